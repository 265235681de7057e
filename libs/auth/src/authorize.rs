//! Authorization URL construction

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::pkce::PkceParams;
use url::Url;

/// Build the identity provider's authorize URL for one sign-in attempt.
///
/// Query pairs already present on the configured endpoint are kept.
pub fn build_authorization_url(config: &AuthConfig, pkce: &PkceParams) -> AuthResult<Url> {
    let mut url = Url::parse(&config.authorize_url).map_err(|e| {
        AuthError::url_construction(format!(
            "invalid authorize endpoint '{}': {}",
            config.authorize_url, e
        ))
    })?;
    if url.cannot_be_a_base() {
        return Err(AuthError::url_construction(format!(
            "authorize endpoint '{}' is not a hierarchical URL",
            config.authorize_url
        )));
    }
    if config.client_id.trim().is_empty() {
        return Err(AuthError::url_construction("client id is empty"));
    }
    let redirect_uri = config.redirect_url()?;

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("client_id", &config.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", redirect_uri.as_str())
            .append_pair("scope", &config.scopes_string())
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", PkceParams::challenge_method())
            .append_pair("state", &pkce.state);
        if config.ephemeral {
            query.append_pair("prompt", "login");
        }
    }

    Ok(url)
}
