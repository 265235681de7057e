//! Sign-in configuration

use crate::error::{AuthError, AuthResult};
use url::Url;

/// Scopes requested when none are configured
pub const DEFAULT_SCOPES: &[&str] = &["openid", "email", "profile"];

/// Configuration for the identity provider and the token proxy
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// OAuth client ID
    pub client_id: String,
    /// Identity provider authorize endpoint (`{domain}/oauth2/authorize`)
    pub authorize_url: String,
    /// Redirect URI the browser returns to after sign-in
    pub redirect_uri: String,
    /// Scopes to request
    pub scopes: Vec<String>,
    /// Base URL of the backend API that proxies the token endpoint
    pub api_base_url: String,
    /// Ask the provider to ignore any existing browser session
    pub ephemeral: bool,
}

impl AuthConfig {
    /// Create a configuration for a hosted-UI domain such as
    /// `https://example.auth.us-east-1.amazoncognito.com`
    pub fn new(
        client_id: impl Into<String>,
        domain: impl AsRef<str>,
        redirect_uri: impl Into<String>,
        api_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            authorize_url: format!("{}/oauth2/authorize", domain.as_ref().trim_end_matches('/')),
            redirect_uri: redirect_uri.into(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            api_base_url: api_base_url.into(),
            ephemeral: false,
        }
    }

    /// Override the authorize endpoint
    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = url.into();
        self
    }

    /// Override the requested scopes
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Toggle ephemeral sign-in
    pub fn with_ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }

    /// Get the scopes as a space-separated string
    pub fn scopes_string(&self) -> String {
        self.scopes.join(" ")
    }

    /// Backend token endpoint
    pub fn token_url(&self) -> String {
        format!("{}/auth/token", self.api_base_url.trim_end_matches('/'))
    }

    /// Parsed redirect URI
    pub fn redirect_url(&self) -> AuthResult<Url> {
        Url::parse(&self.redirect_uri).map_err(|e| {
            AuthError::url_construction(format!("invalid redirect URI '{}': {}", self.redirect_uri, e))
        })
    }

    /// Check every field that later steps rely on
    pub fn validate(&self) -> AuthResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(AuthError::url_construction("client id is empty"));
        }
        self.redirect_url()?;
        Url::parse(&self.api_base_url).map_err(|e| {
            AuthError::url_construction(format!("invalid API base URL '{}': {}", self.api_base_url, e))
        })?;
        Ok(())
    }
}
