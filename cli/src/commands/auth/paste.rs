//! Manual sign-in surface for redirect URIs the CLI cannot listen on

use async_trait::async_trait;
use pocketledger_auth::callback::provider_error;
use pocketledger_auth::{AuthError, AuthResult, AuthorizationPrompt, AuthorizationSurface};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use url::Url;

/// Prints the sign-in URL and reads the redirect URL back from stdin
#[derive(Debug, Default)]
pub struct PasteSurface;

impl PasteSurface {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuthorizationSurface for PasteSurface {
    async fn authorize(&self, prompt: &AuthorizationPrompt) -> AuthResult<Url> {
        super::login::print_authorize_url(&prompt.url);
        if let Err(e) = open::that(prompt.url.as_str()) {
            warn!("Failed to open browser: {}", e);
        }

        println!("After signing in, your browser is sent to {}", prompt.redirect_uri);
        print!("Paste the full address from the browser here: ");
        std::io::stdout()
            .flush()
            .map_err(|e| AuthError::presentation_failed(e.to_string()))?;

        let mut line = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        tokio::select! {
            read = stdin.read_line(&mut line) => {
                read.map_err(|e| AuthError::presentation_failed(format!("Failed to read input: {}", e)))?;
            }
            _ = tokio::signal::ctrl_c() => return Err(AuthError::UserCancelled),
        }

        resolve_pasted(&line, prompt)
    }
}

/// Interpret what the user pasted
pub(crate) fn resolve_pasted(input: &str, prompt: &AuthorizationPrompt) -> AuthResult<Url> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AuthError::UserCancelled);
    }
    let url = Url::parse(input).map_err(|_| AuthError::MissingAuthorizationCode)?;
    if !prompt.matches_redirect(&url) {
        warn!(
            expected = prompt.callback_scheme(),
            "pasted URL does not match the redirect URI"
        );
    }
    if let Some(error) = provider_error(&url) {
        return Err(error.into_auth_error());
    }
    Ok(url)
}
