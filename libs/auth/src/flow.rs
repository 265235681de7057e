//! Sign-in orchestration
//!
//! One call to [`Authenticator::sign_in`] is one attempt: fresh PKCE
//! parameters, the authorize URL, the interactive surface, the callback check,
//! the token exchange, and finally [`SessionController::apply`]. Nothing
//! touches the controller until the exchange has succeeded.

use crate::authorize::build_authorization_url;
use crate::browser::{AuthorizationPrompt, AuthorizationSurface};
use crate::callback::{parse_callback, verify_state};
use crate::config::AuthConfig;
use crate::controller::SessionController;
use crate::error::{AuthError, AuthResult};
use crate::pkce::PkceParams;
use crate::session::AuthSession;
use crate::token::TokenExchange;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Authenticator {
    config: AuthConfig,
    tokens: Arc<dyn TokenExchange>,
    surface: Arc<dyn AuthorizationSurface>,
    controller: Arc<SessionController>,
}

impl Authenticator {
    pub fn new(
        config: AuthConfig,
        tokens: Arc<dyn TokenExchange>,
        surface: Arc<dyn AuthorizationSurface>,
        controller: Arc<SessionController>,
    ) -> Self {
        Self {
            config,
            tokens,
            surface,
            controller,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }

    /// Run one interactive sign-in attempt and return the applied session.
    ///
    /// Errors before the exchange completes leave the controller as it was.
    /// A session that is already expired on arrival is rejected by the
    /// controller, which signs out any existing session, and is reported as
    /// [`AuthError::Unauthorized`].
    pub async fn sign_in(&self) -> AuthResult<AuthSession> {
        let pkce = PkceParams::generate();
        let url = build_authorization_url(&self.config, &pkce)?;
        let prompt = AuthorizationPrompt {
            url,
            redirect_uri: self.config.redirect_url()?,
            ephemeral: self.config.ephemeral,
        };

        debug!(ephemeral = prompt.ephemeral, "presenting authorization prompt");
        let callback = self.surface.authorize(&prompt).await?;

        let params = parse_callback(&callback)?;
        verify_state(&pkce.state, params.state.as_deref())?;

        debug!("exchanging authorization code");
        let session = self
            .tokens
            .exchange_authorization_code(&params.code, &pkce.verifier, prompt.redirect_uri.as_str())
            .await?;

        if !self.controller.apply(session.clone()) {
            return Err(AuthError::Unauthorized);
        }
        info!(user_id = ?session.user_id, expires_at = %session.expires_at, "signed in");
        Ok(session)
    }

    /// Forget the current session
    pub fn sign_out(&self) {
        self.controller.clear_session();
        info!("signed out");
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("config", &self.config)
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}
