//! Interactive authorization surfaces
//!
//! A surface shows the authorize URL to the user (normally in the system
//! browser) and suspends the sign-in until exactly one outcome arrives: the
//! redirect callback, a cancellation, or an error.
//!
//! Callback-driven surfaces bridge into `async` through [`Completion`], a
//! one-shot resolver. The first outcome wins; later ones are logged and
//! dropped.

mod loopback;

pub use loopback::LoopbackSurface;

use crate::error::{AuthError, AuthResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::warn;
use url::Url;

/// What a surface needs to run one authorization attempt
#[derive(Debug, Clone)]
pub struct AuthorizationPrompt {
    /// Provider authorize URL to present
    pub url: Url,
    /// Where the provider sends the browser back to
    pub redirect_uri: Url,
    /// Whether provider-side cookies should be ignored for this attempt
    pub ephemeral: bool,
}

impl AuthorizationPrompt {
    /// Scheme the callback URL must carry
    pub fn callback_scheme(&self) -> &str {
        self.redirect_uri.scheme()
    }

    /// Whether `url` is addressed to this prompt's redirect URI
    pub fn matches_redirect(&self, url: &Url) -> bool {
        url.scheme() == self.redirect_uri.scheme()
            && url.host_str() == self.redirect_uri.host_str()
            && url.path() == self.redirect_uri.path()
    }
}

/// Presents the authorize URL and waits for the outcome
#[async_trait]
pub trait AuthorizationSurface: Send + Sync {
    /// Resolve with the callback URL, [`AuthError::UserCancelled`],
    /// [`AuthError::PresentationFailed`], or another surface error
    async fn authorize(&self, prompt: &AuthorizationPrompt) -> AuthResult<Url>;
}

/// Resolving half of a one-shot authorization outcome.
///
/// Cheap to clone; every clone shares the same single slot.
#[derive(Clone, Debug)]
pub struct Completion {
    sender: Arc<Mutex<Option<oneshot::Sender<AuthResult<Url>>>>>,
}

/// Waiting half of a one-shot authorization outcome
#[derive(Debug)]
pub struct PendingAuthorization {
    receiver: oneshot::Receiver<AuthResult<Url>>,
}

/// Create a linked resolver and waiter
pub fn completion() -> (Completion, PendingAuthorization) {
    let (sender, receiver) = oneshot::channel();
    (
        Completion {
            sender: Arc::new(Mutex::new(Some(sender))),
        },
        PendingAuthorization { receiver },
    )
}

impl Completion {
    /// Deliver the outcome. Returns `false` if one was already delivered.
    pub fn resolve(&self, outcome: AuthResult<Url>) -> bool {
        let Some(sender) = self.sender.lock().take() else {
            warn!("authorization already resolved; ignoring later outcome");
            return false;
        };
        // The waiter may have gone away (e.g. cancelled); nothing to do then
        let _ = sender.send(outcome);
        true
    }

    pub fn is_resolved(&self) -> bool {
        self.sender.lock().is_none()
    }
}

impl PendingAuthorization {
    /// Wait for the outcome.
    ///
    /// If every [`Completion`] is dropped without resolving, this fails with
    /// [`AuthError::PresentationFailed`] instead of hanging.
    pub async fn wait(self) -> AuthResult<Url> {
        self.receiver.await.unwrap_or_else(|_| {
            Err(AuthError::presentation_failed(
                "authorization surface closed without a result",
            ))
        })
    }
}
