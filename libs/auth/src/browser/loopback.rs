use super::{AuthorizationPrompt, AuthorizationSurface, Completion, completion};
use crate::callback::provider_error;
use crate::error::{AuthError, AuthResult};
use async_trait::async_trait;
use axum::Router;
use axum::extract::{RawQuery, State};
use axum::response::Html;
use axum::routing::get;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use url::Url;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

const SUCCESS_PAGE: &str = "<!doctype html><html><body>\
<h2>Signed in to PocketLedger</h2><p>You can close this window and return to the terminal.</p>\
</body></html>";

const FAILURE_PAGE: &str = "<!doctype html><html><body>\
<h2>Sign-in did not complete</h2><p>Return to the terminal for details.</p>\
</body></html>";

const ALREADY_COMPLETED_PAGE: &str = "<!doctype html><html><body>\
<h2>Sign-in already completed</h2><p>You can close this window.</p>\
</body></html>";

type Presenter = Arc<dyn Fn(&Url) + Send + Sync>;

/// Receives the redirect on a local HTTP listener.
///
/// The redirect URI must be `http://127.0.0.1:<port>/<path>` or
/// `http://localhost:<port>/<path>`. The listener only lives for the duration
/// of one [`authorize`](AuthorizationSurface::authorize) call.
#[derive(Clone)]
pub struct LoopbackSurface {
    open_browser: bool,
    presenter: Option<Presenter>,
}

#[derive(Clone)]
struct CallbackState {
    completion: Completion,
    redirect_uri: Url,
}

impl Default for LoopbackSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackSurface {
    pub fn new() -> Self {
        Self {
            open_browser: true,
            presenter: None,
        }
    }

    /// Do not launch the system browser; only call the presenter
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }

    /// Called with the authorize URL before the browser is launched,
    /// e.g. to print it for the user to copy
    pub fn with_presenter<F>(mut self, presenter: F) -> Self
    where
        F: Fn(&Url) + Send + Sync + 'static,
    {
        self.presenter = Some(Arc::new(presenter));
        self
    }

    /// Run one authorization attempt on an already bound listener
    pub async fn authorize_on(
        &self,
        listener: TcpListener,
        prompt: &AuthorizationPrompt,
    ) -> AuthResult<Url> {
        let (completion, pending) = completion();
        let state = CallbackState {
            completion: completion.clone(),
            redirect_uri: prompt.redirect_uri.clone(),
        };

        let path = match prompt.redirect_uri.path() {
            "" => "/",
            path => path,
        };
        let router = Router::new()
            .route(path, get(handle_callback))
            .with_state(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server_completion = completion.clone();
        let mut server = tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = served {
                server_completion.resolve(Err(AuthError::presentation_failed(format!(
                    "callback server failed: {}",
                    e
                ))));
            }
        });

        self.present(&prompt.url, &completion);

        let outcome = tokio::select! {
            outcome = pending.wait() => outcome,
            _ = interrupted() => {
                debug!("authorization interrupted");
                Err(AuthError::UserCancelled)
            }
        };

        let _ = shutdown_tx.send(());
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await.is_err() {
            server.abort();
        }

        outcome
    }

    fn present(&self, url: &Url, completion: &Completion) {
        if let Some(presenter) = &self.presenter {
            presenter(url);
        }
        if !self.open_browser {
            return;
        }
        match open::that(url.as_str()) {
            Ok(()) => debug!("opened system browser"),
            // With a presenter the user can still follow the printed URL
            Err(e) if self.presenter.is_some() => warn!("Failed to open browser: {}", e),
            Err(e) => {
                completion.resolve(Err(AuthError::presentation_failed(format!(
                    "failed to open browser: {}",
                    e
                ))));
            }
        }
    }
}

#[async_trait]
impl AuthorizationSurface for LoopbackSurface {
    async fn authorize(&self, prompt: &AuthorizationPrompt) -> AuthResult<Url> {
        let address = loopback_address(&prompt.redirect_uri)?;
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            AuthError::presentation_failed(format!("failed to listen on {}: {}", address, e))
        })?;
        debug!(%address, "waiting for authorization callback");
        self.authorize_on(listener, prompt).await
    }
}

impl std::fmt::Debug for LoopbackSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackSurface")
            .field("open_browser", &self.open_browser)
            .field("presenter", &self.presenter.is_some())
            .finish()
    }
}

/// IPv4 `host:port` to bind for a loopback redirect URI
///
/// `localhost` binds 127.0.0.1; resolving it may yield only `::1`.
fn loopback_address(redirect_uri: &Url) -> AuthResult<String> {
    if redirect_uri.scheme() != "http" {
        return Err(AuthError::presentation_failed(format!(
            "redirect URI scheme '{}' cannot be served locally",
            redirect_uri.scheme()
        )));
    }
    match redirect_uri.host_str() {
        Some("127.0.0.1" | "localhost") => {}
        other => {
            return Err(AuthError::presentation_failed(format!(
                "redirect URI host {:?} is not a loopback address",
                other
            )));
        }
    }
    let port = redirect_uri
        .port()
        .ok_or_else(|| AuthError::presentation_failed("redirect URI has no port"))?;
    Ok(format!("127.0.0.1:{}", port))
}

async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn handle_callback(
    State(state): State<CallbackState>,
    RawQuery(query): RawQuery,
) -> Html<&'static str> {
    let mut callback = state.redirect_uri.clone();
    callback.set_query(query.as_deref());

    let (outcome, page) = match provider_error(&callback) {
        Some(err) => {
            debug!(error = %err.error, "provider reported an error on the callback");
            (Err(err.into_auth_error()), FAILURE_PAGE)
        }
        None => (Ok(callback), SUCCESS_PAGE),
    };

    if state.completion.resolve(outcome) {
        Html(page)
    } else {
        Html(ALREADY_COMPLETED_PAGE)
    }
}
