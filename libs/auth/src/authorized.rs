//! Authenticated API access
//!
//! [`SessionRefresher`] owns the refresh-token grant. [`AuthorizedClient`]
//! attaches the bearer token to backend calls and uses the refresher when the
//! token is about to expire or the backend rejects it.

use crate::controller::SessionController;
use crate::error::{AuthError, AuthResult};
use crate::http::{self, TRACE_HEADER};
use crate::session::AuthSession;
use crate::token::TokenExchange;
use chrono::TimeDelta;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// Refresh this long before the access token actually expires
pub const REFRESH_SKEW: TimeDelta = TimeDelta::seconds(60);

/// Keeps the controller's session alive with the refresh-token grant.
///
/// Refreshes are serialized, and a caller that waited on another caller's
/// refresh reuses its result instead of refreshing again.
pub struct SessionRefresher {
    controller: Arc<SessionController>,
    tokens: Arc<dyn TokenExchange>,
    refresh_lock: Mutex<()>,
}

enum Trigger<'a> {
    Forced,
    Stale,
    Rejected(&'a str),
}

impl SessionRefresher {
    pub fn new(controller: Arc<SessionController>, tokens: Arc<dyn TokenExchange>) -> Self {
        Self {
            controller,
            tokens,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn controller(&self) -> &Arc<SessionController> {
        &self.controller
    }

    /// Refresh now, whatever the current expiry.
    ///
    /// Without a refresh token the session is cleared and this fails with
    /// [`AuthError::Unauthorized`]. Any refresh failure also clears the session.
    pub async fn refresh(&self) -> AuthResult<AuthSession> {
        self.refresh_when(Trigger::Forced).await
    }

    /// The current session, refreshed first if it expires within
    /// [`REFRESH_SKEW`]
    pub async fn ensure_fresh(&self) -> AuthResult<AuthSession> {
        let session = self.controller.session().ok_or(AuthError::Unauthorized)?;
        if !session.expires_within(REFRESH_SKEW) {
            return Ok(session);
        }
        self.refresh_when(Trigger::Stale).await
    }

    /// Refresh after the backend rejected `access_token`, unless another
    /// caller already replaced it
    pub async fn refresh_rejected(&self, access_token: &str) -> AuthResult<AuthSession> {
        self.refresh_when(Trigger::Rejected(access_token)).await
    }

    async fn refresh_when(&self, trigger: Trigger<'_>) -> AuthResult<AuthSession> {
        let _guard = self.refresh_lock.lock().await;

        let current = self.controller.session().ok_or(AuthError::Unauthorized)?;
        let still_needed = match trigger {
            Trigger::Forced => true,
            Trigger::Stale => current.expires_within(REFRESH_SKEW),
            Trigger::Rejected(token) => current.access_token == token,
        };
        if !still_needed {
            debug!("session already refreshed by another caller");
            return Ok(current);
        }

        let Some(refresh_token) = current.refresh_token.as_deref() else {
            warn!("session has no refresh token; signing out");
            self.controller.clear_session();
            return Err(AuthError::Unauthorized);
        };

        debug!("refreshing session");
        match self.tokens.refresh_access_token(refresh_token).await {
            Ok(session) => {
                if self.controller.apply(session.clone()) {
                    Ok(session)
                } else {
                    Err(AuthError::Unauthorized)
                }
            }
            Err(e) => {
                warn!("Session refresh failed, signing out: {}", e);
                self.controller.clear_session();
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for SessionRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRefresher")
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

/// JSON client for the backend API that authenticates every call
#[derive(Clone, Debug)]
pub struct AuthorizedClient {
    http: reqwest::Client,
    base_url: String,
    refresher: Arc<SessionRefresher>,
}

impl AuthorizedClient {
    pub fn new(base_url: impl Into<String>, refresher: Arc<SessionRefresher>) -> AuthResult<Self> {
        Ok(Self::with_client(
            http::create_http_client()?,
            base_url,
            refresher,
        ))
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        refresher: Arc<SessionRefresher>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            refresher,
        }
    }

    pub fn refresher(&self) -> &Arc<SessionRefresher> {
        &self.refresher
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AuthResult<T> {
        self.execute(Method::GET, path, None::<&()>).await
    }

    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> AuthResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(method, path, Some(body)).await
    }

    async fn execute<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> AuthResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let session = self.refresher.ensure_fresh().await?;
        let response = self.send_once(&method, &url, body, &session).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return decode(response).await;
        }

        debug!(%url, "access token rejected; refreshing and retrying once");
        let session = self.refresher.refresh_rejected(&session.access_token).await?;
        let response = self.send_once(&method, &url, body, &session).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(%url, "refreshed token rejected; signing out");
            self.refresher.controller().clear_session();
            return Err(AuthError::Unauthorized);
        }
        decode(response).await
    }

    async fn send_once<B>(
        &self,
        method: &Method,
        url: &str,
        body: Option<&B>,
        session: &AuthSession,
    ) -> AuthResult<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self
            .http
            .request(method.clone(), url)
            .header(AUTHORIZATION, session.authorization_header())
            .header(ACCEPT, "application/json")
            .header(TRACE_HEADER, Uuid::new_v4().to_string());
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(http::transport_error)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> AuthResult<T> {
    let response = http::ensure_success(response, "api request").await?;
    http::decode_json(response).await
}
