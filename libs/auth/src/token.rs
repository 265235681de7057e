//! Token exchange through the backend proxy
//!
//! The client never talks to the identity provider's token endpoint. It
//! posts to `{api}/auth/token`, and the backend (which holds the client
//! secret) performs the exchange.

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::http::{self, IDEMPOTENCY_HEADER, TRACE_HEADER};
use crate::session::{AuthSession, DEFAULT_TOKEN_TYPE};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Exchanges codes and refresh tokens for sessions.
///
/// Implementations do not retry. Retrying after a rejected access token is
/// the caller's job (see [`SessionRefresher`](crate::SessionRefresher)).
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Exchange an authorization code (plus PKCE verifier) for a session
    async fn exchange_authorization_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> AuthResult<AuthSession>;

    /// Obtain a new session from a refresh token.
    ///
    /// When the response omits a refresh token, the one sent is kept.
    async fn refresh_access_token(&self, refresh_token: &str) -> AuthResult<AuthSession>;
}

/// Body of `POST /auth/token`
#[derive(Debug, Serialize)]
#[serde(tag = "grantType")]
enum TokenRequest<'a> {
    #[serde(rename = "authorization_code", rename_all = "camelCase")]
    AuthorizationCode {
        code: &'a str,
        redirect_uri: &'a str,
        code_verifier: &'a str,
    },
    #[serde(rename = "refresh_token", rename_all = "camelCase")]
    RefreshToken { refresh_token: &'a str },
}

impl TokenRequest<'_> {
    fn grant_type(&self) -> &'static str {
        match self {
            Self::AuthorizationCode { .. } => "authorization_code",
            Self::RefreshToken { .. } => "refresh_token",
        }
    }
}

/// Token response from the backend token endpoint
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Access token for API requests
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
    /// Omitted when the provider does not rotate refresh tokens
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl TokenResponse {
    /// Build a session, anchoring the lifetime at `received_at`.
    ///
    /// `previous_refresh_token` fills in for a missing refresh token.
    pub fn into_session(
        self,
        received_at: DateTime<Utc>,
        previous_refresh_token: Option<&str>,
    ) -> AuthResult<AuthSession> {
        let expires_at = TimeDelta::try_seconds(self.expires_in)
            .and_then(|lifetime| received_at.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::decoding_failed(format!("expiresIn out of range: {}", self.expires_in))
            })?;

        Ok(AuthSession {
            access_token: self.access_token,
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh_token.map(str::to_string)),
            id_token: self.id_token,
            expires_at,
            user_id: self.user_id,
            token_type: self
                .token_type
                .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()),
        })
    }
}

/// [`TokenExchange`] over HTTP
#[derive(Clone, Debug)]
pub struct HttpTokenClient {
    client: reqwest::Client,
    token_url: String,
}

impl HttpTokenClient {
    /// Create a client for the token endpoint named by `config`
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        Ok(Self::with_client(http::create_http_client()?, config.token_url()))
    }

    /// Use a custom HTTP client (for connection pool reuse or testing)
    pub fn with_client(client: reqwest::Client, token_url: impl Into<String>) -> Self {
        Self {
            client,
            token_url: token_url.into(),
        }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    async fn post_token(&self, request: &TokenRequest<'_>) -> AuthResult<TokenResponse> {
        let trace_id = Uuid::new_v4();
        let idempotency_key = Uuid::new_v4();
        debug!(%trace_id, grant_type = request.grant_type(), "requesting tokens");

        let response = self
            .client
            .post(&self.token_url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(TRACE_HEADER, trace_id.to_string())
            .header(IDEMPOTENCY_HEADER, idempotency_key.to_string())
            .json(request)
            .send()
            .await
            .map_err(http::transport_error)?;

        let response = http::ensure_success(response, "token exchange").await?;
        http::decode_json(response).await
    }
}

#[async_trait]
impl TokenExchange for HttpTokenClient {
    async fn exchange_authorization_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> AuthResult<AuthSession> {
        let request = TokenRequest::AuthorizationCode {
            code,
            redirect_uri,
            code_verifier,
        };
        let response = self.post_token(&request).await?;
        response.into_session(Utc::now(), None)
    }

    async fn refresh_access_token(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        let request = TokenRequest::RefreshToken { refresh_token };
        let response = self.post_token(&request).await?;
        response.into_session(Utc::now(), Some(refresh_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Recorded {
        requests: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
    }

    async fn spawn_token_server(status: StatusCode, body: &'static str) -> (String, Recorded) {
        let recorded = Recorded::default();
        let router = Router::new()
            .route(
                "/auth/token",
                post(
                    move |State(recorded): State<Recorded>,
                          headers: HeaderMap,
                          Json(request): Json<Value>| async move {
                        recorded.requests.lock().push((headers, request));
                        (status, body)
                    },
                ),
            )
            .with_state(recorded.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{addr}/auth/token"), recorded)
    }

    fn client_for(url: &str) -> HttpTokenClient {
        HttpTokenClient::with_client(reqwest::Client::new(), url)
    }

    const FULL_RESPONSE: &str = r#"{
        "accessToken": "at1",
        "idToken": "id1",
        "refreshToken": "rt1",
        "expiresIn": 3600,
        "tokenType": "Bearer",
        "userId": "user-1"
    }"#;

    #[tokio::test]
    async fn test_exchange_authorization_code() {
        let (url, recorded) = spawn_token_server(StatusCode::OK, FULL_RESPONSE).await;
        let before = Utc::now();

        let session = client_for(&url)
            .exchange_authorization_code("abc123", "verifier", "pocketledger://auth/callback")
            .await
            .unwrap();

        assert_eq!(session.access_token, "at1");
        assert_eq!(session.id_token.as_deref(), Some("id1"));
        assert_eq!(session.refresh_token.as_deref(), Some("rt1"));
        assert_eq!(session.user_id.as_deref(), Some("user-1"));
        assert_eq!(session.token_type, "Bearer");
        assert!(session.expires_at >= before + TimeDelta::seconds(3600));
        assert!(!session.is_expired());

        let requests = recorded.requests.lock();
        let (headers, body) = &requests[0];
        assert_eq!(
            body,
            &json!({
                "grantType": "authorization_code",
                "code": "abc123",
                "redirectUri": "pocketledger://auth/callback",
                "codeVerifier": "verifier"
            })
        );
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["accept"], "application/json");
    }

    #[tokio::test]
    async fn test_refresh_request_body() {
        let (url, recorded) = spawn_token_server(StatusCode::OK, FULL_RESPONSE).await;
        client_for(&url).refresh_access_token("rt0").await.unwrap();

        let requests = recorded.requests.lock();
        assert_eq!(
            requests[0].1,
            json!({ "grantType": "refresh_token", "refreshToken": "rt0" })
        );
    }

    #[tokio::test]
    async fn test_refresh_keeps_previous_refresh_token() {
        let (url, _) = spawn_token_server(
            StatusCode::OK,
            r#"{"accessToken":"at2","expiresIn":3600,"tokenType":"Bearer"}"#,
        )
        .await;

        let session = client_for(&url).refresh_access_token("rt-old").await.unwrap();
        assert_eq!(session.access_token, "at2");
        assert_eq!(session.refresh_token.as_deref(), Some("rt-old"));
    }

    #[tokio::test]
    async fn test_refresh_takes_rotated_refresh_token() {
        let (url, _) = spawn_token_server(StatusCode::OK, FULL_RESPONSE).await;
        let session = client_for(&url).refresh_access_token("rt-old").await.unwrap();
        assert_eq!(session.refresh_token.as_deref(), Some("rt1"));
    }

    #[tokio::test]
    async fn test_fresh_trace_and_idempotency_headers_per_request() {
        let (url, recorded) = spawn_token_server(StatusCode::OK, FULL_RESPONSE).await;
        let client = client_for(&url);
        client
            .exchange_authorization_code("code", "verifier", "app://cb")
            .await
            .unwrap();
        client.refresh_access_token("rt").await.unwrap();

        let requests = recorded.requests.lock();
        assert_eq!(requests.len(), 2);
        let header = |i: usize, name: &str| {
            requests[i].0[name].to_str().unwrap().to_string()
        };

        let keys = (header(0, "idempotency-key"), header(1, "idempotency-key"));
        let traces = (header(0, "x-request-trace"), header(1, "x-request-trace"));
        assert_ne!(keys.0, keys.1);
        assert_ne!(traces.0, traces.1);
        assert_ne!(keys.0, traces.0);
        assert!(Uuid::parse_str(&keys.0).is_ok());
        assert!(Uuid::parse_str(&traces.0).is_ok());
    }

    #[tokio::test]
    async fn test_unauthorized_status() {
        let (url, _) = spawn_token_server(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"code":"invalid_grant","message":"expired"},"traceId":"t"}"#,
        )
        .await;
        let result = client_for(&url).refresh_access_token("rt").await;
        assert_eq!(result, Err(AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn test_server_error_is_unreachable() {
        let (url, _) = spawn_token_server(StatusCode::INTERNAL_SERVER_ERROR, "").await;
        let result = client_for(&url)
            .exchange_authorization_code("code", "verifier", "app://cb")
            .await;
        assert!(matches!(result, Err(AuthError::Unreachable(_))));
    }

    #[tokio::test]
    async fn test_undecodable_success_body() {
        let (url, _) = spawn_token_server(StatusCode::OK, "{\"accessToken\": 42").await;
        let result = client_for(&url)
            .exchange_authorization_code("code", "verifier", "app://cb")
            .await;
        assert!(matches!(result, Err(AuthError::DecodingFailed(_))));
    }

    #[tokio::test]
    async fn test_missing_required_field_is_decoding_failure() {
        let (url, _) = spawn_token_server(StatusCode::OK, r#"{"accessToken":"at"}"#).await;
        let result = client_for(&url).refresh_access_token("rt").await;
        assert!(matches!(result, Err(AuthError::DecodingFailed(_))));
    }

    #[test]
    fn test_into_session_defaults() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"accessToken":"at","expiresIn":60}"#).unwrap();
        let received_at = Utc::now();
        let session = response.into_session(received_at, None).unwrap();

        assert_eq!(session.token_type, "Bearer");
        assert_eq!(session.refresh_token, None);
        assert_eq!(session.expires_at, received_at + TimeDelta::seconds(60));
    }

    #[test]
    fn test_into_session_rejects_absurd_lifetime() {
        let response: TokenResponse =
            serde_json::from_str(&format!(r#"{{"accessToken":"at","expiresIn":{}}}"#, i64::MAX))
                .unwrap();
        assert!(matches!(
            response.into_session(Utc::now(), None),
            Err(AuthError::DecodingFailed(_))
        ));
    }

    #[test]
    fn test_transport_failure_is_unreachable() {
        // Nothing listens on port 9 (discard) in the test environment
        let client = client_for("http://127.0.0.1:9/auth/token");
        let result = tokio_test::block_on(client.refresh_access_token("rt"));
        assert!(matches!(result, Err(AuthError::Unreachable(_))));
    }
}
