//! HTTP plumbing shared by the token client and the authorized API client

use crate::error::{AuthError, AuthResult};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use rustls_platform_verifier::BuilderVerifierExt;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::error;

/// Per-request correlation id header
pub const TRACE_HEADER: &str = "X-Request-Trace";
/// Per-request deduplication key header
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a client that trusts the OS certificate store
pub fn create_http_client() -> AuthResult<Client> {
    // needed to use OS-provided CA certificates with Rustls
    let crypto_provider = std::sync::Arc::new(rustls::crypto::ring::default_provider());
    let tls_config = rustls::ClientConfig::builder_with_provider(crypto_provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| AuthError::Unknown(format!("failed to build TLS config: {}", e)))?
        .with_platform_verifier()
        .with_no_client_auth();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_str(&format!("PocketLedger/{}", env!("CARGO_PKG_VERSION")))
            .map_err(|e| AuthError::Unknown(e.to_string()))?,
    );

    Client::builder()
        .use_preconfigured_tls(tls_config)
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AuthError::Unknown(format!("failed to create HTTP client: {}", e)))
}

/// Map a failure to get any response at all
pub fn transport_error(err: reqwest::Error) -> AuthError {
    AuthError::Unreachable(err.to_string())
}

/// Error response body. Only used for logging.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<ApiErrorDetail>,
    #[serde(default)]
    trace_id: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Pass a successful response through, or map its status to an error
pub async fn ensure_success(response: Response, operation: &'static str) -> AuthResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<ApiErrorBody>(&body).unwrap_or_default();
    let detail = parsed.error.unwrap_or(ApiErrorDetail {
        code: None,
        message: None,
    });
    error!(
        operation,
        status = status.as_u16(),
        code = detail.code.as_deref().unwrap_or("-"),
        message = detail.message.as_deref().unwrap_or("-"),
        trace_id = parsed.trace_id.as_deref().unwrap_or("-"),
        "request failed"
    );

    Err(AuthError::from_status(status.as_u16()))
}

/// Read the body and decode it as JSON
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> AuthResult<T> {
    let bytes = response.bytes().await.map_err(transport_error)?;
    serde_json::from_slice(&bytes).map_err(|e| AuthError::decoding_failed(e.to_string()))
}
