//! Error types for sign-in, token exchange and session persistence

use thiserror::Error;

/// Errors produced while signing in or talking to the token endpoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The authorize endpoint or one of its parameters could not form a URL
    #[error("Failed to build authorization URL: {0}")]
    AuthorizationUrlConstructionFailed(String),

    /// The user backed out of the sign-in page
    #[error("Sign-in cancelled by the user")]
    UserCancelled,

    /// The sign-in page could not be shown or reported a provider error
    #[error("Failed to present the sign-in page: {0}")]
    PresentationFailed(String),

    /// The callback URL carried no usable `code` parameter
    #[error("Callback URL did not contain an authorization code")]
    MissingAuthorizationCode,

    /// The callback `state` differs from the one generated for this attempt
    #[error("Callback state did not match the sign-in attempt")]
    StateMismatch,

    /// HTTP 400
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// HTTP 401, or no usable session is available
    #[error("Unauthorized")]
    Unauthorized,

    /// HTTP 403
    #[error("Forbidden")]
    Forbidden,

    /// HTTP 404
    #[error("Not found")]
    NotFound,

    /// HTTP 429
    #[error("Rate limited")]
    RateLimited,

    /// HTTP 5xx or a transport-level failure
    #[error("Service unreachable: {0}")]
    Unreachable(String),

    /// Any other non-success response
    #[error("Unexpected response: {0}")]
    Unknown(String),

    /// The response body could not be decoded
    #[error("Failed to decode response: {0}")]
    DecodingFailed(String),
}

impl AuthError {
    /// Map a non-success HTTP status to its error kind
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::InvalidCredentials,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            500..=599 => Self::Unreachable(format!("HTTP {}", status)),
            _ => Self::Unknown(format!("HTTP {}", status)),
        }
    }

    /// Create a URL construction error
    pub fn url_construction(msg: impl Into<String>) -> Self {
        Self::AuthorizationUrlConstructionFailed(msg.into())
    }

    /// Create a presentation error
    pub fn presentation_failed(msg: impl Into<String>) -> Self {
        Self::PresentationFailed(msg.into())
    }

    /// Create a decoding error
    pub fn decoding_failed(msg: impl Into<String>) -> Self {
        Self::DecodingFailed(msg.into())
    }

    /// Whether this error is the benign user-cancel outcome
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::UserCancelled)
    }

    /// Short message suitable for showing to the user.
    ///
    /// Returns `None` for [`AuthError::UserCancelled`], which is never shown.
    /// Security failures share the generic sign-in message so the user cannot
    /// tell which check rejected the attempt.
    pub fn user_message(&self) -> Option<&'static str> {
        let msg = match self {
            Self::UserCancelled => return None,
            Self::AuthorizationUrlConstructionFailed(_) => {
                "Sign-in is misconfigured. Please contact support."
            }
            Self::PresentationFailed(_) => "Couldn't open the sign-in page. Please try again.",
            Self::MissingAuthorizationCode | Self::StateMismatch => {
                "Sign-in failed. Please try again."
            }
            Self::InvalidCredentials => "Your sign-in details were not accepted.",
            Self::Unauthorized => "Your session has expired. Please sign in again.",
            Self::Forbidden => "You don't have access to this resource.",
            Self::NotFound => "The requested resource was not found.",
            Self::RateLimited => "Too many requests. Please wait a moment and try again.",
            Self::Unreachable(_) => "Can't reach the server. Check your connection and try again.",
            Self::Unknown(_) => "Something went wrong. Please try again.",
            Self::DecodingFailed(_) => "The server sent an unexpected response.",
        };
        Some(msg)
    }
}

/// Result type alias for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors raised by a [`SessionStore`](crate::store::SessionStore) backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// File I/O error
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// TOML deserialization error
    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// OS credential manager error
    #[error("Credential store error: {0}")]
    Keyring(#[from] keyring::Error),

    /// Home directory could not be resolved
    #[error("Could not determine home directory")]
    NoHomeDir,
}

/// Result type alias for session store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(400, AuthError::InvalidCredentials ; "bad request")]
    #[test_case(401, AuthError::Unauthorized ; "unauthorized")]
    #[test_case(403, AuthError::Forbidden ; "forbidden")]
    #[test_case(404, AuthError::NotFound ; "not found")]
    #[test_case(429, AuthError::RateLimited ; "rate limited")]
    #[test_case(500, AuthError::Unreachable("HTTP 500".into()) ; "internal error")]
    #[test_case(503, AuthError::Unreachable("HTTP 503".into()) ; "unavailable")]
    #[test_case(599, AuthError::Unreachable("HTTP 599".into()) ; "upper 5xx")]
    #[test_case(302, AuthError::Unknown("HTTP 302".into()) ; "redirect")]
    #[test_case(418, AuthError::Unknown("HTTP 418".into()) ; "teapot")]
    fn test_status_mapping(status: u16, expected: AuthError) {
        assert_eq!(AuthError::from_status(status), expected);
    }

    #[test]
    fn test_user_cancelled_has_no_message() {
        assert!(AuthError::UserCancelled.user_message().is_none());
        assert!(AuthError::UserCancelled.is_cancellation());
    }

    #[test]
    fn test_every_other_kind_has_a_message() {
        let errors = [
            AuthError::url_construction("bad"),
            AuthError::presentation_failed("no window"),
            AuthError::MissingAuthorizationCode,
            AuthError::StateMismatch,
            AuthError::InvalidCredentials,
            AuthError::Unauthorized,
            AuthError::Forbidden,
            AuthError::NotFound,
            AuthError::RateLimited,
            AuthError::Unreachable("down".into()),
            AuthError::Unknown("HTTP 418".into()),
            AuthError::decoding_failed("eof"),
        ];

        for error in errors {
            assert!(error.user_message().is_some(), "{:?} has no message", error);
            assert!(!error.is_cancellation());
        }
    }

    #[test]
    fn test_state_mismatch_does_not_leak_which_check_failed() {
        assert_eq!(
            AuthError::StateMismatch.user_message(),
            AuthError::MissingAuthorizationCode.user_message()
        );
    }
}
