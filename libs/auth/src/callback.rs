//! Redirect callback parsing and state validation

use crate::error::{AuthError, AuthResult};
use url::Url;

/// Parameters carried by a successful authorization redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    /// Authorization code to exchange
    pub code: String,
    /// State echoed back by the provider, if any
    pub state: Option<String>,
}

/// Error reported by the provider on the redirect (`?error=...`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub error: String,
    pub description: Option<String>,
}

impl ProviderError {
    /// The user declined or closed the consent page
    pub fn is_access_denied(&self) -> bool {
        self.error == "access_denied"
    }

    /// Convert into the error the suspended sign-in resolves with
    pub fn into_auth_error(self) -> AuthError {
        if self.is_access_denied() {
            return AuthError::UserCancelled;
        }
        match self.description {
            Some(desc) => AuthError::presentation_failed(format!("{}: {}", self.error, desc)),
            None => AuthError::presentation_failed(self.error),
        }
    }
}

/// Extract `code` and `state` from a callback URL.
///
/// A missing or empty `code` fails with [`AuthError::MissingAuthorizationCode`].
/// A missing `state` is returned as `None`; comparing it is [`verify_state`]'s job.
pub fn parse_callback(callback: &Url) -> AuthResult<CallbackParams> {
    if callback.query().is_none() {
        return Err(AuthError::MissingAuthorizationCode);
    }

    let mut code = None;
    let mut state = None;
    for (key, value) in callback.query_pairs() {
        match key.as_ref() {
            "code" if code.is_none() => code = Some(value.into_owned()),
            "state" if state.is_none() => state = Some(value.into_owned()),
            _ => {}
        }
    }

    let code = code
        .filter(|c| !c.is_empty())
        .ok_or(AuthError::MissingAuthorizationCode)?;

    Ok(CallbackParams { code, state })
}

/// Parse a callback from its string form
pub fn parse_callback_str(callback: &str) -> AuthResult<CallbackParams> {
    let url = Url::parse(callback.trim()).map_err(|_| AuthError::MissingAuthorizationCode)?;
    parse_callback(&url)
}

/// Read an `error` reported by the provider on the redirect
pub fn provider_error(callback: &Url) -> Option<ProviderError> {
    let mut error = None;
    let mut description = None;
    for (key, value) in callback.query_pairs() {
        match key.as_ref() {
            "error" => error = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }
    error.map(|error| ProviderError { error, description })
}

/// Compare the returned state with the one generated for this attempt.
///
/// Must pass before the code is used in any network call.
pub fn verify_state(expected: &str, returned: Option<&str>) -> AuthResult<()> {
    match returned {
        Some(returned) if constant_time_eq(expected.as_bytes(), returned.as_bytes()) => Ok(()),
        _ => {
            tracing::warn!("callback state mismatch; aborting sign-in");
            Err(AuthError::StateMismatch)
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_code_and_state() {
        let params = parse_callback_str("app://cb?code=abc&state=xyz").unwrap();
        assert_eq!(params.code, "abc");
        assert_eq!(params.state.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_parse_missing_code() {
        assert_eq!(
            parse_callback_str("app://cb?state=xyz"),
            Err(AuthError::MissingAuthorizationCode)
        );
    }

    #[test]
    fn test_parse_empty_code() {
        assert_eq!(
            parse_callback_str("app://cb?code=&state=xyz"),
            Err(AuthError::MissingAuthorizationCode)
        );
    }

    #[test]
    fn test_parse_no_query() {
        assert_eq!(
            parse_callback_str("app://cb"),
            Err(AuthError::MissingAuthorizationCode)
        );
    }

    #[test]
    fn test_parse_not_a_url() {
        assert_eq!(
            parse_callback_str("abc123"),
            Err(AuthError::MissingAuthorizationCode)
        );
    }

    #[test]
    fn test_parse_absent_state_is_not_a_failure() {
        let params = parse_callback_str("app://cb?code=abc").unwrap();
        assert_eq!(params.code, "abc");
        assert_eq!(params.state, None);
    }

    #[test]
    fn test_parse_percent_encoded_values() {
        let params =
            parse_callback_str("http://127.0.0.1:8765/callback?code=a%2Fb&state=s%20t").unwrap();
        assert_eq!(params.code, "a/b");
        assert_eq!(params.state.as_deref(), Some("s t"));
    }

    #[test]
    fn test_verify_state() {
        assert!(verify_state("S1", Some("S1")).is_ok());
        assert_eq!(verify_state("S1", Some("S2")), Err(AuthError::StateMismatch));
        assert_eq!(verify_state("S1", Some("S10")), Err(AuthError::StateMismatch));
        assert_eq!(verify_state("S1", None), Err(AuthError::StateMismatch));
    }

    #[test]
    fn test_provider_error() {
        let url = Url::parse("app://cb?error=access_denied&state=xyz").unwrap();
        let error = provider_error(&url).unwrap();
        assert!(error.is_access_denied());
        assert_eq!(error.into_auth_error(), AuthError::UserCancelled);

        let url =
            Url::parse("app://cb?error=invalid_scope&error_description=bad+scope").unwrap();
        let error = provider_error(&url).unwrap();
        assert_eq!(
            error.into_auth_error(),
            AuthError::PresentationFailed("invalid_scope: bad scope".to_string())
        );

        let url = Url::parse("app://cb?code=abc").unwrap();
        assert!(provider_error(&url).is_none());
    }
}
