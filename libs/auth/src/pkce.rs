//! PKCE (Proof Key for Code Exchange) parameters
//!
//! Implements RFC 7636 with the S256 method. Verifiers and state tokens use
//! letters and digits only, a strict subset of the unreserved alphabet, so no
//! intermediary has a reason to re-encode them.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use rand::distr::Alphanumeric;
use sha2::{Digest, Sha256};
use std::fmt;

/// Shortest verifier allowed by RFC 7636
pub const VERIFIER_MIN_LEN: usize = 43;
/// Longest verifier allowed by RFC 7636
pub const VERIFIER_MAX_LEN: usize = 128;
/// Length of the anti-CSRF state token
pub const STATE_LEN: usize = 32;

/// Verifier, challenge and state for a single sign-in attempt.
///
/// Never persisted; dropped once the attempt finishes.
#[derive(Clone)]
pub struct PkceParams {
    /// Sent with the token exchange
    pub verifier: String,
    /// Sent with the authorization request
    pub challenge: String,
    /// Round-tripped through the redirect and checked on return
    pub state: String,
}

impl PkceParams {
    /// Generate a fresh, independent set of parameters
    pub fn generate() -> Self {
        let verifier = generate_verifier();
        let challenge = challenge(&verifier);
        Self {
            verifier,
            challenge,
            state: generate_state(),
        }
    }

    /// Get the code challenge method (always S256)
    pub fn challenge_method() -> &'static str {
        "S256"
    }
}

impl fmt::Debug for PkceParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkceParams")
            .field("verifier", &"[redacted]")
            .field("challenge", &self.challenge)
            .field("state", &"[redacted]")
            .finish()
    }
}

/// Random verifier with a length drawn from `[43, 128]`
pub fn generate_verifier() -> String {
    let len = rand::rng().random_range(VERIFIER_MIN_LEN..=VERIFIER_MAX_LEN);
    random_alphanumeric(len)
}

/// `BASE64URL(SHA256(verifier))`, unpadded
pub fn challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Random 32-character state token
pub fn generate_state() -> String {
    random_alphanumeric(STATE_LEN)
}

// ThreadRng is a CSPRNG reseeded from the OS
fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
