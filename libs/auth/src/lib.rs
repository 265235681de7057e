//! PocketLedger sign-in and session lifecycle
//!
//! Signs the user in with the OAuth 2.0 authorization code flow plus PKCE,
//! exchanges the code through the backend token proxy, and keeps the resulting
//! session in a single [`SessionController`].
//!
//! ```text
//! PkceParams ─▶ build_authorization_url ─▶ AuthorizationSurface
//!                                                │ callback URL
//!                                                ▼
//!      SessionController ◀─ TokenExchange ◀─ parse_callback + verify_state
//! ```

pub mod authorize;
pub mod authorized;
pub mod browser;
pub mod callback;
pub mod config;
pub mod controller;
pub mod error;
pub mod flow;
pub mod http;
pub mod pkce;
pub mod session;
pub mod store;
pub mod token;

pub use authorize::build_authorization_url;
pub use authorized::{AuthorizedClient, REFRESH_SKEW, SessionRefresher};
pub use browser::{AuthorizationPrompt, AuthorizationSurface, Completion, LoopbackSurface};
pub use callback::{CallbackParams, parse_callback, parse_callback_str, verify_state};
pub use config::AuthConfig;
pub use controller::{ObserverId, SessionController, SessionState};
pub use error::{AuthError, AuthResult, StoreError, StoreResult};
pub use flow::Authenticator;
pub use pkce::PkceParams;
pub use session::AuthSession;
pub use store::{FileSessionStore, KeyringSessionStore, MemorySessionStore, SessionStore};
pub use token::{HttpTokenClient, TokenExchange, TokenResponse};
