//! Persistent storage for the single signed-in session
//!
//! The store is a durable mirror of the [`SessionController`](crate::SessionController)
//! state. Only the controller writes to it.

mod credential;
mod file;
mod memory;

pub use credential::KeyringSessionStore;
pub use file::{FileSessionStore, default_config_dir};
pub use memory::MemorySessionStore;

use crate::error::StoreResult;
use crate::session::AuthSession;

/// Service name used for persisted records
pub const STORE_SERVICE: &str = "pocketledger";
/// Account name of the one persisted session record
pub const STORE_ACCOUNT: &str = "session";

/// A single persisted session slot
pub trait SessionStore: Send + Sync {
    /// Read the stored session, if any
    fn get(&self) -> StoreResult<Option<AuthSession>>;

    /// Replace the stored session. Readers never observe a partial write.
    fn put(&self, session: &AuthSession) -> StoreResult<()>;

    /// Delete the stored session. Deleting an empty slot succeeds.
    fn delete(&self) -> StoreResult<()>;

    /// Write `Some` or delete on `None`
    fn set(&self, session: Option<&AuthSession>) -> StoreResult<()> {
        match session {
            Some(session) => self.put(session),
            None => self.delete(),
        }
    }
}
