use super::SessionStore;
use crate::error::StoreResult;
use crate::session::AuthSession;
use parking_lot::Mutex;

/// In-process store, used by tests and hosts without durable storage
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<AuthSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `session`
    pub fn with_session(session: AuthSession) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> StoreResult<Option<AuthSession>> {
        Ok(self.slot.lock().clone())
    }

    fn put(&self, session: &AuthSession) -> StoreResult<()> {
        *self.slot.lock() = Some(session.clone());
        Ok(())
    }

    fn delete(&self) -> StoreResult<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}
