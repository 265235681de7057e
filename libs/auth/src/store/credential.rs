use super::{STORE_ACCOUNT, STORE_SERVICE, SessionStore};
use crate::error::StoreResult;
use crate::session::AuthSession;

/// Stores the session in the OS credential manager (Keychain, Credential
/// Manager, kernel keyutils) as a JSON payload
#[derive(Debug, Clone)]
pub struct KeyringSessionStore {
    service: String,
    account: String,
}

impl KeyringSessionStore {
    pub fn new() -> Self {
        Self::with_names(STORE_SERVICE, STORE_ACCOUNT)
    }

    /// Use a custom service/account pair
    pub fn with_names(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }

    fn entry(&self) -> StoreResult<keyring::Entry> {
        Ok(keyring::Entry::new(&self.service, &self.account)?)
    }
}

impl Default for KeyringSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for KeyringSessionStore {
    fn get(&self) -> StoreResult<Option<AuthSession>> {
        let raw = match self.entry()?.get_password() {
            Ok(value) => value,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn put(&self, session: &AuthSession) -> StoreResult<()> {
        let json = serde_json::to_string(session)?;
        self.entry()?.set_password(&json)?;
        Ok(())
    }

    fn delete(&self) -> StoreResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
