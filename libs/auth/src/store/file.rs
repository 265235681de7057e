//! File-backed session store
//!
//! The session lives in `session.toml` inside the config directory:
//!
//! ```toml
//! accessToken = "eyJ..."
//! refreshToken = "eyJ..."
//! expiresAt = "2030-01-01T00:00:00Z"
//! tokenType = "Bearer"
//! ```

use super::SessionStore;
use crate::error::{StoreError, StoreResult};
use crate::session::AuthSession;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The name of the session file
const SESSION_FILE_NAME: &str = "session.toml";

/// Default config directory name under the home directory
const CONFIG_DIR_NAME: &str = ".pocketledger";

/// Stores the session as TOML on disk, owner-readable only
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store the session at an explicit file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store the session in `session.toml` under `config_dir`
    pub fn in_dir(config_dir: &Path) -> Self {
        Self::new(config_dir.join(SESSION_FILE_NAME))
    }

    /// Store the session under the default config directory (~/.pocketledger/)
    pub fn from_default_dir() -> StoreResult<Self> {
        Ok(Self::in_dir(&default_config_dir()?))
    }

    /// Get the path to the session file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> StoreResult<Option<AuthSession>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(toml::from_str(&content)?))
    }

    fn put(&self, session: &AuthSession) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let content = toml::to_string_pretty(session)?;

        // Unique temp file in the same directory, renamed over the session file
        let mut temp = private_temp_file(dir)?;
        temp.write_all(content.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn delete(&self) -> StoreResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Create a temp file that only the owner can read, from the moment it exists
fn private_temp_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".session").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o600));
    }
    builder.tempfile_in(dir)
}

/// Get the default PocketLedger config directory
pub fn default_config_dir() -> StoreResult<PathBuf> {
    let home = dirs::home_dir().ok_or(StoreError::NoHomeDir)?;
    Ok(home.join(CONFIG_DIR_NAME))
}
