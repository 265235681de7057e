use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the signed-in session is persisted
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// `session.toml` next to the config file
    #[default]
    File,
    /// OS credential manager
    Keyring,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::File => write!(f, "file"),
            StoreBackend::Keyring => write!(f, "keyring"),
        }
    }
}
