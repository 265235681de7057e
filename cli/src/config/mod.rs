//! Configuration management for the PocketLedger CLI.
//!
//! Settings are layered, later sources winning:
//! - `~/.pocketledger/config.toml` (or `--config <path>`)
//! - `POCKETLEDGER_*` environment variables
//! - command-line flags

mod app;
mod types;

#[cfg(test)]
mod tests;

pub use app::AppConfig;
pub use types::StoreBackend;

// Constants
pub const POCKETLEDGER_API_ENDPOINT: &str = "https://api.pocketledger.app";
pub const POCKETLEDGER_CONFIG_PATH: &str = ".pocketledger/config.toml";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8765/callback";
pub const ENV_PREFIX: &str = "POCKETLEDGER";
