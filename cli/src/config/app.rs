//! Main application configuration.

use config::{Config, ConfigError, Environment, File, FileFormat, Map};
use pocketledger_auth::config::DEFAULT_SCOPES;
use pocketledger_auth::{AuthConfig, FileSessionStore, KeyringSessionStore, SessionStore};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::types::StoreBackend;
use super::{DEFAULT_REDIRECT_URI, ENV_PREFIX, POCKETLEDGER_API_ENDPOINT, POCKETLEDGER_CONFIG_PATH};

/// The main application configuration, built from config file and environment.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Hosted sign-in domain, e.g. `https://ledger.auth.eu-west-1.amazoncognito.com`
    pub cognito_domain: Option<String>,
    /// OAuth client ID registered with the identity provider
    pub client_id: Option<String>,
    /// Redirect URI registered for this client
    pub redirect_uri: String,
    /// Scopes to request
    pub scopes: Vec<String>,
    /// Backend API base URL (also hosts `/auth/token`)
    pub api_endpoint: String,
    /// Ignore any existing browser session when signing in
    pub ephemeral: bool,
    /// Session persistence backend
    pub store: StoreBackend,
    /// Path to the config file that was loaded
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cognito_domain: None,
            client_id: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            api_endpoint: POCKETLEDGER_API_ENDPOINT.to_string(),
            ephemeral: false,
            store: StoreBackend::default(),
            config_path: PathBuf::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and the process environment.
    pub fn load<P: AsRef<Path>>(custom_config_path: Option<P>) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(custom_config_path);
        Self::load_from(&config_path, None)
    }

    /// Load configuration from `config_path`, reading `POCKETLEDGER_*`
    /// variables from `env` instead of the process when given.
    pub(crate) fn load_from(
        config_path: &Path,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let environment = Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("scopes")
            .source(env);

        let settings = Config::builder()
            .add_source(
                File::from(config_path)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(environment)
            .build()?;

        let mut config: AppConfig = settings.try_deserialize()?;
        config.config_path = config_path.to_path_buf();
        Ok(config)
    }

    /// Get the config file path, defaulting to `~/.pocketledger/config.toml`.
    pub fn get_config_path<P: AsRef<Path>>(path: Option<P>) -> PathBuf {
        match path {
            Some(path) => path.as_ref().to_path_buf(),
            None => dirs::home_dir()
                .unwrap_or_default()
                .join(POCKETLEDGER_CONFIG_PATH),
        }
    }

    /// Get the config directory from the config path.
    pub fn get_config_dir(&self) -> PathBuf {
        match self.config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => dirs::home_dir().unwrap_or_default().join(".pocketledger"),
        }
    }

    /// Build the sign-in configuration. Fails if the provider is not configured.
    pub fn auth_config(&self) -> Result<AuthConfig, ConfigError> {
        let domain = Self::required(&self.cognito_domain, "cognito_domain")?;
        let client_id = Self::required(&self.client_id, "client_id")?;

        let mut auth = AuthConfig::new(
            client_id,
            domain,
            self.redirect_uri.as_str(),
            self.api_endpoint.as_str(),
        )
        .with_ephemeral(self.ephemeral);
        if !self.scopes.is_empty() {
            auth = auth.with_scopes(self.scopes.clone());
        }

        auth.validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(auth)
    }

    /// The session store selected by `store`
    pub fn session_store(&self) -> Arc<dyn SessionStore> {
        match self.store {
            StoreBackend::File => Arc::new(FileSessionStore::in_dir(&self.get_config_dir())),
            StoreBackend::Keyring => Arc::new(KeyringSessionStore::new()),
        }
    }

    fn required<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str, ConfigError> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ConfigError::Message(format!(
                    "'{}' is not configured. Set it in the config file or via {}_{}",
                    key,
                    ENV_PREFIX,
                    key.to_uppercase()
                ))
            })
    }
}
