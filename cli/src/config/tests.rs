//! Tests for configuration module.

use super::*;
use config::Map;
use std::path::PathBuf;
use tempfile::TempDir;

const SAMPLE_CONFIG: &str = r#"
cognito_domain = "https://ledger.auth.eu-west-1.amazoncognito.com"
client_id = "file-client"
api_endpoint = "https://api.staging.pocketledger.app"
scopes = ["openid", "email"]
store = "keyring"
"#;

fn get_a_config_path(dir: &TempDir) -> PathBuf {
    dir.path().join("config.toml")
}

fn env(pairs: &[(&str, &str)]) -> Option<Map<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

fn load_with(contents: Option<&str>, vars: &[(&str, &str)]) -> (AppConfig, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = get_a_config_path(&dir);
    if let Some(contents) = contents {
        std::fs::write(&path, contents).unwrap();
    }
    let config = AppConfig::load_from(&path, env(vars)).unwrap();
    (config, dir)
}

#[test]
fn get_config_path_returns_custom_path_when_provided() {
    let custom_path = PathBuf::from("/tmp/pocketledger/custom.toml");
    let resolved = AppConfig::get_config_path(Some(&custom_path));
    assert_eq!(custom_path, resolved);
}

#[test]
fn get_config_path_defaults_to_home_directory() {
    let home_dir = dirs::home_dir().unwrap();
    let resolved = AppConfig::get_config_path::<&str>(None);
    assert_eq!(resolved, home_dir.join(POCKETLEDGER_CONFIG_PATH));
}

#[test]
fn missing_file_yields_defaults() {
    let (config, _dir) = load_with(None, &[]);

    assert_eq!(config.redirect_uri, DEFAULT_REDIRECT_URI);
    assert_eq!(config.api_endpoint, POCKETLEDGER_API_ENDPOINT);
    assert_eq!(config.scopes, vec!["openid", "email", "profile"]);
    assert_eq!(config.store, StoreBackend::File);
    assert!(!config.ephemeral);
    assert!(config.client_id.is_none());
}

#[test]
fn file_values_are_loaded() {
    let (config, dir) = load_with(Some(SAMPLE_CONFIG), &[]);

    assert_eq!(config.client_id.as_deref(), Some("file-client"));
    assert_eq!(config.api_endpoint, "https://api.staging.pocketledger.app");
    assert_eq!(config.scopes, vec!["openid", "email"]);
    assert_eq!(config.store, StoreBackend::Keyring);
    assert_eq!(config.config_path, get_a_config_path(&dir));
    assert_eq!(config.get_config_dir(), dir.path());
}

#[test]
fn environment_overrides_file() {
    let (config, _dir) = load_with(
        Some(SAMPLE_CONFIG),
        &[
            ("POCKETLEDGER_CLIENT_ID", "env-client"),
            ("POCKETLEDGER_EPHEMERAL", "true"),
            ("POCKETLEDGER_SCOPES", "openid,profile,ledger/read"),
            ("UNRELATED_CLIENT_ID", "ignored"),
        ],
    );

    assert_eq!(config.client_id.as_deref(), Some("env-client"));
    assert!(config.ephemeral);
    assert_eq!(config.scopes, vec!["openid", "profile", "ledger/read"]);
    // Untouched keys still come from the file
    assert_eq!(config.store, StoreBackend::Keyring);
}

#[test]
fn invalid_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = get_a_config_path(&dir);
    std::fs::write(&path, "client_id = [").unwrap();
    assert!(AppConfig::load_from(&path, env(&[])).is_err());
}

#[test]
fn auth_config_requires_provider_settings() {
    let (config, _dir) = load_with(None, &[]);
    let err = config.auth_config().unwrap_err().to_string();
    assert!(err.contains("cognito_domain"));

    let (config, _dir) = load_with(
        None,
        &[(
            "POCKETLEDGER_COGNITO_DOMAIN",
            "https://ledger.auth.eu-west-1.amazoncognito.com",
        )],
    );
    let err = config.auth_config().unwrap_err().to_string();
    assert!(err.contains("POCKETLEDGER_CLIENT_ID"));
}

#[test]
fn auth_config_from_loaded_settings() {
    let (config, _dir) = load_with(Some(SAMPLE_CONFIG), &[("POCKETLEDGER_EPHEMERAL", "true")]);
    let auth = config.auth_config().unwrap();

    assert_eq!(auth.client_id, "file-client");
    assert_eq!(
        auth.authorize_url,
        "https://ledger.auth.eu-west-1.amazoncognito.com/oauth2/authorize"
    );
    assert_eq!(auth.redirect_uri, DEFAULT_REDIRECT_URI);
    assert_eq!(auth.token_url(), "https://api.staging.pocketledger.app/auth/token");
    assert_eq!(auth.scopes_string(), "openid email");
    assert!(auth.ephemeral);
}

#[test]
fn auth_config_rejects_bad_redirect_uri() {
    let (config, _dir) = load_with(
        Some(SAMPLE_CONFIG),
        &[("POCKETLEDGER_REDIRECT_URI", "not a url")],
    );
    assert!(config.auth_config().is_err());
}

#[test]
fn file_store_lives_next_to_config() {
    let (config, dir) = load_with(None, &[]);
    let store = config.session_store();
    assert!(store.get().unwrap().is_none());
    assert!(!dir.path().join("session.toml").exists());
}
