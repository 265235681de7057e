//! Token command - print a valid access token for use in scripts

use super::{describe, session_refresher};
use crate::config::AppConfig;

/// Handle the token command
pub async fn handle_token(config: &AppConfig) -> Result<(), String> {
    let refresher = session_refresher(config)?;
    let session = refresher.ensure_fresh().await.map_err(|e| describe(&e))?;
    println!("{}", session.access_token);
    Ok(())
}
