//! Refresh command - renew the session with the stored refresh token

use super::{describe, session_refresher};
use crate::config::AppConfig;

/// Handle the refresh command
pub async fn handle_refresh(config: &AppConfig) -> Result<(), String> {
    let refresher = session_refresher(config)?;
    if !refresher.controller().is_authenticated() {
        return Err("Not signed in. Run `pocketledger auth login` first.".to_string());
    }

    let session = refresher.refresh().await.map_err(|e| describe(&e))?;
    println!(
        "Session refreshed. Valid until {}.",
        session
            .expires_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
    );
    Ok(())
}
