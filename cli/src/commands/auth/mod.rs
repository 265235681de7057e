//! Authentication commands
//!
//! # Commands
//!
//! - `pocketledger auth login` - Sign in through the browser
//! - `pocketledger auth logout` - Forget the stored session
//! - `pocketledger auth status` - Show whether you are signed in
//! - `pocketledger auth refresh` - Renew the session now
//! - `pocketledger auth token` - Print a valid access token for scripts

mod login;
mod logout;
mod paste;
mod refresh;
mod status;
mod token;

use crate::config::AppConfig;
use clap::Subcommand;
use pocketledger_auth::{AuthError, HttpTokenClient, SessionController, SessionRefresher};
use std::sync::Arc;
use tracing::debug;

/// Authentication subcommands
#[derive(Subcommand, PartialEq, Debug)]
pub enum AuthCommands {
    /// Sign in to PocketLedger in the browser
    Login {
        /// Ignore any existing browser session and ask for credentials again
        #[arg(long)]
        ephemeral: bool,

        /// Paste the redirect URL instead of listening on a local port
        #[arg(long)]
        paste: bool,
    },

    /// Sign out and delete the stored session
    Logout,

    /// Show the current session
    Status,

    /// Refresh the session now
    Refresh,

    /// Print a valid access token (refreshing first if needed)
    Token,
}

impl AuthCommands {
    /// Run the auth command
    pub async fn run(self, mut config: AppConfig) -> Result<(), String> {
        match self {
            AuthCommands::Login { ephemeral, paste } => {
                config.ephemeral |= ephemeral;
                login::handle_login(&config, paste).await
            }
            AuthCommands::Logout => logout::handle_logout(&config),
            AuthCommands::Status => status::handle_status(&config),
            AuthCommands::Refresh => refresh::handle_refresh(&config).await,
            AuthCommands::Token => token::handle_token(&config).await,
        }
    }
}

/// Controller restored from the configured store
fn session_controller(config: &AppConfig) -> Arc<SessionController> {
    let controller = Arc::new(SessionController::new(config.session_store()));
    controller.subscribe(|state| {
        debug!(
            authenticated = state.is_authenticated(),
            "session state changed"
        );
    });
    controller
}

/// Token client for the configured backend
fn token_client(config: &AppConfig) -> Result<Arc<HttpTokenClient>, String> {
    let auth = config.auth_config().map_err(|e| e.to_string())?;
    let client = HttpTokenClient::new(&auth).map_err(|e| describe(&e))?;
    Ok(Arc::new(client))
}

fn session_refresher(config: &AppConfig) -> Result<SessionRefresher, String> {
    let tokens = token_client(config)?;
    Ok(SessionRefresher::new(session_controller(config), tokens))
}

/// Message shown for a failed command
fn describe(err: &AuthError) -> String {
    debug!("auth error: {}", err);
    err.user_message()
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: AuthCommands,
    }

    fn parse(args: &[&str]) -> AuthCommands {
        TestCli::try_parse_from(std::iter::once("auth").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn login_flags_default_off() {
        assert_eq!(
            parse(&["login"]),
            AuthCommands::Login {
                ephemeral: false,
                paste: false
            }
        );
    }

    #[test]
    fn login_flags_parse() {
        assert_eq!(
            parse(&["login", "--ephemeral", "--paste"]),
            AuthCommands::Login {
                ephemeral: true,
                paste: true
            }
        );
    }

    #[test]
    fn other_subcommands_parse() {
        assert_eq!(parse(&["logout"]), AuthCommands::Logout);
        assert_eq!(parse(&["status"]), AuthCommands::Status);
        assert_eq!(parse(&["refresh"]), AuthCommands::Refresh);
        assert_eq!(parse(&["token"]), AuthCommands::Token);
    }

    #[test]
    fn describe_prefers_user_message() {
        assert_eq!(
            describe(&AuthError::StateMismatch),
            "Sign-in failed. Please try again."
        );
        assert_eq!(
            describe(&AuthError::UserCancelled),
            AuthError::UserCancelled.to_string()
        );
    }
}
