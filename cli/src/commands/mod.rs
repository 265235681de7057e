use crate::config::AppConfig;
use clap::Subcommand;

pub mod auth;

pub use auth::AuthCommands;

#[derive(Subcommand, PartialEq, Debug)]
pub enum Commands {
    /// Get CLI Version
    Version,

    /// Sign in, sign out and inspect the current session
    #[command(subcommand)]
    Auth(AuthCommands),
}

impl Commands {
    pub async fn run(self, config: AppConfig) -> Result<(), String> {
        match self {
            Commands::Version => {
                println!("pocketledger v{}", env!("CARGO_PKG_VERSION"));
            }
            Commands::Auth(auth_command) => {
                auth_command.run(config).await?;
            }
        }
        Ok(())
    }
}
