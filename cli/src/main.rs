use clap::Parser;
use std::path::PathBuf;

mod commands;
mod config;

use commands::Commands;
use config::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, PartialEq)]
#[command(name = "pocketledger")]
#[command(about = "PocketLedger CLI", long_about = None)]
struct Cli {
    /// Use a config file other than ~/.pocketledger/config.toml
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long = "debug", default_value_t = false, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    format!("error,{}=debug,pocketledger_auth=debug", env!("CARGO_CRATE_NAME"))
                        .into()
                }),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    match AppConfig::load(cli.config.as_ref()) {
        Ok(config) => {
            if let Err(e) = cli.command.run(config).await {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    }
}
