//! getcal CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use getcal::cli::{Cli, Command};
use getcal::config::AppConfig;
use getcal::error::Result;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.debug {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = if let Some(ref path) = cli.config {
        AppConfig::load_from(path)?
    } else {
        // A missing default config yields Ok(default); an unreadable or
        // malformed one must surface instead of silently running on defaults.
        AppConfig::load()?
    };

    match cli.command {
        Some(Command::Auth {
            ref client_id,
            ref client_secret,
            ref credentials_file,
            force,
        }) => {
            getcal::commands::auth::run(
                client_id.clone(),
                client_secret.clone(),
                credentials_file.clone(),
                force,
                &config,
            )
            .await
        }
        None => getcal::commands::fetch::run(&cli, &config).await,
    }
}
