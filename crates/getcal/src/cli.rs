//! Command-line interface definition.

use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser, Subcommand};

/// getcal - Fetch Google Calendar events for a given day
#[derive(Debug, Parser)]
#[command(name = "getcal")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "GETCAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Print results to stdout instead of copying them to the clipboard
    #[arg(
        long,
        env = "GETCAL_DRY_RUN",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub dry_run: bool,

    /// Fail instead of opening a browser if OAuth consent is required
    #[arg(long)]
    pub non_interactive: bool,

    /// Calendar to query (defaults to the primary calendar)
    #[arg(long)]
    pub calendar: Option<String>,

    /// ISO date (YYYY-MM-DD). Defaults to today if omitted
    #[arg(env = "GETCAL_DEFAULT_DATE")]
    pub date: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the interactive Google Calendar authentication flow
    Auth {
        /// OAuth client ID (from Google Cloud Console)
        #[arg(long, env = "GOOGLE_CLIENT_ID")]
        client_id: Option<String>,

        /// OAuth client secret (from Google Cloud Console)
        #[arg(long, env = "GOOGLE_CLIENT_SECRET")]
        client_secret: Option<String>,

        /// Path to the Google Cloud Console credentials JSON file
        #[arg(long, env = "GOOGLE_CREDENTIALS_FILE")]
        credentials_file: Option<PathBuf>,

        /// Force re-authentication even if a usable token is cached
        #[arg(long, short)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_invocation() {
        let cli = Cli::parse_from(["getcal"]);
        assert!(cli.date.is_none());
        assert!(!cli.dry_run);
        assert!(!cli.non_interactive);
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_date_and_flags() {
        let cli = Cli::parse_from(["getcal", "--dry-run", "--non-interactive", "2025-11-01"]);
        assert_eq!(cli.date.as_deref(), Some("2025-11-01"));
        assert!(cli.dry_run);
        assert!(cli.non_interactive);
    }

    #[test]
    fn parses_auth_subcommand() {
        let cli = Cli::parse_from([
            "getcal",
            "auth",
            "--client-id",
            "id.apps.googleusercontent.com",
            "--client-secret",
            "secret",
            "--force",
        ]);
        match cli.command {
            Some(Command::Auth {
                client_id,
                client_secret,
                force,
                ..
            }) => {
                assert_eq!(client_id.as_deref(), Some("id.apps.googleusercontent.com"));
                assert_eq!(client_secret.as_deref(), Some("secret"));
                assert!(force);
            }
            other => panic!("expected auth subcommand, got {:?}", other),
        }
    }

    #[test]
    fn calendar_flag_overrides_default() {
        let cli = Cli::parse_from(["getcal", "--calendar", "work@example.com"]);
        assert_eq!(cli.calendar.as_deref(), Some("work@example.com"));
    }
}
