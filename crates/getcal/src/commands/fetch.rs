//! The default command: fetch one day's events and deliver them.
//!
//! Linear pipeline: resolve the date window, obtain a fresh credential, query
//! the calendar, format, deliver. Any failure aborts the run before the sink
//! is touched.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::debug;

use getcal_core::{format_html, format_text, parse_date, DateWindow};

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::google::{CredentialStore, GoogleConfig};
use crate::sink::{self, SinkMode};

/// Runs the fetch-and-deliver pipeline.
pub async fn run(cli: &Cli, config: &AppConfig) -> Result<()> {
    let tz = local_timezone()?;

    // Argument validation happens before any credential or network work.
    let date = resolve_date(cli.date.as_deref(), tz)?;
    let window = DateWindow::for_date(date, tz)?;
    debug!(
        "querying {} in window {}..{}",
        date, window.start, window.end
    );

    let google_config = build_google_config(cli, config)?;
    let calendar_id = google_config.calendar_id.clone();

    let store = CredentialStore::new(google_config)?;
    let tokens = store.load_or_authenticate(!cli.non_interactive).await?;
    let client = store.api_client(&tokens)?;

    let events = client.list_events(&calendar_id, &window).await?;

    let plain = format_text(&events, tz);
    let html = format_html(&events, tz);

    println!("Fetched {} event(s) for {}:", events.len(), date);
    if cli.dry_run {
        sink::deliver(&plain, &html, SinkMode::DryRun)?;
    } else {
        sink::deliver(&plain, &html, SinkMode::Clipboard)?;
        println!("Copied {} event(s) for {} to clipboard.", events.len(), date);
    }

    Ok(())
}

/// Parses the date argument, defaulting to today in the local timezone.
fn resolve_date(arg: Option<&str>, tz: Tz) -> Result<NaiveDate> {
    match arg {
        Some(input) => Ok(parse_date(input)?),
        None => Ok(Utc::now().with_timezone(&tz).date_naive()),
    }
}

/// Determines the system's current IANA timezone.
fn local_timezone() -> Result<Tz> {
    let name = iana_time_zone::get_timezone()
        .map_err(|e| Error::Internal(format!("failed to determine local timezone: {}", e)))?;
    name.parse::<Tz>()
        .map_err(|e| Error::Internal(format!("unrecognized local timezone '{}': {}", name, e)))
}

/// Builds the Google configuration from CLI flags and `config.toml`.
fn build_google_config(cli: &Cli, config: &AppConfig) -> Result<GoogleConfig> {
    let settings = config.google.as_ref();
    let credentials = super::resolve_credentials(None, None, None, settings)?;

    let mut google_config = GoogleConfig::new(credentials);

    if let Some(id) = cli
        .calendar
        .clone()
        .or_else(|| settings.and_then(|g| g.calendar_id.clone()))
    {
        google_config = google_config.with_calendar_id(id);
    }

    if let Some(path) = settings.and_then(|g| g.token_path.clone()) {
        google_config = google_config.with_token_path(path);
    }

    Ok(google_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoogleSettings;
    use clap::Parser;

    #[test]
    fn malformed_date_fails_before_any_credential_work() {
        let err = resolve_date(Some("2025-13-40"), chrono_tz::UTC).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn missing_date_defaults_to_today() {
        let today = Utc::now().with_timezone(&chrono_tz::UTC).date_naive();
        assert_eq!(resolve_date(None, chrono_tz::UTC).unwrap(), today);
    }

    #[test]
    fn calendar_flag_overrides_config() {
        let cli = Cli::parse_from(["getcal", "--calendar", "cli@example.com"]);
        let config = AppConfig {
            google: Some(GoogleSettings {
                client_id: Some("id".to_string()),
                client_secret: Some("secret".to_string()),
                calendar_id: Some("config@example.com".to_string()),
                ..Default::default()
            }),
        };
        let google_config = build_google_config(&cli, &config).unwrap();
        assert_eq!(google_config.calendar_id, "cli@example.com");
    }

    #[test]
    fn calendar_defaults_to_primary() {
        let cli = Cli::parse_from(["getcal"]);
        let config = AppConfig {
            google: Some(GoogleSettings {
                client_id: Some("id".to_string()),
                client_secret: Some("secret".to_string()),
                ..Default::default()
            }),
        };
        let google_config = build_google_config(&cli, &config).unwrap();
        assert_eq!(google_config.calendar_id, "primary");
    }
}
