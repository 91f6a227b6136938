//! The `auth` subcommand: explicit interactive authentication.

use std::path::PathBuf;

use tracing::info;

use crate::config::AppConfig;
use crate::error::Result;
use crate::google::{CredentialStore, GoogleConfig};

/// Runs the Google authentication flow.
///
/// Resolves credentials from CLI flags, a `--credentials-file`, `config.toml`,
/// or the default credentials location, then runs the OAuth consent flow and
/// persists the obtained tokens.
pub async fn run(
    client_id: Option<String>,
    client_secret: Option<String>,
    credentials_file: Option<PathBuf>,
    force: bool,
    config: &AppConfig,
) -> Result<()> {
    let settings = config.google.as_ref();
    let credentials =
        super::resolve_credentials(client_id, client_secret, credentials_file, settings)?;
    credentials.validate()?;

    let mut google_config = GoogleConfig::new(credentials);
    if let Some(path) = settings.and_then(|g| g.token_path.clone()) {
        google_config = google_config.with_token_path(path);
    }

    let store = CredentialStore::new(google_config)?;

    if store.is_authenticated() && !force {
        println!("Already authenticated with Google Calendar.");
        println!("Use --force to re-authenticate.");
        return Ok(());
    }

    if force {
        store.clear()?;
    }

    println!("Starting Google Calendar authentication...");
    println!();
    println!("A browser window will open for you to authorize access.");
    println!("If the browser doesn't open, check the terminal for a URL to copy.");
    println!();

    store.load_or_authenticate(true).await?;

    info!("Google authentication successful");
    println!();
    println!("Authentication successful!");
    println!("Your Google Calendar tokens have been saved.");

    Ok(())
}
