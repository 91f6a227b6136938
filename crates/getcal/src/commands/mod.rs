//! Command implementations.

pub mod auth;
pub mod fetch;

use std::path::PathBuf;

use crate::config::{AppConfig, GoogleSettings};
use crate::error::{Error, Result};
use crate::google::OAuthCredentials;

/// Resolves OAuth client credentials.
///
/// Priority (highest to lowest):
/// 1. Explicit `client_id` + `client_secret` (CLI flags of `getcal auth`)
/// 2. Explicit credentials JSON path (CLI flag)
/// 3. `config.toml` `[google]` section (`client_id`/`client_secret`, or its
///    `credentials_file`)
/// 4. The default credentials JSON location
pub(crate) fn resolve_credentials(
    cli_client_id: Option<String>,
    cli_client_secret: Option<String>,
    cli_credentials_file: Option<PathBuf>,
    settings: Option<&GoogleSettings>,
) -> Result<OAuthCredentials> {
    if let (Some(id), Some(secret)) = (&cli_client_id, &cli_client_secret) {
        return Ok(OAuthCredentials::new(id, secret));
    }

    if cli_client_id.is_some() || cli_client_secret.is_some() {
        return Err(Error::InvalidArgument(
            "both --client-id and --client-secret are required when providing \
             credentials directly"
                .into(),
        ));
    }

    if let Some(path) = cli_credentials_file {
        return OAuthCredentials::from_file(path);
    }

    if let Some(google) = settings {
        if let (Some(id), Some(secret)) = (&google.client_id, &google.client_secret) {
            return Ok(OAuthCredentials::new(id, secret));
        }
        if let Some(path) = &google.credentials_file {
            return OAuthCredentials::from_file(path);
        }
    }

    OAuthCredentials::from_file(AppConfig::default_credentials_path())
}
