//! Credential lifecycle: load, refresh, interactive consent, persistence.

use tracing::{debug, info};

use crate::error::{Error, Result};

use super::client::CalendarClient;
use super::config::GoogleConfig;
use super::oauth::OAuthClient;
use super::tokens::{TokenInfo, TokenStorage};

/// Owns the on-disk token cache and hands out fresh credentials.
///
/// One instance lives for the duration of a single run. Every refresh or
/// initial grant is written back to durable storage before the credential is
/// handed to the caller.
pub struct CredentialStore {
    config: GoogleConfig,
    oauth: OAuthClient,
    storage: TokenStorage,
}

impl CredentialStore {
    /// Creates a store for the given configuration.
    pub fn new(config: GoogleConfig) -> Result<Self> {
        config.validate()?;
        let oauth = OAuthClient::new(config.credentials.clone(), config.timeout)?;
        let storage = TokenStorage::new(&config.token_path);
        Ok(Self {
            config,
            oauth,
            storage,
        })
    }

    /// Returns a valid, authorized credential or fails.
    ///
    /// Tries the persisted token first, refreshing silently if it is expired
    /// but refreshable. With no usable cached token, runs the interactive
    /// consent flow when `interactive` is true, otherwise fails with
    /// [`Error::AuthenticationRequired`] without opening a browser.
    pub async fn load_or_authenticate(&self, interactive: bool) -> Result<TokenInfo> {
        if let Some(tokens) = self.storage.load()? {
            let usable = tokens.has_scopes(&self.config.scopes)
                && (!tokens.is_expired() || tokens.refresh_token.is_some());
            if usable {
                return self.ensure_fresh(tokens).await;
            }
            debug!("cached tokens lack required scopes or are unrefreshable");
        }

        if !interactive {
            return Err(Error::AuthenticationRequired(
                "OAuth consent required but --non-interactive was provided. \
                 Run again without --non-interactive to authorize."
                    .into(),
            ));
        }

        let tokens = self
            .oauth
            .authorize(&self.config.scopes, self.config.loopback_port_range)
            .await?;
        self.storage.save(&tokens)?;
        info!("authentication successful, tokens saved");
        Ok(tokens)
    }

    /// Refreshes the access token if it is expired, re-persisting the result.
    ///
    /// A refresh rejected by Google (revoked consent) surfaces as
    /// [`Error::CredentialRevoked`].
    pub async fn ensure_fresh(&self, mut tokens: TokenInfo) -> Result<TokenInfo> {
        if !tokens.is_expired() {
            return Ok(tokens);
        }

        let refresh_token = tokens.refresh_token.clone().ok_or_else(|| {
            Error::CredentialRevoked(
                "access token expired and no refresh token is available".into(),
            )
        })?;

        debug!("refreshing expired access token");
        let (access_token, expires_in) = self.oauth.refresh_token(&refresh_token).await?;
        tokens.update_access_token(access_token, expires_in);
        self.storage.save(&tokens)?;
        Ok(tokens)
    }

    /// Builds an API client from a credential.
    pub fn api_client(&self, tokens: &TokenInfo) -> Result<CalendarClient> {
        CalendarClient::new(&tokens.access_token, self.config.timeout)
    }

    /// True if a cached token exists that is valid or refreshable.
    pub fn is_authenticated(&self) -> bool {
        matches!(
            self.storage.load(),
            Ok(Some(ref tokens))
                if tokens.has_scopes(&self.config.scopes)
                    && (!tokens.is_expired() || tokens.refresh_token.is_some())
        )
    }

    /// Deletes the persisted token cache.
    pub fn clear(&self) -> Result<()> {
        self.storage.clear()
    }
}
