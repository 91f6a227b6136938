//! OAuth token persistence.
//!
//! Tokens are cached as JSON next to the user's data directory so a refreshed
//! credential survives process restarts without another consent prompt.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// An OAuth token set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    /// The access token for API requests.
    pub access_token: String,

    /// The refresh token for obtaining new access tokens.
    pub refresh_token: Option<String>,

    /// When the access token expires.
    pub expires_at: Option<DateTime<Utc>>,

    /// The OAuth scopes that were granted.
    pub scopes: Vec<String>,

    /// When the tokens were last refreshed.
    pub last_refresh: DateTime<Utc>,
}

impl TokenInfo {
    /// Creates a new token set from OAuth response data.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expires_in_secs.map(expiry_from_now),
            scopes,
            last_refresh: Utc::now(),
        }
    }

    /// Returns true if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            // No expiry recorded: assume still valid.
            None => false,
        }
    }

    /// Returns true if the token set covers all required scopes.
    pub fn has_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|scope| self.scopes.contains(scope))
    }

    /// Replaces the access token after a refresh.
    pub fn update_access_token(
        &mut self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) {
        self.access_token = access_token.into();
        self.expires_at = expires_in_secs.map(expiry_from_now);
        self.last_refresh = Utc::now();
    }
}

// Refresh one minute before the advertised expiry.
fn expiry_from_now(secs: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(secs) - Duration::seconds(60)
}

/// File-backed token cache.
#[derive(Debug)]
pub struct TokenStorage {
    path: PathBuf,
}

impl TokenStorage {
    /// Creates a token cache at the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads tokens from disk. Returns `None` if no cache file exists.
    pub fn load(&self) -> Result<Option<TokenInfo>> {
        if !self.path.exists() {
            debug!("no token file at {:?}", self.path);
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| Error::Internal(format!("failed to read token file: {}", e)))?;

        let tokens: TokenInfo = serde_json::from_str(&content)
            .map_err(|e| Error::Internal(format!("failed to parse token file: {}", e)))?;

        debug!("loaded tokens from {:?}", self.path);
        Ok(Some(tokens))
    }

    /// Persists tokens to disk.
    ///
    /// Writes to a temp file first, then renames, so a crash mid-write never
    /// leaves a truncated cache. Restrictive permissions on Unix.
    pub fn save(&self, tokens: &TokenInfo) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Internal(format!("failed to create token directory: {}", e)))?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(tokens)
            .map_err(|e| Error::Internal(format!("failed to serialize tokens: {}", e)))?;

        fs::write(&temp_path, &content)
            .map_err(|e| Error::Internal(format!("failed to write token file: {}", e)))?;

        fs::rename(&temp_path, &self.path)
            .map_err(|e| Error::Internal(format!("failed to rename token file: {}", e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            let _ = fs::set_permissions(&self.path, perms);
        }

        debug!("saved tokens to {:?}", self.path);
        Ok(())
    }

    /// Removes the cache file, if present.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .map_err(|e| Error::Internal(format!("failed to remove token file: {}", e)))?;
            info!("cleared tokens from {:?}", self.path);
        }
        Ok(())
    }

    /// Returns the token cache path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tokens() -> TokenInfo {
        TokenInfo::new(
            "access-token",
            Some("refresh-token".to_string()),
            Some(3600),
            vec![crate::google::GoogleConfig::DEFAULT_SCOPE.to_string()],
        )
    }

    #[test]
    fn token_creation_and_expiry() {
        let tokens = sample_tokens();
        assert!(!tokens.is_expired());
        assert!(tokens.expires_at.is_some());

        let mut expired = sample_tokens();
        expired.expires_at = Some(Utc::now() - Duration::hours(1));
        assert!(expired.is_expired());
    }

    #[test]
    fn token_without_expiry_is_valid() {
        let tokens = TokenInfo::new("access", None, None, vec![]);
        assert!(!tokens.is_expired());
    }

    #[test]
    fn scope_check() {
        let tokens = TokenInfo::new("access", None, None, vec!["a".to_string(), "b".to_string()]);
        assert!(tokens.has_scopes(&["a".to_string()]));
        assert!(tokens.has_scopes(&["a".to_string(), "b".to_string()]));
        assert!(!tokens.has_scopes(&["c".to_string()]));
    }

    #[test]
    fn update_access_token_keeps_refresh_token() {
        let mut tokens = sample_tokens();
        tokens.update_access_token("new-access", Some(3600));
        assert_eq!(tokens.access_token, "new-access");
        assert_eq!(tokens.refresh_token, Some("refresh-token".to_string()));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tokens.json");
        let storage = TokenStorage::new(&path);

        storage.save(&sample_tokens()).unwrap();
        assert!(path.exists());

        let loaded = storage.load().unwrap().unwrap();
        assert_eq!(loaded.access_token, "access-token");
        assert_eq!(loaded.refresh_token, Some("refresh-token".to_string()));
        assert!(!loaded.is_expired());
    }

    #[test]
    fn load_without_file_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = TokenStorage::new(tmp.path().join("missing.json"));
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn clear_removes_the_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tokens.json");
        let storage = TokenStorage::new(&path);

        storage.save(&sample_tokens()).unwrap();
        storage.clear().unwrap();
        assert!(!path.exists());
        // Clearing twice is a no-op.
        storage.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tokens.json");
        TokenStorage::new(&path).save(&sample_tokens()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
