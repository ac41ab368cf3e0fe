//! Token persistence on top of a pluggable secret backend.
//!
//! Tokens are stored as opaque strings under fixed keys. No expiry
//! metadata is kept: a stale access token surfaces as a 401 from the API
//! and the remediation is to sign in again.

use crate::error::AuthError;
use crate::models::PersistedTokens;
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;

pub const ACCESS_TOKEN_KEY: &str = "zpt.access_token";
pub const REFRESH_TOKEN_KEY: &str = "zpt.refresh_token";

/// Minimal secret backend: keyed strings with get/store/delete.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError>;
    async fn store(&self, key: &str, value: &str) -> Result<(), AuthError>;
    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), AuthError>;
}

/// File-backed secret store: one file per key under the user cache
/// directory, owner read/write only.
pub struct FileSecretStore {
    dir: PathBuf,
}

impl FileSecretStore {
    pub fn new() -> Result<Self, AuthError> {
        let dir = dirs::cache_dir()
            .ok_or_else(|| AuthError::Storage("no cache directory on this platform".to_string()))?
            .join("zpt");
        Self::at(dir)
    }

    pub fn at(dir: PathBuf) -> Result<Self, AuthError> {
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| {
                AuthError::Storage(format!("failed to create secret directory: {}", e))
            })?;
        }
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let value = fs::read_to_string(&path)
            .map_err(|e| AuthError::Storage(format!("failed to read secret {}: {}", key, e)))?;
        Ok(Some(value))
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), AuthError> {
        let path = self.path_for(key);
        fs::write(&path, value)
            .map_err(|e| AuthError::Storage(format!("failed to save secret {}: {}", key, e)))?;

        // Set permissions to 0600 (read/write for owner only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&path)
                .map_err(|e| {
                    AuthError::Storage(format!("failed to get file permissions: {}", e))
                })?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms).map_err(|e| {
                AuthError::Storage(format!("failed to set file permissions: {}", e))
            })?;
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AuthError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| AuthError::Storage(format!("failed to delete secret {}: {}", key, e)))?;
        }
        Ok(())
    }
}

/// Typed access/refresh token pair over a [`SecretStore`].
pub struct TokenStore {
    secrets: Box<dyn SecretStore>,
}

impl TokenStore {
    pub fn new(secrets: Box<dyn SecretStore>) -> Self {
        Self { secrets }
    }

    /// Persist both tokens. If the refresh token write fails the access
    /// token is rolled back so the pair never goes half-written.
    pub async fn save(&self, tokens: &PersistedTokens) -> Result<(), AuthError> {
        self.secrets
            .store(ACCESS_TOKEN_KEY, &tokens.access_token)
            .await?;
        if let Err(e) = self
            .secrets
            .store(REFRESH_TOKEN_KEY, &tokens.refresh_token)
            .await
        {
            if let Err(rollback) = self.secrets.delete(ACCESS_TOKEN_KEY).await {
                tracing::warn!(error = %rollback, "failed to roll back access token");
            }
            return Err(e);
        }
        Ok(())
    }

    pub async fn access_token(&self) -> Result<Option<String>, AuthError> {
        self.secrets.get(ACCESS_TOKEN_KEY).await
    }

    pub async fn refresh_token(&self) -> Result<Option<String>, AuthError> {
        self.secrets.get(REFRESH_TOKEN_KEY).await
    }

    /// Remove both tokens. Already-cleared stores clear cleanly.
    pub async fn clear(&self) -> Result<(), AuthError> {
        self.secrets.delete(ACCESS_TOKEN_KEY).await?;
        self.secrets.delete(REFRESH_TOKEN_KEY).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemorySecretStore;

    fn tokens() -> PersistedTokens {
        PersistedTokens {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips_both_tokens() {
        let store = TokenStore::new(Box::new(MemorySecretStore::new()));
        store.save(&tokens()).await.unwrap();

        assert_eq!(store.access_token().await.unwrap().as_deref(), Some("access-1"));
        assert_eq!(
            store.refresh_token().await.unwrap().as_deref(),
            Some("refresh-1")
        );
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let store = TokenStore::new(Box::new(MemorySecretStore::new()));
        store.save(&tokens()).await.unwrap();

        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.access_token().await.unwrap(), None);
        assert_eq!(store.refresh_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn failed_refresh_write_rolls_back_access_token() {
        let secrets = MemorySecretStore::new();
        secrets.fail_writes_of(REFRESH_TOKEN_KEY);
        let store = TokenStore::new(Box::new(secrets));

        assert!(store.save(&tokens()).await.is_err());
        assert_eq!(store.access_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_round_trips_with_restrictive_permissions() {
        let dir = std::env::temp_dir().join(format!("zpt-secrets-{}", std::process::id()));
        let secrets = FileSecretStore::at(dir.clone()).unwrap();

        secrets.store(ACCESS_TOKEN_KEY, "tok").await.unwrap();
        assert_eq!(
            secrets.get(ACCESS_TOKEN_KEY).await.unwrap().as_deref(),
            Some("tok")
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(dir.join(ACCESS_TOKEN_KEY))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        secrets.delete(ACCESS_TOKEN_KEY).await.unwrap();
        secrets.delete(ACCESS_TOKEN_KEY).await.unwrap();
        assert_eq!(secrets.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
        let _ = fs::remove_dir_all(dir);
    }
}
