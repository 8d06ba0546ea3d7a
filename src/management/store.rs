use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::{
    config,
    error::{Result, SessionError},
};

pub const REFRESH_TOKEN_KEY: &str = "SpotifyRefreshToken";
pub const GRANTED_SCOPES_KEY: &str = "SpotifyGrantedScopes";
pub const AUTH_CODE_KEY: &str = "SpotifyAuthToken";
pub const CODE_VERIFIER_KEY: &str = "CodeVerifierStorageKey";

/// Durable string key-value capability provided by the host.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store, for tests and throwaway sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryCredentialStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

/// JSON file store under the local data directory.
///
/// Every write rewrites the whole file; the store only ever holds a handful of
/// short strings.
pub struct FileCredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// `<data_local_dir>/sporbpm/credentials.json`
    pub fn default_location() -> Self {
        Self::new(config::data_dir().join("credentials.json"))
    }

    async fn load(&self) -> Result<HashMap<String, String>> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(SessionError::Storage(e.to_string())),
        };
        serde_json::from_str(&content).map_err(|e| SessionError::Storage(e.to_string()))
    }

    async fn persist(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| SessionError::Storage(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(values)?;
        async_fs::write(&self.path, json)
            .await
            .map_err(|e| SessionError::Storage(e.to_string()))
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut values = self.load().await?;
        values.insert(key.to_string(), value.to_string());
        self.persist(&values).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut values = self.load().await?;
        if values.remove(key).is_some() {
            self.persist(&values).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_operations() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");

        let store = FileCredentialStore::new(path.clone());
        store.set(REFRESH_TOKEN_KEY, "refresh-1").await.unwrap();
        store.set(GRANTED_SCOPES_KEY, "a b").await.unwrap();

        let reopened = FileCredentialStore::new(path);
        assert_eq!(
            reopened.get(REFRESH_TOKEN_KEY).await.unwrap().as_deref(),
            Some("refresh-1")
        );

        reopened.remove(REFRESH_TOKEN_KEY).await.unwrap();
        assert_eq!(reopened.get(REFRESH_TOKEN_KEY).await.unwrap(), None);
        assert_eq!(
            reopened.get(GRANTED_SCOPES_KEY).await.unwrap().as_deref(),
            Some("a b")
        );
    }

    #[tokio::test]
    async fn test_file_store_missing_file_reads_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("none.json"));
        assert_eq!(store.get(REFRESH_TOKEN_KEY).await.unwrap(), None);
        store.remove(REFRESH_TOKEN_KEY).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileCredentialStore::new(path);
        assert!(matches!(
            store.get(REFRESH_TOKEN_KEY).await,
            Err(SessionError::Storage(_))
        ));
    }
}
