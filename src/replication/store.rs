//! Remote object storage abstraction.
//!
//! The engine needs exactly one capability from remote storage: store a
//! local file under a key in a bucket. Implementations:
//! - [`S3RemoteStore`]: AWS S3 and S3-compatible services via `object_store`
//! - [`InMemoryRemoteStore`]: records puts, for unit tests

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex};

use object_store::ObjectStore as _;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;

use crate::config::RemoteConfig;
use crate::error::BackupError;

/// "Store object under key" capability.
pub trait RemoteStore: Send + Sync {
    /// Uploads the file at `local_path` to `bucket` under `key`.
    fn put(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
    ) -> impl Future<Output = Result<(), BackupError>> + Send;
}

// ============================================================================
// S3RemoteStore
// ============================================================================

/// S3 remote store.
///
/// Uses the `object_store` crate, which supports AWS S3 and S3-compatible
/// endpoints (MinIO, LocalStack). A client is built per upload since a run
/// performs at most one.
#[derive(Clone)]
pub struct S3RemoteStore {
    access_key_id: String,
    secret_access_key: String,
    region: String,
    endpoint: Option<String>,
}

impl S3RemoteStore {
    /// Creates a store from the remote section of the configuration.
    #[must_use]
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            access_key_id: config.access_key_id.clone(),
            secret_access_key: config.secret_access_key.clone(),
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        }
    }

    fn client(&self, bucket: &str) -> Result<AmazonS3, BackupError> {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_region(&self.region)
            .with_access_key_id(&self.access_key_id)
            .with_secret_access_key(&self.secret_access_key);

        if let Some(endpoint) = &self.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        builder
            .build()
            .map_err(|e| BackupError::Replication(format!("failed to create S3 client: {e}")))
    }
}

impl std::fmt::Debug for S3RemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3RemoteStore")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl RemoteStore for S3RemoteStore {
    async fn put(&self, bucket: &str, key: &str, local_path: &Path) -> Result<(), BackupError> {
        let data = tokio::fs::read(local_path).await.map_err(|e| {
            BackupError::Replication(format!("cannot read {}: {e}", local_path.display()))
        })?;
        let client = self.client(bucket)?;
        client
            .put(&ObjectPath::from(key), bytes::Bytes::from(data).into())
            .await
            .map_err(|e| BackupError::Replication(e.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// InMemoryRemoteStore
// ============================================================================

/// Uploaded objects keyed by `(bucket, key)`.
type ObjectMap = HashMap<(String, String), Vec<u8>>;

/// In-memory remote store that records every upload.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRemoteStore {
    objects: Arc<Mutex<ObjectMap>>,
    failure: Option<String>,
}

impl InMemoryRemoteStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose every upload fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Returns the stored bytes for `bucket`/`key`.
    #[must_use]
    pub fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .ok()?
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.lock().map(|o| o.len()).unwrap_or_default()
    }

    /// Returns `true` if nothing was uploaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RemoteStore for InMemoryRemoteStore {
    async fn put(&self, bucket: &str, key: &str, local_path: &Path) -> Result<(), BackupError> {
        if let Some(message) = &self.failure {
            return Err(BackupError::Replication(message.clone()));
        }
        let data = tokio::fs::read(local_path)
            .await
            .map_err(|e| BackupError::Replication(e.to_string()))?;
        self.objects
            .lock()
            .map_err(|_| BackupError::Replication("in-memory store poisoned".to_string()))?
            .insert((bucket.to_string(), key.to_string()), data);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn remote_config(endpoint: Option<&str>) -> RemoteConfig {
        RemoteConfig {
            access_key_id: "AKIATEST".into(),
            secret_access_key: "secret".into(),
            bucket: "vault".into(),
            region: "eu-west-1".into(),
            endpoint: endpoint.map(str::to_string),
            key_prefix: "inquiry-backups".into(),
        }
    }

    #[test]
    fn s3_client_builds_for_custom_endpoint() {
        let store = S3RemoteStore::new(&remote_config(Some("http://localhost:9000")));
        assert!(store.client("vault").is_ok());
    }

    #[test]
    fn s3_debug_hides_credentials() {
        let store = S3RemoteStore::new(&remote_config(None));
        let debug = format!("{store:?}");
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("AKIATEST"));
    }

    #[tokio::test]
    async fn s3_missing_local_file_is_replication_error() {
        let store = S3RemoteStore::new(&remote_config(Some("http://localhost:9000")));
        let result = store
            .put("vault", "k.csv", Path::new("/nonexistent/k.csv"))
            .await;
        assert!(matches!(result, Err(BackupError::Replication(_))));
    }

    #[tokio::test]
    async fn in_memory_store_records_uploads() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let file = tmp.path().join("a.csv");
        if std::fs::write(&file, b"id\n1\n").is_err() {
            panic!("setup");
        }
        let store = InMemoryRemoteStore::new();
        assert!(store.put("b", "p/a.csv", &file).await.is_ok());
        assert_eq!(store.get("b", "p/a.csv"), Some(b"id\n1\n".to_vec()));
        assert_eq!(store.len(), 1);
    }
}
