//! Best-effort replication of local archives to remote object storage.
//!
//! [`Replicator::replicate`] never returns an error: a missing
//! configuration yields [`ReplicationOutcome::Disabled`] and any upload
//! failure yields [`ReplicationOutcome::Failed`]. One attempt per call;
//! the next scheduled run is the retry.

pub mod store;

use std::path::Path;

pub use store::{InMemoryRemoteStore, RemoteStore, S3RemoteStore};

use crate::config::RemoteConfig;
use crate::domain::ReplicationOutcome;

/// Where enabled replication sends archives.
#[derive(Debug, Clone)]
struct RemoteTarget<S> {
    store: S,
    bucket: String,
    key_prefix: String,
}

/// Uploads completed snapshots to a [`RemoteStore`].
#[derive(Debug, Clone)]
pub struct Replicator<S> {
    target: Option<RemoteTarget<S>>,
}

impl<S: RemoteStore> Replicator<S> {
    /// Creates an enabled replicator.
    #[must_use]
    pub fn new(store: S, bucket: impl Into<String>, key_prefix: impl Into<String>) -> Self {
        Self {
            target: Some(RemoteTarget {
                store,
                bucket: bucket.into(),
                key_prefix: key_prefix.into(),
            }),
        }
    }

    /// Creates a replicator that always reports [`ReplicationOutcome::Disabled`].
    #[must_use]
    pub const fn disabled() -> Self {
        Self { target: None }
    }

    /// Returns `true` if a remote target is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Object key for a local archive: `<prefix>/<file name>`.
    #[must_use]
    pub fn object_key(key_prefix: &str, local_path: &Path) -> String {
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let prefix = key_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        }
    }

    /// Uploads `local_path`; never fails the caller.
    pub async fn replicate(&self, local_path: &Path) -> ReplicationOutcome {
        let Some(target) = &self.target else {
            tracing::warn!("remote storage credentials not configured, skipping upload");
            return ReplicationOutcome::Disabled;
        };

        let key = Self::object_key(&target.key_prefix, local_path);
        match target.store.put(&target.bucket, &key, local_path).await {
            Ok(()) => {
                tracing::info!(bucket = %target.bucket, %key, "snapshot uploaded");
                ReplicationOutcome::Uploaded { key }
            }
            Err(e) => {
                tracing::error!(bucket = %target.bucket, %key, error = %e, "snapshot upload failed");
                ReplicationOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

impl Replicator<S3RemoteStore> {
    /// Builds an S3 replicator from configuration, disabled when `remote`
    /// is `None`.
    #[must_use]
    pub fn from_config(remote: Option<&RemoteConfig>) -> Self {
        match remote {
            Some(cfg) => Self::new(S3RemoteStore::new(cfg), &cfg.bucket, &cfg.key_prefix),
            None => Self::disabled(),
        }
    }
}
