//! Vault configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). The configuration is read exactly once
//! at process start and handed to component constructors by reference.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::BackupError;

/// Default entity tag; also the source table name.
pub const DEFAULT_ENTITY: &str = "inquiries";

/// Default remote key prefix for replicated snapshots.
pub const DEFAULT_REMOTE_PREFIX: &str = "inquiry-backups";

/// Largest accepted export window in days (about ten years).
pub const MAX_EXPORT_DAYS: u32 = 3650;

/// Top-level vault configuration.
///
/// Loaded once at startup via [`VaultConfig::from_env`].
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// PostgreSQL connection string. `None` when `DATABASE_URL` is unset.
    pub database_url: Option<String>,

    /// Timeout in seconds for establishing a database connection.
    pub database_connect_timeout_secs: u64,

    /// Entity tag used in file names; also the table that is read.
    pub entity: String,

    /// Directory receiving full snapshots.
    pub backup_dir: PathBuf,

    /// Directory receiving windowed exports.
    pub export_dir: PathBuf,

    /// Delete snapshots older than this many days (0 = never).
    pub retention_days: u64,

    /// Window length in days used by scheduled exports.
    pub export_days: u32,

    /// Seconds between scheduled runs in `serve` mode.
    pub schedule_interval_secs: u64,

    /// Socket address of the admin HTTP API.
    pub listen_addr: SocketAddr,

    /// Remote replication settings; `None` disables replication.
    pub remote: Option<RemoteConfig>,
}

/// S3-compatible replication target.
///
/// Only constructed when access key, secret and bucket are all present.
#[derive(Clone)]
pub struct RemoteConfig {
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Target bucket.
    pub bucket: String,
    /// Bucket region.
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, LocalStack).
    pub endpoint: Option<String>,
    /// Key prefix prepended to every uploaded file name.
    pub key_prefix: String,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl VaultConfig {
    /// Loads configuration from the process environment.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file first.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Config`] if `LISTEN_ADDR` cannot be parsed,
    /// `VAULT_ENTITY` is not a plain SQL identifier or `VAULT_EXPORT_DAYS`
    /// is outside `1..=MAX_EXPORT_DAYS`.
    pub fn from_env() -> Result<Self, BackupError> {
        dotenvy::dotenv().ok();
        Self::from_vars(&std::env::vars().collect())
    }

    /// Builds the configuration from an explicit variable map.
    ///
    /// Falls back to defaults when a variable is missing or malformed.
    ///
    /// # Errors
    ///
    /// Same as [`VaultConfig::from_env`].
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, BackupError> {
        let get = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let listen_addr: SocketAddr = get("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|e| BackupError::Config(format!("LISTEN_ADDR: {e}")))?;

        let entity = get("VAULT_ENTITY").unwrap_or_else(|| DEFAULT_ENTITY.to_string());
        if !is_identifier(&entity) {
            return Err(BackupError::Config(format!(
                "VAULT_ENTITY must be a plain identifier, got {entity:?}"
            )));
        }

        let export_days = parse_var(vars, "VAULT_EXPORT_DAYS", 7);
        if !(1..=MAX_EXPORT_DAYS).contains(&export_days) {
            return Err(BackupError::Config(format!(
                "VAULT_EXPORT_DAYS must be between 1 and {MAX_EXPORT_DAYS}, got {export_days}"
            )));
        }

        let remote = match (
            get("AWS_ACCESS_KEY_ID"),
            get("AWS_SECRET_ACCESS_KEY"),
            get("AWS_BUCKET_NAME"),
        ) {
            (Some(access_key_id), Some(secret_access_key), Some(bucket)) => Some(RemoteConfig {
                access_key_id,
                secret_access_key,
                bucket,
                region: get("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
                endpoint: get("AWS_ENDPOINT"),
                key_prefix: get("VAULT_REMOTE_PREFIX")
                    .unwrap_or_else(|| DEFAULT_REMOTE_PREFIX.to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            database_connect_timeout_secs: parse_var(vars, "DATABASE_CONNECT_TIMEOUT_SECS", 5),
            entity,
            backup_dir: get("VAULT_BACKUP_DIR").map_or_else(|| "backups".into(), PathBuf::from),
            export_dir: get("VAULT_EXPORT_DIR").map_or_else(|| "exports".into(), PathBuf::from),
            retention_days: parse_var(vars, "VAULT_RETENTION_DAYS", 7),
            export_days,
            schedule_interval_secs: parse_var(vars, "VAULT_SCHEDULE_INTERVAL_SECS", 86_400),
            listen_addr,
            remote,
        })
    }

    /// Returns the database URL or a configuration error naming the variable.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Config`] when `DATABASE_URL` was not set.
    pub fn require_database_url(&self) -> Result<&str, BackupError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| BackupError::Config("DATABASE_URL not set".to_string()))
    }
}

/// Parses a variable as `T`, returning `default` on missing or invalid values.
fn parse_var<T: std::str::FromStr>(vars: &HashMap<String, String>, key: &str, default: T) -> T {
    vars.get(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// `[A-Za-z_][A-Za-z0-9_]*`; the entity is interpolated into SQL and file names.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let Ok(cfg) = VaultConfig::from_vars(&HashMap::new()) else {
            panic!("defaults must load");
        };
        assert_eq!(cfg.entity, "inquiries");
        assert_eq!(cfg.backup_dir, PathBuf::from("backups"));
        assert_eq!(cfg.export_dir, PathBuf::from("exports"));
        assert_eq!(cfg.retention_days, 7);
        assert_eq!(cfg.export_days, 7);
        assert!(cfg.database_url.is_none());
        assert!(cfg.remote.is_none());
    }

    #[test]
    fn remote_requires_all_three_values() {
        let partial = vars(&[
            ("AWS_ACCESS_KEY_ID", "AKIA"),
            ("AWS_BUCKET_NAME", "bucket"),
        ]);
        let Ok(cfg) = VaultConfig::from_vars(&partial) else {
            panic!("config must load");
        };
        assert!(cfg.remote.is_none());

        let full = vars(&[
            ("AWS_ACCESS_KEY_ID", "AKIA"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_BUCKET_NAME", "bucket"),
        ]);
        let Ok(cfg) = VaultConfig::from_vars(&full) else {
            panic!("config must load");
        };
        let Some(remote) = cfg.remote else {
            panic!("remote should be enabled");
        };
        assert_eq!(remote.bucket, "bucket");
        assert_eq!(remote.region, "us-east-1");
        assert_eq!(remote.key_prefix, DEFAULT_REMOTE_PREFIX);
    }

    #[test]
    fn blank_credential_counts_as_absent() {
        let v = vars(&[
            ("AWS_ACCESS_KEY_ID", "AKIA"),
            ("AWS_SECRET_ACCESS_KEY", "  "),
            ("AWS_BUCKET_NAME", "bucket"),
        ]);
        let Ok(cfg) = VaultConfig::from_vars(&v) else {
            panic!("config must load");
        };
        assert!(cfg.remote.is_none());
    }

    #[test]
    fn malformed_numbers_fall_back() {
        let v = vars(&[("VAULT_RETENTION_DAYS", "soon")]);
        let Ok(cfg) = VaultConfig::from_vars(&v) else {
            panic!("config must load");
        };
        assert_eq!(cfg.retention_days, 7);
    }

    #[test]
    fn export_days_outside_window_range_are_rejected() {
        for bad in ["0", "3651"] {
            let v = vars(&[("VAULT_EXPORT_DAYS", bad)]);
            assert!(
                matches!(VaultConfig::from_vars(&v), Err(BackupError::Config(_))),
                "VAULT_EXPORT_DAYS={bad} accepted"
            );
        }
        let Ok(cfg) = VaultConfig::from_vars(&vars(&[("VAULT_EXPORT_DAYS", "3650")])) else {
            panic!("upper bound must load");
        };
        assert_eq!(cfg.export_days, MAX_EXPORT_DAYS);
    }

    #[test]
    fn entity_must_be_identifier() {
        let v = vars(&[("VAULT_ENTITY", "inquiries; DROP TABLE x")]);
        assert!(VaultConfig::from_vars(&v).is_err());
        assert!(is_identifier("leads_2024"));
        assert!(!is_identifier("2024_leads"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn debug_redacts_secret() {
        let remote = RemoteConfig {
            access_key_id: "AKIA".into(),
            secret_access_key: "hunter2".into(),
            bucket: "b".into(),
            region: "eu-west-1".into(),
            endpoint: None,
            key_prefix: "p".into(),
        };
        assert!(!format!("{remote:?}").contains("hunter2"));
    }
}
