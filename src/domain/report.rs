//! Outcome values returned by the engine's entry points.
//!
//! "No data" and "replication disabled" are ordinary outcomes, not errors:
//! they are represented here rather than as [`crate::error::BackupError`]s.
//! Every report carries a success flag and a human-readable summary that an
//! operator-facing notifier can relay verbatim.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::RunId;

/// A snapshot or export file that was written successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ArchiveFile {
    /// Full local path of the file.
    #[schema(value_type = String)]
    pub path: PathBuf,
    /// Base file name.
    pub file_name: String,
    /// Number of data rows (header excluded).
    pub rows: usize,
    /// File size in bytes.
    pub bytes: u64,
    /// Wall-clock time the file name was derived from.
    pub created_at: DateTime<Utc>,
}

/// Result of a single best-effort upload attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReplicationOutcome {
    /// The archive was stored remotely under `key`.
    Uploaded {
        /// Object key inside the bucket.
        key: String,
    },
    /// Remote credentials or target are not configured.
    Disabled,
    /// The upload was attempted and failed.
    Failed {
        /// Transport or authentication failure description.
        reason: String,
    },
    /// No replication was attempted because nothing was written.
    Skipped,
}

impl ReplicationOutcome {
    /// Returns `true` only when the archive was uploaded.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self, Self::Uploaded { .. })
    }
}

impl fmt::Display for ReplicationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uploaded { key } => write!(f, "uploaded to {key}"),
            Self::Disabled => write!(f, "remote storage not configured, upload skipped"),
            Self::Failed { reason } => write!(f, "upload failed: {reason}"),
            Self::Skipped => write!(f, "nothing to upload"),
        }
    }
}

/// Summary of one retention pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PruneReport {
    /// Snapshot files that matched the naming convention.
    pub scanned: usize,
    /// Names of the files that were deleted.
    pub deleted: Vec<String>,
    /// Number of eligible files that could not be deleted.
    pub failed: usize,
}

impl PruneReport {
    /// Number of deleted files.
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }
}

/// Result of a full backup run.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BackupReport {
    /// Run identifier.
    #[schema(value_type = String)]
    pub run_id: RunId,
    /// `false` only on record-source or local-write failure.
    pub success: bool,
    /// Records returned by the source; `None` if extraction failed.
    pub records: Option<usize>,
    /// The snapshot written, if any.
    pub snapshot: Option<ArchiveFile>,
    /// Replication outcome; does not affect `success`.
    pub replication: ReplicationOutcome,
    /// Retention outcome; `None` when pruning did not run.
    pub retention: Option<PruneReport>,
    /// Fatal error message when `success` is `false`.
    pub error: Option<String>,
    /// Human-readable status line.
    pub summary: String,
}

impl BackupReport {
    /// Report for a run that found nothing to back up.
    #[must_use]
    pub fn empty(run_id: RunId) -> Self {
        Self {
            run_id,
            success: true,
            records: Some(0),
            snapshot: None,
            replication: ReplicationOutcome::Skipped,
            retention: None,
            error: None,
            summary: "no data to back up".to_string(),
        }
    }

    /// Report for a run that wrote a snapshot.
    #[must_use]
    pub fn written(
        run_id: RunId,
        snapshot: ArchiveFile,
        replication: ReplicationOutcome,
        retention: Option<PruneReport>,
    ) -> Self {
        let mut summary = format!(
            "backup created: {} ({} records); {}",
            snapshot.file_name, snapshot.rows, replication
        );
        if let Some(pruned) = &retention {
            if pruned.deleted_count() > 0 {
                summary.push_str(&format!("; removed {} old backups", pruned.deleted_count()));
            }
            if pruned.failed > 0 {
                summary.push_str(&format!("; {} old backups could not be removed", pruned.failed));
            }
        }
        Self {
            run_id,
            success: true,
            records: Some(snapshot.rows),
            snapshot: Some(snapshot),
            replication,
            retention,
            error: None,
            summary,
        }
    }

    /// Report for a run that failed on a fatal error.
    #[must_use]
    pub fn failed(run_id: RunId, records: Option<usize>, error: &crate::error::BackupError) -> Self {
        Self {
            run_id,
            success: false,
            records,
            snapshot: None,
            replication: ReplicationOutcome::Skipped,
            retention: None,
            error: Some(error.to_string()),
            summary: format!("backup failed: {error}"),
        }
    }
}

/// Result of a windowed export.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExportReport {
    /// Run identifier.
    #[schema(value_type = String)]
    pub run_id: RunId,
    /// `false` only on record-source or local-write failure.
    pub success: bool,
    /// Window length in days.
    pub days: u32,
    /// The export written; `None` when the window was empty or on failure.
    pub export: Option<ArchiveFile>,
    /// Fatal error message when `success` is `false`.
    pub error: Option<String>,
    /// Human-readable status line.
    pub summary: String,
}

impl ExportReport {
    /// Report for a window that contained no records.
    #[must_use]
    pub fn empty(run_id: RunId, days: u32) -> Self {
        Self {
            run_id,
            success: true,
            days,
            export: None,
            error: None,
            summary: format!("no inquiries in the last {days} days"),
        }
    }

    /// Report for a window that was exported.
    #[must_use]
    pub fn written(run_id: RunId, days: u32, export: ArchiveFile) -> Self {
        let summary = format!(
            "exported {} inquiries from the last {days} days to {}",
            export.rows, export.file_name
        );
        Self {
            run_id,
            success: true,
            days,
            export: Some(export),
            error: None,
            summary,
        }
    }

    /// Report for an export that failed on a fatal error.
    #[must_use]
    pub fn failed(run_id: RunId, days: u32, error: &crate::error::BackupError) -> Self {
        Self {
            run_id,
            success: false,
            days,
            export: None,
            error: Some(error.to_string()),
            summary: format!("export failed: {error}"),
        }
    }

    /// Path of the exported file, if one was written.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        self.export.as_ref().map(|e| e.path.as_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackupError;

    fn archive(rows: usize) -> ArchiveFile {
        ArchiveFile {
            path: PathBuf::from("backups/inquiries_backup_20240501_093000.csv"),
            file_name: "inquiries_backup_20240501_093000.csv".into(),
            rows,
            bytes: 128,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn only_upload_counts_as_replication_success() {
        assert!(ReplicationOutcome::Uploaded { key: "k".into() }.succeeded());
        assert!(!ReplicationOutcome::Disabled.succeeded());
        assert!(!ReplicationOutcome::Failed { reason: "x".into() }.succeeded());
    }

    #[test]
    fn written_report_succeeds_even_when_upload_failed() {
        let report = BackupReport::written(
            RunId::new(),
            archive(3),
            ReplicationOutcome::Failed {
                reason: "access denied".into(),
            },
            Some(PruneReport {
                scanned: 4,
                deleted: vec!["a.csv".into(), "b.csv".into()],
                failed: 1,
            }),
        );
        assert!(report.success);
        assert_eq!(report.records, Some(3));
        assert!(report.summary.contains("upload failed: access denied"));
        assert!(report.summary.contains("removed 2 old backups"));
        assert!(report.summary.contains("1 old backups could not be removed"));
    }

    #[test]
    fn failed_report_carries_error() {
        let err = BackupError::Source("connection refused".into());
        let report = BackupReport::failed(RunId::new(), None, &err);
        assert!(!report.success);
        assert!(report.snapshot.is_none());
        assert_eq!(report.error.as_deref(), Some("record source error: connection refused"));
    }

    #[test]
    fn replication_outcome_serializes_tagged() {
        let json = serde_json::to_string(&ReplicationOutcome::Disabled).unwrap_or_default();
        assert_eq!(json, r#"{"outcome":"disabled"}"#);
    }

    #[test]
    fn empty_export_has_no_path() {
        let report = ExportReport::empty(RunId::new(), 30);
        assert!(report.success);
        assert!(report.path().is_none());
        assert!(report.summary.contains("30 days"));
    }
}
