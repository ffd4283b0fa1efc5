//! Domain events emitted while a run progresses.
//!
//! Every stage publishes a [`BackupEvent`] through the [`super::EventBus`].
//! An operator-facing notifier subscribes to relay them; the engine itself
//! never depends on anyone listening.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ReplicationOutcome, RunId};

/// Which entry point a run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    /// Full snapshot followed by retention.
    FullBackup,
    /// Trailing-window review export.
    WindowExport,
}

/// Event emitted at each stage boundary of a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum BackupEvent {
    /// A local snapshot was written.
    SnapshotWritten {
        /// Run identifier.
        run_id: RunId,
        /// Snapshot file name.
        file_name: String,
        /// Data rows written.
        rows: usize,
        /// Write timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The replication step finished (in any outcome).
    SnapshotReplicated {
        /// Run identifier.
        run_id: RunId,
        /// Upload outcome.
        outcome: ReplicationOutcome,
        /// Completion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A retention pass finished.
    SnapshotsPruned {
        /// Run identifier.
        run_id: RunId,
        /// Number of deleted snapshots.
        deleted: usize,
        /// Number of snapshots that could not be deleted.
        failed: usize,
        /// Completion timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A window export was written.
    WindowExported {
        /// Run identifier.
        run_id: RunId,
        /// Export file name.
        file_name: String,
        /// Window length in days.
        days: u32,
        /// Data rows written.
        rows: usize,
        /// Write timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A run ended without writing anything because the source was empty.
    NothingToArchive {
        /// Run identifier.
        run_id: RunId,
        /// Run kind.
        kind: RunKind,
        /// Timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A run failed on a source or write error.
    RunFailed {
        /// Run identifier.
        run_id: RunId,
        /// Run kind.
        kind: RunKind,
        /// Error description.
        error: String,
        /// Failure timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl BackupEvent {
    /// Returns the run ID associated with this event.
    #[must_use]
    pub fn run_id(&self) -> RunId {
        match self {
            Self::SnapshotWritten { run_id, .. }
            | Self::SnapshotReplicated { run_id, .. }
            | Self::SnapshotsPruned { run_id, .. }
            | Self::WindowExported { run_id, .. }
            | Self::NothingToArchive { run_id, .. }
            | Self::RunFailed { run_id, .. } => *run_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::SnapshotWritten { .. } => "snapshot_written",
            Self::SnapshotReplicated { .. } => "snapshot_replicated",
            Self::SnapshotsPruned { .. } => "snapshots_pruned",
            Self::WindowExported { .. } => "window_exported",
            Self::NothingToArchive { .. } => "nothing_to_archive",
            Self::RunFailed { .. } => "run_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_failed_serializes_with_tag() {
        let event = BackupEvent::RunFailed {
            run_id: RunId::new(),
            kind: RunKind::FullBackup,
            error: "record source error: timeout".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains(r#""event_type":"run_failed""#));
        assert!(json.contains(r#""kind":"full_backup""#));
        assert_eq!(event.event_type_str(), "run_failed");
    }

    #[test]
    fn run_id_accessor() {
        let id = RunId::new();
        let event = BackupEvent::SnapshotReplicated {
            run_id: id,
            outcome: ReplicationOutcome::Disabled,
            timestamp: Utc::now(),
        };
        assert_eq!(event.run_id(), id);
    }
}
