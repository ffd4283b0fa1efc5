//! Backup service: orchestrates snapshot, replication, retention and
//! windowed export runs.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Days, NaiveTime, Utc};
use tokio::sync::Mutex;
use tracing::Instrument;

use crate::archive::{ArchiveNaming, ArchiveWriter};
use crate::config::VaultConfig;
use crate::domain::{
    BackupEvent, BackupReport, EventBus, ExportReport, ReviewRow, RunId, RunKind,
};
use crate::error::BackupError;
use crate::persistence::RecordSource;
use crate::replication::{RemoteStore, Replicator};
use crate::retention::RetentionManager;

/// Thin orchestrator over the engine's components.
///
/// Each entry point runs to completion and returns a report; only source
/// and local-write failures turn `success` false. Runs issued through the
/// same service never overlap: a run guard serializes them.
#[derive(Debug)]
pub struct BackupService<R, S> {
    source: R,
    replicator: Replicator<S>,
    retention: RetentionManager,
    writer: ArchiveWriter,
    naming: ArchiveNaming,
    backup_dir: PathBuf,
    export_dir: PathBuf,
    retention_days: u64,
    event_bus: EventBus,
    run_guard: Mutex<()>,
}

impl<R: RecordSource, S: RemoteStore> BackupService<R, S> {
    /// Creates a service from configuration and its collaborators.
    #[must_use]
    pub fn new(config: &VaultConfig, source: R, replicator: Replicator<S>, event_bus: EventBus) -> Self {
        let naming = ArchiveNaming::new(config.entity.clone());
        Self {
            source,
            replicator,
            retention: RetentionManager::new(naming.clone()),
            writer: ArchiveWriter::default(),
            naming,
            backup_dir: config.backup_dir.clone(),
            export_dir: config.export_dir.clone(),
            retention_days: config.retention_days,
            event_bus,
            run_guard: Mutex::new(()),
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Directory receiving full snapshots.
    #[must_use]
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Directory receiving window exports.
    #[must_use]
    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Extracts every record, writes a snapshot, replicates it and prunes
    /// old snapshots.
    pub async fn run_full_backup(&self) -> BackupReport {
        let run_id = RunId::new();
        let span = tracing::info_span!("full_backup", %run_id);
        self.full_backup(run_id).instrument(span).await
    }

    /// Exports records from the trailing `days`-day window for review.
    pub async fn export_window(&self, days: u32) -> ExportReport {
        let run_id = RunId::new();
        let span = tracing::info_span!("window_export", %run_id, days);
        self.window_export(run_id, days).instrument(span).await
    }

    async fn full_backup(&self, run_id: RunId) -> BackupReport {
        let _guard = self.run_guard.lock().await;
        tracing::info!("starting database backup");

        let records = match self.source.fetch_all().await {
            Ok(records) => records,
            Err(e) => return self.backup_failed(run_id, None, &e),
        };

        if records.is_empty() {
            tracing::info!("no data to back up");
            self.event_bus.publish(BackupEvent::NothingToArchive {
                run_id,
                kind: RunKind::FullBackup,
                timestamp: Utc::now(),
            });
            return BackupReport::empty(run_id);
        }

        let started_at = Utc::now();
        let file_name = self.naming.snapshot_file_name(started_at);
        let snapshot = match self
            .writer
            .write(&self.backup_dir, &file_name, started_at, &records)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => return self.backup_failed(run_id, Some(records.len()), &e),
        };
        drop(records);

        tracing::info!(path = %snapshot.path.display(), rows = snapshot.rows, "local backup created");
        self.event_bus.publish(BackupEvent::SnapshotWritten {
            run_id,
            file_name: snapshot.file_name.clone(),
            rows: snapshot.rows,
            timestamp: Utc::now(),
        });

        let replication = self.replicator.replicate(&snapshot.path).await;
        self.event_bus.publish(BackupEvent::SnapshotReplicated {
            run_id,
            outcome: replication.clone(),
            timestamp: Utc::now(),
        });

        let pruned = self.retention.prune(&self.backup_dir, self.retention_days).await;
        self.event_bus.publish(BackupEvent::SnapshotsPruned {
            run_id,
            deleted: pruned.deleted_count(),
            failed: pruned.failed,
            timestamp: Utc::now(),
        });

        let report = BackupReport::written(run_id, snapshot, replication, Some(pruned));
        tracing::info!(summary = %report.summary, "backup completed");
        report
    }

    async fn window_export(&self, run_id: RunId, days: u32) -> ExportReport {
        let _guard = self.run_guard.lock().await;
        let now = Utc::now();
        let since = window_start(now, days);
        tracing::info!(%since, "exporting recent inquiries");

        let records = match self.source.fetch_since(since).await {
            Ok(records) => records,
            Err(e) => return self.export_failed(run_id, days, &e),
        };

        if records.is_empty() {
            tracing::info!("no inquiries in window");
            self.event_bus.publish(BackupEvent::NothingToArchive {
                run_id,
                kind: RunKind::WindowExport,
                timestamp: Utc::now(),
            });
            return ExportReport::empty(run_id, days);
        }

        let file_name = self.naming.export_file_name(days, now);
        let export = match self
            .writer
            .write(&self.export_dir, &file_name, now, records.iter().map(ReviewRow))
            .await
        {
            Ok(export) => export,
            Err(e) => return self.export_failed(run_id, days, &e),
        };

        tracing::info!(path = %export.path.display(), rows = export.rows, "recent inquiries exported");
        self.event_bus.publish(BackupEvent::WindowExported {
            run_id,
            file_name: export.file_name.clone(),
            days,
            rows: export.rows,
            timestamp: Utc::now(),
        });
        ExportReport::written(run_id, days, export)
    }

    fn backup_failed(&self, run_id: RunId, records: Option<usize>, err: &BackupError) -> BackupReport {
        tracing::error!(error = %err, "backup failed");
        self.event_bus.publish(BackupEvent::RunFailed {
            run_id,
            kind: RunKind::FullBackup,
            error: err.to_string(),
            timestamp: Utc::now(),
        });
        BackupReport::failed(run_id, records, err)
    }

    fn export_failed(&self, run_id: RunId, days: u32, err: &BackupError) -> ExportReport {
        tracing::error!(error = %err, "export failed");
        self.event_bus.publish(BackupEvent::RunFailed {
            run_id,
            kind: RunKind::WindowExport,
            error: err.to_string(),
            timestamp: Utc::now(),
        });
        ExportReport::failed(run_id, days, err)
    }
}

/// Start of the trailing window: midnight UTC of the current day minus
/// `days` days. The current day is always included.
#[must_use]
pub fn window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now.date_naive()
        .checked_sub_days(Days::new(u64::from(days)))
        .map_or(DateTime::<Utc>::MIN_UTC, |date| {
            date.and_time(NaiveTime::MIN).and_utc()
        })
}
