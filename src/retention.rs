//! Age-based pruning of local snapshots.
//!
//! Only files matching the snapshot naming convention are considered;
//! everything else in the directory is left alone. Deletion is best-effort
//! per file.

use std::path::Path;
use std::time::{Duration, SystemTime};

use tokio::fs;

use crate::archive::ArchiveNaming;
use crate::domain::PruneReport;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Deletes snapshots older than a retention threshold.
#[derive(Debug, Clone)]
pub struct RetentionManager {
    naming: ArchiveNaming,
}

impl RetentionManager {
    /// Creates a retention manager for snapshots named by `naming`.
    #[must_use]
    pub const fn new(naming: ArchiveNaming) -> Self {
        Self { naming }
    }

    /// Prunes `directory` relative to the current time.
    pub async fn prune(&self, directory: &Path, max_age_days: u64) -> PruneReport {
        self.prune_at(directory, max_age_days, SystemTime::now()).await
    }

    /// Deletes snapshots in `directory` whose modification time is strictly
    /// before `now - max_age_days`.
    ///
    /// `max_age_days == 0` disables pruning. A missing directory yields an
    /// empty report.
    pub async fn prune_at(&self, directory: &Path, max_age_days: u64, now: SystemTime) -> PruneReport {
        let mut report = PruneReport::default();
        if max_age_days == 0 {
            tracing::debug!("retention disabled");
            return report;
        }

        let max_age = Duration::from_secs(max_age_days.saturating_mul(SECS_PER_DAY));
        let Some(cutoff) = now.checked_sub(max_age) else {
            return report;
        };

        let mut entries = match fs::read_dir(directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return report,
            Err(e) => {
                tracing::error!(dir = %directory.display(), error = %e, "cannot list backup directory");
                return report;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(dir = %directory.display(), error = %e, "backup directory listing interrupted");
                    break;
                }
            };

            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !self.naming.is_snapshot_file_name(&file_name) {
                continue;
            }

            // Snapshot-named entries that are not regular files still go
            // through deletion, so a stray directory is reported as a failure.
            let modified = match entry.metadata().await {
                Ok(meta) => meta.modified(),
                Err(e) => Err(e),
            };
            report.scanned = report.scanned.saturating_add(1);

            let modified = match modified {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(file = %file_name, error = %e, "cannot read modification time");
                    report.failed = report.failed.saturating_add(1);
                    continue;
                }
            };
            if modified >= cutoff {
                continue;
            }

            match fs::remove_file(entry.path()).await {
                Ok(()) => {
                    tracing::info!(file = %file_name, "deleted old backup");
                    report.deleted.push(file_name);
                }
                Err(e) => {
                    tracing::warn!(file = %file_name, error = %e, "failed to delete old backup");
                    report.failed = report.failed.saturating_add(1);
                }
            }
        }

        report.deleted.sort();
        if !report.deleted.is_empty() {
            tracing::info!(deleted = report.deleted.len(), "cleaned up old backup files");
        }
        report
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const HOUR: u64 = 60 * 60;

    fn manager() -> RetentionManager {
        RetentionManager::new(ArchiveNaming::new("inquiries"))
    }

    fn touch(dir: &Path, name: &str, modified: SystemTime) -> PathBuf {
        let path = dir.join(name);
        let Ok(file) = std::fs::File::create(&path) else {
            panic!("create {name}");
        };
        if file.set_modified(modified).is_err() {
            panic!("set mtime on {name}");
        }
        path
    }

    fn hours_before(now: SystemTime, hours: u64) -> SystemTime {
        now.checked_sub(Duration::from_secs(hours * HOUR))
            .unwrap_or(SystemTime::UNIX_EPOCH)
    }

    #[tokio::test]
    async fn deletes_exactly_the_files_past_the_threshold() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let now = SystemTime::now();
        let day0 = touch(tmp.path(), "inquiries_backup_20240110_000000.csv", now);
        let day6 = touch(tmp.path(), "inquiries_backup_20240104_000000.csv", hours_before(now, 6 * 24));
        let day7_5 = touch(tmp.path(), "inquiries_backup_20240102_120000.csv", hours_before(now, 7 * 24 + 12));
        let day10 = touch(tmp.path(), "inquiries_backup_20231231_000000.csv", hours_before(now, 10 * 24));

        let report = manager().prune_at(tmp.path(), 7, now).await;

        assert_eq!(report.scanned, 4);
        assert_eq!(
            report.deleted,
            vec![
                "inquiries_backup_20231231_000000.csv".to_string(),
                "inquiries_backup_20240102_120000.csv".to_string(),
            ]
        );
        assert_eq!(report.failed, 0);
        assert!(day0.exists());
        assert!(day6.exists());
        assert!(!day7_5.exists());
        assert!(!day10.exists());
    }

    #[tokio::test]
    async fn foreign_files_are_never_touched() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let now = SystemTime::now();
        let old = hours_before(now, 100 * 24);
        let kept = [
            touch(tmp.path(), "inquiries_recent_30days_20230101_000000.csv", old),
            touch(tmp.path(), "notes.txt", old),
            touch(tmp.path(), ".inquiries_backup_20230101_000000.csv.tmp", old),
            touch(tmp.path(), "leads_backup_20230101_000000.csv", old),
        ];

        let report = manager().prune_at(tmp.path(), 7, now).await;

        assert_eq!(report.scanned, 0);
        assert!(report.deleted.is_empty());
        for path in kept {
            assert!(path.exists(), "{} was deleted", path.display());
        }
    }

    #[tokio::test]
    async fn undeletable_entry_is_counted_and_pruning_continues() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let now = SystemTime::now();
        let old = hours_before(now, 30 * 24);

        let blocked = tmp.path().join("inquiries_backup_20200101_000000.csv");
        if std::fs::create_dir(&blocked).is_err() {
            panic!("create snapshot-named directory");
        }
        touch(&blocked, "x", old);
        let Ok(dir_handle) = std::fs::File::open(&blocked) else {
            panic!("open snapshot-named directory");
        };
        if dir_handle.set_modified(old).is_err() {
            panic!("set directory mtime");
        }
        let removable = touch(tmp.path(), "inquiries_backup_20200102_000000.csv", old);

        let report = manager().prune_at(tmp.path(), 7, now).await;

        assert_eq!(report.scanned, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.deleted, vec!["inquiries_backup_20200102_000000.csv".to_string()]);
        assert!(!removable.exists());
        assert!(blocked.exists());
    }

    #[tokio::test]
    async fn missing_directory_is_a_no_op() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let report = manager().prune(&tmp.path().join("absent"), 7).await;
        assert_eq!(report, PruneReport::default());
    }

    #[tokio::test]
    async fn zero_days_disables_pruning() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let now = SystemTime::now();
        let old = touch(
            tmp.path(),
            "inquiries_backup_20200101_000000.csv",
            hours_before(now, 365 * 24),
        );
        let report = manager().prune_at(tmp.path(), 0, now).await;
        assert!(report.deleted.is_empty());
        assert!(old.exists());
    }

    #[tokio::test]
    async fn running_twice_is_idempotent() {
        let Ok(tmp) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let now = SystemTime::now();
        touch(
            tmp.path(),
            "inquiries_backup_20200101_000000.csv",
            hours_before(now, 30 * 24),
        );
        let first = manager().prune_at(tmp.path(), 7, now).await;
        let second = manager().prune_at(tmp.path(), 7, now).await;
        assert_eq!(first.deleted_count(), 1);
        assert_eq!(second, PruneReport::default());
    }
}
