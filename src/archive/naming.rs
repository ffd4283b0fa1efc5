//! File naming conventions for snapshots and window exports.
//!
//! Snapshots: `<entity>_backup_<YYYYMMDD_HHMMSS>.csv`.
//! Window exports: `<entity>_recent_<days>days_<YYYYMMDD_HHMMSS>.csv`.
//!
//! The two patterns are disjoint, so retention matching on snapshot names
//! can never select an export. Names derive from wall-clock time at second
//! granularity; two runs in the same second share a name.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Extension of every archive file.
pub const ARCHIVE_EXTENSION: &str = "csv";

/// `strftime` pattern of the timestamp embedded in file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Naming rules bound to one entity tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveNaming {
    entity: String,
}

impl ArchiveNaming {
    /// Creates naming rules for `entity`.
    #[must_use]
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
        }
    }

    /// Returns the entity tag.
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Snapshot file name for a run started at `at`.
    #[must_use]
    pub fn snapshot_file_name(&self, at: DateTime<Utc>) -> String {
        format!(
            "{}_backup_{}.{ARCHIVE_EXTENSION}",
            self.entity,
            at.format(TIMESTAMP_FORMAT)
        )
    }

    /// Window export file name for a `days`-day window exported at `at`.
    #[must_use]
    pub fn export_file_name(&self, days: u32, at: DateTime<Utc>) -> String {
        format!(
            "{}_recent_{days}days_{}.{ARCHIVE_EXTENSION}",
            self.entity,
            at.format(TIMESTAMP_FORMAT)
        )
    }

    /// Parses the timestamp out of a snapshot file name.
    ///
    /// Returns `None` for anything that is not exactly a snapshot name of
    /// this entity.
    #[must_use]
    pub fn parse_snapshot_timestamp(&self, file_name: &str) -> Option<NaiveDateTime> {
        let stamp = file_name
            .strip_prefix(self.entity.as_str())?
            .strip_prefix("_backup_")?
            .strip_suffix(ARCHIVE_EXTENSION)?
            .strip_suffix('.')?;
        // "YYYYMMDD_HHMMSS"
        if stamp.len() != 15 {
            return None;
        }
        NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
    }

    /// Returns `true` if `file_name` follows the snapshot convention.
    #[must_use]
    pub fn is_snapshot_file_name(&self, file_name: &str) -> bool {
        self.parse_snapshot_timestamp(file_name).is_some()
    }
}
