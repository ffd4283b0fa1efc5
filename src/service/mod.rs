//! Service layer: run orchestration.
//!
//! [`BackupService`] composes the record source, archive writer,
//! replicator and retention manager into the two entry points (full backup
//! and windowed export). [`scheduler`] drives them periodically.

pub mod backup_service;
pub mod scheduler;

pub use backup_service::{BackupService, window_start};
pub use scheduler::{Schedule, run_scheduled};
