//! Domain layer: the archived record, run identity, outcomes and events.
//!
//! This module contains the inquiry record and its tabular projections,
//! the report values returned by every entry point, and the event bus that
//! broadcasts run progress to notifiers.

pub mod backup_event;
pub mod event_bus;
pub mod record;
pub mod report;
pub mod run_id;

pub use backup_event::{BackupEvent, RunKind};
pub use event_bus::EventBus;
pub use record::{Inquiry, ReviewRow, TabularRecord};
pub use report::{ArchiveFile, BackupReport, ExportReport, PruneReport, ReplicationOutcome};
pub use run_id::RunId;
