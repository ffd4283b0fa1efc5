//! # inquiry-vault
//!
//! Snapshot, replication and retention engine for assistant inquiry records.
//!
//! Each full backup extracts every record from the store, writes a
//! timestamped CSV snapshot atomically, copies it to S3-compatible object
//! storage when credentials are configured, and prunes local snapshots past
//! the retention window. Window exports write the review projection of
//! recent records to a separate directory that is never pruned.
//!
//! ## Architecture
//!
//! ```text
//! Invocation (CLI, HTTP admin API, scheduler)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── BackupService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── RecordSource (persistence/)  ── PostgreSQL
//!     ├── ArchiveWriter (archive/)     ── local filesystem
//!     ├── Replicator (replication/)    ── object storage
//!     └── RetentionManager (retention)
//! ```

pub mod api;
pub mod app_state;
pub mod archive;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod replication;
pub mod retention;
pub mod service;
