//! Persistence layer: read-only access to the inquiry store.
//!
//! Provides the [`RecordSource`] trait the engine extracts records through,
//! a PostgreSQL implementation backed by `sqlx`, and an in-memory source
//! for tests.

pub mod postgres;
pub mod source;

pub use postgres::PostgresRecordSource;
pub use source::{InMemorySource, RecordSource};
