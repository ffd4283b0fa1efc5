//! The record source seam.
//!
//! [`RecordSource`] is the only thing the engine needs from the relational
//! store: a complete, ordered read of the record set, optionally restricted
//! to a trailing window. [`InMemorySource`] backs unit tests.

use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::domain::Inquiry;
use crate::error::BackupError;

/// Read-only, ordered access to inquiry records.
///
/// Both operations return records ordered by `created_at` descending and
/// must surface any transport, query or decode failure as
/// [`BackupError::Source`], never as a shorter or empty result.
pub trait RecordSource: Send + Sync {
    /// Returns every record.
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Inquiry>, BackupError>> + Send;

    /// Returns records created at or after `since`.
    fn fetch_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Inquiry>, BackupError>> + Send;
}

/// In-memory record source.
///
/// Clones share the same record set, so a test can keep a handle and
/// change the data between runs.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    state: Arc<Mutex<SourceState>>,
}

#[derive(Debug, Default)]
struct SourceState {
    records: Vec<Inquiry>,
    failure: Option<String>,
    fetches: usize,
}

impl InMemorySource {
    /// Creates a source holding `records`.
    #[must_use]
    pub fn new(records: Vec<Inquiry>) -> Self {
        let source = Self::default();
        source.set_records(records);
        source
    }

    /// Creates a source whose every fetch fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        let source = Self::default();
        source.set_failure(Some(message.into()));
        source
    }

    /// Replaces the record set.
    pub fn set_records(&self, records: Vec<Inquiry>) {
        if let Ok(mut state) = self.state.lock() {
            state.records = records;
        }
    }

    /// Makes subsequent fetches fail (or succeed again with `None`).
    pub fn set_failure(&self, failure: Option<String>) {
        if let Ok(mut state) = self.state.lock() {
            state.failure = failure;
        }
    }

    /// Number of fetches served so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.state.lock().map(|s| s.fetches).unwrap_or_default()
    }

    fn read(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Inquiry>, BackupError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| BackupError::Source("in-memory source poisoned".to_string()))?;
        state.fetches = state.fetches.saturating_add(1);
        if let Some(message) = &state.failure {
            return Err(BackupError::Source(message.clone()));
        }
        let mut records: Vec<Inquiry> = state
            .records
            .iter()
            .filter(|r| since.is_none_or(|s| r.created_at >= s))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }
}

impl RecordSource for InMemorySource {
    async fn fetch_all(&self) -> Result<Vec<Inquiry>, BackupError> {
        self.read(None)
    }

    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<Inquiry>, BackupError> {
        self.read(Some(since))
    }
}
