//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::BackupService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug)]
pub struct AppState<R, S> {
    /// Backup service for all run orchestration.
    pub service: Arc<BackupService<R, S>>,
    /// Window used when an export request names no `days`.
    pub default_export_days: u32,
}

// Manual impl: the derive would demand `R: Clone, S: Clone`.
impl<R, S> Clone for AppState<R, S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            default_export_days: self.default_export_days,
        }
    }
}
