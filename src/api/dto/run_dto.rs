//! Request bodies for run-triggering endpoints.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::config::MAX_EXPORT_DAYS;
use crate::error::BackupError;

/// Body of `POST /api/v1/exports`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ExportRequest {
    /// Window size in days; the server default applies when omitted.
    #[serde(default)]
    #[schema(minimum = 1, maximum = 3650)]
    pub days: Option<u32>,
}

impl ExportRequest {
    /// Resolves the window, falling back to `default_days`.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::InvalidRequest`] if `days` is outside
    /// `1..=MAX_EXPORT_DAYS`.
    pub fn resolve_days(&self, default_days: u32) -> Result<u32, BackupError> {
        let days = self.days.unwrap_or(default_days);
        if (1..=MAX_EXPORT_DAYS).contains(&days) {
            Ok(days)
        } else {
            Err(BackupError::InvalidRequest(format!(
                "days must be between 1 and {MAX_EXPORT_DAYS}, got {days}"
            )))
        }
    }
}
