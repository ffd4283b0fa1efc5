//! Run handlers: trigger a full backup or a window export.
//!
//! Both endpoints block until the run finishes. Runs already in progress
//! (scheduled or HTTP-triggered) are waited for, not overlapped.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::ExportRequest;
use crate::app_state::AppState;
use crate::domain::{BackupReport, ExportReport};
use crate::error::{BackupError, ErrorResponse};
use crate::persistence::RecordSource;
use crate::replication::RemoteStore;

const fn run_status(success: bool) -> StatusCode {
    if success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// `POST /backups` — Run a full snapshot backup.
#[utoipa::path(
    post,
    path = "/api/v1/backups",
    tag = "Runs",
    summary = "Run a full backup",
    description = "Extracts every record, writes a timestamped snapshot, replicates it when remote storage is configured and prunes expired snapshots. Replication and pruning faults are reported in the body without failing the run.",
    responses(
        (status = 200, description = "Run succeeded (possibly with nothing to archive)", body = BackupReport),
        (status = 500, description = "Extraction or local write failed", body = BackupReport),
    )
)]
pub async fn run_backup<R, S>(State(state): State<AppState<R, S>>) -> impl IntoResponse
where
    R: RecordSource + 'static,
    S: RemoteStore + 'static,
{
    let report = state.service.run_full_backup().await;
    (run_status(report.success), Json(report))
}

/// `POST /exports` — Export records created within a recent window.
///
/// # Errors
///
/// Returns [`BackupError::InvalidRequest`] if `days` is out of range.
#[utoipa::path(
    post,
    path = "/api/v1/exports",
    tag = "Runs",
    summary = "Run a window export",
    description = "Writes the review projection of records created since midnight UTC `days` days ago to the export directory. Exports are never replicated or pruned.",
    request_body = ExportRequest,
    responses(
        (status = 200, description = "Export succeeded (possibly with nothing to export)", body = ExportReport),
        (status = 400, description = "Invalid window", body = ErrorResponse),
        (status = 500, description = "Extraction or local write failed", body = ExportReport),
    )
)]
pub async fn run_export<R, S>(
    State(state): State<AppState<R, S>>,
    Json(req): Json<ExportRequest>,
) -> Result<impl IntoResponse, BackupError>
where
    R: RecordSource + 'static,
    S: RemoteStore + 'static,
{
    let days = req.resolve_days(state.default_export_days)?;
    let report = state.service.export_window(days).await;
    Ok((run_status(report.success), Json(report)))
}

/// Run routes, nested under `/api/v1`.
pub fn routes<R, S>() -> Router<AppState<R, S>>
where
    R: RecordSource + 'static,
    S: RemoteStore + 'static,
{
    Router::new()
        .route("/backups", post(run_backup::<R, S>))
        .route("/exports", post(run_export::<R, S>))
}
