//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Run endpoints are mounted under `/api/v1`; `/health` sits at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::persistence::RecordSource;
use crate::replication::RemoteStore;

/// OpenAPI description of the admin API.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "inquiry-vault", description = "Snapshot, replication and retention admin API"),
    paths(
        handlers::system::health_handler,
        handlers::run::run_backup,
        handlers::run::run_export,
    ),
    tags(
        (name = "System", description = "Liveness"),
        (name = "Runs", description = "Backup and export runs"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router<R, S>() -> Router<AppState<R, S>>
where
    R: RecordSource + 'static,
    S: RemoteStore + 'static,
{
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
