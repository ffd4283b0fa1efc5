//! REST endpoint handlers organized by resource.

pub mod run;
pub mod system;

use axum::Router;

use crate::app_state::AppState;
use crate::persistence::RecordSource;
use crate::replication::RemoteStore;

/// Composes all resource routes under `/api/v1`.
pub fn routes<R, S>() -> Router<AppState<R, S>>
where
    R: RecordSource + 'static,
    S: RemoteStore + 'static,
{
    Router::new().merge(run::routes())
}
