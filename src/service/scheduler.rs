//! Periodic backup runs for long-lived (`serve`) mode.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};

use super::BackupService;
use crate::persistence::RecordSource;
use crate::replication::RemoteStore;

/// What a scheduled tick does.
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    /// Time between ticks; the first tick fires immediately.
    pub period: Duration,
    /// Window of the export that follows each full backup.
    pub export_days: u32,
}

/// Runs a full backup followed by a window export on every tick until
/// `shutdown` resolves.
///
/// Ticks missed while a run is in progress are skipped rather than queued.
pub async fn run_scheduled<R, S, F>(service: Arc<BackupService<R, S>>, schedule: Schedule, shutdown: F)
where
    R: RecordSource,
    S: RemoteStore,
    F: Future<Output = ()>,
{
    let mut ticker = time::interval(schedule.period.max(Duration::from_secs(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                tracing::info!("scheduler stopped");
                return;
            }
            _ = ticker.tick() => {
                let backup = service.run_full_backup().await;
                let export = service.export_window(schedule.export_days).await;
                tracing::info!(
                    backup_ok = backup.success,
                    export_ok = export.success,
                    backup = %backup.summary,
                    export = %export.summary,
                    "scheduled run finished"
                );
            }
        }
    }
}
