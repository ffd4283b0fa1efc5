//! inquiry-vault entry point.
//!
//! One-shot runs (`backup`, `export`, `run`) exit non-zero when the run
//! fails. `serve` starts the admin API and the periodic scheduler.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use axum::Router;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use inquiry_vault::api;
use inquiry_vault::app_state::AppState;
use inquiry_vault::config::{MAX_EXPORT_DAYS, VaultConfig};
use inquiry_vault::domain::EventBus;
use inquiry_vault::persistence::PostgresRecordSource;
use inquiry_vault::replication::{Replicator, S3RemoteStore};
use inquiry_vault::service::{BackupService, Schedule, run_scheduled};

type Service = BackupService<PostgresRecordSource, S3RemoteStore>;

#[derive(Parser)]
#[command(author, version, about = "Inquiry snapshot, replication and retention engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Full snapshot: extract, write, replicate, prune.
    Backup,
    /// Export records created in the last N days for review.
    Export {
        /// Window size in days.
        #[arg(long, default_value_t = 30, value_parser = export_days_parser())]
        days: u32,
    },
    /// Full backup followed by a window export.
    Run {
        /// Window size of the export; defaults to `VAULT_EXPORT_DAYS`.
        #[arg(long, value_parser = export_days_parser())]
        export_days: Option<u32>,
    },
    /// Serve the admin API and run backups on a schedule.
    Serve,
}

/// Same window bounds the admin API enforces.
fn export_days_parser() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=i64::from(MAX_EXPORT_DAYS))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Logs every run event until the bus closes.
fn spawn_event_logger(event_bus: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let detail = serde_json::to_string(&event).unwrap_or_default();
                    tracing::info!(
                        event = event.event_type_str(),
                        run_id = %event.run_id(),
                        %detail,
                        "backup event"
                    );
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "event logger lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn build_service(config: &VaultConfig, event_bus: EventBus) -> anyhow::Result<Service> {
    let database_url = config.require_database_url()?;
    let source = PostgresRecordSource::new(
        database_url,
        config.entity.clone(),
        Duration::from_secs(config.database_connect_timeout_secs),
    );
    let replicator = Replicator::from_config(config.remote.as_ref());
    if !replicator.is_enabled() {
        tracing::warn!("remote storage not configured, snapshots stay local only");
    }
    Ok(BackupService::new(config, source, replicator, event_bus))
}

async fn serve(config: &VaultConfig, service: Arc<Service>) -> anyhow::Result<()> {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let schedule = Schedule {
        period: Duration::from_secs(config.schedule_interval_secs),
        export_days: config.export_days,
    };
    let scheduler = tokio::spawn(run_scheduled(Arc::clone(&service), schedule, async move {
        let _ = shutdown_rx.wait_for(|stop| *stop).await;
    }));

    let app_state = AppState {
        service,
        default_export_days: config.export_days,
    };
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await
        .context("server error")?;

    let _ = shutdown_tx.send(true);
    let _ = scheduler.await;
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = VaultConfig::from_env().context("invalid configuration")?;
    tracing::info!(entity = %config.entity, backup_dir = %config.backup_dir.display(), "starting inquiry-vault");

    let event_bus = EventBus::default();
    let logger = spawn_event_logger(&event_bus);
    let service = Arc::new(build_service(&config, event_bus)?);

    let success = match cli.command {
        Command::Backup => {
            let report = service.run_full_backup().await;
            println!("{}", report.summary);
            report.success
        }
        Command::Export { days } => {
            let report = service.export_window(days).await;
            println!("{}", report.summary);
            report.success
        }
        Command::Run { export_days } => {
            let backup = service.run_full_backup().await;
            println!("{}", backup.summary);
            let export = service.export_window(export_days.unwrap_or(config.export_days)).await;
            println!("{}", export.summary);
            backup.success && export.success
        }
        Command::Serve => {
            serve(&config, Arc::clone(&service)).await?;
            true
        }
    };

    // Dropping the last service handle closes the bus and ends the logger.
    drop(service);
    let _ = logger.await;
    Ok(success)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let success = run(cli).await?;
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn export_days_default_and_bounds() {
        let Ok(cli) = Cli::try_parse_from(["inquiry-vault", "export"]) else {
            panic!("default export must parse");
        };
        assert!(matches!(cli.command, Command::Export { days: 30 }));

        let Ok(cli) = Cli::try_parse_from(["inquiry-vault", "export", "--days", "3650"]) else {
            panic!("upper bound must parse");
        };
        assert!(matches!(cli.command, Command::Export { days: 3650 }));

        for bad in ["0", "3651", "4294967295"] {
            assert!(Cli::try_parse_from(["inquiry-vault", "export", "--days", bad]).is_err());
            assert!(Cli::try_parse_from(["inquiry-vault", "run", "--export-days", bad]).is_err());
        }
    }
}
