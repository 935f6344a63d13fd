use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use winding_floor::adapters::inbound::{FileSnapshotStore, InMemorySnapshotStore, JsonFloorSource, SeedFloorSource};
use winding_floor::adapters::outbound::{init_buffered_logger, init_combined_logger, init_console_logger};
use winding_floor::application::FloorService;
use winding_floor::config::{RunConfig, StoreBackend};
use winding_floor::domains::floor::{FloorModelSource, FloorSettings};
use winding_floor::{ApplicationResult, Config, SnapshotStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting winding floor simulator");

    let config_path = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("config.toml"));
    let config = Config::load(Some(config_path.as_path()))?;
    info!(path = %config_path.display(), store = ?config.store.backend, "configuration loaded");

    let bridge = match &config.logging.file {
        Some(path) => init_combined_logger(path),
        None => init_console_logger(),
    };
    let logger = init_buffered_logger(bridge, config.logging.buffer_capacity);

    let source: Arc<dyn FloorModelSource> = match &config.source.models_path {
        Some(path) => Arc::new(JsonFloorSource::new(path.clone())),
        None => Arc::new(SeedFloorSource::default()),
    };
    let store = build_store(&config).await?;

    let mut service = FloorService::new(FloorSettings::from(&config.simulation), source, store, logger);
    service.start().await?;

    tokio::select! {
        result = run_floor(&mut service, &config.run) => result?,
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }

    for (agent_id, totals) in service.utilization_report() {
        info!(
            agent = %agent_id,
            idle_ms = totals.idle_ms,
            moving_ms = totals.moving_ms,
            busy_ms = totals.busy_ms,
            "utilization"
        );
    }
    service.stop().await?;
    match service.latest_snapshot().await {
        Ok(Some(batch)) => info!(sim_time_ms = batch.sim_time_ms, agents = batch.len(), "last stored snapshot"),
        Ok(None) => info!("no snapshot stored"),
        Err(e) => warn!(error = %e, "snapshot store unreadable"),
    }
    info!(
        persisted = service.persisted_batches(),
        failed = service.failed_batches(),
        "Shutting down winding floor simulator"
    );
    Ok(())
}

async fn build_store(config: &Config) -> Result<Arc<dyn SnapshotStore>, Box<dyn Error>> {
    let store: Arc<dyn SnapshotStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(InMemorySnapshotStore::new()),
        StoreBackend::File => Arc::new(FileSnapshotStore::new(config.store.path.clone())),
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres => Arc::new(
            winding_floor::adapters::outbound::PostgresSnapshotStore::new(config.store.postgres.clone()).await?,
        ),
        #[cfg(not(feature = "postgres"))]
        StoreBackend::Postgres => {
            warn!("built without the postgres feature, keeping snapshots in memory");
            Arc::new(InMemorySnapshotStore::new())
        }
    };
    Ok(store)
}

/// Run in report-sized chunks until the horizon, logging progress after each.
async fn run_floor(service: &mut FloorService, run: &RunConfig) -> ApplicationResult<()> {
    let chunk = run.report_every_ms.max(1);
    let mut remaining = run.run_for_ms;
    loop {
        let span = remaining.map_or(chunk, |left| left.min(chunk));
        if span == 0 {
            return Ok(());
        }
        if run.realtime {
            service.run_realtime(Some(span)).await?;
        } else {
            service.run_for(span).await?;
        }

        let view = service.view();
        info!(
            sim_time_ms = view.time_ms,
            open_tasks = view.open_tasks.len(),
            persisted = service.persisted_batches(),
            "progress"
        );
        if let Some(left) = remaining.as_mut() {
            *left -= span;
        }
    }
}
