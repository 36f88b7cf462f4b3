//! Zion supervisor daemon entry point.
//!
//! Wires together the production `RedisStore` and `DockerRuntime`
//! implementations, runs the Pool Manager's cold start, then drives the
//! Monitor, Autoscaler, and Reaper on their own ticking tasks until a
//! shutdown signal arrives, at which point it tears the pool back down.

mod settings;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use zion_core::{
    Autoscaler, AutoscalerState, Dispatcher, Monitor, MonitoringTable, PoolManager, Reaper,
    SlotTable,
};
use zion_runtime::{ContainerRuntime, DockerRuntime, RuntimeConfig};
use zion_store::{CoordinationStore, RedisConfig, RedisStore};

fn config_path_from_args() -> PathBuf {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return PathBuf::from(path);
            }
        } else if let Some(path) = arg.strip_prefix("--config=") {
            return PathBuf::from(path);
        }
    }
    PathBuf::from(settings::DEFAULT_CONFIG_PATH)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("zion_supervisord=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting zion supervisor");

    let config_path = config_path_from_args();
    let config = Arc::new(settings::load(&config_path).inspect_err(
        |e| tracing::error!(error = %e, path = %config_path.display(), "failed to load configuration"),
    )?);
    tracing::info!(slots = config.slot_count(), path = %config_path.display(), "configuration loaded");

    let redis_config = RedisConfig {
        url: std::env::var("ZION_REDIS_URL").unwrap_or_else(|_| RedisConfig::default().url),
        connect_timeout_secs: 5,
    };
    let runtime_config = RuntimeConfig {
        docker_host: std::env::var("ZION_DOCKER_HOST").ok(),
        connect_timeout_secs: 5,
        runtime_image: config.runtime_image.clone(),
    };

    let store: Arc<dyn CoordinationStore> = Arc::new(
        RedisStore::connect(&redis_config)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "failed to connect to coordination store"))?,
    );
    let runtime: Arc<dyn ContainerRuntime> = Arc::new(
        DockerRuntime::connect(&runtime_config, config.slot_count())
            .inspect_err(|e| tracing::error!(error = %e, "failed to connect to container runtime"))?,
    );

    let monitoring = Arc::new(MonitoringTable::new());
    let slots = Arc::new(SlotTable::new());
    let autoscaler_state = Arc::new(AutoscalerState::new());

    let pool = PoolManager::new(
        store.clone(),
        runtime.clone(),
        monitoring.clone(),
        config.clone(),
        slots.clone(),
    );

    tracing::info!("pool manager: cold start");
    pool.start().await?;

    let dispatcher = Arc::new(Dispatcher::new(
        store.clone(),
        config.clone(),
        pool.spawner().clone(),
    ));
    let monitor = Monitor::new(store.clone(), slots.clone(), monitoring.clone());
    let autoscaler = Autoscaler::new(
        monitoring.clone(),
        autoscaler_state.clone(),
        store.clone(),
        dispatcher.clone(),
        config.clone(),
    );
    let reaper = Reaper::new(autoscaler_state.clone(), pool.spawner().clone());

    let tick_interval = Duration::from_secs(config.tick_interval_secs);

    let monitor_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_interval);
        loop {
            interval.tick().await;
            monitor.tick().await;
        }
    });
    let autoscaler_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_interval);
        loop {
            interval.tick().await;
            autoscaler.tick().await;
        }
    });
    let reaper_task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick_interval);
        loop {
            interval.tick().await;
            reaper.tick().await;
        }
    });

    tracing::info!("supervisor ready");
    wait_for_shutdown_signal().await;
    tracing::info!("shutdown signal received, tearing down pool");

    monitor_task.abort();
    autoscaler_task.abort();
    reaper_task.abort();

    if let Err(e) = pool.teardown().await {
        tracing::error!(error = %e, "teardown encountered an error");
    }

    tracing::info!("supervisor shutdown complete");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
