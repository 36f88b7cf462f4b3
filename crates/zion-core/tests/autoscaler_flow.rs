//! End-to-end exercise of cold start, dispatch, scale-up, scale-down, and
//! the Reaper's TTL-driven recycle, all against the in-memory fakes.

use std::sync::Arc;
use zion_common::FunctionName;
use zion_core::{
    Autoscaler, AutoscalerState, Dispatcher, Monitor, MonitoringTable, PoolManager, Reaper,
    SlotTable, SupervisorConfig,
};
use zion_runtime::{ContainerRuntime, InMemoryRuntime};
use zion_store::{CoordinationStore, InMemoryStore};

async fn seed_function(functions_root: &std::path::Path, function: &str) {
    let bin_dir = functions_root.join(function).join("bin");
    tokio::fs::create_dir_all(&bin_dir).await.unwrap();
    tokio::fs::write(bin_dir.join(function), b"#!/bin/sh\necho hi\n")
        .await
        .unwrap();

    let cache_dir = functions_root.join(function).join("cache");
    tokio::fs::create_dir_all(&cache_dir).await.unwrap();
    tokio::fs::write(
        cache_dir.join(format!("{function}.tar.gz")),
        format!(
            r#"{{"memory_mib": 128, "timeout_secs": 30, "main_class": "{function}.main"}}"#
        ),
    )
    .await
    .unwrap();
}

struct Harness {
    store: Arc<dyn CoordinationStore>,
    runtime: Arc<dyn ContainerRuntime>,
    monitoring: Arc<MonitoringTable>,
    slots: Arc<SlotTable>,
    config: Arc<SupervisorConfig>,
    pool: PoolManager,
    dispatcher: Arc<Dispatcher>,
    autoscaler_state: Arc<AutoscalerState>,
}

impl Harness {
    async fn new() -> (Self, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        tokio::fs::create_dir_all(tmp.path().join("runtime-image"))
            .await
            .unwrap();

        let config = Arc::new(SupervisorConfig {
            n_cpu: Some(4),
            pool_root: tmp.path().join("pool"),
            workers_root: tmp.path().join("workers"),
            functions_root: tmp.path().join("functions"),
            runtime_image_root: tmp.path().join("runtime-image"),
            ..SupervisorConfig::default()
        });

        let store: Arc<dyn CoordinationStore> = Arc::new(InMemoryStore::new());
        let runtime: Arc<dyn ContainerRuntime> = Arc::new(InMemoryRuntime::new());
        let monitoring = Arc::new(MonitoringTable::new());
        let slots = Arc::new(SlotTable::new());

        let pool = PoolManager::new(
            store.clone(),
            runtime.clone(),
            monitoring.clone(),
            config.clone(),
            slots.clone(),
        );

        let dispatcher = Arc::new(Dispatcher::new(
            store.clone(),
            config.clone(),
            pool.spawner().clone(),
        ));

        let autoscaler_state = Arc::new(AutoscalerState::new());

        (
            Self {
                store,
                runtime,
                monitoring,
                slots,
                config,
                pool,
                dispatcher,
                autoscaler_state,
            },
            tmp,
        )
    }

    fn autoscaler(&self) -> Autoscaler {
        Autoscaler::new(
            self.monitoring.clone(),
            self.autoscaler_state.clone(),
            self.store.clone(),
            self.dispatcher.clone(),
            self.config.clone(),
        )
    }

    fn reaper(&self) -> Reaper {
        Reaper::new(self.autoscaler_state.clone(), self.pool.spawner().clone())
    }

    fn monitor(&self) -> Monitor {
        Monitor::new(self.store.clone(), self.slots.clone(), self.monitoring.clone())
    }
}

#[tokio::test]
async fn cold_start_then_single_request() {
    let (h, tmp) = Harness::new().await;
    seed_function(&h.config.functions_root, "fn-a").await;

    h.pool.start().await.unwrap();
    assert_eq!(h.slots.len().await, 4);

    // supervisor.run() tasks are spawned in the background; give them a
    // beat to publish themselves as available.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let function = FunctionName::new("fn-a");
    h.dispatcher.start_worker(&function).await.unwrap();

    let members = h.store.zrange(&function.workers_key()).await.unwrap();
    assert_eq!(members.len(), 1);

    drop(tmp);
}

#[tokio::test]
async fn scale_up_after_sustained_high_load() {
    let (h, _tmp) = Harness::new().await;
    seed_function(&h.config.functions_root, "fn-a").await;

    h.pool.start().await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let function = FunctionName::new("fn-a");
    h.dispatcher.start_worker(&function).await.unwrap();

    let autoscaler = h.autoscaler();

    // Six consecutive high-load ticks: grow_counter reaches
    // TIMEOUT_TO_GROW_UP (5) on the 5th increment, firing scale-up on the
    // 6th tick's evaluation.
    for _ in 0..6 {
        h.monitoring.update("fn-a", "zion_0", 95.0).await;
        autoscaler.tick().await;
    }

    let members = h.store.zrange(&function.workers_key()).await.unwrap();
    assert_eq!(members.len(), 2, "a second worker should have been dispatched");
}

#[tokio::test]
async fn scale_down_moves_lowest_cpu_worker_to_cooling() {
    let (h, _tmp) = Harness::new().await;

    h.monitoring.update("fn-a", "zion_0", 20.0).await;
    h.monitoring.update("fn-a", "zion_1", 10.0).await;
    h.store.zadd("workers:fn-a", "zion_0", 0.0).await.unwrap();
    h.store.zadd("workers:fn-a", "zion_1", 0.0).await.unwrap();

    h.autoscaler().tick().await;

    let members = h.store.zrange("workers:fn-a").await.unwrap();
    assert_eq!(members, vec!["zion_0".to_string()]);

    let cooling = h
        .autoscaler_state
        .with_state(|s| s.cooling_of("fn-a"))
        .await;
    assert!(cooling.contains_key("zion_1"));
    assert_eq!(cooling["zion_1"], h.config.worker_timeout_ticks);
}

#[tokio::test]
async fn reaper_recycles_slot_after_ttl_expiry() {
    let (h, _tmp) = Harness::new().await;
    tokio::fs::create_dir_all(&h.config.pool_root).await.unwrap();

    let slot_id = zion_common::SlotId::new(0);
    h.pool.spawner().spawn(slot_id).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    h.autoscaler_state
        .with_state(|s| s.cool("fn-a", "zion_0", 1))
        .await;

    h.reaper().tick().await;

    // The slot was rebuilt and should have republished itself as
    // available after its fresh run() loop starts.
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let cooling = h.autoscaler_state.with_state(|s| s.cooling_of("fn-a")).await;
    assert!(cooling.is_empty());
}

#[tokio::test]
async fn monitor_wires_worker_registered_from_elsewhere() {
    let (h, _tmp) = Harness::new().await;
    let slot_id = zion_common::SlotId::new(2);
    h.pool.spawner().spawn(slot_id).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    h.store.zadd("workers:fn-b", "zion_2", 0.0).await.unwrap();

    h.monitor().tick().await;

    let snap = h.monitoring.snapshot().await;
    assert!(snap["fn-b"].contains_key("zion_2"));
}
