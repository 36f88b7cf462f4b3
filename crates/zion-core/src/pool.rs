//! The Pool Manager: cold start and teardown of the whole slot pool.

use crate::config::SupervisorConfig;
use crate::error::Result;
use crate::monitoring::MonitoringTable;
use crate::slot_table::SlotTable;
use crate::supervisor::SandboxSupervisor;
use std::sync::Arc;
use tracing::{info, warn};
use zion_common::SlotId;
use zion_runtime::ContainerRuntime;
use zion_store::CoordinationStore;

/// Spawns Sandbox Supervisors and registers them into a shared
/// [`SlotTable`]. Used at pool start and whenever a slot needs to be
/// rebuilt from scratch — after a Reaper expiry or a failed
/// `load_function` — so both paths construct and register a supervisor
/// identically.
#[derive(Clone)]
pub struct SupervisorSpawner {
    store: Arc<dyn CoordinationStore>,
    runtime: Arc<dyn ContainerRuntime>,
    monitoring: Arc<MonitoringTable>,
    config: Arc<SupervisorConfig>,
    slots: Arc<SlotTable>,
}

impl SupervisorSpawner {
    /// Construct a spawner sharing the given collaborators.
    pub fn new(
        store: Arc<dyn CoordinationStore>,
        runtime: Arc<dyn ContainerRuntime>,
        monitoring: Arc<MonitoringTable>,
        config: Arc<SupervisorConfig>,
        slots: Arc<SlotTable>,
    ) -> Self {
        Self {
            store,
            runtime,
            monitoring,
            config,
            slots,
        }
    }

    /// The slot table this spawner registers into.
    pub fn slots(&self) -> &Arc<SlotTable> {
        &self.slots
    }

    /// Construct a fresh Sandbox Supervisor for `slot_id`, register it, and
    /// start its `run()` loop as a background task. Returns the registered
    /// supervisor.
    pub async fn spawn(&self, slot_id: SlotId) -> Arc<SandboxSupervisor> {
        let supervisor = Arc::new(SandboxSupervisor::new(
            slot_id,
            self.store.clone(),
            self.runtime.clone(),
            self.monitoring.clone(),
            self.config.clone(),
        ));
        self.slots.insert(slot_id, supervisor.clone()).await;

        let task_supervisor = supervisor.clone();
        tokio::spawn(async move {
            if let Err(e) = task_supervisor.run().await {
                warn!(slot = %task_supervisor.slot_name(), error = %e, "supervisor run loop exited with error");
            }
        });

        supervisor
    }
}

/// Owns cold start and teardown of the whole pool.
pub struct PoolManager {
    store: Arc<dyn CoordinationStore>,
    runtime: Arc<dyn ContainerRuntime>,
    config: Arc<SupervisorConfig>,
    spawner: SupervisorSpawner,
}

impl PoolManager {
    /// Construct a Pool Manager over the given collaborators. `slots` and
    /// `monitoring` are shared with the rest of the supervisor (Dispatcher,
    /// Monitor, Autoscaler).
    pub fn new(
        store: Arc<dyn CoordinationStore>,
        runtime: Arc<dyn ContainerRuntime>,
        monitoring: Arc<MonitoringTable>,
        config: Arc<SupervisorConfig>,
        slots: Arc<SlotTable>,
    ) -> Self {
        let spawner = SupervisorSpawner::new(
            store.clone(),
            runtime.clone(),
            monitoring,
            config.clone(),
            slots,
        );
        Self {
            store,
            runtime,
            config,
            spawner,
        }
    }

    /// The spawner shared with the Dispatcher and Reaper for slot rebuilds.
    pub fn spawner(&self) -> &SupervisorSpawner {
        &self.spawner
    }

    /// Cold start: tear down any leftover state from a previous crashed
    /// instance, then create `N` fresh slots where `N` is
    /// [`SupervisorConfig::slot_count`].
    ///
    /// Idempotent with respect to any previously crashed instance's
    /// leftovers — safe to call on every process start.
    pub async fn start(&self) -> Result<()> {
        info!("pool manager starting: tearing down any leftover state");
        self.teardown().await?;

        let n = self.config.slot_count();
        info!(slots = n, "creating sandbox slots");
        for i in 0..n {
            self.spawner.spawn(SlotId::new(i)).await;
        }

        Ok(())
    }

    /// Teardown: force-remove every `zion_*` container, clear the
    /// coordination store's `available_dockers` and `workers:*` keys, and
    /// wipe and recreate the pool and workers directory trees.
    ///
    /// Safe to run twice in a row: a second run finds nothing to remove
    /// and nothing to delete.
    pub async fn teardown(&self) -> Result<()> {
        let containers = self.runtime.list_all().await?;
        for name in containers.iter().filter(|n| n.starts_with("zion_")) {
            if let Err(e) = self.runtime.remove(name).await {
                warn!(container = %name, error = %e, "failed to remove leftover container");
            }
        }

        if let Err(e) = self.store.delete("available_dockers").await {
            warn!(error = %e, "failed to delete available_dockers key");
        }
        match self.store.keys("workers:*").await {
            Ok(keys) => {
                for key in keys {
                    if let Err(e) = self.store.delete(&key).await {
                        warn!(key = %key, error = %e, "failed to delete workers key");
                    }
                }
            }
            Err(e) => warn!(error = %e, "failed to list workers:* keys"),
        }

        for root in [&self.config.workers_root, &self.config.pool_root] {
            if tokio::fs::try_exists(root).await.unwrap_or(false) {
                if let Err(e) = tokio::fs::remove_dir_all(root).await {
                    warn!(path = %root.display(), error = %e, "failed to remove directory tree");
                }
            }
            tokio::fs::create_dir_all(root).await?;
        }

        Ok(())
    }
}
