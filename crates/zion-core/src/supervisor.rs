//! The Sandbox Supervisor: one per slot, owning the lifecycle of the
//! container bound to that slot.

use crate::bus::{self, Datagram};
use crate::config::SupervisorConfig;
use crate::error::Result;
use crate::layout::{FunctionArtifacts, SlotLayout};
use crate::metadata;
use crate::monitoring::MonitoringTable;
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use zion_common::{FunctionName, SlotId};
use zion_runtime::{ContainerRuntime, ContainerSpec};
use zion_store::CoordinationStore;

/// Fixed in-container mount point for a slot's directory tree.
const SLOT_MOUNT_POINT: &str = "/mnt/zion";

/// Long-lived owner of one slot's container.
///
/// `run()` is the supervisor's main loop: it does not return until the
/// container exits or is forcibly removed. `stop()` and `load_function()`
/// are called from other tasks (the Reaper and the Dispatcher,
/// respectively) while `run()` is in flight.
pub struct SandboxSupervisor {
    slot_id: SlotId,
    store: Arc<dyn CoordinationStore>,
    runtime: Arc<dyn ContainerRuntime>,
    monitoring: Arc<MonitoringTable>,
    config: Arc<SupervisorConfig>,
    function: Mutex<Option<FunctionName>>,
    last_cpu_percent: Mutex<f64>,
    stopped: AtomicBool,
}

impl SandboxSupervisor {
    /// Construct a supervisor for `slot_id`. Does not launch anything —
    /// call [`run`](Self::run) to start the container and begin ingesting
    /// stats.
    pub fn new(
        slot_id: SlotId,
        store: Arc<dyn CoordinationStore>,
        runtime: Arc<dyn ContainerRuntime>,
        monitoring: Arc<MonitoringTable>,
        config: Arc<SupervisorConfig>,
    ) -> Self {
        Self {
            slot_id,
            store,
            runtime,
            monitoring,
            config,
            function: Mutex::new(None),
            last_cpu_percent: Mutex::new(0.0),
            stopped: AtomicBool::new(false),
        }
    }

    /// The slot id this supervisor owns.
    pub fn slot_id(&self) -> SlotId {
        self.slot_id
    }

    /// The slot's coordination-store-visible name, e.g. `zion_3`.
    pub fn slot_name(&self) -> String {
        self.slot_id.name().to_string()
    }

    fn layout(&self) -> SlotLayout {
        SlotLayout::new(self.config.slot_dir(&self.slot_name()))
    }

    /// The function this slot is currently assigned to, if any.
    pub async fn assigned_function(&self) -> Option<FunctionName> {
        self.function.lock().await.clone()
    }

    /// The most recently sampled CPU percentage.
    pub async fn last_cpu_percent(&self) -> f64 {
        *self.last_cpu_percent.lock().await
    }

    /// Run the slot: prepare its directory tree, launch its container,
    /// publish it as available, then stream stats until the container
    /// dies.
    ///
    /// Returns once the stats stream ends, which happens naturally when
    /// the container is removed (by `stop`, by the Reaper, or out from
    /// under the supervisor).
    pub async fn run(&self) -> Result<()> {
        let slot_name = self.slot_name();
        let layout = self.layout();

        info!(slot = %slot_name, "preparing slot directory tree");
        layout.prepare(&self.config.runtime_image_root()).await?;

        let spec = ContainerSpec {
            name: slot_name.clone(),
            image: self.config.runtime_image.clone(),
            cpuset: self.slot_id.index().to_string(),
            bind_mounts: vec![(layout.root().display().to_string(), SLOT_MOUNT_POINT.to_string())],
            command: vec![
                format!("{SLOT_MOUNT_POINT}/runtime/agent"),
                self.slot_id.index().to_string(),
            ],
        };

        info!(slot = %slot_name, cpuset = %spec.cpuset, "launching container");
        self.runtime.run(&spec).await?;

        if let Err(e) = self.store.rpush("available_dockers", &slot_name).await {
            warn!(slot = %slot_name, error = %e, "failed to publish slot as available");
        }

        let mut stats = self.runtime.stats(&slot_name);
        while let Some(sample) = stats.next().await {
            match sample {
                Ok(cpu_percent) => {
                    *self.last_cpu_percent.lock().await = cpu_percent;
                    if let Some(function) = self.function.lock().await.clone() {
                        self.monitoring
                            .update(function.as_str(), &slot_name, cpu_percent)
                            .await;
                    }
                }
                Err(e) => {
                    debug!(slot = %slot_name, error = %e, "stats sample unusable, skipping tick");
                }
            }
        }

        self.stopped.store(true, Ordering::Relaxed);
        info!(slot = %slot_name, "container exited, stats stream ended");
        Ok(())
    }

    /// Idempotent teardown: mark stopped, unregister from the coordination
    /// store and monitoring table, remove the container, and remove the
    /// per-function worker symlink if present. All removal steps suppress
    /// not-found errors.
    pub async fn stop(&self, reason: &str) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }

        let slot_name = self.slot_name();
        info!(slot = %slot_name, reason, "stopping sandbox");

        let function = self.function.lock().await.take();

        if let Some(function) = &function {
            if let Err(e) = self.store.zrem(&function.workers_key(), &slot_name).await {
                warn!(slot = %slot_name, error = %e, "failed to remove slot from workers set");
            }

            let symlink = self
                .config
                .function_workers_dir(function.as_str())
                .join(&slot_name);
            match tokio::fs::symlink_metadata(&symlink).await {
                Ok(_) => {
                    if let Err(e) = tokio::fs::remove_file(&symlink).await {
                        warn!(slot = %slot_name, path = %symlink.display(), error = %e, "failed to remove worker symlink");
                    }
                }
                Err(_) => { /* already gone */ }
            }

            self.monitoring.remove(function.as_str(), &slot_name).await;
        }

        if let Err(e) = self.runtime.remove(&slot_name).await {
            warn!(slot = %slot_name, error = %e, "failed to remove container");
        }
    }

    /// Load `function` into this slot: copy its binary, validate its
    /// sidecar metadata, open its append log, and send the "execute"
    /// control message.
    ///
    /// A missing metadata field or a failed channel send is a hard
    /// failure; the caller (the Dispatcher) is responsible for deciding
    /// whether to tear the slot down and restart it.
    pub async fn load_function(&self, function: FunctionName) -> Result<()> {
        let slot_name = self.slot_name();
        let layout = self.layout();
        let artifacts = FunctionArtifacts::new(&self.config.functions_root, function.as_str());

        debug!(slot = %slot_name, function = %function, "copying function binary");
        let dest = layout.function_dir().join(function.as_str());
        tokio::fs::copy(artifacts.binary_path(), &dest).await?;

        let meta = metadata::load(function.as_str(), &artifacts.metadata_path()).await?;

        if let Some(parent) = artifacts.log_path().parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let _log = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(artifacts.log_path())
            .await?;

        let datagram = Datagram::execute(dest, function.as_str().to_string(), meta.main_class);
        bus::send(&layout.channel_pipe(), &datagram).await?;

        *self.function.lock().await = Some(function);
        Ok(())
    }
}
