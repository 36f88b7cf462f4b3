//! The Dispatcher: claims an available slot for a function and hands it
//! its function binary.

use crate::config::SupervisorConfig;
use crate::error::Result;
use crate::pool::SupervisorSpawner;
use std::sync::Arc;
use tracing::{info, warn};
use zion_common::{FunctionName, SlotName};
use zion_store::CoordinationStore;

/// Claims slots from `available_dockers` and turns them into registered
/// workers of a function.
pub struct Dispatcher {
    store: Arc<dyn CoordinationStore>,
    config: Arc<SupervisorConfig>,
    spawner: SupervisorSpawner,
}

impl Dispatcher {
    /// Construct a Dispatcher sharing the coordination store, config, and
    /// supervisor spawner with the rest of the supervisor.
    pub fn new(
        store: Arc<dyn CoordinationStore>,
        config: Arc<SupervisorConfig>,
        spawner: SupervisorSpawner,
    ) -> Self {
        Self {
            store,
            config,
            spawner,
        }
    }

    /// Start a new worker for `function`.
    ///
    /// Pops the head of `available_dockers`. If empty, returns `Ok(())`
    /// silently — the Autoscaler will retry on its next tick. Otherwise:
    /// symlinks the slot into the function's worker directory, loads the
    /// function into the slot, then registers the slot in `workers:<function>`.
    ///
    /// If `load_function` fails, the slot is torn down and rebuilt from
    /// scratch rather than left orphaned with a symlink and no registration
    /// (the slot was already popped from `available_dockers` and cannot be
    /// pushed back without risking it being handed out twice).
    pub async fn start_worker(&self, function: &FunctionName) -> Result<()> {
        let Some(slot_name) = self.store.lpop("available_dockers").await? else {
            return Ok(());
        };

        info!(function = %function, slot = %slot_name, "dispatching worker");

        let Some(slot_id) = SlotName::new(slot_name.as_str()).parse_slot_id() else {
            warn!(slot = %slot_name, "popped malformed slot name from available_dockers, dropping");
            return Ok(());
        };

        let workers_dir = self.config.function_workers_dir(function.as_str());
        tokio::fs::create_dir_all(&workers_dir).await?;
        let link = workers_dir.join(&slot_name);
        let target = self.config.slot_dir(&slot_name);
        // The symlink must exist before load_function, since the
        // in-sandbox agent resolves paths through it.
        if tokio::fs::symlink_metadata(&link).await.is_ok() {
            tokio::fs::remove_file(&link).await?;
        }
        tokio::fs::symlink(&target, &link).await?;

        let Some(supervisor) = self.spawner.slots().get(slot_id).await else {
            warn!(slot = %slot_name, "popped slot has no registered supervisor, rebuilding");
            self.spawner.spawn(slot_id).await;
            return Ok(());
        };

        match supervisor.load_function(function.clone()).await {
            Ok(()) => {
                // Last so the Monitor never observes a registered worker
                // whose sandbox hasn't yet been handed its function.
                self.store.zadd(&function.workers_key(), &slot_name, 0.0).await?;
                Ok(())
            }
            Err(e) => {
                warn!(function = %function, slot = %slot_name, error = %e, "load_function failed, rebuilding slot");
                supervisor.stop("load_function failed").await;
                self.spawner.spawn(slot_id).await;
                Err(e)
            }
        }
    }
}
