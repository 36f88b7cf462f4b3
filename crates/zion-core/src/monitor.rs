//! The Monitor: discovers registered workers and wires them into the
//! monitoring table.

use crate::monitoring::MonitoringTable;
use crate::slot_table::SlotTable;
use std::sync::Arc;
use tracing::{debug, warn};
use zion_common::FunctionName;
use zion_store::CoordinationStore;

/// Periodically discovers `(function, worker)` registrations in the
/// coordination store and ensures each is represented in the shared
/// monitoring table.
///
/// Never removes entries — that is the Sandbox Supervisor's job on stop.
/// Tolerates a transiently missing slot (recently killed, not yet
/// replaced) by skipping it for the tick.
pub struct Monitor {
    store: Arc<dyn CoordinationStore>,
    slots: Arc<SlotTable>,
    monitoring: Arc<MonitoringTable>,
}

impl Monitor {
    /// Construct a Monitor sharing the coordination store, slot table, and
    /// monitoring table with the rest of the supervisor.
    pub fn new(
        store: Arc<dyn CoordinationStore>,
        slots: Arc<SlotTable>,
        monitoring: Arc<MonitoringTable>,
    ) -> Self {
        Self {
            store,
            slots,
            monitoring,
        }
    }

    /// Run one discovery pass.
    pub async fn tick(&self) {
        let keys = match self.store.keys("workers:*").await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "monitor: failed to list workers:* keys, skipping tick");
                return;
            }
        };

        for key in keys {
            let Some(function) = FunctionName::from_workers_key(&key) else {
                continue;
            };

            let members = match self.store.zrange(&key).await {
                Ok(members) => members,
                Err(e) => {
                    warn!(function = %function, error = %e, "monitor: failed to list workers, skipping function");
                    continue;
                }
            };

            let known = self.monitoring.snapshot().await;
            let already_known = known.get(function.as_str());

            for slot_name in members {
                if already_known
                    .map(|slots| slots.contains_key(&slot_name))
                    .unwrap_or(false)
                {
                    continue;
                }

                let Some(supervisor) = self.slots.get_by_name(&slot_name).await else {
                    debug!(slot = %slot_name, "monitor: slot transiently missing, skipping");
                    continue;
                };

                let cpu = supervisor.last_cpu_percent().await;
                self.monitoring.update(function.as_str(), &slot_name, cpu).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SupervisorConfig;
    use crate::supervisor::SandboxSupervisor;
    use zion_common::SlotId;
    use zion_runtime::InMemoryRuntime;
    use zion_store::InMemoryStore;

    #[tokio::test]
    async fn tick_wires_newly_registered_worker_into_monitoring_table() {
        let store: Arc<dyn CoordinationStore> = Arc::new(InMemoryStore::new());
        let runtime: Arc<dyn zion_runtime::ContainerRuntime> = Arc::new(InMemoryRuntime::new());
        let monitoring = Arc::new(MonitoringTable::new());
        let slots = Arc::new(SlotTable::new());
        let config = Arc::new(SupervisorConfig::default());

        let slot_id = SlotId::new(0);
        let supervisor = Arc::new(SandboxSupervisor::new(
            slot_id,
            store.clone(),
            runtime,
            monitoring.clone(),
            config,
        ));
        slots.insert(slot_id, supervisor).await;

        store.zadd("workers:fn-a", "zion_0", 0.0).await.unwrap();

        let monitor = Monitor::new(store, slots, monitoring.clone());
        monitor.tick().await;

        let snap = monitoring.snapshot().await;
        assert!(snap["fn-a"].contains_key("zion_0"));
    }

    #[tokio::test]
    async fn tick_skips_transiently_missing_slot() {
        let store: Arc<dyn CoordinationStore> = Arc::new(InMemoryStore::new());
        let monitoring = Arc::new(MonitoringTable::new());
        let slots = Arc::new(SlotTable::new());

        store.zadd("workers:fn-a", "zion_9", 0.0).await.unwrap();

        let monitor = Monitor::new(store, slots, monitoring.clone());
        monitor.tick().await;

        assert!(monitoring.snapshot().await.is_empty());
    }
}
