//! Registry of the supervisor's live Sandbox Supervisors, keyed by slot id.
//!
//! Shared by the Pool Manager (which populates it at start and replaces
//! entries after a Reaper-driven restart), the Dispatcher and Monitor
//! (which look a supervisor up by slot id or slot name), and nothing else —
//! the table itself never drives lifecycle, it only tracks who owns what.

use crate::supervisor::SandboxSupervisor;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use zion_common::{SlotId, SlotName};

/// `slot id -> supervisor` registry.
#[derive(Default)]
pub struct SlotTable {
    supervisors: RwLock<HashMap<SlotId, Arc<SandboxSupervisor>>>,
}

impl SlotTable {
    /// Construct an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the supervisor owning `slot_id`.
    pub async fn insert(&self, slot_id: SlotId, supervisor: Arc<SandboxSupervisor>) {
        self.supervisors.write().await.insert(slot_id, supervisor);
    }

    /// Look up the supervisor owning `slot_id`.
    pub async fn get(&self, slot_id: SlotId) -> Option<Arc<SandboxSupervisor>> {
        self.supervisors.read().await.get(&slot_id).cloned()
    }

    /// Look up the supervisor owning the slot named `name` (e.g. `zion_3`).
    /// Returns `None` if the name is malformed or the slot isn't
    /// registered — the Monitor tolerates either as a transiently missing
    /// slot and skips the tick.
    pub async fn get_by_name(&self, name: &str) -> Option<Arc<SandboxSupervisor>> {
        let slot_id = SlotName::new(name).parse_slot_id()?;
        self.get(slot_id).await
    }

    /// Every slot id currently registered.
    pub async fn ids(&self) -> Vec<SlotId> {
        self.supervisors.read().await.keys().copied().collect()
    }

    /// Number of slots currently registered.
    pub async fn len(&self) -> usize {
        self.supervisors.read().await.len()
    }

    /// Whether the table has no registered slots.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SupervisorConfig;
    use crate::monitoring::MonitoringTable;
    use std::sync::Arc;
    use zion_runtime::InMemoryRuntime;
    use zion_store::InMemoryStore;

    fn supervisor(slot_id: SlotId) -> Arc<SandboxSupervisor> {
        Arc::new(SandboxSupervisor::new(
            slot_id,
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryRuntime::new()),
            Arc::new(MonitoringTable::new()),
            Arc::new(SupervisorConfig::default()),
        ))
    }

    #[tokio::test]
    async fn insert_then_get_by_id_and_name() {
        let table = SlotTable::new();
        let id = SlotId::new(3);
        table.insert(id, supervisor(id)).await;
        assert!(table.get(id).await.is_some());
        assert!(table.get_by_name("zion_3").await.is_some());
    }

    #[tokio::test]
    async fn get_by_malformed_name_is_none() {
        let table = SlotTable::new();
        assert!(table.get_by_name("not_a_slot").await.is_none());
    }

    #[tokio::test]
    async fn ids_reflects_insertions() {
        let table = SlotTable::new();
        table.insert(SlotId::new(0), supervisor(SlotId::new(0))).await;
        table.insert(SlotId::new(1), supervisor(SlotId::new(1))).await;
        let mut ids = table.ids().await;
        ids.sort();
        assert_eq!(ids, vec![SlotId::new(0), SlotId::new(1)]);
    }
}
