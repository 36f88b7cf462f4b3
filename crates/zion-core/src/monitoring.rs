//! The monitoring table: a process-local service object mapping
//! `function -> (slot name -> cpu_percent)`.
//!
//! Exposed as `update`/`remove`/`snapshot` operations behind its own mutex,
//! decoupled from the Autoscaler's tick-level lock, so a Sandbox
//! Supervisor's stats write never has to wait on (or be serialized with) a
//! full autoscaler decision pass.

use std::collections::HashMap;
use tokio::sync::Mutex;

/// `function -> (slot name -> cpu_percent)`.
#[derive(Default)]
pub struct MonitoringTable {
    inner: Mutex<HashMap<String, HashMap<String, f64>>>,
}

impl MonitoringTable {
    /// Construct an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update `slot`'s CPU percentage under `function`. Called by
    /// the Monitor on first discovery and by each Sandbox Supervisor on
    /// every stats tick.
    pub async fn update(&self, function: &str, slot: &str, cpu_percent: f64) {
        let mut table = self.inner.lock().await;
        table
            .entry(function.to_string())
            .or_default()
            .insert(slot.to_string(), cpu_percent);
    }

    /// Remove `slot` from `function`'s entry, pruning the function's key
    /// entirely if it becomes empty. Called by a Sandbox Supervisor on
    /// stop.
    pub async fn remove(&self, function: &str, slot: &str) {
        let mut table = self.inner.lock().await;
        if let Some(slots) = table.get_mut(function) {
            slots.remove(slot);
            if slots.is_empty() {
                table.remove(function);
            }
        }
    }

    /// Snapshot of every function currently present, each with its full
    /// `slot -> cpu_percent` map. Used by the Autoscaler at the start of
    /// each tick so its decision pass runs against a consistent view
    /// without holding the table lock for the whole tick.
    pub async fn snapshot(&self) -> HashMap<String, HashMap<String, f64>> {
        self.inner.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_then_snapshot_reflects_latest_value() {
        let table = MonitoringTable::new();
        table.update("fn-a", "zion_0", 10.0).await;
        table.update("fn-a", "zion_0", 15.0).await;
        let snap = table.snapshot().await;
        assert_eq!(snap["fn-a"]["zion_0"], 15.0);
    }

    #[tokio::test]
    async fn remove_prunes_empty_function_key() {
        let table = MonitoringTable::new();
        table.update("fn-a", "zion_0", 10.0).await;
        table.remove("fn-a", "zion_0").await;
        let snap = table.snapshot().await;
        assert!(!snap.contains_key("fn-a"));
    }

    #[tokio::test]
    async fn remove_keeps_function_key_while_siblings_remain() {
        let table = MonitoringTable::new();
        table.update("fn-a", "zion_0", 10.0).await;
        table.update("fn-a", "zion_1", 20.0).await;
        table.remove("fn-a", "zion_0").await;
        let snap = table.snapshot().await;
        assert_eq!(snap["fn-a"].len(), 1);
        assert!(snap["fn-a"].contains_key("zion_1"));
    }
}
