//! In-memory `CoordinationStore` fake for unit and integration tests.

use crate::error::Result;
use crate::store::CoordinationStore;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Default)]
struct State {
    queues: HashMap<String, VecDeque<String>>,
    sets: HashMap<String, Vec<(String, f64)>>,
    keys: HashMap<String, String>,
}

/// A `CoordinationStore` backed by in-process data structures.
///
/// Used in place of `RedisStore` wherever tests need deterministic,
/// network-free coordination-store behavior. Mirrors the shape of the real
/// store exactly: queues are FIFO, sets are score-ordered, plain keys are a
/// flat map.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// Construct an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CoordinationStore for InMemoryStore {
    async fn lpop(&self, queue: &str) -> Result<Option<String>> {
        let mut state = self.state.lock().unwrap();
        Ok(state.queues.get_mut(queue).and_then(|q| q.pop_front()))
    }

    async fn rpush(&self, queue: &str, value: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .queues
            .entry(queue.to_string())
            .or_default()
            .push_back(value.to_string());
        Ok(())
    }

    async fn zadd(&self, set: &str, member: &str, score: f64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let entries = state.sets.entry(set.to_string()).or_default();
        entries.retain(|(m, _)| m != member);
        entries.push((member.to_string(), score));
        entries.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
        Ok(())
    }

    async fn zrem(&self, set: &str, member: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(entries) = state.sets.get_mut(set) {
            entries.retain(|(m, _)| m != member);
        }
        Ok(())
    }

    async fn zrange(&self, set: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .sets
            .get(set)
            .map(|entries| entries.iter().map(|(m, _)| m.clone()).collect())
            .unwrap_or_default())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        let prefix = pattern.trim_end_matches('*');
        Ok(state
            .keys
            .keys()
            .chain(state.sets.keys())
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.keys.remove(key);
        state.sets.remove(key);
        state.queues.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queue_is_fifo() {
        let store = InMemoryStore::new();
        store.rpush("available_dockers", "zion_0").await.unwrap();
        store.rpush("available_dockers", "zion_1").await.unwrap();
        assert_eq!(
            store.lpop("available_dockers").await.unwrap(),
            Some("zion_0".to_string())
        );
        assert_eq!(
            store.lpop("available_dockers").await.unwrap(),
            Some("zion_1".to_string())
        );
        assert_eq!(store.lpop("available_dockers").await.unwrap(), None);
    }

    #[tokio::test]
    async fn zadd_is_idempotent_on_member() {
        let store = InMemoryStore::new();
        store.zadd("workers:fn-a", "zion_0", 0.0).await.unwrap();
        store.zadd("workers:fn-a", "zion_0", 0.0).await.unwrap();
        assert_eq!(
            store.zrange("workers:fn-a").await.unwrap(),
            vec!["zion_0".to_string()]
        );
    }

    #[tokio::test]
    async fn zrem_absent_member_is_not_an_error() {
        let store = InMemoryStore::new();
        store.zrem("workers:fn-a", "zion_0").await.unwrap();
    }

    #[tokio::test]
    async fn keys_filters_by_prefix() {
        let store = InMemoryStore::new();
        store.zadd("workers:fn-a", "zion_0", 0.0).await.unwrap();
        store.zadd("workers:fn-b", "zion_1", 0.0).await.unwrap();
        let mut found = store.keys("workers:*").await.unwrap();
        found.sort();
        assert_eq!(found, vec!["workers:fn-a".to_string(), "workers:fn-b".to_string()]);
    }
}
