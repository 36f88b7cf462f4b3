//! The `CoordinationStore` trait: the narrow set of atomic key-value
//! operations the supervisor needs from a shared, cross-node store.
//!
//! Modeled after the source's direct Redis calls (`lpop`, `rpush`, `zadd`,
//! `zrem`, `zrange`, `keys`, `delete`), kept as single-key atomic operations
//! with no cross-key transactions assumed, so any backend offering these
//! primitives (Redis today, something else tomorrow) can implement it.

use crate::error::Result;
use async_trait::async_trait;

/// Abstract coordination store used for the `available_dockers` queue and
/// the per-function `workers:<function>` sets.
///
/// Every method is a single atomic operation against one key. Callers must
/// not assume atomicity across multiple calls.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Pop and return the head of the FIFO queue `queue`, or `None` if empty.
    async fn lpop(&self, queue: &str) -> Result<Option<String>>;

    /// Push `value` onto the tail of the FIFO queue `queue`.
    async fn rpush(&self, queue: &str, value: &str) -> Result<()>;

    /// Add `member` to the sorted set `set` with the given `score`.
    ///
    /// Scores are unused by the supervisor (always `0`); the set serves as
    /// a presence set plus removal signal.
    async fn zadd(&self, set: &str, member: &str, score: f64) -> Result<()>;

    /// Remove `member` from the sorted set `set`. Idempotent: removing an
    /// absent member is not an error.
    async fn zrem(&self, set: &str, member: &str) -> Result<()>;

    /// List all members of the sorted set `set` in score order.
    async fn zrange(&self, set: &str) -> Result<Vec<String>>;

    /// List all keys matching the glob `pattern` (e.g. `"workers:*"`).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Delete `key` entirely. Idempotent: deleting an absent key is not an
    /// error.
    async fn delete(&self, key: &str) -> Result<()>;
}
