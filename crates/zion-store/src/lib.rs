//! Coordination-store client for the Zion supervisor.
//!
//! Exposes the `CoordinationStore` trait plus two implementations: a real
//! `RedisStore` for production and an `InMemoryStore` fake for tests. Every
//! component in `zion-core` that needs to read or write the
//! `available_dockers` queue or a `workers:<function>` set depends on the
//! trait, never on Redis directly.

pub mod config;
pub mod error;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use config::RedisConfig;
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use redis_store::RedisStore;
pub use store::CoordinationStore;
