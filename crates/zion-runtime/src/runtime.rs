//! The `ContainerRuntime` trait: the narrow container lifecycle and
//! statistics surface the supervisor needs.

use crate::config::ContainerSpec;
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Abstract container runtime. `DockerRuntime` is the production
/// implementation; `InMemoryRuntime` is a deterministic fake for tests.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Create and start a container from `spec`. Replaces any existing
    /// container of the same name first, mirroring `docker run --rm`-style
    /// idempotency expected by the Sandbox Supervisor on restart.
    async fn run(&self, spec: &ContainerSpec) -> Result<()>;

    /// Subscribe to the named container's CPU-percentage stream.
    ///
    /// Each item is one computed sample (already reduced from the pair of
    /// consecutive raw usage counters via [`crate::stats::cpu_percent`]).
    /// A tick with an unusable raw sample (missing fields, zero
    /// `system_delta`) is simply absent from the stream rather than
    /// surfaced as an error. The stream ends when the container stops or
    /// is removed.
    fn stats(&self, name: &str) -> BoxStream<'static, Result<f64>>;

    /// List the names of every container known to the runtime, running or
    /// not.
    async fn list_all(&self) -> Result<Vec<String>>;

    /// Force-remove the named container. Idempotent: removing an absent
    /// container is not an error.
    async fn remove(&self, name: &str) -> Result<()>;
}
