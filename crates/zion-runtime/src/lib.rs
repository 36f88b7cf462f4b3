//! Container runtime client for the Zion supervisor.
//!
//! Exposes the `ContainerRuntime` trait plus two implementations: a real
//! `DockerRuntime` for production and an `InMemoryRuntime` fake for tests.
//! The Sandbox Supervisor depends only on the trait, never on `bollard`
//! directly, so the CPU-percentage math and lifecycle logic in `zion-core`
//! can be exercised without a Docker daemon.

pub mod config;
pub mod docker;
pub mod error;
pub mod memory;
pub mod runtime;
pub mod stats;

pub use config::{ContainerSpec, RuntimeConfig};
pub use docker::DockerRuntime;
pub use error::{Result, RuntimeError};
pub use memory::InMemoryRuntime;
pub use runtime::ContainerRuntime;
pub use stats::{cpu_percent, CpuSample};
