//! Supervisor core: the Pool Manager, Sandbox Supervisor, Dispatcher,
//! Monitor, and Autoscaler/Reaper that make up one node's function-execution
//! supervisor.
//!
//! Each component depends only on the `zion-store::CoordinationStore` and
//! `zion-runtime::ContainerRuntime` trait objects, never on a concrete
//! Redis or Docker client, so the whole control loop can be exercised in
//! tests against the in-memory fakes in those crates.

pub mod autoscaler;
pub mod bus;
pub mod config;
pub mod cooling;
pub mod dispatcher;
pub mod error;
pub mod layout;
pub mod metadata;
pub mod monitor;
pub mod monitoring;
pub mod pool;
pub mod slot_table;
pub mod supervisor;

pub use autoscaler::{Autoscaler, Reaper};
pub use config::SupervisorConfig;
pub use cooling::AutoscalerState;
pub use dispatcher::Dispatcher;
pub use error::{CoreError, Result};
pub use monitor::Monitor;
pub use monitoring::MonitoringTable;
pub use pool::{PoolManager, SupervisorSpawner};
pub use slot_table::SlotTable;
pub use supervisor::SandboxSupervisor;
