//! Supervisor-wide configuration.
//!
//! Bundles the thresholds, timeouts, and filesystem roots that the source
//! kept as process-wide constants, so tests can exercise the autoscaler and
//! pool manager against arbitrary values instead of a single hardcoded set.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_high() -> f64 {
    90.0
}

fn default_low() -> f64 {
    0.15
}

fn default_worker_timeout_ticks() -> u32 {
    30
}

fn default_timeout_to_grow_up() -> u32 {
    5
}

fn default_tick_interval_secs() -> u64 {
    1
}

fn default_runtime_image() -> String {
    "zion-runtime:latest".to_string()
}

fn default_pool_root() -> PathBuf {
    PathBuf::from("/var/lib/zion/pool")
}

fn default_workers_root() -> PathBuf {
    PathBuf::from("/var/lib/zion/workers")
}

fn default_functions_root() -> PathBuf {
    PathBuf::from("/var/lib/zion/functions")
}

fn default_runtime_image_root() -> PathBuf {
    PathBuf::from("/var/lib/zion/runtime-image")
}

/// All tunables and filesystem roots the supervisor needs, gathered into
/// one object so no component reaches for a process-global constant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Number of sandbox slots to maintain; one per CPU core when unset.
    #[serde(default)]
    pub n_cpu: Option<u32>,

    /// Mean CPU-percent threshold above which a function is a scale-up
    /// candidate. Source default: 90.
    #[serde(default = "default_high")]
    pub high: f64,

    /// Mean CPU-percent threshold below which a lone active worker is
    /// drained. Source default: 0.15.
    #[serde(default = "default_low")]
    pub low: f64,

    /// Ticks a cooling worker survives before the Reaper kills it.
    /// Source default: 30.
    #[serde(default = "default_worker_timeout_ticks")]
    pub worker_timeout_ticks: u32,

    /// Consecutive high-load ticks required before a scale-up fires.
    /// Source default: 5.
    #[serde(default = "default_timeout_to_grow_up")]
    pub timeout_to_grow_up: u32,

    /// Period of the Monitor, Autoscaler, and Reaper ticks.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Image reference used to seed each slot's `runtime` directory and run
    /// its container.
    #[serde(default = "default_runtime_image")]
    pub runtime_image: String,

    /// Root directory under which slot directories (`zion_<i>`) live.
    #[serde(default = "default_pool_root")]
    pub pool_root: PathBuf,

    /// Root directory under which per-function worker symlinks live.
    #[serde(default = "default_workers_root")]
    pub workers_root: PathBuf,

    /// Root directory of the function artifact store.
    #[serde(default = "default_functions_root")]
    pub functions_root: PathBuf,

    /// Directory seeding a fresh slot's `runtime` subdirectory.
    #[serde(default = "default_runtime_image_root")]
    pub runtime_image_root: PathBuf,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            n_cpu: None,
            high: default_high(),
            low: default_low(),
            worker_timeout_ticks: default_worker_timeout_ticks(),
            timeout_to_grow_up: default_timeout_to_grow_up(),
            tick_interval_secs: default_tick_interval_secs(),
            runtime_image: default_runtime_image(),
            pool_root: default_pool_root(),
            workers_root: default_workers_root(),
            functions_root: default_functions_root(),
            runtime_image_root: default_runtime_image_root(),
        }
    }
}

impl SupervisorConfig {
    /// Resolve the slot count: the configured override, or the host's CPU
    /// count.
    pub fn slot_count(&self) -> u32 {
        self.n_cpu.unwrap_or_else(|| num_cpus::get() as u32)
    }

    /// Directory for slot `i`: `<pool_root>/zion_<i>`.
    pub fn slot_dir(&self, slot_name: &str) -> PathBuf {
        self.pool_root.join(slot_name)
    }

    /// Directory holding `function`'s worker symlinks:
    /// `<workers_root>/<function>`.
    pub fn function_workers_dir(&self, function: &str) -> PathBuf {
        self.workers_root.join(function)
    }

    /// The directory seeding a fresh slot's `runtime` subdirectory.
    pub fn runtime_image_root(&self) -> &Path {
        &self.runtime_image_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_source_constants() {
        let config = SupervisorConfig::default();
        assert_eq!(config.high, 90.0);
        assert_eq!(config.low, 0.15);
        assert_eq!(config.worker_timeout_ticks, 30);
        assert_eq!(config.timeout_to_grow_up, 5);
    }

    #[test]
    fn slot_count_falls_back_to_host_cpus() {
        let config = SupervisorConfig::default();
        assert!(config.slot_count() > 0);
    }

    #[test]
    fn slot_count_honors_override() {
        let mut config = SupervisorConfig::default();
        config.n_cpu = Some(4);
        assert_eq!(config.slot_count(), 4);
    }
}
