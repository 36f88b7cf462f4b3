//! CPU statistics decoding.
//!
//! The container runtime reports usage as cumulative counters, so a single
//! sample is meaningless on its own — the CPU percentage requires the
//! delta between two consecutive samples.

use serde::{Deserialize, Serialize};

/// One decoded usage sample from the runtime's stats stream, carrying only
/// the fields the CPU percentage formula needs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CpuSample {
    pub total_usage: u64,
    pub system_cpu_usage: u64,
}

impl CpuSample {
    /// Extract the fields this crate cares about from a raw Docker stats
    /// JSON document's `cpu_stats` (or `precpu_stats`) object.
    pub fn from_docker_stats(stats: &bollard::container::Stats) -> Option<Self> {
        let total_usage = stats.cpu_stats.cpu_usage.total_usage;
        let system_cpu_usage = stats.cpu_stats.system_cpu_usage?;
        Some(Self {
            total_usage,
            system_cpu_usage,
        })
    }

    /// Extract the previous sample's fields from the same stats document's
    /// `precpu_stats` object.
    pub fn prev_from_docker_stats(stats: &bollard::container::Stats) -> Option<Self> {
        let total_usage = stats.precpu_stats.cpu_usage.total_usage;
        let system_cpu_usage = stats.precpu_stats.system_cpu_usage?;
        Some(Self {
            total_usage,
            system_cpu_usage,
        })
    }
}

/// Compute CPU percentage from two consecutive samples:
/// `(cpu_delta / system_delta) * 100 * n_cpu`, rounded to two decimals.
///
/// Returns `None` if either delta can't be computed meaningfully — in
/// particular a zero `system_delta`, which would otherwise divide by zero.
/// Callers should skip the tick entirely when this returns `None`.
pub fn cpu_percent(current: CpuSample, previous: CpuSample, n_cpu: u32) -> Option<f64> {
    let cpu_delta = current.total_usage.checked_sub(previous.total_usage)?;
    let system_delta = current
        .system_cpu_usage
        .checked_sub(previous.system_cpu_usage)?;
    if system_delta == 0 {
        return None;
    }
    let raw = (cpu_delta as f64 / system_delta as f64) * 100.0 * n_cpu as f64;
    Some((raw * 100.0).round() / 100.0)
}
