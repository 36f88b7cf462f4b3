//! Loading [`zion_core::SupervisorConfig`] from a TOML file with
//! environment-variable overrides, mirroring the teacher pack's
//! `PlatformConfig::from_file` use of the `config` crate.

use anyhow::{Context, Result};
use std::path::Path;
use zion_core::SupervisorConfig;

/// Default location for the supervisor's TOML configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/zion/supervisor.toml";

/// Load a [`SupervisorConfig`], layering in order:
/// 1. The struct's serde defaults.
/// 2. `path`, if it exists (a TOML file; missing is not an error — the
///    service runs on defaults alone in that case).
/// 3. Environment variables prefixed `ZION_`, double-underscore separated
///    (e.g. `ZION_HIGH=85`, `ZION_POOL_ROOT=/srv/zion/pool`).
pub fn load(path: &Path) -> Result<SupervisorConfig> {
    let mut builder = config::Config::builder().add_source(
        config::Config::try_from(&SupervisorConfig::default())
            .context("serializing default SupervisorConfig")?,
    );

    if path.exists() {
        builder = builder.add_source(config::File::from(path));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("ZION")
            .separator("__")
            .try_parsing(true),
    );

    builder
        .build()
        .context("assembling supervisor configuration")?
        .try_deserialize()
        .context("deserializing supervisor configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load(Path::new("/nonexistent/path/supervisor.toml")).unwrap();
        assert_eq!(config.high, 90.0);
        assert_eq!(config.worker_timeout_ticks, 30);
    }

    #[test]
    fn file_overrides_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("supervisor.toml");
        std::fs::write(&path, "high = 80.0\nworker_timeout_ticks = 45\n").unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.high, 80.0);
        assert_eq!(config.worker_timeout_ticks, 45);
        // untouched fields keep their defaults
        assert_eq!(config.low, 0.15);
    }
}
