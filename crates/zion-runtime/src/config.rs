//! Settings needed to reach the container runtime and to launch slot
//! containers consistently.

use serde::{Deserialize, Serialize};

fn default_docker_host() -> Option<String> {
    None
}

fn default_connect_timeout_secs() -> u64 {
    5
}

/// Connection settings for the Docker-compatible runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Docker daemon address, e.g. `unix:///var/run/docker.sock`. `None`
    /// uses bollard's platform default (local socket / named pipe).
    #[serde(default = "default_docker_host")]
    pub docker_host: Option<String>,

    /// How long to wait for the daemon to answer a ping before giving up.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Image reference used as the slot's `runtime` image.
    pub runtime_image: String,
}

/// Parameters for launching one slot's container.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    /// Container name, e.g. `zion_3`.
    pub name: String,
    /// Image reference to run.
    pub image: String,
    /// CPU core to pin the container to, e.g. `"3"` for `--cpuset-cpus 3`.
    pub cpuset: String,
    /// Host path to mount, and the in-container path to mount it at.
    pub bind_mounts: Vec<(String, String)>,
    /// Command to run as the container entrypoint.
    pub command: Vec<String>,
}
