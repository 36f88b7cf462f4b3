//! `ContainerRuntime` implementation backed by a local Docker daemon.

use crate::config::{ContainerSpec, RuntimeConfig};
use crate::error::{Result, RuntimeError};
use crate::runtime::ContainerRuntime;
use crate::stats::{cpu_percent, CpuSample};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, RemoveContainerOptions,
    StartContainerOptions, Stats, StatsOptions,
};
use bollard::models::HostConfig;
use bollard::Docker;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::collections::HashMap;
use tracing::{debug, warn};

/// `ContainerRuntime` implementation talking to a real Docker daemon via
/// `bollard`.
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
    n_cpu: u32,
}

impl DockerRuntime {
    /// Connect to the Docker daemon described by `config`.
    pub fn connect(config: &RuntimeConfig, n_cpu: u32) -> Result<Self> {
        let docker = match &config.docker_host {
            Some(host) => Docker::connect_with_http(
                host,
                config.connect_timeout_secs,
                bollard::API_DEFAULT_VERSION,
            )?,
            None => Docker::connect_with_local_defaults()?,
        };
        Ok(Self { docker, n_cpu })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn run(&self, spec: &ContainerSpec) -> Result<()> {
        // Idempotent: a leftover container from a previous crash must not
        // block the new one from binding the name.
        self.remove(&spec.name).await?;

        let binds: Vec<String> = spec
            .bind_mounts
            .iter()
            .map(|(host, container)| format!("{host}:{container}"))
            .collect();

        let host_config = HostConfig {
            cpuset_cpus: Some(spec.cpuset.clone()),
            binds: Some(binds),
            ..Default::default()
        };

        let config = Config {
            image: Some(spec.image.clone()),
            cmd: Some(spec.command.clone()),
            host_config: Some(host_config),
            ..Default::default()
        };

        debug!(name = %spec.name, image = %spec.image, cpuset = %spec.cpuset, "creating container");
        self.docker
            .create_container(
                Some(CreateContainerOptions {
                    name: spec.name.clone(),
                    platform: None,
                }),
                config,
            )
            .await?;

        self.docker
            .start_container(&spec.name, None::<StartContainerOptions<String>>)
            .await?;

        Ok(())
    }

    fn stats(&self, name: &str) -> BoxStream<'static, Result<f64>> {
        let docker = self.docker.clone();
        let name = name.to_string();
        let n_cpu = self.n_cpu;

        let raw = async_stream::stream! {
            let options = Some(StatsOptions {
                stream: true,
                one_shot: false,
            });
            let mut inner = docker.stats(&name, options);
            while let Some(item) = inner.next().await {
                yield item;
            }
        };

        let mapped = raw.filter_map(move |item: std::result::Result<Stats, bollard::errors::Error>| {
            let n_cpu = n_cpu;
            async move {
                match item {
                    Ok(stats) => {
                        let curr = CpuSample::from_docker_stats(&stats)?;
                        let prev = CpuSample::prev_from_docker_stats(&stats)?;
                        cpu_percent(curr, prev, n_cpu).map(Ok)
                    }
                    Err(e) => Some(Err(RuntimeError::from(e))),
                }
            }
        });

        Box::pin(mapped)
    }

    async fn list_all(&self) -> Result<Vec<String>> {
        let mut filters = HashMap::new();
        filters.insert("name".to_string(), vec!["zion_".to_string()]);
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: true,
                filters,
                ..Default::default()
            }))
            .await?;
        Ok(containers
            .into_iter()
            .flat_map(|c| c.names.unwrap_or_default())
            .map(|n| n.trim_start_matches('/').to_string())
            .collect())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        match self
            .docker
            .remove_container(
                name,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await
        {
            Ok(()) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(()),
            Err(e) => {
                warn!(name, error = %e, "failed to remove container");
                Err(e.into())
            }
        }
    }
}
