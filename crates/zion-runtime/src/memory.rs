//! In-memory `ContainerRuntime` fake for unit and integration tests.

use crate::config::ContainerSpec;
use crate::error::{Result, RuntimeError};
use crate::runtime::ContainerRuntime;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

struct Container {
    sender: Option<mpsc::Sender<Result<f64>>>,
}

/// A `ContainerRuntime` backed by in-process state.
///
/// `run` records the container as present but does not itself produce any
/// stats; tests drive the stats stream explicitly via [`InMemoryRuntime::push_stat`]
/// and end it via [`InMemoryRuntime::kill`], which mirrors how a real
/// container's stream ends when it is removed or dies.
#[derive(Default)]
pub struct InMemoryRuntime {
    containers: Mutex<HashMap<String, Container>>,
}

impl InMemoryRuntime {
    /// Construct an empty runtime with no containers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one CPU-percent sample onto `name`'s stats stream, as if the
    /// runtime had just reported it.
    pub fn push_stat(&self, name: &str, cpu_percent: f64) {
        let containers = self.containers.lock().unwrap();
        if let Some(container) = containers.get(name) {
            if let Some(sender) = &container.sender {
                let _ = sender.try_send(Ok(cpu_percent));
            }
        }
    }

    /// End `name`'s stats stream and drop it from the runtime, as if the
    /// container had died or been removed out from under the supervisor.
    pub fn kill(&self, name: &str) {
        let mut containers = self.containers.lock().unwrap();
        containers.remove(name);
    }
}

#[async_trait]
impl ContainerRuntime for InMemoryRuntime {
    async fn run(&self, spec: &ContainerSpec) -> Result<()> {
        let mut containers = self.containers.lock().unwrap();
        containers.insert(spec.name.clone(), Container { sender: None });
        Ok(())
    }

    fn stats(&self, name: &str) -> BoxStream<'static, Result<f64>> {
        let (tx, rx) = mpsc::channel(64);
        let mut containers = self.containers.lock().unwrap();
        match containers.get_mut(name) {
            Some(container) => {
                container.sender = Some(tx);
                Box::pin(ReceiverStream::new(rx))
            }
            None => {
                drop(containers);
                let name = name.to_string();
                Box::pin(futures::stream::once(async move {
                    Err(RuntimeError::NotFound(name))
                }))
            }
        }
    }

    async fn list_all(&self) -> Result<Vec<String>> {
        let containers = self.containers.lock().unwrap();
        Ok(containers.keys().cloned().collect())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        let mut containers = self.containers.lock().unwrap();
        containers.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn stats_stream_delivers_pushed_samples() {
        let runtime = InMemoryRuntime::new();
        let spec = ContainerSpec {
            name: "zion_0".to_string(),
            image: "zion-runtime:latest".to_string(),
            cpuset: "0".to_string(),
            bind_mounts: vec![],
            command: vec![],
        };
        runtime.run(&spec).await.unwrap();

        let mut stream = runtime.stats("zion_0");
        runtime.push_stat("zion_0", 42.5);
        assert_eq!(stream.next().await.unwrap().unwrap(), 42.5);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let runtime = InMemoryRuntime::new();
        runtime.remove("zion_0").await.unwrap();
        runtime.remove("zion_0").await.unwrap();
    }

    #[tokio::test]
    async fn stats_on_unknown_container_yields_not_found() {
        let runtime = InMemoryRuntime::new();
        let mut stream = runtime.stats("zion_99");
        assert!(stream.next().await.unwrap().is_err());
    }
}
