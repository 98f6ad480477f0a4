//! Built-in workloads
//!
//! Each workload is a fixed argument list driven through the same
//! lifecycle: pull, start a sandbox, create and start a container, measure,
//! tear down. Whatever a trial created is removed before it returns, on the
//! failure path too.

pub mod limits;
pub mod operations;
pub mod performance;
pub mod scalability;
pub mod sysbench;

use std::sync::Arc;
use std::time::Duration;

use crate::error::{BenchError, BenchResult};
use crate::runtime::{ContainerState, ResourceLimits, RuntimeClient};

use super::Benchmark;

pub use sysbench::{Measurement, Sysbench};

/// Every built-in workload: performance, operations, scalability, limits
pub fn catalog() -> Vec<Arc<dyn Benchmark>> {
    let mut all = performance::all();
    all.extend(operations::all());
    all.extend(scalability::all());
    all.extend(limits::all());
    all
}

/// Resources created by one trial
#[derive(Debug, Default)]
pub(crate) struct Deployment {
    sandboxes: Vec<String>,
    containers: Vec<String>,
}

impl Deployment {
    pub(crate) fn sandbox(&mut self, id: &str) {
        self.sandboxes.push(id.to_string());
    }

    pub(crate) fn container(&mut self, id: &str) {
        self.containers.push(id.to_string());
    }

    /// Remove every container, then every sandbox, and report the first
    /// failure once all of them were attempted
    pub(crate) async fn teardown(self, client: &RuntimeClient) -> BenchResult<()> {
        match self.release(client).await {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Best-effort teardown after `cause`; always hands `cause` back
    pub(crate) async fn abandon(self, client: &RuntimeClient, cause: BenchError) -> BenchError {
        self.release(client).await;
        cause
    }

    async fn release(&self, client: &RuntimeClient) -> Option<BenchError> {
        let mut first = None;
        for container in &self.containers {
            if let Err(e) = client.stop_and_remove_container(container).await {
                tracing::warn!(container = %container, error = %e, "Container left behind");
                first.get_or_insert(e);
            }
        }
        for sandbox in &self.sandboxes {
            if let Err(e) = client.stop_and_remove_sandbox(sandbox).await {
                tracing::warn!(sandbox = %sandbox, error = %e, "Sandbox left behind");
                first.get_or_insert(e);
            }
        }
        first
    }
}

/// Resource limits applied to a workload container
#[derive(Debug, Clone, Default)]
pub enum Limits {
    #[default]
    Unconstrained,
    Fixed(ResourceLimits),
    /// Start with the first step, then move to the next one every
    /// `interval` while the container is still running
    Scaling {
        steps: Vec<ResourceLimits>,
        interval: Duration,
    },
}

impl Limits {
    fn initial(&self) -> Option<ResourceLimits> {
        match self {
            Self::Unconstrained => None,
            Self::Fixed(limits) => Some(*limits),
            Self::Scaling { steps, .. } => steps.first().copied(),
        }
    }
}

/// Run `command` in a fresh sandbox until it exits and return its log
/// messages
pub(crate) async fn run_to_completion(
    client: &RuntimeClient,
    handler: &str,
    benchmark_name: &str,
    image: &str,
    command: &[&str],
    limits: &Limits,
) -> BenchResult<Vec<u8>> {
    client.pull_image(image).await?;

    let mut deployment = Deployment::default();
    let logs = drive(client, handler, benchmark_name, image, command, limits, &mut deployment).await;

    match logs {
        Ok(logs) => {
            deployment.teardown(client).await?;
            Ok(logs)
        }
        Err(e) => Err(deployment.abandon(client, e).await),
    }
}

async fn drive(
    client: &RuntimeClient,
    handler: &str,
    benchmark_name: &str,
    image: &str,
    command: &[&str],
    limits: &Limits,
    deployment: &mut Deployment,
) -> BenchResult<Vec<u8>> {
    let sandbox = client.init_sandbox_spec(&client.unique_name(benchmark_name));
    let pod = client.start_sandbox(&sandbox, handler).await?;
    deployment.sandbox(&pod);

    let name = client.unique_name(benchmark_name);
    let container = match limits.initial() {
        Some(resources) => {
            client
                .create_container_with_resources(&sandbox, &pod, &name, image, command, &resources)
                .await?
        }
        None => client.create_container(&sandbox, &pod, &name, image, command).await?,
    };
    deployment.container(&container);
    client.start_container(&container).await?;

    if let Limits::Scaling { steps, interval } = limits {
        for step in steps.iter().skip(1) {
            if client.state(&container).await? != ContainerState::Running {
                break;
            }
            client.update_container_resources(&container, step).await?;
            tokio::time::sleep(*interval).await;
        }
    }

    client.wait_for_logs(&container).await
}
