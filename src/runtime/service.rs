//! The request/response contract of a CRI endpoint

use async_trait::async_trait;

use crate::error::BenchResult;

use super::types::{
    ContainerSpec, ContainerStatus, ResourceLimits, RuntimeVersion, SandboxDescriptor,
};

/// One connection to a CRI endpoint.
///
/// Each method is a single RPC. Failures of any kind (connection, protocol,
/// rejected request) surface as [`crate::BenchError::Transport`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuntimeService: Send + Sync {
    async fn version(&self) -> BenchResult<RuntimeVersion>;

    async fn pull_image(&self, image: &str) -> BenchResult<()>;

    async fn run_pod_sandbox(&self, sandbox: &SandboxDescriptor, handler: &str)
    -> BenchResult<String>;

    async fn stop_pod_sandbox(&self, sandbox_id: &str) -> BenchResult<()>;

    async fn remove_pod_sandbox(&self, sandbox_id: &str) -> BenchResult<()>;

    async fn create_container(
        &self,
        sandbox_id: &str,
        container: &ContainerSpec,
        sandbox: &SandboxDescriptor,
    ) -> BenchResult<String>;

    async fn start_container(&self, container_id: &str) -> BenchResult<()>;

    async fn stop_container(&self, container_id: &str, timeout_secs: i64) -> BenchResult<()>;

    async fn remove_container(&self, container_id: &str) -> BenchResult<()>;

    async fn container_status(&self, container_id: &str) -> BenchResult<ContainerStatus>;

    async fn update_container_resources(
        &self,
        container_id: &str,
        resources: &ResourceLimits,
    ) -> BenchResult<()>;

    /// Release the underlying connection
    async fn close(&self);
}
