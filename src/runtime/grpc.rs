//! gRPC transport for [`RuntimeService`]

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;
use tokio::sync::RwLock;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint, Uri};
use tower::service_fn;

use crate::error::{BenchError, BenchResult};

use super::proto::{self, paths};
use super::service::RuntimeService;
use super::types::{
    ContainerSpec, ContainerState, ContainerStatus, ResourceLimits, RuntimeVersion,
    SandboxDescriptor,
};

/// Placeholder authority for unix socket channels; the connector ignores it
const UDS_AUTHORITY: &str = "http://[::]:50051";

/// CRI client speaking `runtime.v1` over one channel
pub struct GrpcRuntimeService {
    endpoint: String,
    channel: RwLock<Option<Channel>>,
}

impl GrpcRuntimeService {
    /// Dial a CRI endpoint (`unix:///path/to.sock` or `http://host:port`)
    pub async fn connect(endpoint: &str, dial_timeout: Duration) -> BenchResult<Self> {
        tracing::info!(addr = %endpoint, "Connecting to CRI endpoint");

        let dial = async {
            match endpoint.strip_prefix("unix://") {
                Some(path) => {
                    let path = PathBuf::from(path);
                    Endpoint::from_static(UDS_AUTHORITY)
                        .connect_timeout(dial_timeout)
                        .connect_with_connector(service_fn(move |_: Uri| {
                            let path = path.clone();
                            async move {
                                Ok::<_, std::io::Error>(TokioIo::new(
                                    UnixStream::connect(path).await?,
                                ))
                            }
                        }))
                        .await
                }
                None => {
                    Endpoint::from_shared(endpoint.to_string())?
                        .connect_timeout(dial_timeout)
                        .connect()
                        .await
                }
            }
        };

        let channel = tokio::time::timeout(dial_timeout, dial)
            .await
            .map_err(|_| {
                BenchError::Transport(format!(
                    "Timed out after {}s dialing {}",
                    dial_timeout.as_secs(),
                    endpoint
                ))
            })??;

        Ok(Self {
            endpoint: endpoint.to_string(),
            channel: RwLock::new(Some(channel)),
        })
    }

    /// Address this service was dialed with
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn channel(&self) -> BenchResult<Channel> {
        self.channel
            .read()
            .await
            .clone()
            .ok_or_else(|| BenchError::Transport(format!("Connection to {} closed", self.endpoint)))
    }

    async fn unary<Req, Resp>(&self, path: &'static str, request: Req) -> BenchResult<Resp>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = tonic::client::Grpc::new(self.channel().await?);
        grpc.ready()
            .await
            .map_err(|e| BenchError::Transport(format!("Service was not ready: {}", e)))?;

        let codec = tonic::codec::ProstCodec::<Req, Resp>::default();
        let response = grpc
            .unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(path),
                codec,
            )
            .await?;

        Ok(response.into_inner())
    }
}

#[async_trait]
impl RuntimeService for GrpcRuntimeService {
    async fn version(&self) -> BenchResult<RuntimeVersion> {
        let resp: proto::VersionResponse = self
            .unary(paths::VERSION, proto::VersionRequest::default())
            .await?;

        Ok(RuntimeVersion {
            version: resp.version,
            runtime_name: resp.runtime_name,
            runtime_version: resp.runtime_version,
            runtime_api_version: resp.runtime_api_version,
        })
    }

    async fn pull_image(&self, image: &str) -> BenchResult<()> {
        let _: proto::PullImageResponse = self
            .unary(
                paths::PULL_IMAGE,
                proto::PullImageRequest {
                    image: Some(image_spec(image)),
                    sandbox_config: None,
                },
            )
            .await?;
        Ok(())
    }

    async fn run_pod_sandbox(
        &self,
        sandbox: &SandboxDescriptor,
        handler: &str,
    ) -> BenchResult<String> {
        let resp: proto::RunPodSandboxResponse = self
            .unary(
                paths::RUN_POD_SANDBOX,
                proto::RunPodSandboxRequest {
                    config: Some(sandbox.into()),
                    runtime_handler: handler.to_string(),
                },
            )
            .await?;
        Ok(resp.pod_sandbox_id)
    }

    async fn stop_pod_sandbox(&self, sandbox_id: &str) -> BenchResult<()> {
        let _: proto::StopPodSandboxResponse = self
            .unary(
                paths::STOP_POD_SANDBOX,
                proto::StopPodSandboxRequest {
                    pod_sandbox_id: sandbox_id.to_string(),
                },
            )
            .await?;
        Ok(())
    }

    async fn remove_pod_sandbox(&self, sandbox_id: &str) -> BenchResult<()> {
        let _: proto::RemovePodSandboxResponse = self
            .unary(
                paths::REMOVE_POD_SANDBOX,
                proto::RemovePodSandboxRequest {
                    pod_sandbox_id: sandbox_id.to_string(),
                },
            )
            .await?;
        Ok(())
    }

    async fn create_container(
        &self,
        sandbox_id: &str,
        container: &ContainerSpec,
        sandbox: &SandboxDescriptor,
    ) -> BenchResult<String> {
        let resp: proto::CreateContainerResponse = self
            .unary(
                paths::CREATE_CONTAINER,
                proto::CreateContainerRequest {
                    pod_sandbox_id: sandbox_id.to_string(),
                    config: Some(container.into()),
                    sandbox_config: Some(sandbox.into()),
                },
            )
            .await?;
        Ok(resp.container_id)
    }

    async fn start_container(&self, container_id: &str) -> BenchResult<()> {
        let _: proto::StartContainerResponse = self
            .unary(
                paths::START_CONTAINER,
                proto::StartContainerRequest {
                    container_id: container_id.to_string(),
                },
            )
            .await?;
        Ok(())
    }

    async fn stop_container(&self, container_id: &str, timeout_secs: i64) -> BenchResult<()> {
        let _: proto::StopContainerResponse = self
            .unary(
                paths::STOP_CONTAINER,
                proto::StopContainerRequest {
                    container_id: container_id.to_string(),
                    timeout: timeout_secs,
                },
            )
            .await?;
        Ok(())
    }

    async fn remove_container(&self, container_id: &str) -> BenchResult<()> {
        let _: proto::RemoveContainerResponse = self
            .unary(
                paths::REMOVE_CONTAINER,
                proto::RemoveContainerRequest {
                    container_id: container_id.to_string(),
                },
            )
            .await?;
        Ok(())
    }

    async fn container_status(&self, container_id: &str) -> BenchResult<ContainerStatus> {
        let resp: proto::ContainerStatusResponse = self
            .unary(
                paths::CONTAINER_STATUS,
                proto::ContainerStatusRequest {
                    container_id: container_id.to_string(),
                    verbose: false,
                },
            )
            .await?;

        let status = resp.status.ok_or_else(|| {
            BenchError::Transport(format!("Runtime returned no status for {}", container_id))
        })?;

        Ok(ContainerStatus {
            id: status.id,
            state: ContainerState::from_code(status.state),
            exit_code: status.exit_code,
            log_path: status.log_path,
        })
    }

    async fn update_container_resources(
        &self,
        container_id: &str,
        resources: &ResourceLimits,
    ) -> BenchResult<()> {
        let _: proto::UpdateContainerResourcesResponse = self
            .unary(
                paths::UPDATE_CONTAINER_RESOURCES,
                proto::UpdateContainerResourcesRequest {
                    container_id: container_id.to_string(),
                    linux: Some(resources.into()),
                },
            )
            .await?;
        Ok(())
    }

    async fn close(&self) {
        if self.channel.write().await.take().is_some() {
            tracing::debug!(addr = %self.endpoint, "Closed CRI connection");
        }
    }
}

// ── Domain → wire conversions ──────────────────────────────────────────────

fn image_spec(image: &str) -> proto::ImageSpec {
    proto::ImageSpec {
        image: image.to_string(),
        ..Default::default()
    }
}

impl From<&SandboxDescriptor> for proto::PodSandboxConfig {
    fn from(sandbox: &SandboxDescriptor) -> Self {
        Self {
            metadata: Some(proto::PodSandboxMetadata {
                name: sandbox.name.clone(),
                uid: sandbox.uid.clone(),
                namespace: sandbox.namespace.clone(),
                attempt: sandbox.attempt,
            }),
            labels: sandbox
                .labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            linux: Some(proto::LinuxPodSandboxConfig::default()),
            ..Default::default()
        }
    }
}

impl From<&ResourceLimits> for proto::LinuxContainerResources {
    fn from(resources: &ResourceLimits) -> Self {
        Self {
            cpu_period: resources.cpu_period,
            cpu_quota: resources.cpu_quota,
            cpu_shares: resources.cpu_shares,
            memory_limit_in_bytes: resources.memory_limit_in_bytes,
            ..Default::default()
        }
    }
}

impl From<&ContainerSpec> for proto::ContainerConfig {
    fn from(container: &ContainerSpec) -> Self {
        Self {
            metadata: Some(proto::ContainerMetadata {
                name: container.name.clone(),
                attempt: 0,
            }),
            image: Some(image_spec(&container.image)),
            command: container.command.clone(),
            log_path: container.log_path.clone(),
            linux: Some(proto::LinuxContainerConfig {
                resources: container.resources.as_ref().map(Into::into),
            }),
            ..Default::default()
        }
    }
}
