//! Opening one runtime client per backend

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::RuntimeConfig;
use crate::error::BenchResult;
use crate::utils::{IdGenerator, cri_endpoint};

use super::client::RuntimeClient;
use super::grpc::GrpcRuntimeService;

/// Factory for connected [`RuntimeClient`]s, keyed by backend name
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, backend: &str) -> BenchResult<RuntimeClient>;
}

/// Connects to `unix://<socket_root>/<backend>/<backend>.sock` over gRPC
pub struct GrpcConnector {
    config: RuntimeConfig,
    ids: Arc<IdGenerator>,
}

impl GrpcConnector {
    pub fn new(config: RuntimeConfig, ids: Arc<IdGenerator>) -> Self {
        Self { config, ids }
    }

    /// Endpoint address used for a backend
    pub fn endpoint(&self, backend: &str) -> String {
        cri_endpoint(&self.config.socket_root, backend)
    }
}

#[async_trait]
impl Connector for GrpcConnector {
    async fn connect(&self, backend: &str) -> BenchResult<RuntimeClient> {
        let service =
            GrpcRuntimeService::connect(&self.endpoint(backend), self.config.dial_timeout).await?;
        Ok(RuntimeClient::new(Box::new(service), Arc::clone(&self.ids)))
    }
}
