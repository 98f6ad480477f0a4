//! CRI runtime access
//!
//! [`RuntimeService`] is the raw request/response contract of an endpoint,
//! [`GrpcRuntimeService`] implements it over `runtime.v1`, and
//! [`RuntimeClient`] layers the lifecycle helpers benchmarks use on top:
//! image normalization, completion polling, and bounded-retry teardown.

pub mod client;
pub mod connector;
pub mod grpc;
pub mod proto;
pub mod service;
pub mod types;

pub use client::RuntimeClient;
pub use connector::{Connector, GrpcConnector};
pub use grpc::GrpcRuntimeService;
pub use service::RuntimeService;
pub use types::{
    ContainerSpec, ContainerState, ContainerStatus, ResourceLimits, RuntimeVersion,
    SandboxDescriptor,
};
