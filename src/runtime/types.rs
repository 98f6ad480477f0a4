//! Transport-independent CRI domain types

use std::collections::BTreeMap;

use serde::Serialize;

/// Pod-level configuration for one benchmark attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxDescriptor {
    pub name: String,
    /// Freshly generated per descriptor, never reused
    pub uid: String,
    pub namespace: String,
    pub attempt: u32,
    pub labels: BTreeMap<String, String>,
}

/// Linux CPU and memory constraints for a container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceLimits {
    pub cpu_period: i64,
    pub cpu_quota: i64,
    pub cpu_shares: i64,
    pub memory_limit_in_bytes: i64,
}

impl ResourceLimits {
    /// Limit CPU time to `quota` out of every `period` microseconds
    pub fn cpu(period: i64, quota: i64) -> Self {
        Self {
            cpu_period: period,
            cpu_quota: quota,
            ..Default::default()
        }
    }
}

/// Container configuration handed to CreateContainer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    /// Empty means "use the image entrypoint"
    pub command: Vec<String>,
    pub log_path: String,
    pub resources: Option<ResourceLimits>,
}

/// Container state progression as reported by the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ContainerState {
    Created = 0,
    Running = 1,
    Exited = 2,
    Unknown = 3,
}

impl ContainerState {
    /// Map a wire value; anything unrecognised is `Unknown`
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Created,
            1 => Self::Running,
            2 => Self::Exited,
            _ => Self::Unknown,
        }
    }

    /// Exited and everything after it
    pub fn is_terminal(self) -> bool {
        self >= Self::Exited
    }
}

/// Snapshot of a container returned by ContainerStatus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStatus {
    pub id: String,
    pub state: ContainerState,
    pub exit_code: i32,
    pub log_path: String,
}

/// Identification reported by a runtime daemon
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeVersion {
    pub version: String,
    pub runtime_name: String,
    pub runtime_version: String,
    pub runtime_api_version: String,
}
