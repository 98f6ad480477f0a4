//! Scripted doubles shared by unit tests

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::benchmark::{Benchmark, Report};
use crate::error::{BenchError, BenchResult};
use crate::runtime::{
    Connector, ContainerSpec, ContainerState, ContainerStatus, ResourceLimits, RuntimeClient,
    RuntimeService, RuntimeVersion, SandboxDescriptor,
};
use crate::utils::IdGenerator;

/// Lifecycle calls a [`FakeRuntime`] can be told to reject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    PullImage,
    RunSandbox,
    CreateContainer,
    StartContainer,
}

#[derive(Default)]
struct FakeState {
    next_id: u32,
    fail_at: Option<FailPoint>,
    removal_failures: u32,
    removal_attempts: HashMap<String, u32>,
    polls_before_exit: u32,
    status_queries: HashMap<String, u32>,
    log_path: Option<String>,
    container_logs: HashMap<String, String>,
    pulled: Vec<String>,
    handlers: Vec<String>,
    created: Vec<ContainerSpec>,
    resource_updates: Vec<(String, ResourceLimits)>,
    live_sandboxes: BTreeSet<String>,
    live_containers: BTreeSet<String>,
    close_calls: u32,
}

/// In-memory CRI endpoint. Clones share state, so a test can keep one
/// handle while the client owns another.
#[derive(Clone, Default)]
pub struct FakeRuntime {
    state: Arc<Mutex<FakeState>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the first `n` RemoveContainer calls
    pub fn failing_container_removals(self, n: u32) -> Self {
        self.state.lock().unwrap().removal_failures = n;
        self
    }

    /// Report `Running` for the first `n` status queries of each container
    pub fn with_polls_before_exit(self, n: u32) -> Self {
        self.state.lock().unwrap().polls_before_exit = n;
        self
    }

    /// Report this log path for every container
    pub fn with_log_path(self, path: String) -> Self {
        self.state.lock().unwrap().log_path = Some(path);
        self
    }

    pub fn failing_at(self, point: FailPoint) -> Self {
        self.state.lock().unwrap().fail_at = Some(point);
        self
    }

    pub fn removal_attempts(&self, container_id: &str) -> u32 {
        let state = self.state.lock().unwrap();
        state.removal_attempts.get(container_id).copied().unwrap_or(0)
    }

    pub fn status_queries(&self, container_id: &str) -> u32 {
        let state = self.state.lock().unwrap();
        state.status_queries.get(container_id).copied().unwrap_or(0)
    }

    pub fn created_containers(&self) -> Vec<ContainerSpec> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn handlers(&self) -> Vec<String> {
        self.state.lock().unwrap().handlers.clone()
    }

    pub fn pulled_images(&self) -> Vec<String> {
        self.state.lock().unwrap().pulled.clone()
    }

    pub fn resource_updates(&self) -> Vec<(String, ResourceLimits)> {
        self.state.lock().unwrap().resource_updates.clone()
    }

    pub fn live_sandboxes(&self) -> usize {
        self.state.lock().unwrap().live_sandboxes.len()
    }

    pub fn live_containers(&self) -> usize {
        self.state.lock().unwrap().live_containers.len()
    }

    pub fn close_calls(&self) -> u32 {
        self.state.lock().unwrap().close_calls
    }

    fn check(&self, point: FailPoint) -> BenchResult<()> {
        if self.state.lock().unwrap().fail_at == Some(point) {
            return Err(BenchError::Transport(format!("injected {:?} failure", point)));
        }
        Ok(())
    }
}

#[async_trait]
impl RuntimeService for FakeRuntime {
    async fn version(&self) -> BenchResult<RuntimeVersion> {
        Ok(RuntimeVersion {
            version: "0.1.0".to_string(),
            runtime_name: "fake".to_string(),
            runtime_version: "1.0.0".to_string(),
            runtime_api_version: "v1".to_string(),
        })
    }

    async fn pull_image(&self, image: &str) -> BenchResult<()> {
        self.check(FailPoint::PullImage)?;
        self.state.lock().unwrap().pulled.push(image.to_string());
        Ok(())
    }

    async fn run_pod_sandbox(
        &self,
        _sandbox: &SandboxDescriptor,
        handler: &str,
    ) -> BenchResult<String> {
        self.check(FailPoint::RunSandbox)?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("pod-{}", state.next_id);
        state.handlers.push(handler.to_string());
        state.live_sandboxes.insert(id.clone());
        Ok(id)
    }

    async fn stop_pod_sandbox(&self, _sandbox_id: &str) -> BenchResult<()> {
        Ok(())
    }

    async fn remove_pod_sandbox(&self, sandbox_id: &str) -> BenchResult<()> {
        self.state.lock().unwrap().live_sandboxes.remove(sandbox_id);
        Ok(())
    }

    async fn create_container(
        &self,
        _sandbox_id: &str,
        container: &ContainerSpec,
        _sandbox: &SandboxDescriptor,
    ) -> BenchResult<String> {
        self.check(FailPoint::CreateContainer)?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("ctr-{}", state.next_id);
        state.created.push(container.clone());
        state.live_containers.insert(id.clone());
        state
            .container_logs
            .insert(id.clone(), container.log_path.clone());
        Ok(id)
    }

    async fn start_container(&self, _container_id: &str) -> BenchResult<()> {
        self.check(FailPoint::StartContainer)
    }

    async fn stop_container(&self, _container_id: &str, _timeout_secs: i64) -> BenchResult<()> {
        Ok(())
    }

    async fn remove_container(&self, container_id: &str) -> BenchResult<()> {
        let mut state = self.state.lock().unwrap();
        *state
            .removal_attempts
            .entry(container_id.to_string())
            .or_default() += 1;

        if state.removal_failures > 0 {
            state.removal_failures -= 1;
            return Err(BenchError::Transport("container is still stopping".to_string()));
        }

        state.live_containers.remove(container_id);
        Ok(())
    }

    async fn container_status(&self, container_id: &str) -> BenchResult<ContainerStatus> {
        let mut state = self.state.lock().unwrap();
        let queries = {
            let count = state
                .status_queries
                .entry(container_id.to_string())
                .or_default();
            *count += 1;
            *count
        };

        let container_state = if queries > state.polls_before_exit {
            ContainerState::Exited
        } else {
            ContainerState::Running
        };
        let log_path = state
            .log_path
            .clone()
            .or_else(|| state.container_logs.get(container_id).cloned())
            .unwrap_or_default();

        Ok(ContainerStatus {
            id: container_id.to_string(),
            state: container_state,
            exit_code: 0,
            log_path,
        })
    }

    async fn update_container_resources(
        &self,
        container_id: &str,
        resources: &ResourceLimits,
    ) -> BenchResult<()> {
        self.state
            .lock()
            .unwrap()
            .resource_updates
            .push((container_id.to_string(), *resources));
        Ok(())
    }

    async fn close(&self) {
        self.state.lock().unwrap().close_calls += 1;
    }
}

/// Hands out clients backed by one shared [`FakeRuntime`]
pub struct FakeConnector {
    pub runtime: FakeRuntime,
    ids: Arc<IdGenerator>,
    connects: Mutex<Vec<String>>,
    unreachable: Vec<String>,
}

impl FakeConnector {
    pub fn new(runtime: FakeRuntime) -> Self {
        Self {
            runtime,
            ids: Arc::new(IdGenerator::new()),
            connects: Mutex::new(Vec::new()),
            unreachable: Vec::new(),
        }
    }

    /// Fail every connection attempt to `backend`
    pub fn unreachable(mut self, backend: &str) -> Self {
        self.unreachable.push(backend.to_string());
        self
    }

    pub fn connects(&self) -> Vec<String> {
        self.connects.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, backend: &str) -> BenchResult<RuntimeClient> {
        self.connects.lock().unwrap().push(backend.to_string());
        if self.unreachable.iter().any(|b| b == backend) {
            return Err(BenchError::Transport(format!("no socket for {}", backend)));
        }
        Ok(RuntimeClient::new(
            Box::new(self.runtime.clone()),
            Arc::clone(&self.ids),
        ))
    }
}

/// Benchmark returning the same value for every label on every trial
pub struct FixedBenchmark {
    name: String,
    labels: Vec<String>,
    value: f64,
    fail_on_call: Option<u32>,
    calls: AtomicU32,
    handlers: Mutex<Vec<String>>,
}

impl FixedBenchmark {
    pub fn new(name: &str, labels: &[&str], value: f64) -> Self {
        Self {
            name: name.to_string(),
            labels: labels.iter().map(|l| (*l).to_string()).collect(),
            value,
            fail_on_call: None,
            calls: AtomicU32::new(0),
            handlers: Mutex::new(Vec::new()),
        }
    }

    /// Fail the `n`-th run (1-based)
    pub fn failing_on_call(mut self, n: u32) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn handlers(&self) -> Vec<String> {
        self.handlers.lock().unwrap().clone()
    }
}

#[async_trait]
impl Benchmark for FixedBenchmark {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn labels(&self) -> Vec<String> {
        self.labels.clone()
    }

    async fn run(&self, _client: &RuntimeClient, handler: &str) -> BenchResult<Report> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.handlers.lock().unwrap().push(handler.to_string());

        if self.fail_on_call == Some(call) {
            return Err(BenchError::Extraction {
                prefix: "total time:".to_string(),
            });
        }

        Ok(self
            .labels
            .iter()
            .map(|label| (label.clone(), self.value))
            .collect())
    }
}

/// Write `messages` as CRI-formatted log lines into a temp file
pub fn write_cri_log(dir: &tempfile::TempDir, name: &str, messages: &str) -> String {
    let path = dir.path().join(name);
    let body: String = messages
        .lines()
        .map(|line| format!("2024-01-01T00:00:00.000000000Z stdout F {}\n", line))
        .collect();
    std::fs::write(&path, body).unwrap();
    path.to_string_lossy().to_string()
}
