//! Sandbox and container lifecycle over one CRI endpoint

use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::constants::{
    DEFAULT_IMAGE_TAG, MAX_REMOVAL_ATTEMPTS, POLL_INTERVAL, REMOVAL_STOP_TIMEOUT_SECS,
    SANDBOX_ATTEMPT, SANDBOX_NAMESPACE,
};
use crate::error::{BenchError, BenchResult};
use crate::utils::IdGenerator;

use super::service::RuntimeService;
use super::types::{
    ContainerSpec, ContainerState, ContainerStatus, ResourceLimits, RuntimeVersion,
    SandboxDescriptor,
};

/// Lifecycle primitives on top of a [`RuntimeService`].
///
/// A client owns its connection exclusively and is driven by one task at a
/// time; sandboxes and containers it creates stay its responsibility until
/// torn down.
pub struct RuntimeClient {
    service: Box<dyn RuntimeService>,
    ids: Arc<IdGenerator>,
    closed: AtomicBool,
}

impl RuntimeClient {
    /// Wrap a connected service
    pub fn new(service: Box<dyn RuntimeService>, ids: Arc<IdGenerator>) -> Self {
        Self {
            service,
            ids,
            closed: AtomicBool::new(false),
        }
    }

    /// Unique resource name derived from a benchmark name
    pub fn unique_name(&self, benchmark_name: &str) -> String {
        self.ids.benchmark_id(benchmark_name)
    }

    /// Query the runtime's name and version
    pub async fn version(&self) -> BenchResult<RuntimeVersion> {
        self.service.version().await
    }

    /// Pull an image, defaulting the tag to `latest`
    pub async fn pull_image(&self, image: &str) -> BenchResult<()> {
        let image = normalize_image(image);
        tracing::debug!(image = %image, "Pulling image");
        self.service.pull_image(&image).await
    }

    /// Build a sandbox descriptor with a fresh uid. Performs no I/O.
    pub fn init_sandbox_spec(&self, name: &str) -> SandboxDescriptor {
        SandboxDescriptor {
            name: name.to_string(),
            uid: self.ids.next_id(),
            namespace: SANDBOX_NAMESPACE.to_string(),
            attempt: SANDBOX_ATTEMPT,
            labels: BTreeMap::new(),
        }
    }

    /// Run a pod sandbox under the named execution handler
    pub async fn start_sandbox(
        &self,
        sandbox: &SandboxDescriptor,
        handler: &str,
    ) -> BenchResult<String> {
        let sandbox_id = self.service.run_pod_sandbox(sandbox, handler).await?;
        tracing::debug!(sandbox = %sandbox_id, handler = %handler, "Started sandbox");
        Ok(sandbox_id)
    }

    /// Create a container in a running sandbox
    pub async fn create_container(
        &self,
        sandbox: &SandboxDescriptor,
        sandbox_id: &str,
        name: &str,
        image: &str,
        command: &[&str],
    ) -> BenchResult<String> {
        let spec = container_spec(sandbox_id, name, image, command, None);
        self.service.create_container(sandbox_id, &spec, sandbox).await
    }

    /// Create a container with Linux resource limits applied
    pub async fn create_container_with_resources(
        &self,
        sandbox: &SandboxDescriptor,
        sandbox_id: &str,
        name: &str,
        image: &str,
        command: &[&str],
        resources: &ResourceLimits,
    ) -> BenchResult<String> {
        let spec = container_spec(sandbox_id, name, image, command, Some(*resources));
        self.service.create_container(sandbox_id, &spec, sandbox).await
    }

    pub async fn start_container(&self, container_id: &str) -> BenchResult<()> {
        self.service.start_container(container_id).await
    }

    pub async fn stop_container(&self, container_id: &str, timeout_secs: i64) -> BenchResult<()> {
        self.service.stop_container(container_id, timeout_secs).await
    }

    pub async fn remove_container(&self, container_id: &str) -> BenchResult<()> {
        self.service.remove_container(container_id).await
    }

    pub async fn stop_sandbox(&self, sandbox_id: &str) -> BenchResult<()> {
        self.service.stop_pod_sandbox(sandbox_id).await
    }

    pub async fn remove_sandbox(&self, sandbox_id: &str) -> BenchResult<()> {
        self.service.remove_pod_sandbox(sandbox_id).await
    }

    pub async fn status(&self, container_id: &str) -> BenchResult<ContainerStatus> {
        self.service.container_status(container_id).await
    }

    pub async fn state(&self, container_id: &str) -> BenchResult<ContainerState> {
        Ok(self.status(container_id).await?.state)
    }

    /// Change CPU/memory limits of a running container
    pub async fn update_container_resources(
        &self,
        container_id: &str,
        resources: &ResourceLimits,
    ) -> BenchResult<()> {
        self.service
            .update_container_resources(container_id, resources)
            .await
    }

    /// Wait until the container exits, then return its log messages.
    ///
    /// Polls status once per [`POLL_INTERVAL`] with no upper bound; callers
    /// that need a deadline must impose one themselves.
    pub async fn wait_for_logs(&self, container_id: &str) -> BenchResult<Vec<u8>> {
        let status = loop {
            let status = self.status(container_id).await?;
            if status.state.is_terminal() {
                break status;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        };

        tracing::debug!(
            container = %container_id,
            exit_code = status.exit_code,
            "Container exited"
        );

        if status.log_path.is_empty() {
            return Err(BenchError::Io(format!(
                "Container {} reported no log path",
                container_id
            )));
        }

        read_log_messages(Path::new(&status.log_path)).await
    }

    /// Stop and remove a container, retrying the pair as one unit
    pub async fn stop_and_remove_container(&self, container_id: &str) -> BenchResult<()> {
        retry_teardown(&format!("container {}", container_id), move || async move {
            self.stop_container(container_id, REMOVAL_STOP_TIMEOUT_SECS)
                .await?;
            self.remove_container(container_id).await
        })
        .await
    }

    /// Stop and remove a sandbox, retrying the pair as one unit
    pub async fn stop_and_remove_sandbox(&self, sandbox_id: &str) -> BenchResult<()> {
        retry_teardown(&format!("sandbox {}", sandbox_id), move || async move {
            self.stop_sandbox(sandbox_id).await?;
            self.remove_sandbox(sandbox_id).await
        })
        .await
    }

    /// Release the connection. Calling it again is a no-op.
    pub async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.service.close().await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Append the default tag to references that carry neither tag nor digest.
///
/// A `:` before the last `/` belongs to a registry port, not a tag.
pub fn normalize_image(image: &str) -> String {
    let repository = image.rsplit('/').next().unwrap_or(image);
    if repository.contains(':') || image.contains('@') {
        image.to_string()
    } else {
        format!("{}:{}", image, DEFAULT_IMAGE_TAG)
    }
}

fn container_spec(
    sandbox_id: &str,
    name: &str,
    image: &str,
    command: &[&str],
    resources: Option<ResourceLimits>,
) -> ContainerSpec {
    ContainerSpec {
        name: name.to_string(),
        image: image.to_string(),
        command: command.iter().map(|part| (*part).to_string()).collect(),
        log_path: format!("/var/log/{}_{}.log", sandbox_id, name),
        resources,
    }
}

/// Run `unit` until it succeeds, at most [`MAX_REMOVAL_ATTEMPTS`] times.
///
/// Any failure inside the unit abandons that attempt and restarts the whole
/// unit; only the last error is reported once the budget is spent.
pub async fn retry_teardown<F, Fut>(resource: &str, mut unit: F) -> BenchResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = BenchResult<()>>,
{
    let mut attempt = 1;
    loop {
        match unit().await {
            Ok(()) => return Ok(()),
            Err(e) if attempt >= MAX_REMOVAL_ATTEMPTS => {
                tracing::warn!(resource = %resource, attempts = attempt, error = %e, "Teardown gave up");
                return Err(BenchError::Teardown {
                    resource: resource.to_string(),
                    attempts: attempt,
                    source: Box::new(e),
                });
            }
            Err(e) => {
                tracing::debug!(resource = %resource, attempt, error = %e, "Teardown attempt failed");
                attempt += 1;
            }
        }
    }
}

/// Keep only the message field of `<timestamp> <stream> <tag> <message>`
/// lines, one message per output line.
pub fn extract_log_messages(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    for line in raw.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let mut fields = line.splitn(4, |&b| b == b' ');
        if let (Some(_), Some(_), Some(_), Some(message)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        {
            out.extend_from_slice(message);
            out.push(b'\n');
        }
    }
    out
}

async fn read_log_messages(path: &Path) -> BenchResult<Vec<u8>> {
    let raw = tokio::fs::read(path).await.map_err(|e| {
        BenchError::Io(format!("Failed to open log file {}: {}", path.display(), e))
    })?;
    Ok(extract_log_messages(&raw))
}
