//! Startup time under many concurrent sandboxes

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::benchmark::{Benchmark, Report};
use crate::constants::images;
use crate::error::BenchResult;
use crate::runtime::RuntimeClient;

use super::Deployment;

pub fn all() -> Vec<Arc<dyn Benchmark>> {
    [5, 10, 50]
        .into_iter()
        .map(|scale| Arc::new(StartupScalability::new(scale)) as Arc<dyn Benchmark>)
        .collect()
}

/// Time to bring up `scale` sandboxes, each with one long-sleeping
/// container, one after another
#[derive(Debug, Clone, Copy)]
pub struct StartupScalability {
    scale: usize,
}

impl StartupScalability {
    pub fn new(scale: usize) -> Self {
        Self { scale }
    }

    async fn ramp_up(
        &self,
        client: &RuntimeClient,
        handler: &str,
        deployment: &mut Deployment,
    ) -> BenchResult<()> {
        let name = self.name();
        for _ in 0..self.scale {
            let sandbox = client.init_sandbox_spec(&client.unique_name(&name));
            let pod = client.start_sandbox(&sandbox, handler).await?;
            deployment.sandbox(&pod);
            let container = client
                .create_container(
                    &sandbox,
                    &pod,
                    &client.unique_name(&name),
                    images::BUSYBOX,
                    &["sleep", "1000000"],
                )
                .await?;
            deployment.container(&container);
            client.start_container(&container).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Benchmark for StartupScalability {
    fn name(&self) -> String {
        format!("scalability.runtime.{}", self.scale)
    }

    fn labels(&self) -> Vec<String> {
        vec!["TotalTime".to_string()]
    }

    async fn run(&self, client: &RuntimeClient, handler: &str) -> BenchResult<Report> {
        client.pull_image(images::BUSYBOX).await?;

        let mut deployment = Deployment::default();
        let started = Instant::now();
        if let Err(e) = self.ramp_up(client, handler, &mut deployment).await {
            return Err(deployment.abandon(client, e).await);
        }
        let total = started.elapsed();

        deployment.teardown(client).await?;

        Ok(Report::from([("TotalTime", total.as_secs_f64())]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FailPoint, FakeRuntime};
    use crate::utils::IdGenerator;

    fn client(fake: &FakeRuntime) -> RuntimeClient {
        RuntimeClient::new(Box::new(fake.clone()), Arc::new(IdGenerator::new()))
    }

    #[tokio::test]
    async fn test_starts_scale_pairs_and_removes_them() {
        let fake = FakeRuntime::new();
        let bm = StartupScalability::new(5);

        let report = bm.run(&client(&fake), "kata").await.unwrap();

        assert_eq!(bm.name(), "scalability.runtime.5");
        assert!(report.get("TotalTime").is_some());
        assert_eq!(fake.handlers().len(), 5);
        assert_eq!(fake.created_containers().len(), 5);
        assert_eq!(fake.live_containers(), 0);
        assert_eq!(fake.live_sandboxes(), 0);
    }

    #[tokio::test]
    async fn test_partial_ramp_up_is_cleaned() {
        let fake = FakeRuntime::new().failing_at(FailPoint::CreateContainer);

        let result = StartupScalability::new(10).run(&client(&fake), "runc").await;

        assert!(result.is_err());
        assert_eq!(fake.handlers().len(), 1);
        assert_eq!(fake.live_sandboxes(), 0);
    }

    #[tokio::test]
    async fn test_stuck_containers_do_not_stop_teardown() {
        let fake = FakeRuntime::new().failing_container_removals(u32::MAX);

        let err = StartupScalability::new(5)
            .run(&client(&fake), "runc")
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "TEARDOWN_ERROR");
        for n in 1..=5 {
            assert_eq!(fake.removal_attempts(&format!("ctr-{}", 2 * n)), 10);
        }
        assert_eq!(fake.live_sandboxes(), 0);
    }
}
