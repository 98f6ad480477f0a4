//! Lifecycle operation latency

use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::benchmark::{Benchmark, Report};
use crate::constants::images;
use crate::error::BenchResult;
use crate::runtime::RuntimeClient;

use super::Deployment;

pub fn all() -> Vec<Arc<dyn Benchmark>> {
    vec![Arc::new(ContainerLifecycle)]
}

/// Wall-clock time of sandbox creation, container start and teardown.
///
/// `Startup` spans sandbox start through container start, `Create` the
/// sandbox plus container creation, `Start` the container start alone and
/// `Destroy` both teardowns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerLifecycle;

impl ContainerLifecycle {
    const NAME: &'static str = "operations.container.lifecycle";
}

#[async_trait]
impl Benchmark for ContainerLifecycle {
    fn name(&self) -> String {
        Self::NAME.to_string()
    }

    fn labels(&self) -> Vec<String> {
        ["Startup", "Create", "Start", "Destroy"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    async fn run(&self, client: &RuntimeClient, handler: &str) -> BenchResult<Report> {
        client.pull_image(images::BUSYBOX).await?;

        let sandbox = client.init_sandbox_spec(&client.unique_name(Self::NAME));
        let mut deployment = Deployment::default();

        let startup = Instant::now();
        let created = async {
            let pod = client.start_sandbox(&sandbox, handler).await?;
            deployment.sandbox(&pod);
            let name = client.unique_name(Self::NAME);
            let container = client
                .create_container(&sandbox, &pod, &name, images::BUSYBOX, &["sleep", "60"])
                .await?;
            deployment.container(&container);
            BenchResult::Ok(container)
        }
        .await;

        let container = match created {
            Ok(container) => container,
            Err(e) => return Err(deployment.abandon(client, e).await),
        };
        let create = startup.elapsed();

        let start_begin = Instant::now();
        if let Err(e) = client.start_container(&container).await {
            return Err(deployment.abandon(client, e).await);
        }
        let start = start_begin.elapsed();
        let total = startup.elapsed();

        let destroy_begin = Instant::now();
        deployment.teardown(client).await?;
        let destroy = destroy_begin.elapsed();

        Ok(Report::from([
            ("Startup", total.as_secs_f64()),
            ("Create", create.as_secs_f64()),
            ("Start", start.as_secs_f64()),
            ("Destroy", destroy.as_secs_f64()),
        ]))
    }
}
