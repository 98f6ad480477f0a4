//! Implementations behind the CLI subcommands

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::benchmark::workloads::catalog;
use crate::benchmark::{Index, MatrixEntry, filter};
use crate::constants::images;
use crate::error::{BenchError, BenchResult};
use crate::plan::{OutputTarget, Plan};
use crate::runtime::{Connector, RuntimeClient, RuntimeVersion};

/// Run every plan in order, writing each plan's entries to its output
/// target and the merged index to `dir/index_file`.
///
/// The first failing plan aborts the command; its entries are not written.
pub async fn benchmark(
    connector: &dyn Connector,
    files: &[PathBuf],
    dir: &Path,
    index_file: &str,
) -> BenchResult<Vec<MatrixEntry>> {
    let catalog = catalog();
    let mut index = Index::new();
    let mut all = Vec::new();

    for file in files {
        tracing::info!(file = %file.display(), "Loading benchmark plan");
        let plan = Plan::parse(file)?;
        let matrix = plan.matrix(&catalog)?;

        let entries = matrix.run(connector).await?;
        write_json(&plan.output_target(dir), &entries)?;

        matrix.index(&mut index);
        all.extend(entries);
    }

    write_json(&OutputTarget::File(dir.join(index_file)), &index)?;
    Ok(all)
}

/// Catalog names left after applying each prefix in turn
pub fn list(filters: &[String]) -> Vec<String> {
    filters
        .iter()
        .fold(catalog(), |items, prefix| filter(&items, prefix))
        .iter()
        .map(|bm| bm.name())
        .collect()
}

/// Merged label index of the benchmarks every plan selects
pub fn index(files: &[PathBuf]) -> BenchResult<Index> {
    let catalog = catalog();
    let mut index = Index::new();
    for file in files {
        Plan::parse(file)?.matrix(&catalog)?.index(&mut index);
    }
    Ok(index)
}

/// Runtime identification per backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendVersion {
    pub backend: String,
    #[serde(flatten)]
    pub version: RuntimeVersion,
}

/// Query each backend's version; unreachable backends are skipped with a
/// warning
pub async fn versions(connector: &dyn Connector, backends: &[String]) -> Vec<BackendVersion> {
    let mut found = Vec::with_capacity(backends.len());
    for backend in backends {
        match query_version(connector, backend).await {
            Ok(version) => found.push(BackendVersion {
                backend: backend.clone(),
                version,
            }),
            Err(e) => tracing::warn!(backend = %backend, error = %e, "Backend unavailable"),
        }
    }
    found
}

async fn query_version(connector: &dyn Connector, backend: &str) -> BenchResult<RuntimeVersion> {
    let client = connector.connect(backend).await?;
    let version = client.version().await;
    client.close().await;
    version
}

/// Run one sysbench CPU container and return its log messages
pub async fn init(connector: &dyn Connector, backend: &str, handler: &str) -> BenchResult<Vec<u8>> {
    let client = connector.connect(backend).await?;
    let logs = smoke_run(&client, handler).await;
    client.close().await;
    logs
}

async fn smoke_run(client: &RuntimeClient, handler: &str) -> BenchResult<Vec<u8>> {
    client.pull_image(images::SYSBENCH).await?;
    tracing::info!(image = images::SYSBENCH, "Pulled sysbench image");

    let sandbox = client.init_sandbox_spec(&format!("sysbench-{}", client.unique_name("init")));
    let pod = client.start_sandbox(&sandbox, handler).await?;
    tracing::info!(sandbox = %pod, "Created sandbox");

    let outcome = async {
        let container = client
            .create_container(&sandbox, &pod, "sysbench", images::SYSBENCH, &["sysbench", "--test=cpu", "run"])
            .await?;
        tracing::info!(container = %container, "Created container");

        let logs = async {
            client.start_container(&container).await?;
            client.wait_for_logs(&container).await
        }
        .await;
        let removed = client.stop_and_remove_container(&container).await;
        let logs = logs?;
        removed?;
        BenchResult::Ok(logs)
    }
    .await;

    let removed = client.stop_and_remove_sandbox(&pod).await;
    let logs = outcome?;
    removed?;
    Ok(logs)
}

fn write_json<T: Serialize + ?Sized>(target: &OutputTarget, value: &T) -> BenchResult<()> {
    match target {
        OutputTarget::Stdout => {
            let mut out = io::stdout().lock();
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputTarget::File(path) => {
            let file = File::create(path).map_err(|e| {
                BenchError::Io(format!("Failed to create {}: {}", path.display(), e))
            })?;
            let mut out = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
            out.flush()?;
        }
    }
    Ok(())
}
