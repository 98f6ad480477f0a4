//! Backend × handler × item × trial orchestration

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{BenchError, BenchResult};
use crate::runtime::{Connector, RuntimeClient};

use super::{Benchmark, Report};

/// One item measured under one (backend, handler) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixResult {
    pub name: String,
    /// Mean over all trials, same labels as each trial
    pub aggregated: Report,
    /// Per-trial reports in execution order
    pub reports: Vec<Report>,
}

/// All items measured under one (backend, handler) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixEntry {
    pub backend: String,
    pub handler: String,
    pub results: Vec<MatrixResult>,
}

/// Declared labels of one benchmark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub labels: Vec<String>,
}

/// Benchmark name to label schema, independent of any trial data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Index(BTreeMap<String, IndexEntry>);

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a benchmark's labels, replacing any earlier entry
    pub fn record(&mut self, benchmark: &dyn Benchmark) {
        self.0.insert(
            benchmark.name(),
            IndexEntry {
                labels: benchmark.labels(),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The configured cross product of one plan
#[derive(Clone)]
pub struct Matrix {
    pub backends: Vec<String>,
    pub handlers: Vec<String>,
    pub items: Vec<Arc<dyn Benchmark>>,
    pub runs: u32,
}

impl Matrix {
    /// Execute every pair, backend-major and handler-minor.
    ///
    /// The first failing trial aborts the whole run. Pairs completed before
    /// it are not returned. Each pair's client is closed whether or not the
    /// pair succeeded.
    pub async fn run(&self, connector: &dyn Connector) -> BenchResult<Vec<MatrixEntry>> {
        if self.runs < 1 {
            return Err(BenchError::Configuration(
                "runs must be larger than 0".to_string(),
            ));
        }

        let mut entries = Vec::with_capacity(self.backends.len() * self.handlers.len());

        for backend in &self.backends {
            for handler in &self.handlers {
                tracing::info!(
                    backend = %backend,
                    handler = %handler,
                    items = self.items.len(),
                    runs = self.runs,
                    "Running benchmark matrix entry"
                );

                let outcome = match connector.connect(backend).await {
                    Ok(client) => {
                        let results = self.run_pair(&client, handler).await;
                        client.close().await;
                        results
                    }
                    Err(e) => Err(e),
                };

                match outcome {
                    Ok(results) => entries.push(MatrixEntry {
                        backend: backend.clone(),
                        handler: handler.clone(),
                        results,
                    }),
                    Err(e) => {
                        tracing::error!(
                            backend = %backend,
                            handler = %handler,
                            completed = entries.len(),
                            error = %e,
                            "Matrix run aborted"
                        );
                        return Err(e.in_pair(backend, handler));
                    }
                }
            }
        }

        Ok(entries)
    }

    /// Record every item's label schema
    pub fn index(&self, index: &mut Index) {
        for item in &self.items {
            index.record(item.as_ref());
        }
    }

    async fn run_pair(
        &self,
        client: &RuntimeClient,
        handler: &str,
    ) -> BenchResult<Vec<MatrixResult>> {
        let mut results = Vec::with_capacity(self.items.len());
        for item in &self.items {
            results.push(self.run_item(item.as_ref(), client, handler).await?);
        }
        Ok(results)
    }

    async fn run_item(
        &self,
        item: &dyn Benchmark,
        client: &RuntimeClient,
        handler: &str,
    ) -> BenchResult<MatrixResult> {
        let name = item.name();
        let mut sum = Report::new();
        let mut reports = Vec::with_capacity(self.runs as usize);

        for trial in 1..=self.runs {
            tracing::info!(item = %name, trial, runs = self.runs, "Running benchmark trial");
            let report = item.run(client, handler).await?;
            sum = sum.aggregate(&report);
            reports.push(report);
        }

        Ok(MatrixResult {
            name,
            aggregated: sum.scale(self.runs),
            reports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeConnector, FakeRuntime, FixedBenchmark};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    fn matrix(item: Arc<FixedBenchmark>, runs: u32) -> Matrix {
        Matrix {
            backends: strings(&["A", "B"]),
            handlers: strings(&["x", "y"]),
            items: vec![item as Arc<dyn Benchmark>],
            runs,
        }
    }

    #[tokio::test]
    async fn test_full_matrix_order_and_means() {
        let item = Arc::new(FixedBenchmark::new("bench.fixed", &["T"], 2.0));
        let connector = FakeConnector::new(FakeRuntime::new());

        let entries = matrix(item.clone(), 5).run(&connector).await.unwrap();

        let pairs: Vec<(&str, &str)> = entries
            .iter()
            .map(|e| (e.backend.as_str(), e.handler.as_str()))
            .collect();
        assert_eq!(pairs, vec![("A", "x"), ("A", "y"), ("B", "x"), ("B", "y")]);

        let expected = Report::from([("T", 2.0)]);
        for entry in &entries {
            assert_eq!(entry.results.len(), 1);
            let result = &entry.results[0];
            assert_eq!(result.name, "bench.fixed");
            assert_eq!(result.aggregated, expected);
            assert_eq!(result.reports, vec![expected.clone(); 5]);
        }

        assert_eq!(item.calls(), 20);
        assert_eq!(&item.handlers()[..5], &strings(&["x"; 5])[..]);
        assert_eq!(connector.connects(), strings(&["A", "A", "B", "B"]));
        assert_eq!(connector.runtime.close_calls(), 4);
    }

    #[tokio::test]
    async fn test_failed_trial_aborts_run() {
        let item = Arc::new(FixedBenchmark::new("bench.fixed", &["T"], 2.0).failing_on_call(3));
        let connector = FakeConnector::new(FakeRuntime::new());

        let err = matrix(item.clone(), 5).run(&connector).await.unwrap_err();

        match &err {
            BenchError::Matrix { backend, handler, .. } => {
                assert_eq!(backend, "A");
                assert_eq!(handler, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.root_cause().error_code(), "EXTRACTION_ERROR");
        assert_eq!(item.calls(), 3);
        assert_eq!(connector.connects(), strings(&["A"]));
        assert_eq!(connector.runtime.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_in_later_pair_still_closes_client() {
        // 5 trials per pair, so call 12 lands in the third pair (B, x)
        let item = Arc::new(FixedBenchmark::new("bench.fixed", &["T"], 1.0).failing_on_call(12));
        let connector = FakeConnector::new(FakeRuntime::new());

        let err = matrix(item, 5).run(&connector).await.unwrap_err();

        assert!(err.to_string().starts_with("(B / x): "));
        assert_eq!(connector.runtime.close_calls(), 3);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_wrapped() {
        let item = Arc::new(FixedBenchmark::new("bench.fixed", &["T"], 1.0));
        let connector = FakeConnector::new(FakeRuntime::new()).unreachable("B");

        let err = matrix(item.clone(), 1).run(&connector).await.unwrap_err();

        assert!(err.to_string().starts_with("(B / x): "));
        assert_eq!(err.root_cause().error_code(), "TRANSPORT_ERROR");
        assert_eq!(item.calls(), 2);
    }

    #[tokio::test]
    async fn test_zero_runs_rejected() {
        let item = Arc::new(FixedBenchmark::new("bench.fixed", &["T"], 1.0));
        let connector = FakeConnector::new(FakeRuntime::new());

        let err = matrix(item, 0).run(&connector).await.unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
        assert!(connector.connects().is_empty());
    }

    #[test]
    fn test_index_records_labels_only() {
        let m = Matrix {
            backends: vec![],
            handlers: vec![],
            items: vec![
                Arc::new(FixedBenchmark::new("a", &["X", "Y"], 1.0)),
                Arc::new(FixedBenchmark::new("b", &["T"], 1.0)),
            ],
            runs: 1,
        };

        let mut index = Index::new();
        m.index(&mut index);

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("a").unwrap().labels, strings(&["X", "Y"]));
        assert_eq!(
            serde_json::to_value(&index).unwrap(),
            serde_json::json!({ "a": { "labels": ["X", "Y"] }, "b": { "labels": ["T"] } })
        );
    }
}
