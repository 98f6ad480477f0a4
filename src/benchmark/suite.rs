//! Ordered composition of benchmarks

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{BenchError, BenchResult};
use crate::runtime::RuntimeClient;

use super::{Benchmark, Report};

/// One member's report from a suite run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedReport {
    pub name: String,
    pub report: Report,
}

/// Benchmarks run one after another as a single unit
#[derive(Clone, Default)]
pub struct Suite {
    members: Vec<Arc<dyn Benchmark>>,
}

impl Suite {
    pub fn new(members: Vec<Arc<dyn Benchmark>>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &[Arc<dyn Benchmark>] {
        &self.members
    }

    /// Run every member in order.
    ///
    /// Stops at the first failing member; reports gathered before it are
    /// dropped and the error is wrapped with the member's name.
    pub async fn run_members(
        &self,
        client: &RuntimeClient,
        handler: &str,
    ) -> BenchResult<Vec<NamedReport>> {
        let mut reports = Vec::with_capacity(self.members.len());

        for member in &self.members {
            let name = member.name();
            tracing::debug!(item = %name, handler = %handler, "Running suite member");

            let report = member
                .run(client, handler)
                .await
                .map_err(|e| BenchError::Suite {
                    member: name.clone(),
                    source: Box::new(e),
                })?;

            reports.push(NamedReport { name, report });
        }

        Ok(reports)
    }
}

/// A suite is itself a benchmark whose labels are `member/label`
#[async_trait]
impl Benchmark for Suite {
    fn name(&self) -> String {
        let names: Vec<String> = self.members.iter().map(|m| m.name()).collect();
        format!("Suite [{}]", names.join(", "))
    }

    fn labels(&self) -> Vec<String> {
        self.members
            .iter()
            .flat_map(|member| {
                let name = member.name();
                member
                    .labels()
                    .into_iter()
                    .map(move |label| format!("{}/{}", name, label))
            })
            .collect()
    }

    async fn run(&self, client: &RuntimeClient, handler: &str) -> BenchResult<Report> {
        let mut flat = Report::new();
        for named in self.run_members(client, handler).await? {
            flat.extend(
                named
                    .report
                    .namespaced(&named.name)
                    .iter()
                    .map(|(label, value)| (label.to_string(), value)),
            );
        }
        Ok(flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeRuntime, FixedBenchmark};
    use crate::utils::IdGenerator;

    fn client() -> RuntimeClient {
        RuntimeClient::new(Box::new(FakeRuntime::new()), Arc::new(IdGenerator::new()))
    }

    #[test]
    fn test_name_joins_members() {
        let suite = Suite::new(vec![
            Arc::new(FixedBenchmark::new("a", &["T"], 1.0)),
            Arc::new(FixedBenchmark::new("b", &["T"], 1.0)),
        ]);
        assert_eq!(suite.name(), "Suite [a, b]");
        assert_eq!(Suite::default().name(), "Suite []");
    }

    #[tokio::test]
    async fn test_run_members_in_order() {
        let suite = Suite::new(vec![
            Arc::new(FixedBenchmark::new("second", &["T"], 2.0)),
            Arc::new(FixedBenchmark::new("first", &["T"], 1.0)),
        ]);

        let reports = suite.run_members(&client(), "runc").await.unwrap();
        let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["second", "first"]);
        assert_eq!(reports[0].report.get("T"), Some(2.0));
    }

    #[tokio::test]
    async fn test_fails_fast_on_first_member_error() {
        let failing = Arc::new(FixedBenchmark::new("broken", &["T"], 1.0).failing_on_call(1));
        let after = Arc::new(FixedBenchmark::new("after", &["T"], 1.0));
        let suite = Suite::new(vec![
            Arc::new(FixedBenchmark::new("ok", &["T"], 1.0)),
            failing,
            after.clone(),
        ]);

        let err = suite.run_members(&client(), "runc").await.unwrap_err();
        match &err {
            BenchError::Suite { member, .. } => assert_eq!(member, "broken"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.root_cause().error_code(), "EXTRACTION_ERROR");
        assert_eq!(after.calls(), 0);
    }

    #[tokio::test]
    async fn test_run_flattens_labels() {
        let suite = Suite::new(vec![
            Arc::new(FixedBenchmark::new("a", &["X", "Y"], 1.0)),
            Arc::new(FixedBenchmark::new("b", &["X"], 3.0)),
        ]);

        let report = suite.run(&client(), "runc").await.unwrap();
        assert_eq!(suite.labels(), vec!["a/X", "a/Y", "b/X"]);
        assert_eq!(report.labels().collect::<Vec<_>>(), vec!["a/X", "a/Y", "b/X"]);
        assert_eq!(report.get("b/X"), Some(3.0));
    }
}
