//! Sysbench-backed workloads

use async_trait::async_trait;

use crate::benchmark::{Benchmark, Report};
use crate::constants::images;
use crate::error::BenchResult;
use crate::runtime::RuntimeClient;
use crate::utils::parse_prefixed_value;

use super::{Limits, run_to_completion};

/// One sysbench invocation and the values read from its output
#[derive(Debug, Clone)]
pub struct Measurement {
    pub args: &'static [&'static str],
    /// (label, output line prefix)
    pub values: &'static [(&'static str, &'static str)],
}

/// A benchmark made of one or more sysbench runs, each in its own sandbox
#[derive(Debug, Clone)]
pub struct Sysbench {
    name: &'static str,
    measurements: Vec<Measurement>,
    limits: Limits,
}

impl Sysbench {
    pub fn new(name: &'static str, measurements: Vec<Measurement>) -> Self {
        Self {
            name,
            measurements,
            limits: Limits::Unconstrained,
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }
}

#[async_trait]
impl Benchmark for Sysbench {
    fn name(&self) -> String {
        self.name.to_string()
    }

    fn labels(&self) -> Vec<String> {
        self.measurements
            .iter()
            .flat_map(|measurement| measurement.values.iter())
            .map(|(label, _)| (*label).to_string())
            .collect()
    }

    async fn run(&self, client: &RuntimeClient, handler: &str) -> BenchResult<Report> {
        let mut report = Report::new();

        for measurement in &self.measurements {
            let logs = run_to_completion(
                client,
                handler,
                self.name,
                images::SYSBENCH,
                measurement.args,
                &self.limits,
            )
            .await?;

            for (label, prefix) in measurement.values {
                report.insert(*label, parse_prefixed_value(&logs, prefix)?);
            }
        }

        Ok(report)
    }
}
