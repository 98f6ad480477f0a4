//! Benchmark execution engine
//!
//! A [`Benchmark`] is a named unit of work that drives a [`RuntimeClient`]
//! through one trial and returns a [`Report`]. Benchmarks compose in two
//! ways:
//!
//! 1. **Suites** (`suite.rs`): an ordered group run member by member,
//!    failing fast on the first error.
//!
//! 2. **Matrices** (`matrix.rs`): every item run repeatedly against every
//!    (backend, handler) pair, with trial reports folded into a mean.
//!
//! The concrete workloads live in `workloads/`.

pub mod matrix;
pub mod report;
pub mod suite;
pub mod workloads;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BenchResult;
use crate::runtime::RuntimeClient;

pub use matrix::{Index, IndexEntry, Matrix, MatrixEntry, MatrixResult};
pub use report::Report;
pub use suite::{NamedReport, Suite};

/// A measurable workload.
///
/// `name` must be unique within one execution and stable across calls.
/// Every report returned by `run` carries exactly the labels listed by
/// `labels`.
#[async_trait]
pub trait Benchmark: Send + Sync {
    fn name(&self) -> String;

    fn labels(&self) -> Vec<String>;

    /// Run one trial under `handler`, tearing down everything it created
    async fn run(&self, client: &RuntimeClient, handler: &str) -> BenchResult<Report>;
}

/// Keep the benchmarks whose name starts with `prefix`, in order
pub fn filter(benchmarks: &[Arc<dyn Benchmark>], prefix: &str) -> Vec<Arc<dyn Benchmark>> {
    benchmarks
        .iter()
        .filter(|bm| bm.name().starts_with(prefix))
        .cloned()
        .collect()
}
