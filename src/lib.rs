//! cribench - CRI Runtime Benchmarking
//!
//! This library drives container runtimes that speak the Container Runtime
//! Interface through synthetic workloads and aggregates what they measure.
//!
//! # Features
//!
//! - Sandbox and container lifecycle over `runtime.v1` gRPC
//! - Bounded-retry teardown and completion polling
//! - Composable benchmarks with mean aggregation across trials
//! - Backend × handler matrices driven from YAML plans
//!
//! # Architecture
//!
//! The crate follows a layered architecture:
//! - **Runtime**: CRI transport and lifecycle client
//! - **Benchmark**: benchmark contract, suites, matrix and workloads
//! - **Plan**: plan files that configure a matrix
//! - **Commands**: CLI subcommands on top of the above

pub mod benchmark;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod plan;
pub mod runtime;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types
pub use benchmark::{Benchmark, Matrix, MatrixEntry, Report};
pub use config::Config;
pub use error::{BenchError, BenchResult};
pub use runtime::RuntimeClient;
