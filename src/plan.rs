//! Benchmark plan files
//!
//! A plan is a YAML document naming the backends and handlers to cross,
//! the catalog filters to apply and how many trials to run:
//!
//! ```yaml
//! cri: [containerd, crio]
//! oci: [runc, runsc]
//! filter: [performance]
//! runs: 5
//! output: results.json
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::benchmark::{Benchmark, Matrix, filter};
use crate::error::{BenchError, BenchResult};

/// Parsed plan file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Plan {
    /// Execution handlers
    pub oci: Vec<String>,
    /// CRI backends
    pub cri: Vec<String>,
    /// Result file name; empty means stdout
    pub output: String,
    /// Name prefixes, applied one after another
    pub filter: Vec<String>,
    pub runs: i64,
}

/// Where a plan's results are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl Plan {
    /// Read and validate a plan file
    pub fn parse(path: &Path) -> BenchResult<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            BenchError::Io(format!("Failed to read plan {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> BenchResult<Self> {
        let plan: Plan = serde_yaml::from_str(data)?;
        plan.validate()?;
        Ok(plan)
    }

    fn validate(&self) -> BenchResult<()> {
        if self.runs < 1 {
            return Err(BenchError::Configuration(
                "runs must be larger than 0".to_string(),
            ));
        }
        if u32::try_from(self.runs).is_err() {
            return Err(BenchError::Configuration(format!(
                "runs must not exceed {}",
                u32::MAX
            )));
        }
        Ok(())
    }

    /// Build the matrix over `catalog`, narrowed by every filter in turn
    pub fn matrix(&self, catalog: &[Arc<dyn Benchmark>]) -> BenchResult<Matrix> {
        let items = self
            .filter
            .iter()
            .fold(catalog.to_vec(), |items, prefix| filter(&items, prefix));

        let runs = u32::try_from(self.runs)
            .ok()
            .filter(|runs| *runs >= 1)
            .ok_or_else(|| BenchError::Configuration("runs must be larger than 0".to_string()))?;

        Ok(Matrix {
            backends: self.cri.clone(),
            handlers: self.oci.clone(),
            items,
            runs,
        })
    }

    /// Resolve the output target relative to `dir`
    pub fn output_target(&self, dir: &Path) -> OutputTarget {
        if self.output.is_empty() {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(dir.join(&self.output))
        }
    }
}
