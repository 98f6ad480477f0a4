//! Custom error types and handling
//!
//! Every fallible operation in the engine returns [`BenchResult`]. The
//! composition layers (suites, the matrix) wrap inner failures with their
//! own context instead of flattening them, so the first failure of a run can
//! be traced back to the pair and member that produced it.

/// Engine-wide error type
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    // CRI endpoint errors
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Teardown of {resource} failed after {attempts} attempts: {source}")]
    Teardown {
        resource: String,
        attempts: u32,
        #[source]
        source: Box<BenchError>,
    },

    // Workload output errors
    #[error("No line starting with {prefix:?} in workload output")]
    Extraction { prefix: String },

    #[error("Value {value:?} after {prefix:?} is not numeric")]
    Parse { prefix: String, value: String },

    // Local errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Composition context
    #[error("Suite member {member} failed: {source}")]
    Suite {
        member: String,
        #[source]
        source: Box<BenchError>,
    },

    #[error("({backend} / {handler}): {source}")]
    Matrix {
        backend: String,
        handler: String,
        #[source]
        source: Box<BenchError>,
    },
}

impl BenchError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Teardown { .. } => "TEARDOWN_ERROR",
            Self::Extraction { .. } => "EXTRACTION_ERROR",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Suite { .. } => "SUITE_ERROR",
            Self::Matrix { .. } => "MATRIX_ERROR",
        }
    }

    /// Innermost error, skipping suite and matrix context
    pub fn root_cause(&self) -> &BenchError {
        match self {
            Self::Suite { source, .. } | Self::Matrix { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Wrap this error with the (backend, handler) pair it occurred under
    pub fn in_pair(self, backend: &str, handler: &str) -> Self {
        Self::Matrix {
            backend: backend.to_string(),
            handler: handler.to_string(),
            source: Box::new(self),
        }
    }
}

impl From<tonic::Status> for BenchError {
    fn from(status: tonic::Status) -> Self {
        BenchError::Transport(format!("{:?}: {}", status.code(), status.message()))
    }
}

impl From<tonic::transport::Error> for BenchError {
    fn from(err: tonic::transport::Error) -> Self {
        BenchError::Transport(err.to_string())
    }
}

impl From<std::io::Error> for BenchError {
    fn from(err: std::io::Error) -> Self {
        BenchError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for BenchError {
    fn from(err: serde_yaml::Error) -> Self {
        BenchError::Configuration(err.to_string())
    }
}

/// Result type alias using BenchError
pub type BenchResult<T> = Result<T, BenchError>;
