//! CLI command definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::constants::DEFAULT_INDEX_FILE;

/// Benchmark CRI runtimes across execution handlers
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the benchmark matrix of one or more plan files
    Benchmark {
        /// Plan files
        #[arg(short, long = "file", default_value = "default.yaml", num_args = 1..)]
        files: Vec<PathBuf>,

        /// Output destination directory
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// File name of the merged index inside the output directory
        #[arg(long, default_value = DEFAULT_INDEX_FILE)]
        index_file: String,
    },

    /// List available benchmarks
    List {
        /// Name prefixes, applied one after another
        #[arg(short, long = "filter")]
        filters: Vec<String>,
    },

    /// Print the label index of the benchmarks selected by plan files
    Index {
        /// Plan files
        #[arg(short, long = "file", default_value = "default.yaml", num_args = 1..)]
        files: Vec<PathBuf>,
    },

    /// Print tool and runtime versions
    Version {
        /// Backends to query (defaults to all known backends)
        #[arg(short = 'c', long = "cri")]
        backends: Vec<String>,
    },

    /// Run a single sysbench CPU container and print its output
    Init {
        /// Backend to connect to
        #[arg(short = 'c', long = "cri", default_value = "containerd")]
        backend: String,

        /// Execution handler for the sandbox
        #[arg(short = 'r', long = "runtime", default_value = "runc")]
        handler: String,
    },
}
