//! cribench - Application Entry Point

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cribench::{
    cli::{Cli, Commands},
    commands,
    config::{Config, LogFormat},
    constants::KNOWN_BACKENDS,
    runtime::GrpcConnector,
    utils::IdGenerator,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    // Logs go to stderr so results on stdout stay machine-readable
    let json = config.logging.format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.rust_log.clone().into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();

    let connector = GrpcConnector::new(config.runtime.clone(), Arc::new(IdGenerator::new()));

    match cli.command {
        Commands::Benchmark {
            files,
            dir,
            index_file,
        } => {
            let entries = commands::benchmark(&connector, &files, &dir, &index_file).await?;
            tracing::info!(entries = entries.len(), "Benchmark finished");
        }
        Commands::List { filters } => {
            for name in commands::list(&filters) {
                println!("{}", name);
            }
        }
        Commands::Index { files } => {
            let index = commands::index(&files)?;
            println!("{}", serde_json::to_string(&index)?);
        }
        Commands::Version { backends } => {
            let backends = if backends.is_empty() {
                KNOWN_BACKENDS.iter().map(|b| (*b).to_string()).collect()
            } else {
                backends
            };

            println!("cribench {}", env!("CARGO_PKG_VERSION"));
            for found in commands::versions(&connector, &backends).await {
                println!(
                    "{}: {} {} (CRI {})",
                    found.backend,
                    found.version.runtime_name,
                    found.version.runtime_version,
                    found.version.runtime_api_version
                );
            }
        }
        Commands::Init { backend, handler } => {
            let logs = commands::init(&connector, &backend, &handler).await?;
            std::io::stdout().write_all(&logs)?;
            tracing::info!("Benchmark finished");
        }
    }

    Ok(())
}
