// Regent document exploration agent
// Main entry point for the Regent binary

use clap::Parser;
use regent_engine::cli::{Cli, Command};
use regent_engine::config::Config;
use regent_engine::handlers::{error_hint, handle_index, handle_run, OutputFormat, RunRequest};
use regent_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        if let Some(hint) = error_hint(&e) {
            eprintln!("Hint: {}", hint);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // Only the first subscriber install takes effect, so resolve the level
    // once: RUST_LOG > --log > config
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    tracing::info!("Regent v{}", env!("CARGO_PKG_VERSION"));

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match cli.command {
        Command::Run {
            query,
            model,
            experiment,
            skip_index_regeneration,
        } => {
            tracing::info!("Exploring {} for: {}", experiment, query);
            let request = RunRequest {
                query,
                model,
                experiment,
                skip_index_regeneration,
            };
            handle_run(request, &config, format).await
        }

        Command::Index { experiment } => {
            tracing::info!("Indexing {}", experiment);
            handle_index(&experiment, &config, format).await
        }
    }
}
