pub mod backend; // Embedder / Classifier / Summarizer backends
pub mod cli;
pub mod config;
pub mod ingest; // Transcript upload (.txt / stdin)
pub mod models;
pub mod pipeline;
pub mod pipeline_config;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. Logs go to stderr so stdout
/// carries only the report.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> ExitCode {
    let cli = cli::Cli::parse();
    init_tracing();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let pipeline_config = pipeline_config::PipelineConfig::from_env();
    match cli::dispatch(cli, pipeline_config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
