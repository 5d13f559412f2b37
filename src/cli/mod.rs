//! Command-line surface: argument parsing and command dispatch.

pub mod process;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::backend::BackendError;
use crate::ingest::IngestError;
use crate::pipeline::{AnalysisError, ProcessingError};
use crate::pipeline_config::PipelineConfig;

#[derive(Parser, Debug)]
#[command(name = "notetaker", version)]
#[command(about = "Turn a consultation transcript into a summary, entities, sentiment, intent and a SOAP note")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyse a transcript and print the JSON report
    Process {
        /// Transcript file (.txt), or `-` for stdin
        input: String,
        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
        /// Write per-request diagnostic artifacts (default dir unless NOTETAKER_DUMP_DIR is set)
        #[arg(long)]
        dump: bool,
    },
    /// Report backend and model availability
    Status {
        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error("Backend setup failed: {0}")]
    Backend(#[from] BackendError),

    #[error("Pipeline setup failed: {0}")]
    Setup(#[from] AnalysisError),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Could not write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Could not serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Execute a parsed command line.
pub fn dispatch(cli: Cli, mut config: PipelineConfig) -> Result<(), CliError> {
    match cli.command {
        Commands::Process {
            input,
            output,
            compact,
            dump,
        } => {
            if dump && config.dump_dir.is_none() {
                config.dump_dir = Some(crate::config::diagnostic_dir());
            }
            process::run(&input, output.as_deref(), compact, config)
        }
        Commands::Status { json } => status::run(&config, json),
    }
}
