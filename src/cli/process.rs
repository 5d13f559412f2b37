use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::CliError;
use crate::backend::{BackendError, Classifier, Embedder, OllamaClient};
use crate::ingest;
use crate::models::AnalysisReport;
use crate::pipeline::NoteProcessor;
use crate::pipeline_config::{EmbeddingSource, PipelineConfig, SentimentSource};

/// `notetaker process`: ingest, analyse, write the report.
pub fn run(
    input: &str,
    output: Option<&Path>,
    compact: bool,
    config: PipelineConfig,
) -> Result<(), CliError> {
    let transcript = ingest::load(input)?;

    // Blocking HTTP clients are built and dropped outside the async runtime
    let processor = build_processor(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;
    let result = runtime.block_on(processor.process(&transcript));
    // Timed-out stages may still hold a blocking thread
    runtime.shutdown_timeout(Duration::from_secs(1));
    let report = result?;

    let json = render(&report, compact)?;
    write_report(&json, output)?;
    if let Some(path) = output {
        tracing::info!(path = %path.display(), "Report written");
    }
    Ok(())
}

/// Wire the pipeline to real backends: Ollama for summaries, and for
/// sentiment and embeddings when configured; ONNX models from the data
/// directory otherwise.
pub fn build_processor(config: &PipelineConfig) -> Result<NoteProcessor, CliError> {
    let ollama = Arc::new(OllamaClient::from_config(config)?);

    let embedder: Arc<dyn Embedder + Send + Sync> = match config.embedding_source {
        EmbeddingSource::Ollama => ollama.clone(),
        EmbeddingSource::Onnx => load_onnx_embedder()?,
    };
    let classifier: Arc<dyn Classifier + Send + Sync> = match config.sentiment_source {
        SentimentSource::Ollama => ollama.clone(),
        SentimentSource::Onnx => load_onnx_classifier()?,
    };

    tracing::info!(
        ollama = %ollama.base_url(),
        summary_model = %ollama.summary_model(),
        embedding_source = ?config.embedding_source,
        sentiment_source = ?config.sentiment_source,
        "Backends ready"
    );

    Ok(NoteProcessor::from_backends(
        classifier,
        embedder,
        ollama,
        config.clone(),
    )?)
}

#[cfg(feature = "onnx-models")]
fn load_onnx_embedder() -> Result<Arc<dyn Embedder + Send + Sync>, BackendError> {
    let embedder = crate::backend::OnnxEmbedder::load(&crate::config::embedding_model_dir())?;
    Ok(Arc::new(embedder))
}

#[cfg(not(feature = "onnx-models"))]
fn load_onnx_embedder() -> Result<Arc<dyn Embedder + Send + Sync>, BackendError> {
    Err(BackendError::Unavailable(
        "ONNX embeddings need the `onnx-models` feature; set NOTETAKER_EMBEDDING_SOURCE=ollama".into(),
    ))
}

#[cfg(feature = "onnx-models")]
fn load_onnx_classifier() -> Result<Arc<dyn Classifier + Send + Sync>, BackendError> {
    let classifier =
        crate::backend::OnnxSentimentClassifier::load(&crate::config::sentiment_model_dir())?;
    Ok(Arc::new(classifier))
}

#[cfg(not(feature = "onnx-models"))]
fn load_onnx_classifier() -> Result<Arc<dyn Classifier + Send + Sync>, BackendError> {
    Err(BackendError::Unavailable(
        "ONNX sentiment needs the `onnx-models` feature; set NOTETAKER_SENTIMENT_SOURCE=ollama".into(),
    ))
}

/// Serialize the report, 4-space pretty-printed unless `compact`.
pub fn render(report: &AnalysisReport, compact: bool) -> Result<String, serde_json::Error> {
    if compact {
        serde_json::to_string(report)
    } else {
        report.to_json_pretty()
    }
}

fn write_report(json: &str, output: Option<&Path>) -> std::io::Result<()> {
    match output {
        Some(path) => std::fs::write(path, format!("{json}\n")),
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Assessment, EntityBag, Intent, Objective, Plan, SentimentLabel, Severity, SoapNote,
        Subjective,
    };

    fn report() -> AnalysisReport {
        AnalysisReport {
            summary: "Patient recovering well.".into(),
            entities: EntityBag::from_lists(&["pain"], &["physiotherapy"], &[], &["recovery"]),
            sentiment: SentimentLabel::Reassured,
            intent: Intent::DiscussingRecovery,
            soap_note: SoapNote {
                subjective: Subjective {
                    chief_complaint: "pain".into(),
                    history_of_present_illness: "Patient recovering well.".into(),
                },
                objective: Objective {
                    physical_exam: "Signs of discomfort and limited range of motion.".into(),
                    observations: "Patient appears in normal health.".into(),
                },
                assessment: Assessment {
                    diagnosis: "No specific diagnosis identified".into(),
                    severity: Severity::Mild,
                },
                plan: Plan {
                    treatment: "physiotherapy".into(),
                    follow_up: "Full recovery expected within six months.".into(),
                },
            },
        }
    }

    #[test]
    fn compact_render_is_single_line() {
        let json = render(&report(), true).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.starts_with("{\"Summary\""));
    }

    #[test]
    fn pretty_render_uses_four_space_indent() {
        let json = render(&report(), false).unwrap();
        assert!(json.contains("\n    \"Summary\": "));
    }

    #[test]
    fn report_written_to_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let json = render(&report(), false).unwrap();
        write_report(&json, Some(&path)).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: AnalysisReport = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, report());
    }

    #[test]
    fn ollama_backends_need_no_onnx_models() {
        let config = PipelineConfig {
            sentiment_source: SentimentSource::Ollama,
            embedding_source: EmbeddingSource::Ollama,
            ..PipelineConfig::default()
        };
        assert!(build_processor(&config).is_ok());
    }

    #[cfg(not(feature = "onnx-models"))]
    #[test]
    fn default_build_processes_without_onnx_feature() {
        assert!(build_processor(&PipelineConfig::default()).is_ok());
    }

    #[cfg(not(feature = "onnx-models"))]
    #[test]
    fn onnx_sentiment_requires_feature() {
        let config = PipelineConfig {
            sentiment_source: SentimentSource::Onnx,
            ..PipelineConfig::default()
        };
        let err = build_processor(&config).err().unwrap();
        assert!(matches!(err, CliError::Backend(BackendError::Unavailable(_))));
        assert!(err.to_string().contains("onnx-models"));
    }

    #[test]
    fn empty_input_file_fails_before_backends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "").unwrap();
        let err = run(path.to_str().unwrap(), None, false, PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::Ingest(ingest::IngestError::Empty)));
    }
}
