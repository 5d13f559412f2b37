use std::path::PathBuf;

use serde::Serialize;

use super::CliError;
use crate::backend::{onnx_model_present, OllamaClient};
use crate::config;
use crate::pipeline_config::{EmbeddingSource, PipelineConfig, SentimentSource};

/// Backend availability, as shown by `notetaker status`.
#[derive(Debug, Clone, Serialize)]
pub struct BackendStatus {
    pub ollama_url: String,
    /// Whether Ollama answered `/api/tags`.
    pub ollama_available: bool,
    pub summary_model: String,
    pub summary_model_available: bool,
    pub embedding_source: EmbeddingSource,
    pub embedding_ready: bool,
    pub sentiment_source: SentimentSource,
    pub sentiment_model_dir: PathBuf,
    pub sentiment_ready: bool,
    /// Built with the `onnx-models` feature.
    pub onnx_enabled: bool,
    /// Human-readable status summary.
    pub summary: String,
}

impl BackendStatus {
    pub fn is_ready(&self) -> bool {
        self.summary_model_available && self.embedding_ready && self.sentiment_ready
    }
}

/// Probe Ollama and the local model directories.
pub fn check_status(config: &PipelineConfig) -> Result<BackendStatus, CliError> {
    let client = OllamaClient::from_config(config)?;
    let installed = match client.list_models() {
        Ok(models) => Some(models),
        Err(e) => {
            tracing::warn!(error = %e, "Ollama not reachable");
            None
        }
    };
    Ok(status_from(config, installed.as_deref()))
}

/// Readiness given the models Ollama reported (`None` when unreachable).
fn status_from(config: &PipelineConfig, installed: Option<&[String]>) -> BackendStatus {
    let has_model = |name: &str| {
        installed.is_some_and(|models| models.iter().any(|m| m.starts_with(name)))
    };

    let onnx_enabled = cfg!(feature = "onnx-models");
    let embedding_ready = match config.embedding_source {
        EmbeddingSource::Ollama => has_model(&config.embedding_model),
        EmbeddingSource::Onnx => onnx_enabled && onnx_model_present(&config::embedding_model_dir()),
    };
    let sentiment_model_dir = config::sentiment_model_dir();
    let sentiment_ready = match config.sentiment_source {
        SentimentSource::Ollama => has_model(&config.summary_model),
        SentimentSource::Onnx => onnx_enabled && onnx_model_present(&sentiment_model_dir),
    };

    let mut status = BackendStatus {
        ollama_url: config.ollama_url.clone(),
        ollama_available: installed.is_some(),
        summary_model: config.summary_model.clone(),
        summary_model_available: has_model(&config.summary_model),
        embedding_source: config.embedding_source,
        embedding_ready,
        sentiment_source: config.sentiment_source,
        sentiment_model_dir,
        sentiment_ready,
        onnx_enabled,
        summary: String::new(),
    };
    status.summary = summarize(&status);
    status
}

fn summarize(status: &BackendStatus) -> String {
    if !status.ollama_available {
        return format!("Ollama not detected at {}", status.ollama_url);
    }
    if !status.summary_model_available {
        return format!(
            "Ollama running, summary model missing (ollama pull {})",
            status.summary_model
        );
    }
    let onnx_sentiment = status.sentiment_source == SentimentSource::Onnx;
    if onnx_sentiment && !status.onnx_enabled {
        return "Sentiment unavailable: built without the onnx-models feature".into();
    }
    if onnx_sentiment && !status.sentiment_ready {
        return format!(
            "Sentiment model missing in {}",
            status.sentiment_model_dir.display()
        );
    }
    if !status.embedding_ready {
        return "Embedding model for intent detection missing".into();
    }
    "Ready".into()
}

/// `notetaker status`.
pub fn run(config: &PipelineConfig, json: bool) -> Result<(), CliError> {
    let status = check_status(config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("{} {}", config::APP_NAME, config::APP_VERSION);
        println!("  Ollama:     {} ({})", status.ollama_url, yes_no(status.ollama_available));
        println!(
            "  Summary:    {} ({})",
            status.summary_model,
            yes_no(status.summary_model_available)
        );
        println!(
            "  Embeddings: {:?} ({})",
            status.embedding_source,
            yes_no(status.embedding_ready)
        );
        match status.sentiment_source {
            SentimentSource::Onnx => println!(
                "  Sentiment:  {} ({})",
                status.sentiment_model_dir.display(),
                yes_no(status.sentiment_ready)
            ),
            SentimentSource::Ollama => println!(
                "  Sentiment:  {} via Ollama ({})",
                status.summary_model,
                yes_no(status.sentiment_ready)
            ),
        }
        println!("  Status:     {}", status.summary);
    }
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "available"
    } else {
        "missing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ollama_config() -> PipelineConfig {
        PipelineConfig {
            embedding_source: EmbeddingSource::Ollama,
            sentiment_source: SentimentSource::Ollama,
            ..PipelineConfig::default()
        }
    }

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn unreachable_ollama_reported_not_ready() {
        let status = status_from(&ollama_config(), None);
        assert!(!status.ollama_available);
        assert!(!status.summary_model_available);
        assert!(!status.is_ready());
        assert!(status.summary.starts_with("Ollama not detected"));
    }

    #[test]
    fn ollama_only_setup_ready_with_both_models() {
        let installed = models(&["llama3.2:latest", "all-minilm:latest"]);
        let status = status_from(&ollama_config(), Some(&installed));
        assert!(status.summary_model_available);
        assert!(status.embedding_ready);
        assert!(status.sentiment_ready);
        assert!(status.is_ready());
        assert_eq!(status.summary, "Ready");
    }

    #[test]
    fn missing_summary_model_named_in_summary() {
        let installed = models(&["all-minilm:latest"]);
        let status = status_from(&ollama_config(), Some(&installed));
        assert!(!status.is_ready());
        assert!(status.summary.contains("ollama pull llama3.2"));
    }

    #[test]
    fn missing_embedding_model_reported() {
        let installed = models(&["llama3.2:latest"]);
        let status = status_from(&ollama_config(), Some(&installed));
        assert!(!status.embedding_ready);
        assert_eq!(status.summary, "Embedding model for intent detection missing");
    }

    #[cfg(not(feature = "onnx-models"))]
    #[test]
    fn onnx_sentiment_without_feature_explained() {
        let config = PipelineConfig {
            sentiment_source: SentimentSource::Onnx,
            ..ollama_config()
        };
        let installed = models(&["llama3.2:latest", "all-minilm:latest"]);
        let status = status_from(&config, Some(&installed));
        assert!(!status.sentiment_ready);
        assert!(status.summary.contains("onnx-models"));
    }

    #[test]
    fn status_serializes_for_json_output() {
        let status = status_from(&ollama_config(), None);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["ollama_available"], false);
        assert_eq!(json["sentiment_source"], "ollama");
        assert_eq!(json["onnx_enabled"], cfg!(feature = "onnx-models"));
    }
}
