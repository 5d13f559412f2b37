//! Pipeline configuration: backend endpoints, model names, length bounds
//! and per-stage timeouts.
//!
//! Defaults match the reference models. Every value can be overridden with a
//! `NOTETAKER_*` environment variable; unparsable numbers fall back to the
//! default with a warning so a typo never aborts start-up.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

// ═══════════════════════════════════════════════════════════
// Defaults
// ═══════════════════════════════════════════════════════════

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_SUMMARY_MODEL: &str = "llama3.2";
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MIN_TRANSCRIPT_WORDS: usize = 5;
pub const DEFAULT_SUMMARY_MIN_TOKENS: u32 = 50;
pub const DEFAULT_SUMMARY_MAX_TOKENS: u32 = 150;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Token bounds handed to the summarization backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummaryLength {
    pub min_tokens: u32,
    pub max_tokens: u32,
}

impl Default for SummaryLength {
    fn default() -> Self {
        Self {
            min_tokens: DEFAULT_SUMMARY_MIN_TOKENS,
            max_tokens: DEFAULT_SUMMARY_MAX_TOKENS,
        }
    }
}

/// Where the embedder for intent detection comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingSource {
    /// Local ONNX model directory (requires the `onnx-models` feature).
    Onnx,
    /// Ollama `/api/embed`.
    Ollama,
}

/// Where the polarity classifier for sentiment comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentSource {
    /// Local DistilBERT ONNX model (requires the `onnx-models` feature).
    Onnx,
    /// The summary model prompted for a JSON polarity verdict.
    Ollama,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    /// Base URL of the local Ollama instance.
    pub ollama_url: String,
    /// Ollama model used for abstractive summarization.
    pub summary_model: String,
    /// Ollama model used when `embedding_source` is `Ollama`.
    pub embedding_model: String,
    pub embedding_source: EmbeddingSource,
    pub sentiment_source: SentimentSource,
    /// HTTP client timeout for Ollama calls.
    pub http_timeout_secs: u64,
    /// Upper bound on a single analysis stage.
    pub stage_timeout_secs: u64,
    /// Transcripts with fewer whitespace-separated words are rejected.
    pub min_transcript_words: usize,
    pub summary_length: SummaryLength,
    /// Per-request diagnostic artifacts are written here when set.
    pub dump_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.into(),
            summary_model: DEFAULT_SUMMARY_MODEL.into(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.into(),
            embedding_source: if cfg!(feature = "onnx-models") {
                EmbeddingSource::Onnx
            } else {
                EmbeddingSource::Ollama
            },
            sentiment_source: if cfg!(feature = "onnx-models") {
                SentimentSource::Onnx
            } else {
                SentimentSource::Ollama
            },
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            stage_timeout_secs: DEFAULT_STAGE_TIMEOUT_SECS,
            min_transcript_words: DEFAULT_MIN_TRANSCRIPT_WORDS,
            summary_length: SummaryLength::default(),
            dump_dir: None,
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `NOTETAKER_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable lookup (tests avoid touching
    /// the process environment).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("NOTETAKER_OLLAMA_URL") {
            config.ollama_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("NOTETAKER_SUMMARY_MODEL") {
            config.summary_model = model;
        }
        if let Some(model) = lookup("NOTETAKER_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        if let Some(dir) = lookup("NOTETAKER_DUMP_DIR").filter(|d| !d.trim().is_empty()) {
            config.dump_dir = Some(PathBuf::from(dir));
        }
        if let Some(source) = lookup("NOTETAKER_EMBEDDING_SOURCE") {
            match source.to_lowercase().as_str() {
                "onnx" => config.embedding_source = EmbeddingSource::Onnx,
                "ollama" => config.embedding_source = EmbeddingSource::Ollama,
                other => tracing::warn!(value = other, "Unknown NOTETAKER_EMBEDDING_SOURCE, keeping default"),
            }
        }
        if let Some(source) = lookup("NOTETAKER_SENTIMENT_SOURCE") {
            match source.to_lowercase().as_str() {
                "onnx" => config.sentiment_source = SentimentSource::Onnx,
                "ollama" => config.sentiment_source = SentimentSource::Ollama,
                other => tracing::warn!(value = other, "Unknown NOTETAKER_SENTIMENT_SOURCE, keeping default"),
            }
        }

        config.http_timeout_secs =
            parse_or(&lookup, "NOTETAKER_HTTP_TIMEOUT_SECS", config.http_timeout_secs);
        config.stage_timeout_secs =
            parse_or(&lookup, "NOTETAKER_STAGE_TIMEOUT_SECS", config.stage_timeout_secs);
        config.min_transcript_words =
            parse_or(&lookup, "NOTETAKER_MIN_TRANSCRIPT_WORDS", config.min_transcript_words);
        config.summary_length.min_tokens = parse_or(
            &lookup,
            "NOTETAKER_SUMMARY_MIN_TOKENS",
            config.summary_length.min_tokens,
        );
        config.summary_length.max_tokens = parse_or(
            &lookup,
            "NOTETAKER_SUMMARY_MAX_TOKENS",
            config.summary_length.max_tokens,
        );

        if config.summary_length.min_tokens > config.summary_length.max_tokens {
            tracing::warn!(
                min = config.summary_length.min_tokens,
                max = config.summary_length.max_tokens,
                "Summary min tokens exceeds max, restoring defaults"
            );
            config.summary_length = SummaryLength::default();
        }

        config
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Invalid numeric override, using default");
                default
            }
        },
        None => default,
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
