use std::collections::HashSet;
use std::sync::Arc;

use crate::backend::{BackendError, Summarizer};
use crate::pipeline::{ensure_non_empty, AnalysisError};
use crate::pipeline_config::SummaryLength;

/// Abstractive summary of a transcript, cleaned of quotes and repeated
/// sentences.
pub struct TranscriptSummarizer {
    backend: Arc<dyn Summarizer + Send + Sync>,
    length: SummaryLength,
}

impl TranscriptSummarizer {
    pub fn new(backend: Arc<dyn Summarizer + Send + Sync>, length: SummaryLength) -> Self {
        Self { backend, length }
    }

    pub fn summarize(&self, text: &str) -> Result<String, AnalysisError> {
        ensure_non_empty(text, "Input text")?;

        let raw = self
            .backend
            .summarize(text, self.length)
            .map_err(AnalysisError::Summarization)?;

        let summary = clean_summary(&raw);
        if summary.trim().is_empty() {
            return Err(AnalysisError::Summarization(BackendError::MalformedOutput(
                "Summarizer returned no text".into(),
            )));
        }

        tracing::debug!(
            raw_chars = raw.len(),
            summary_chars = summary.len(),
            "Summary generated"
        );
        Ok(summary)
    }
}

/// Strip `"`, trim, and drop repeated ". "-separated sentences (first
/// occurrence kept).
pub fn clean_summary(raw: &str) -> String {
    let unquoted = raw.replace('"', "");
    let mut seen = HashSet::new();
    unquoted
        .trim()
        .split(". ")
        .filter(|sentence| seen.insert(*sentence))
        .collect::<Vec<_>>()
        .join(". ")
}
