pub mod entities;
pub mod sentiment;
pub mod intent;
pub mod summarize;
pub mod soap;
pub mod processor;
pub mod diagnostic; // Per-request artifact dump (NOTETAKER_DUMP_DIR)

pub use entities::EntityExtractor;
pub use intent::IntentDetector;
pub use processor::{NoteProcessor, ProcessingError};
pub use sentiment::SentimentAnalyzer;
pub use soap::SoapSynthesizer;
pub use summarize::TranscriptSummarizer;

use thiserror::Error;

use crate::backend::BackendError;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Entity extraction failed: {0}")]
    Extraction(#[source] BackendError),

    #[error("Classification failed: {0}")]
    Classification(#[source] BackendError),

    #[error("Summarization failed: {0}")]
    Summarization(#[source] BackendError),
}

impl AnalysisError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Reject empty or whitespace-only text before any backend is touched.
pub(crate) fn ensure_non_empty(text: &str, what: &str) -> Result<(), AnalysisError> {
    if text.trim().is_empty() {
        return Err(AnalysisError::InvalidInput(format!(
            "{what} must be a non-empty string"
        )));
    }
    Ok(())
}
