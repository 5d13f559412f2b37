use std::sync::Arc;

use crate::backend::{BackendError, Classifier};
use crate::models::SentimentLabel;
use crate::pipeline::{ensure_non_empty, AnalysisError};

/// Maps a transcript to one of five sentiment labels using a binary
/// polarity model.
pub struct SentimentAnalyzer {
    classifier: Arc<dyn Classifier + Send + Sync>,
}

impl SentimentAnalyzer {
    pub fn new(classifier: Arc<dyn Classifier + Send + Sync>) -> Self {
        Self { classifier }
    }

    pub fn classify(&self, text: &str) -> Result<SentimentLabel, AnalysisError> {
        let score = self.signed_score(text)?;
        Ok(label_for_score(score))
    }

    /// Signed polarity of the whole text in [-1, 1].
    ///
    /// Text longer than the model window is cut into character chunks of
    /// window size and the chunk scores are averaged.
    pub fn signed_score(&self, text: &str) -> Result<f64, AnalysisError> {
        ensure_non_empty(text, "Input text")?;

        let max_len = self.classifier.max_input_tokens();
        if max_len == 0 {
            return Err(AnalysisError::Classification(BackendError::MalformedOutput(
                "Classifier reports a zero-length context window".into(),
            )));
        }

        let token_count = self
            .classifier
            .token_count(text)
            .map_err(AnalysisError::Classification)?;

        if token_count <= max_len {
            return self.score_one(text);
        }

        let chunks = split_into_char_chunks(text, max_len);
        tracing::debug!(token_count, max_len, chunks = chunks.len(), "Chunking long input");

        let mut total = 0.0;
        for chunk in &chunks {
            total += self.score_one(chunk)?;
        }
        Ok(total / chunks.len() as f64)
    }

    fn score_one(&self, text: &str) -> Result<f64, AnalysisError> {
        let polarity = self
            .classifier
            .classify(text)
            .map_err(AnalysisError::Classification)?;
        if !polarity.is_well_formed() {
            return Err(AnalysisError::Classification(BackendError::MalformedOutput(
                format!("Polarity score {} outside [0, 1]", polarity.score),
            )));
        }
        Ok(polarity.signed())
    }
}

/// Five-way label for a signed score.
pub fn label_for_score(score: f64) -> SentimentLabel {
    if score > 0.5 {
        SentimentLabel::Positive
    } else if score > 0.1 {
        SentimentLabel::Reassured
    } else if score >= -0.1 {
        SentimentLabel::Neutral
    } else if score >= -0.5 {
        SentimentLabel::Concerned
    } else {
        SentimentLabel::Negative
    }
}

/// Consecutive slices of `size` characters; the last may be shorter.
pub fn split_into_char_chunks(text: &str, size: usize) -> Vec<&str> {
    if size == 0 {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    for (count, (idx, _)) in text.char_indices().enumerate() {
        if count > 0 && count % size == 0 {
            chunks.push(&text[start..idx]);
            start = idx;
        }
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}
