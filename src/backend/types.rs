use serde::{Deserialize, Serialize};

use super::BackendError;
use crate::pipeline_config::SummaryLength;

/// Label emitted by a binary polarity model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolarityLabel {
    Positive,
    Negative,
}

/// One polarity prediction: a label and its confidence in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Polarity {
    pub label: PolarityLabel,
    pub score: f64,
}

impl Polarity {
    pub fn positive(score: f64) -> Self {
        Self {
            label: PolarityLabel::Positive,
            score,
        }
    }

    pub fn negative(score: f64) -> Self {
        Self {
            label: PolarityLabel::Negative,
            score,
        }
    }

    /// POSITIVE keeps its score, NEGATIVE is negated.
    pub fn signed(&self) -> f64 {
        match self.label {
            PolarityLabel::Positive => self.score,
            PolarityLabel::Negative => -self.score,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.score.is_finite() && (0.0..=1.0).contains(&self.score)
    }
}

/// Sentence embedding model abstraction
pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError>;
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, BackendError>;
}

/// Binary polarity classifier abstraction
pub trait Classifier {
    fn classify(&self, text: &str) -> Result<Polarity, BackendError>;

    /// Number of model tokens `text` encodes to, special tokens included.
    fn token_count(&self, text: &str) -> Result<usize, BackendError>;

    /// Maximum context window of the model, in tokens.
    fn max_input_tokens(&self) -> usize;
}

/// Abstractive summarization abstraction.
///
/// Implementations decode greedily (no sampling) so the same text always
/// yields the same summary.
pub trait Summarizer {
    fn summarize(&self, text: &str, length: SummaryLength) -> Result<String, BackendError>;
}
