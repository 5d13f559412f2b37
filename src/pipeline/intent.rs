use std::sync::Arc;

use crate::backend::{BackendError, Embedder};
use crate::models::Intent;
use crate::pipeline::{ensure_non_empty, AnalysisError};

/// Nearest-phrase intent detection over sentence embeddings.
///
/// The transcript is embedded alongside the five intent phrases and the
/// intent with the highest cosine similarity wins. Ties go to the earlier
/// intent in `Intent::ALL`. There is no confidence threshold.
pub struct IntentDetector {
    embedder: Arc<dyn Embedder + Send + Sync>,
}

impl IntentDetector {
    pub fn new(embedder: Arc<dyn Embedder + Send + Sync>) -> Self {
        Self { embedder }
    }

    pub fn detect(&self, text: &str) -> Result<Intent, AnalysisError> {
        ensure_non_empty(text, "Input text")?;

        let phrases: Vec<&str> = Intent::ALL.iter().map(|i| i.as_str()).collect();
        let intent_vectors = self
            .embedder
            .embed_batch(&phrases)
            .map_err(AnalysisError::Classification)?;
        if intent_vectors.len() != phrases.len() {
            return Err(malformed(format!(
                "Expected {} intent embeddings, got {}",
                phrases.len(),
                intent_vectors.len()
            )));
        }

        let text_vector = self
            .embedder
            .embed(text)
            .map_err(AnalysisError::Classification)?;

        let mut best = (Intent::ALL[0], f32::NEG_INFINITY);
        for (intent, vector) in Intent::ALL.iter().zip(&intent_vectors) {
            if vector.len() != text_vector.len() {
                return Err(malformed(format!(
                    "Embedding dimension mismatch: {} vs {}",
                    vector.len(),
                    text_vector.len()
                )));
            }
            let similarity = cosine_similarity(&text_vector, vector);
            if similarity > best.1 {
                best = (*intent, similarity);
            }
        }

        tracing::debug!(intent = %best.0, similarity = best.1, "Intent detected");
        Ok(best.0)
    }
}

fn malformed(message: String) -> AnalysisError {
    AnalysisError::Classification(BackendError::MalformedOutput(message))
}

/// Cosine similarity between two vectors. Zero for empty or zero-norm input.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
