use std::collections::HashMap;

use super::types::Embedder;
use super::BackendError;

/// Embedding dimension of the MiniLM-L6 family.
pub const EMBEDDING_DIM: usize = 384;

/// Context window of the MiniLM-L6 sentence models.
pub const EMBEDDING_MAX_TOKENS: usize = 128;

// ═══════════════════════════════════════════════════════════
// ONNX Embedder (`onnx-models` feature)
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-models")]
mod onnx_embedder {
    use std::path::Path;

    use super::super::onnx::OnnxModel;
    use super::{l2_normalize, BackendError, Embedder, EMBEDDING_DIM, EMBEDDING_MAX_TOKENS};

    /// paraphrase-MiniLM-L6-v2 through ONNX Runtime, mean-pooled over the
    /// attention mask and L2-normalized.
    pub struct OnnxEmbedder {
        model: OnnxModel,
    }

    impl OnnxEmbedder {
        pub fn load(model_dir: &Path) -> Result<Self, BackendError> {
            Ok(Self {
                model: OnnxModel::load(model_dir, EMBEDDING_MAX_TOKENS, true)?,
            })
        }

        fn infer(&self, text: &str) -> Result<Vec<f32>, BackendError> {
            let input = self.model.encode(text)?;
            let seq_len = input.len();
            let output = self.model.run(&input)?;

            // Output shape: [1, seq_len, EMBEDDING_DIM]
            if output.shape.len() != 3
                || output.shape[2] != EMBEDDING_DIM
                || output.data.len() != seq_len * EMBEDDING_DIM
            {
                return Err(BackendError::MalformedOutput(format!(
                    "Unexpected output shape: {:?}, expected [1, {seq_len}, {EMBEDDING_DIM}]",
                    output.shape
                )));
            }

            let mut pooled = vec![0.0f32; EMBEDDING_DIM];
            let mut mask_sum = 0.0f32;

            for (token_idx, &mask) in input.attention_mask.iter().enumerate() {
                let mask = mask as f32;
                mask_sum += mask;
                let offset = token_idx * EMBEDDING_DIM;
                for (dim_idx, p) in pooled.iter_mut().enumerate() {
                    *p += output.data[offset + dim_idx] * mask;
                }
            }

            if mask_sum > 0.0 {
                for val in &mut pooled {
                    *val /= mask_sum;
                }
            }

            l2_normalize(&mut pooled);
            Ok(pooled)
        }
    }

    impl Embedder for OnnxEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
            self.infer(text)
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, BackendError> {
            texts.iter().map(|t| self.infer(t)).collect()
        }
    }
}

#[cfg(feature = "onnx-models")]
pub use onnx_embedder::OnnxEmbedder;

fn l2_normalize(vec: &mut [f32]) {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for val in vec.iter_mut() {
            *val /= norm;
        }
    }
}

/// Mock embedding model for testing.
///
/// Texts registered with `with_vector` get that vector back; everything
/// else gets a deterministic hash-style unit vector.
pub struct MockEmbedder {
    dimension: usize,
    fixed: HashMap<String, Vec<f32>>,
    fail: bool,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            dimension: EMBEDDING_DIM,
            fixed: HashMap::new(),
            fail: false,
        }
    }

    /// Small dimension, handy when tests spell vectors out by hand.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            ..Self::new()
        }
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.fixed.insert(text.to_string(), vector);
        self
    }

    /// Every call fails, as if the model were unloaded.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    fn vector_for(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        if self.fail {
            return Err(BackendError::Unavailable("mock embedder set to fail".into()));
        }
        Ok(self
            .fixed
            .get(text)
            .cloned()
            .unwrap_or_else(|| deterministic_vector(text, self.dimension)))
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        self.vector_for(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, BackendError> {
        texts.iter().map(|t| self.vector_for(t)).collect()
    }
}

/// Generate a deterministic unit vector from text.
fn deterministic_vector(text: &str, dim: usize) -> Vec<f32> {
    let mut vec = vec![0.0f32; dim];
    let bytes = text.as_bytes();

    for (i, slot) in vec.iter_mut().enumerate() {
        let byte_idx = i % bytes.len().max(1);
        *slot = (bytes.get(byte_idx).copied().unwrap_or(0) as f32 + i as f32) / 255.0;
    }

    l2_normalize(&mut vec);
    vec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_embed_returns_configured_dimension() {
        let embedder = MockEmbedder::with_dimension(8);
        assert_eq!(embedder.embed("neck pain").unwrap().len(), 8);
    }

    #[test]
    fn mock_embed_is_deterministic() {
        let embedder = MockEmbedder::new();
        assert_eq!(
            embedder.embed("same text").unwrap(),
            embedder.embed("same text").unwrap()
        );
        assert_ne!(
            embedder.embed("text A").unwrap(),
            embedder.embed("text B").unwrap()
        );
    }

    #[test]
    fn fixed_vectors_take_precedence() {
        let embedder = MockEmbedder::with_dimension(2).with_vector("hello", vec![1.0, 0.0]);
        let vecs = embedder.embed_batch(&["hello", "other"]).unwrap();
        assert_eq!(vecs[0], vec![1.0, 0.0]);
        assert_eq!(vecs[1].len(), 2);
    }

    #[test]
    fn deterministic_vector_is_l2_normalized() {
        let vec = deterministic_vector("test normalization", EMBEDDING_DIM);
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01, "got norm = {norm}");
    }

    #[test]
    fn failing_mock_errors() {
        let embedder = MockEmbedder::failing();
        assert!(matches!(
            embedder.embed("x"),
            Err(BackendError::Unavailable(_))
        ));
    }
}
