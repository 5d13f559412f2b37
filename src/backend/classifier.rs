use std::sync::Mutex;

use super::types::{Classifier, Polarity};
use super::BackendError;

/// Context window of the DistilBERT polarity model.
pub const SENTIMENT_MAX_TOKENS: usize = 512;

// ═══════════════════════════════════════════════════════════
// ONNX sentiment classifier (`onnx-models` feature)
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-models")]
mod onnx_classifier {
    use std::path::Path;

    use super::super::onnx::OnnxModel;
    use super::{BackendError, Classifier, Polarity, SENTIMENT_MAX_TOKENS};

    /// DistilBERT sequence classifier (label 0 = NEGATIVE, 1 = POSITIVE).
    /// Inputs longer than the window are truncated before inference.
    pub struct OnnxSentimentClassifier {
        model: OnnxModel,
    }

    impl OnnxSentimentClassifier {
        pub fn load(model_dir: &Path) -> Result<Self, BackendError> {
            Ok(Self {
                model: OnnxModel::load(model_dir, SENTIMENT_MAX_TOKENS, false)?,
            })
        }
    }

    impl Classifier for OnnxSentimentClassifier {
        fn classify(&self, text: &str) -> Result<Polarity, BackendError> {
            let input = self.model.encode(text)?;
            let output = self.model.run(&input)?;

            // Output shape: [1, 2] logits
            if output.data.len() != 2 {
                return Err(BackendError::MalformedOutput(format!(
                    "Expected 2 logits, got shape {:?}",
                    output.shape
                )));
            }

            let probs = softmax(&output.data);
            Ok(if probs[1] >= probs[0] {
                Polarity::positive(f64::from(probs[1]))
            } else {
                Polarity::negative(f64::from(probs[0]))
            })
        }

        fn token_count(&self, text: &str) -> Result<usize, BackendError> {
            self.model.count_tokens(text)
        }

        fn max_input_tokens(&self) -> usize {
            self.model.max_tokens()
        }
    }

    fn softmax(logits: &[f32]) -> Vec<f32> {
        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
        let sum: f32 = exps.iter().sum();
        exps.iter().map(|e| e / sum).collect()
    }
}

#[cfg(feature = "onnx-models")]
pub use onnx_classifier::OnnxSentimentClassifier;

/// Mock polarity classifier for testing.
///
/// Replays a script of predictions (the last one repeats once the script
/// runs out), counts tokens as whitespace-separated words and records every
/// text it was asked to classify.
pub struct MockClassifier {
    script: Vec<Polarity>,
    max_tokens: usize,
    fail: bool,
    calls: Mutex<Vec<String>>,
}

impl MockClassifier {
    pub fn fixed(polarity: Polarity) -> Self {
        Self::scripted(vec![polarity])
    }

    pub fn scripted(script: Vec<Polarity>) -> Self {
        Self {
            script,
            max_tokens: SENTIMENT_MAX_TOKENS,
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::scripted(Vec::new())
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Texts passed to `classify`, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Classifier for MockClassifier {
    fn classify(&self, text: &str) -> Result<Polarity, BackendError> {
        if self.fail {
            return Err(BackendError::Unavailable("mock classifier set to fail".into()));
        }
        let mut calls = self
            .calls
            .lock()
            .map_err(|_| BackendError::Inference("Mock lock poisoned".into()))?;
        let index = calls.len();
        calls.push(text.to_string());

        self.script
            .get(index)
            .or_else(|| self.script.last())
            .copied()
            .ok_or_else(|| BackendError::MalformedOutput("empty mock script".into()))
    }

    fn token_count(&self, text: &str) -> Result<usize, BackendError> {
        if self.fail {
            return Err(BackendError::Unavailable("mock classifier set to fail".into()));
        }
        Ok(text.split_whitespace().count())
    }

    fn max_input_tokens(&self) -> usize {
        self.max_tokens
    }
}
