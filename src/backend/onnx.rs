//! Shared ONNX Runtime plumbing for the local transformer models.
//!
//! A model directory must contain:
//! - `model.onnx`: the exported weights
//! - `tokenizer.json`: HuggingFace tokenizer definition

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::TensorRef;

use super::{BackendError, ONNX_MODEL_FILE, TOKENIZER_FILE};

/// Raw output tensor copied out of the session.
pub(crate) struct TensorOutput {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

/// Tokenized input ready for inference.
pub(crate) struct EncodedInput {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

impl EncodedInput {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }
}

/// A loaded session plus its tokenizer.
///
/// `Session::run` needs `&mut self` while the backend traits expose `&self`,
/// hence the Mutex.
pub(crate) struct OnnxModel {
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
    max_tokens: usize,
    /// BERT-style models take a third `token_type_ids` input, DistilBERT does not.
    feeds_token_type_ids: bool,
}

impl OnnxModel {
    pub fn load(
        model_dir: &Path,
        max_tokens: usize,
        feeds_token_type_ids: bool,
    ) -> Result<Self, BackendError> {
        let model_path = model_dir.join(ONNX_MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);

        if !model_path.exists() {
            return Err(BackendError::ModelNotFound(model_path));
        }
        if !tokenizer_path.exists() {
            return Err(BackendError::ModelNotFound(tokenizer_path));
        }

        let session = Session::builder()
            .map_err(|e: ort::Error| BackendError::ModelInit(e.to_string()))?
            .with_intra_threads(2)
            .map_err(|e: ort::Error| BackendError::ModelInit(e.to_string()))?
            .commit_from_file(&model_path)
            .map_err(|e: ort::Error| BackendError::ModelInit(format!("ONNX load failed: {e}")))?;

        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| BackendError::ModelInit(format!("Tokenizer load failed: {e}")))?;

        tracing::info!(dir = %model_dir.display(), max_tokens, "ONNX model loaded");

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            max_tokens,
            feeds_token_type_ids,
        })
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Untruncated token count, special tokens included.
    pub fn count_tokens(&self, text: &str) -> Result<usize, BackendError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| BackendError::Tokenization(e.to_string()))?;
        Ok(encoding.get_ids().len())
    }

    /// Encode and cut to the model window.
    pub fn encode(&self, text: &str) -> Result<EncodedInput, BackendError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| BackendError::Tokenization(e.to_string()))?;

        let take = encoding.get_ids().len().min(self.max_tokens);
        let widen = |values: &[u32]| -> Vec<i64> {
            values.iter().take(take).map(|&v| i64::from(v)).collect()
        };

        Ok(EncodedInput {
            input_ids: widen(encoding.get_ids()),
            attention_mask: widen(encoding.get_attention_mask()),
            token_type_ids: widen(encoding.get_type_ids()),
        })
    }

    /// Run the session and copy out the first output tensor.
    pub fn run(&self, input: &EncodedInput) -> Result<TensorOutput, BackendError> {
        let seq_len = input.len();
        let array = |values: &[i64]| {
            ndarray::Array2::from_shape_vec((1, seq_len), values.to_vec())
                .map_err(|e| BackendError::Inference(e.to_string()))
        };

        let ids_array = array(&input.input_ids)?;
        let mask_array = array(&input.attention_mask)?;
        let type_array = array(&input.token_type_ids)?;

        let ids_tensor = TensorRef::from_array_view(&ids_array)
            .map_err(|e| BackendError::Inference(e.to_string()))?;
        let mask_tensor = TensorRef::from_array_view(&mask_array)
            .map_err(|e| BackendError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| BackendError::Inference("Session lock poisoned".to_string()))?;

        let outputs = if self.feeds_token_type_ids {
            let type_tensor = TensorRef::from_array_view(&type_array)
                .map_err(|e| BackendError::Inference(e.to_string()))?;
            session.run(ort::inputs![ids_tensor, mask_tensor, type_tensor])
        } else {
            session.run(ort::inputs![ids_tensor, mask_tensor])
        }
        .map_err(|e| BackendError::Inference(format!("ONNX inference failed: {e}")))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| BackendError::Inference(format!("Output extraction: {e}")))?;

        Ok(TensorOutput {
            shape: shape.iter().map(|&d| d.max(0) as usize).collect(),
            data: data.to_vec(),
        })
    }
}
