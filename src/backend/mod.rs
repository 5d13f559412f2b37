//! Inference backends behind small capability traits.
//!
//! Stages only see `Embedder`, `Classifier` and `Summarizer`; real
//! implementations (Ollama over HTTP, ONNX Runtime behind the
//! `onnx-models` feature) and deterministic mocks live side by side.

pub mod types;
pub mod classifier;
pub mod embedder;
pub mod ollama;
#[cfg(feature = "onnx-models")]
mod onnx;

pub use types::*;
pub use classifier::*;
pub use embedder::*;
pub use ollama::*;

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Model initialization: {0}")]
    ModelInit(String),

    #[error("Tokenization error: {0}")]
    Tokenization(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Ollama is not running at {0}")]
    OllamaConnection(String),

    #[error("Ollama returned error (status {status}): {body}")]
    OllamaError { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Malformed backend output: {0}")]
    MalformedOutput(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Exported weights inside a local model directory.
pub const ONNX_MODEL_FILE: &str = "model.onnx";
/// HuggingFace tokenizer definition inside a local model directory.
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Whether `dir` holds everything an ONNX backend needs to load.
pub fn onnx_model_present(dir: &Path) -> bool {
    dir.join(ONNX_MODEL_FILE).is_file() && dir.join(TOKENIZER_FILE).is_file()
}
