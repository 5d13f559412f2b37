use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Notetaker";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sentence-embedding model used for intent detection.
pub const EMBEDDING_MODEL_NAME: &str = "paraphrase-MiniLM-L6-v2";

/// Binary polarity model used for sentiment.
pub const SENTIMENT_MODEL_NAME: &str = "distilbert-base-uncased";

/// Get the application data directory
/// ~/Notetaker/ on all platforms, falls back to the working directory
/// when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the models directory (ONNX weights + tokenizers)
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

/// Get the embedding model directory (paraphrase-MiniLM-L6-v2)
pub fn embedding_model_dir() -> PathBuf {
    models_dir().join(EMBEDDING_MODEL_NAME)
}

/// Get the sentiment model directory (distilbert-base-uncased)
pub fn sentiment_model_dir() -> PathBuf {
    models_dir().join(SENTIMENT_MODEL_NAME)
}

/// Default location for per-request diagnostic dumps
pub fn diagnostic_dir() -> PathBuf {
    app_data_dir().join("diagnostic")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "notetaker=debug,notetaker_lib=debug,info"
    } else {
        "notetaker=info,notetaker_lib=info,warn"
    }
}
