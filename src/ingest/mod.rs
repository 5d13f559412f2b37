//! Transcript ingestion: UTF-8 text files or standard input.
//!
//! PDF and Word documents are recognised so the user gets a clear
//! "unsupported" error instead of garbage text.

pub mod format;

pub use format::{detect_format, TranscriptFormat};

use std::io::Read;
use std::path::Path;

use thiserror::Error;

/// Transcripts above this size are rejected before reading.
pub const MAX_TRANSCRIPT_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("File too large: {size_mb:.1}MB exceeds {max_mb}MB limit")]
    FileTooLarge { size_mb: f64, max_mb: u64 },

    #[error("File is empty or could not be read")]
    Empty,

    #[error("Transcript is not valid UTF-8: {0}")]
    Encoding(String),
}

/// Load a transcript from `source`, where `-` means standard input.
pub fn load(source: &str) -> Result<String, IngestError> {
    if source == "-" {
        read_from(std::io::stdin().lock())
    } else {
        read_transcript(Path::new(source))
    }
}

/// Read a plain-text transcript file.
pub fn read_transcript(path: &Path) -> Result<String, IngestError> {
    let size = std::fs::metadata(path)?.len();
    if size > MAX_TRANSCRIPT_BYTES {
        return Err(IngestError::FileTooLarge {
            size_mb: size as f64 / (1024.0 * 1024.0),
            max_mb: MAX_TRANSCRIPT_BYTES / (1024 * 1024),
        });
    }

    let format = detect_format(path)?;
    if !format.is_supported() {
        tracing::warn!(format = format.as_str(), "Rejected transcript upload");
        return Err(IngestError::UnsupportedFormat(format.as_str().into()));
    }

    let file = std::fs::File::open(path)?;
    let text = read_from(file)?;
    tracing::debug!(bytes = size, "Transcript loaded from file");
    Ok(text)
}

/// Read a UTF-8 transcript from any reader, stripping a leading BOM.
pub fn read_from<R: Read>(reader: R) -> Result<String, IngestError> {
    let mut bytes = Vec::new();
    reader
        .take(MAX_TRANSCRIPT_BYTES + 1)
        .read_to_end(&mut bytes)?;
    if bytes.len() as u64 > MAX_TRANSCRIPT_BYTES {
        return Err(IngestError::FileTooLarge {
            size_mb: bytes.len() as f64 / (1024.0 * 1024.0),
            max_mb: MAX_TRANSCRIPT_BYTES / (1024 * 1024),
        });
    }

    let text = String::from_utf8(bytes).map_err(|e| IngestError::Encoding(e.to_string()))?;
    let text = match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    };

    if text.trim().is_empty() {
        return Err(IngestError::Empty);
    }
    Ok(text)
}
