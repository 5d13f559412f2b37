use std::io::Read;
use std::path::Path;

use serde::Serialize;

use super::IngestError;

/// Transcript file formats recognised on upload.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptFormat {
    PlainText,
    Pdf,
    Docx,
    Unsupported,
}

impl TranscriptFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "plain_text",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Unsupported => "unsupported",
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, Self::PlainText)
    }
}

/// Detect the format from magic bytes, falling back to the extension for
/// documents whose header was stripped or renamed.
pub fn detect_format(path: &Path) -> Result<TranscriptFormat, IngestError> {
    let mut file = std::fs::File::open(path)?;
    let mut header = [0u8; 8];
    let bytes_read = file.read(&mut header)?;

    Ok(classify(&header[..bytes_read], extension_of(path).as_deref()))
}

/// Pure detection over a header and lower-cased extension.
pub fn classify(header: &[u8], extension: Option<&str>) -> TranscriptFormat {
    match header {
        // PDF: starts with %PDF
        [0x25, 0x50, 0x44, 0x46, ..] => TranscriptFormat::Pdf,
        // ZIP container: DOCX when named so, anything else is unsupported
        [0x50, 0x4B, 0x03, 0x04, ..] => match extension {
            Some("docx") => TranscriptFormat::Docx,
            _ => TranscriptFormat::Unsupported,
        },
        _ => match extension {
            Some("pdf") => TranscriptFormat::Pdf,
            Some("docx") => TranscriptFormat::Docx,
            _ if is_utf8_prefix(header) => TranscriptFormat::PlainText,
            _ => TranscriptFormat::Unsupported,
        },
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Valid UTF-8, allowing the header to end inside a multi-byte character.
fn is_utf8_prefix(header: &[u8]) -> bool {
    match std::str::from_utf8(header) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    }
}
