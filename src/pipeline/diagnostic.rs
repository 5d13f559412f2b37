//! Per-request diagnostic dump: writes intermediate artifacts to disk.
//!
//! Disabled unless a dump directory is configured (`NOTETAKER_DUMP_DIR`,
//! or `notetaker process --dump`). Artifacts contain patient text, so
//! the directory must stay local.
//!
//! **Output structure**:
//! ```text
//! {dump_dir}/{request_id}/
//!   00-request.json
//!   01-entities.json
//!   02-summary.txt
//!   03-final-result.json
//! ```

use std::path::{Path, PathBuf};

use uuid::Uuid;

// ──────────────────────────────────────────────
// Dump directory resolution
// ──────────────────────────────────────────────

/// Returns the dump directory for a request under `base`.
///
/// Creates the directory tree on first call. Returns `None` (with a warning)
/// if directory creation fails; never panics, never blocks the pipeline.
pub fn dump_dir_for(base: &Path, request_id: &Uuid) -> Option<PathBuf> {
    let dir = base.join(request_id.to_string());

    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing::warn!(
            path = %dir.display(),
            error = %e,
            "Diagnostic dump: failed to create directory"
        );
        return None;
    }

    Some(dir)
}

// ──────────────────────────────────────────────
// Dump writers
// ──────────────────────────────────────────────

/// Write a JSON artifact (any serde-serializable value).
///
/// Uses pretty-printing for human readability. Never panics.
pub fn dump_json<T: serde::Serialize>(dir: &Path, filename: &str, value: &T) {
    let path = dir.join(filename);
    match serde_json::to_string_pretty(value) {
        Ok(json) => match std::fs::write(&path, json.as_bytes()) {
            Ok(()) => tracing::debug!(
                path = %path.display(),
                size = json.len(),
                "Diagnostic dump: JSON written"
            ),
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "Diagnostic dump: failed to write JSON"
            ),
        },
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "Diagnostic dump: failed to serialize JSON"
        ),
    }
}

/// Write a text artifact. Never panics.
pub fn dump_text(dir: &Path, filename: &str, text: &str) {
    let path = dir.join(filename);
    match std::fs::write(&path, text.as_bytes()) {
        Ok(()) => tracing::debug!(
            path = %path.display(),
            size = text.len(),
            "Diagnostic dump: text written"
        ),
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "Diagnostic dump: failed to write text"
        ),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
