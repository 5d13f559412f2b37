use std::sync::LazyLock;

use regex::Regex;

use crate::backend::BackendError;

/// A token with its byte span in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub start: usize,
    pub end: usize,
    /// Lower-cased token text, the attribute phrases are matched on.
    pub lower: String,
}

/// Segments text into tokens. Spans must lie on char boundaries of the input.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, BackendError>;
}

/// Runs of letters/digits form words; every other non-space character is a
/// token of its own, so "neck-pain." yields `neck`, `-`, `pain`, `.`.
///
/// A single ASCII space separates tokens. Any other whitespace (line
/// breaks, tabs, runs of spaces) is kept as a token, so phrases never match
/// across it.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{N}]+|[^\s\p{L}\p{N}]|\s{2,}|[^\S ]").expect("valid regex")
});

/// Default word/punctuation tokenizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleTokenizer;

impl Tokenizer for RuleTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, BackendError> {
        Ok(TOKEN_RE
            .find_iter(text)
            .map(|m| Token {
                start: m.start(),
                end: m.end(),
                lower: m.as_str().to_lowercase(),
            })
            .collect())
    }
}
