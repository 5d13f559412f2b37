use std::collections::{HashMap, HashSet};

use super::lexicon::Lexicon;
use super::tokenizer::{Token, Tokenizer};
use crate::backend::BackendError;
use crate::models::EntityCategory;

/// One lexicon phrase compiled to its lower-cased token sequence.
#[derive(Debug, Clone)]
struct PhrasePattern {
    category: EntityCategory,
    tokens: Vec<String>,
}

/// A match over a token slice: tokens `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseMatch {
    pub category: EntityCategory,
    pub start: usize,
    pub end: usize,
}

/// Case-insensitive exact phrase matcher over contiguous tokens.
///
/// Every occurrence of every pattern is reported, overlaps included, in
/// (start, end) order.
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    patterns: Vec<PhrasePattern>,
    /// first token → indices into `patterns`
    by_first_token: HashMap<String, Vec<usize>>,
}

impl PhraseMatcher {
    /// Compile lexicons with the same tokenizer that will segment the text.
    pub fn compile(lexicons: &[Lexicon], tokenizer: &dyn Tokenizer) -> Result<Self, BackendError> {
        let mut patterns = Vec::new();
        let mut registered: HashSet<Vec<String>> = HashSet::new();

        for lexicon in lexicons {
            for phrase in lexicon.phrases {
                let tokens: Vec<String> = tokenizer
                    .tokenize(phrase)?
                    .into_iter()
                    .map(|t| t.lower)
                    .collect();

                if tokens.is_empty() {
                    continue;
                }
                if !registered.insert(tokens.clone()) {
                    tracing::trace!(phrase, category = %lexicon.category, "Phrase already registered, skipping");
                    continue;
                }

                patterns.push(PhrasePattern {
                    category: lexicon.category,
                    tokens,
                });
            }
        }

        let mut by_first_token: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, pattern) in patterns.iter().enumerate() {
            by_first_token
                .entry(pattern.tokens[0].clone())
                .or_default()
                .push(idx);
        }

        Ok(Self {
            patterns,
            by_first_token,
        })
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Category a phrase is attributed to, if registered.
    #[cfg(test)]
    pub fn category_of(&self, phrase_tokens: &[&str]) -> Option<EntityCategory> {
        self.patterns
            .iter()
            .find(|p| p.tokens.iter().map(String::as_str).eq(phrase_tokens.iter().copied()))
            .map(|p| p.category)
    }

    pub fn find(&self, tokens: &[Token]) -> Vec<PhraseMatch> {
        let mut matches = Vec::new();

        for (start, token) in tokens.iter().enumerate() {
            let Some(candidates) = self.by_first_token.get(&token.lower) else {
                continue;
            };

            for &idx in candidates {
                let pattern = &self.patterns[idx];
                let end = start + pattern.tokens.len();
                if end > tokens.len() {
                    continue;
                }
                let hit = tokens[start..end]
                    .iter()
                    .zip(&pattern.tokens)
                    .all(|(t, p)| t.lower == *p);
                if hit {
                    matches.push(PhraseMatch {
                        category: pattern.category,
                        start,
                        end,
                    });
                }
            }
        }

        matches.sort_by_key(|m| (m.start, m.end));
        matches
    }
}
