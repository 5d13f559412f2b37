use std::sync::Arc;

use super::lexicon::{InferenceRule, INFERENCE_RULES, LEXICONS};
use super::matcher::PhraseMatcher;
use super::tokenizer::{RuleTokenizer, Tokenizer};
use crate::backend::BackendError;
use crate::models::EntityBag;
use crate::pipeline::{ensure_non_empty, AnalysisError};

/// Extracts Symptoms / Treatment / Diagnosis / Prognosis from a transcript.
pub struct EntityExtractor {
    tokenizer: Arc<dyn Tokenizer + Send + Sync>,
    matcher: PhraseMatcher,
}

impl EntityExtractor {
    pub fn new(tokenizer: Arc<dyn Tokenizer + Send + Sync>) -> Result<Self, AnalysisError> {
        let matcher = PhraseMatcher::compile(LEXICONS, tokenizer.as_ref())
            .map_err(AnalysisError::Extraction)?;
        tracing::debug!(patterns = matcher.pattern_count(), "Phrase matcher compiled");
        Ok(Self { tokenizer, matcher })
    }

    /// Extractor backed by the built-in word/punctuation tokenizer.
    pub fn rule_based() -> Result<Self, AnalysisError> {
        Self::new(Arc::new(RuleTokenizer))
    }

    pub fn extract(&self, text: &str) -> Result<EntityBag, AnalysisError> {
        ensure_non_empty(text, "Input text")?;

        let tokens = self
            .tokenizer
            .tokenize(text)
            .map_err(AnalysisError::Extraction)?;

        let mut bag = EntityBag::new();
        for found in self.matcher.find(&tokens) {
            let first = &tokens[found.start];
            let last = &tokens[found.end - 1];
            let surface = text.get(first.start..last.end).ok_or_else(|| {
                AnalysisError::Extraction(BackendError::MalformedOutput(format!(
                    "Token span {}..{} is not a valid slice of the input",
                    first.start, last.end
                )))
            })?;
            bag.insert(found.category, surface);
        }

        let inferred = apply_inference_rules(&mut bag, INFERENCE_RULES);

        tracing::debug!(
            tokens = tokens.len(),
            symptoms = bag.symptoms.len(),
            treatment = bag.treatment.len(),
            diagnosis = bag.diagnosis.len(),
            prognosis = bag.prognosis.len(),
            inferred,
            "Entities extracted"
        );

        Ok(bag)
    }
}

/// Apply rules once, in order. Returns how many entries were added.
pub fn apply_inference_rules(bag: &mut EntityBag, rules: &[InferenceRule]) -> usize {
    let mut added = 0;
    for rule in rules {
        let satisfied = rule
            .requires
            .iter()
            .all(|(category, surface)| bag.contains(*category, surface));
        if satisfied {
            let (category, surface) = rule.infers;
            if bag.insert(category, surface) {
                added += 1;
            }
        }
    }
    added
}
