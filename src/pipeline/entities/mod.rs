//! Rule-based medical entity extraction.
//!
//! tokenize → phrase match against the static lexicons → inference rules.

pub mod lexicon;
pub mod tokenizer;
pub mod matcher;
pub mod extractor;

pub use lexicon::*;
pub use tokenizer::*;
pub use matcher::*;
pub use extractor::*;
