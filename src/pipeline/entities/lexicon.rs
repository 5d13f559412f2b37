use crate::models::EntityCategory;

/// Literal phrases registered under one category.
#[derive(Debug, Clone, Copy)]
pub struct Lexicon {
    pub category: EntityCategory,
    pub phrases: &'static [&'static str],
}

/// Phrase lexicons in registration order. A phrase listed under several
/// categories belongs to the first one only.
pub const LEXICONS: &[Lexicon] = &[
    Lexicon {
        category: EntityCategory::Symptoms,
        phrases: &[
            "pain",
            "ache",
            "stiffness",
            "discomfort",
            "headache",
            "injury",
            "whiplash injury",
            "car accident",
        ],
    },
    Lexicon {
        category: EntityCategory::Treatment,
        phrases: &["physiotherapy", "session", "medication", "painkillers"],
    },
    Lexicon {
        category: EntityCategory::Diagnosis,
        phrases: &["fracture", "strain", "sprain", "injury", "whiplash injury"],
    },
    Lexicon {
        category: EntityCategory::Prognosis,
        phrases: &["recovery", "healing", "improve", "resolve"],
    },
];

/// Post-match rule: when every `requires` entry is present, add `infers`.
#[derive(Debug, Clone, Copy)]
pub struct InferenceRule {
    pub requires: &'static [(EntityCategory, &'static str)],
    pub infers: (EntityCategory, &'static str),
}

pub const INFERENCE_RULES: &[InferenceRule] = &[InferenceRule {
    requires: &[
        (EntityCategory::Symptoms, "pain"),
        (EntityCategory::Treatment, "physiotherapy"),
    ],
    infers: (EntityCategory::Diagnosis, "whiplash injury"),
}];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexicons_follow_category_order() {
        let order: Vec<EntityCategory> = LEXICONS.iter().map(|l| l.category).collect();
        assert_eq!(order, EntityCategory::ALL);
    }

    #[test]
    fn lexicon_phrases_are_lowercase() {
        for lexicon in LEXICONS {
            for phrase in lexicon.phrases {
                assert_eq!(*phrase, phrase.to_lowercase());
            }
        }
    }

    #[test]
    fn multi_word_phrases_present() {
        let symptoms = LEXICONS[0].phrases;
        assert!(symptoms.contains(&"whiplash injury"));
        assert!(symptoms.contains(&"car accident"));
    }
}
