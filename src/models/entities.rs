use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::enums::EntityCategory;

/// Entities found in one transcript, one ordered set per category.
///
/// Entries keep the surface text exactly as it appeared in the transcript;
/// two spellings that differ only in case are distinct entries. Iteration
/// and serialization are in ascending byte order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityBag {
    #[serde(rename = "Symptoms", default)]
    pub symptoms: BTreeSet<String>,
    #[serde(rename = "Treatment", default)]
    pub treatment: BTreeSet<String>,
    #[serde(rename = "Diagnosis", default)]
    pub diagnosis: BTreeSet<String>,
    #[serde(rename = "Prognosis", default)]
    pub prognosis: BTreeSet<String>,
}

impl EntityBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bag from literal lists (test fixtures, deserialized input).
    pub fn from_lists<S: AsRef<str>>(
        symptoms: &[S],
        treatment: &[S],
        diagnosis: &[S],
        prognosis: &[S],
    ) -> Self {
        let collect = |items: &[S]| items.iter().map(|s| s.as_ref().to_string()).collect();
        Self {
            symptoms: collect(symptoms),
            treatment: collect(treatment),
            diagnosis: collect(diagnosis),
            prognosis: collect(prognosis),
        }
    }

    pub fn get(&self, category: EntityCategory) -> &BTreeSet<String> {
        match category {
            EntityCategory::Symptoms => &self.symptoms,
            EntityCategory::Treatment => &self.treatment,
            EntityCategory::Diagnosis => &self.diagnosis,
            EntityCategory::Prognosis => &self.prognosis,
        }
    }

    fn get_mut(&mut self, category: EntityCategory) -> &mut BTreeSet<String> {
        match category {
            EntityCategory::Symptoms => &mut self.symptoms,
            EntityCategory::Treatment => &mut self.treatment,
            EntityCategory::Diagnosis => &mut self.diagnosis,
            EntityCategory::Prognosis => &mut self.prognosis,
        }
    }

    /// Returns `true` if the entry was not already present.
    pub fn insert(&mut self, category: EntityCategory, surface: impl Into<String>) -> bool {
        self.get_mut(category).insert(surface.into())
    }

    pub fn contains(&self, category: EntityCategory, surface: &str) -> bool {
        self.get(category).contains(surface)
    }

    /// Total number of entries across all categories.
    pub fn total(&self) -> usize {
        EntityCategory::ALL.iter().map(|c| self.get(*c).len()).sum()
    }

    /// First category holding an empty or whitespace-only entry, if any.
    pub fn find_blank_entry(&self) -> Option<EntityCategory> {
        EntityCategory::ALL
            .iter()
            .copied()
            .find(|c| self.get(*c).iter().any(|e| e.trim().is_empty()))
    }

    /// Entries of a category joined with ", " in sorted order.
    pub fn joined(&self, category: EntityCategory) -> Option<String> {
        let set = self.get(category);
        if set.is_empty() {
            return None;
        }
        Some(set.iter().map(String::as_str).collect::<Vec<_>>().join(", "))
    }
}
