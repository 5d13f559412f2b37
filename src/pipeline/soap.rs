//! Rule-based SOAP note synthesis from a summary and extracted entities.

use crate::models::{
    Assessment, EntityBag, EntityCategory, Objective, Plan, Severity, SoapNote, Subjective,
};
use crate::pipeline::{ensure_non_empty, AnalysisError};

pub const NO_SYMPTOMS: &str = "No symptoms reported";
pub const NO_DIAGNOSIS: &str = "No specific diagnosis identified";
pub const NO_TREATMENT: &str = "No treatment prescribed";

pub const EXAM_RESTRICTED: &str = "Signs of discomfort and limited range of motion.";
pub const EXAM_NORMAL: &str = "Full range of motion, no tenderness.";
pub const OBSERVATIONS: &str = "Patient appears in normal health.";

pub const FOLLOW_UP_DEFAULT: &str = "Full recovery expected within six months.";
pub const FOLLOW_UP_SEVERE: &str = "Regular follow-up recommended due to symptom severity.";
pub const FOLLOW_UP_MONITORING: &str = "Monitoring required due to uncertain prognosis.";

/// Symptoms that point at a restricted physical exam.
const RESTRICTING_SYMPTOMS: &[&str] = &["pain", "stiffness"];

#[derive(Debug, Clone, Copy, Default)]
pub struct SoapSynthesizer;

impl SoapSynthesizer {
    pub fn synthesize(&self, summary: &str, entities: &EntityBag) -> Result<SoapNote, AnalysisError> {
        ensure_non_empty(summary, "Summary")?;
        if let Some(category) = entities.find_blank_entry() {
            return Err(AnalysisError::InvalidInput(format!(
                "{category} contains an empty entry"
            )));
        }

        let severity = severity_for(entities.symptoms.len());
        let restricted = RESTRICTING_SYMPTOMS
            .iter()
            .any(|s| entities.contains(EntityCategory::Symptoms, s));

        let note = SoapNote {
            subjective: Subjective {
                chief_complaint: entities
                    .joined(EntityCategory::Symptoms)
                    .unwrap_or_else(|| NO_SYMPTOMS.into()),
                history_of_present_illness: summary.trim().to_string(),
            },
            objective: Objective {
                physical_exam: if restricted { EXAM_RESTRICTED } else { EXAM_NORMAL }.into(),
                observations: OBSERVATIONS.into(),
            },
            assessment: Assessment {
                diagnosis: entities
                    .joined(EntityCategory::Diagnosis)
                    .unwrap_or_else(|| NO_DIAGNOSIS.into()),
                severity,
            },
            plan: Plan {
                treatment: entities
                    .joined(EntityCategory::Treatment)
                    .unwrap_or_else(|| NO_TREATMENT.into()),
                follow_up: follow_up_for(severity, entities.prognosis.is_empty()).into(),
            },
        };

        tracing::debug!(severity = %severity, restricted, "SOAP note synthesized");
        Ok(note)
    }
}

/// 0-2 symptoms Mild, 3-4 Moderate, 5 or more Severe.
pub fn severity_for(symptom_count: usize) -> Severity {
    if symptom_count > 4 {
        Severity::Severe
    } else if symptom_count >= 3 {
        Severity::Moderate
    } else {
        Severity::Mild
    }
}

/// Missing prognosis outranks severity.
pub fn follow_up_for(severity: Severity, prognosis_empty: bool) -> &'static str {
    if prognosis_empty {
        FOLLOW_UP_MONITORING
    } else if severity == Severity::Severe {
        FOLLOW_UP_SEVERE
    } else {
        FOLLOW_UP_DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthesize(summary: &str, bag: &EntityBag) -> Result<SoapNote, AnalysisError> {
        SoapSynthesizer.synthesize(summary, bag)
    }

    #[test]
    fn reference_note() {
        let bag = EntityBag::from_lists(
            &["pain", "stiffness"],
            &["physiotherapy", "painkillers"],
            &["whiplash injury"],
            &["recovery"],
        );
        let note = synthesize("Patient improved after physiotherapy.", &bag).unwrap();

        assert_eq!(note.subjective.chief_complaint, "pain, stiffness");
        assert_eq!(
            note.subjective.history_of_present_illness,
            "Patient improved after physiotherapy."
        );
        assert_eq!(note.objective.physical_exam, EXAM_RESTRICTED);
        assert_eq!(note.objective.observations, OBSERVATIONS);
        assert_eq!(note.assessment.diagnosis, "whiplash injury");
        assert_eq!(note.assessment.severity, Severity::Mild);
        assert_eq!(note.plan.treatment, "painkillers, physiotherapy");
        assert_eq!(note.plan.follow_up, FOLLOW_UP_DEFAULT);
    }

    #[test]
    fn severity_thresholds() {
        let expected = [
            Severity::Mild,
            Severity::Mild,
            Severity::Mild,
            Severity::Moderate,
            Severity::Moderate,
            Severity::Severe,
            Severity::Severe,
        ];
        for (count, severity) in expected.iter().enumerate() {
            assert_eq!(severity_for(count), *severity, "{count} symptoms");
        }
    }

    #[test]
    fn five_symptoms_with_prognosis_get_regular_follow_up() {
        let bag = EntityBag::from_lists(
            &["ache", "discomfort", "headache", "injury", "stiffness"],
            &[],
            &[],
            &["healing"],
        );
        let note = synthesize("Several complaints.", &bag).unwrap();
        assert_eq!(note.assessment.severity, Severity::Severe);
        assert_eq!(note.plan.follow_up, FOLLOW_UP_SEVERE);
    }

    #[test]
    fn empty_prognosis_takes_precedence() {
        let bag = EntityBag::from_lists(
            &["ache", "discomfort", "headache", "injury", "pain"],
            &[],
            &[],
            &[],
        );
        let note = synthesize("Several complaints.", &bag).unwrap();
        assert_eq!(note.assessment.severity, Severity::Severe);
        assert_eq!(note.plan.follow_up, FOLLOW_UP_MONITORING);
    }

    #[test]
    fn empty_bag_uses_defaults() {
        let note = synthesize("  Routine check.  ", &EntityBag::new()).unwrap();
        assert_eq!(note.subjective.chief_complaint, NO_SYMPTOMS);
        assert_eq!(note.subjective.history_of_present_illness, "Routine check.");
        assert_eq!(note.objective.physical_exam, EXAM_NORMAL);
        assert_eq!(note.assessment.diagnosis, NO_DIAGNOSIS);
        assert_eq!(note.assessment.severity, Severity::Mild);
        assert_eq!(note.plan.treatment, NO_TREATMENT);
        assert_eq!(note.plan.follow_up, FOLLOW_UP_MONITORING);
    }

    #[test]
    fn exam_only_restricted_for_exact_pain_or_stiffness() {
        let bag = EntityBag::from_lists(&["Pain", "headache"], &[], &[], &["recovery"]);
        let note = synthesize("Headache.", &bag).unwrap();
        assert_eq!(note.objective.physical_exam, EXAM_NORMAL);

        let bag = EntityBag::from_lists(&["stiffness"], &[], &[], &["recovery"]);
        let note = synthesize("Stiff neck.", &bag).unwrap();
        assert_eq!(note.objective.physical_exam, EXAM_RESTRICTED);
    }

    #[test]
    fn rejects_blank_summary_and_blank_entries() {
        let bag = EntityBag::from_lists(&["pain"], &[], &[], &[]);
        assert!(synthesize(" ", &bag).unwrap_err().is_invalid_input());

        let bag = EntityBag::from_lists(&["pain"], &["  "], &[], &[]);
        let err = synthesize("Summary.", &bag).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("Treatment"));
    }

    #[test]
    fn serializes_clinical_field_names() {
        let bag = EntityBag::from_lists(&["pain"], &["physiotherapy"], &[], &["recovery"]);
        let note = synthesize("Summary.", &bag).unwrap();
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["Subjective"]["Chief_Complaint"], "pain");
        assert_eq!(json["Assessment"]["Severity"], "Mild");
        assert_eq!(json["Plan"]["Follow-Up"], FOLLOW_UP_DEFAULT);
    }
}
