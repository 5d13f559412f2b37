use serde::{Deserialize, Serialize};

use super::enums::Severity;

/// Structured clinical note. Field names serialize in the clinical
/// documentation layout (`Chief_Complaint`, `Follow-Up`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoapNote {
    #[serde(rename = "Subjective")]
    pub subjective: Subjective,
    #[serde(rename = "Objective")]
    pub objective: Objective,
    #[serde(rename = "Assessment")]
    pub assessment: Assessment,
    #[serde(rename = "Plan")]
    pub plan: Plan,
}

/// Patient-reported findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subjective {
    #[serde(rename = "Chief_Complaint")]
    pub chief_complaint: String,
    #[serde(rename = "History_of_Present_Illness")]
    pub history_of_present_illness: String,
}

/// Observed findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Objective {
    #[serde(rename = "Physical_Exam")]
    pub physical_exam: String,
    #[serde(rename = "Observations")]
    pub observations: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    #[serde(rename = "Diagnosis")]
    pub diagnosis: String,
    #[serde(rename = "Severity")]
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(rename = "Treatment")]
    pub treatment: String,
    #[serde(rename = "Follow-Up")]
    pub follow_up: String,
}
