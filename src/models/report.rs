use serde::{Deserialize, Serialize};

use super::entities::EntityBag;
use super::enums::{Intent, SentimentLabel};
use super::soap::SoapNote;

/// The externally visible result of analysing one transcript.
///
/// Serializes to exactly five top-level keys: `Summary`, `NER_Results`,
/// `Sentiment`, `Intent`, `SOAP_Note`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(rename = "Summary")]
    pub summary: String,
    #[serde(rename = "NER_Results")]
    pub entities: EntityBag,
    #[serde(rename = "Sentiment")]
    pub sentiment: SentimentLabel,
    #[serde(rename = "Intent")]
    pub intent: Intent,
    #[serde(rename = "SOAP_Note")]
    pub soap_note: SoapNote,
}

impl AnalysisReport {
    /// Pretty-printed JSON, 4-space indented like the downloadable
    /// `results.json`.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only ever emits UTF-8
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::Severity;
    use crate::models::soap::{Assessment, Objective, Plan, Subjective};

    fn sample_report() -> AnalysisReport {
        AnalysisReport {
            summary: "Patient improved after physiotherapy.".into(),
            entities: EntityBag::from_lists(&["pain"], &["physiotherapy"], &[], &["recovery"]),
            sentiment: SentimentLabel::Reassured,
            intent: Intent::DiscussingRecovery,
            soap_note: SoapNote {
                subjective: Subjective {
                    chief_complaint: "pain".into(),
                    history_of_present_illness: "Patient improved after physiotherapy.".into(),
                },
                objective: Objective {
                    physical_exam: "Signs of discomfort and limited range of motion.".into(),
                    observations: "Patient appears in normal health.".into(),
                },
                assessment: Assessment {
                    diagnosis: "No specific diagnosis identified".into(),
                    severity: Severity::Mild,
                },
                plan: Plan {
                    treatment: "physiotherapy".into(),
                    follow_up: "Full recovery expected within six months.".into(),
                },
            },
        }
    }

    #[test]
    fn report_has_exactly_five_top_level_keys() {
        let json = serde_json::to_value(sample_report()).unwrap();
        let mut keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["Intent", "NER_Results", "SOAP_Note", "Sentiment", "Summary"]
        );
    }

    #[test]
    fn soap_note_uses_clinical_field_names() {
        let json = serde_json::to_value(sample_report()).unwrap();
        let soap = &json["SOAP_Note"];
        assert_eq!(soap["Subjective"]["Chief_Complaint"], "pain");
        assert_eq!(soap["Assessment"]["Severity"], "Mild");
        assert_eq!(
            soap["Plan"]["Follow-Up"],
            "Full recovery expected within six months."
        );
        assert_eq!(json["Sentiment"], "REASSURED");
        assert_eq!(json["Intent"], "Discussing recovery");
    }

    #[test]
    fn pretty_json_is_indented_and_parses_back() {
        let report = sample_report();
        let text = report.to_json_pretty().unwrap();
        assert!(text.contains("\n    \"Summary\""));
        let parsed: AnalysisReport = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, report);
    }
}
