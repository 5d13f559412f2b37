//! Transcript processing orchestrator.
//!
//! Single entry point that drives the full analysis:
//! validate → {entities, sentiment, intent, summary} concurrently → SOAP.
//!
//! Stages are pure functions of the transcript over shared read-only
//! backends, so they run side by side on the blocking pool. Each stage is
//! bounded by the configured timeout; any failure fails the whole request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use super::diagnostic;
use super::{
    ensure_non_empty, AnalysisError, EntityExtractor, IntentDetector, SentimentAnalyzer,
    SoapSynthesizer, TranscriptSummarizer,
};
use crate::backend::{Classifier, Embedder, Summarizer};
use crate::models::AnalysisReport;
use crate::pipeline_config::PipelineConfig;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Transcript is too short to process ({words} words, minimum {min})")]
    TranscriptTooShort { words: usize, min: usize },

    #[error("Stage '{stage}' timed out after {timeout:?}")]
    Timeout {
        stage: &'static str,
        timeout: Duration,
    },

    #[error("Stage task failed: {0}")]
    Join(String),
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Metadata written as `00-request.json` in the diagnostic dump.
#[derive(Debug, Serialize)]
struct RequestInfo<'a> {
    request_id: Uuid,
    word_count: usize,
    char_count: usize,
    transcript: &'a str,
    config: &'a PipelineConfig,
}

pub struct NoteProcessor {
    extractor: Arc<EntityExtractor>,
    sentiment: Arc<SentimentAnalyzer>,
    intent: Arc<IntentDetector>,
    summarizer: Arc<TranscriptSummarizer>,
    synthesizer: SoapSynthesizer,
    config: PipelineConfig,
    stage_timeout: Duration,
}

impl NoteProcessor {
    pub fn new(
        extractor: EntityExtractor,
        sentiment: SentimentAnalyzer,
        intent: IntentDetector,
        summarizer: TranscriptSummarizer,
        config: PipelineConfig,
    ) -> Self {
        Self {
            extractor: Arc::new(extractor),
            sentiment: Arc::new(sentiment),
            intent: Arc::new(intent),
            summarizer: Arc::new(summarizer),
            synthesizer: SoapSynthesizer,
            stage_timeout: config.stage_timeout(),
            config,
        }
    }

    /// Wire every stage from raw backends, with the rule-based entity
    /// extractor.
    pub fn from_backends(
        classifier: Arc<dyn Classifier + Send + Sync>,
        embedder: Arc<dyn Embedder + Send + Sync>,
        summarizer: Arc<dyn Summarizer + Send + Sync>,
        config: PipelineConfig,
    ) -> Result<Self, AnalysisError> {
        Ok(Self::new(
            EntityExtractor::rule_based()?,
            SentimentAnalyzer::new(classifier),
            IntentDetector::new(embedder),
            TranscriptSummarizer::new(summarizer, config.summary_length),
            config,
        ))
    }

    /// Override the per-stage timeout (finer than the whole seconds the
    /// config carries).
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Analyse one transcript.
    pub async fn process(&self, transcript: &str) -> Result<AnalysisReport, ProcessingError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("process_transcript", request_id = %request_id);
        self.process_inner(request_id, transcript)
            .instrument(span)
            .await
    }

    async fn process_inner(
        &self,
        request_id: Uuid,
        transcript: &str,
    ) -> Result<AnalysisReport, ProcessingError> {
        let started = Instant::now();

        ensure_non_empty(transcript, "Transcript")?;
        let words = transcript.split_whitespace().count();
        if words < self.config.min_transcript_words {
            return Err(ProcessingError::TranscriptTooShort {
                words,
                min: self.config.min_transcript_words,
            });
        }

        tracing::info!(words, chars = transcript.chars().count(), "Processing transcript");

        let dump_dir = self
            .config
            .dump_dir
            .as_deref()
            .and_then(|base| diagnostic::dump_dir_for(base, &request_id));
        if let Some(ref dir) = dump_dir {
            diagnostic::dump_json(
                dir,
                "00-request.json",
                &RequestInfo {
                    request_id,
                    word_count: words,
                    char_count: transcript.chars().count(),
                    transcript,
                    config: &self.config,
                },
            );
        }

        let text: Arc<str> = Arc::from(transcript);
        let timeout = self.stage_timeout;

        let extractor = Arc::clone(&self.extractor);
        let sentiment = Arc::clone(&self.sentiment);
        let intent = Arc::clone(&self.intent);
        let summarizer = Arc::clone(&self.summarizer);

        let (entities, sentiment, intent, summary) = tokio::try_join!(
            run_stage("entities", timeout, Arc::clone(&text), move |t| extractor.extract(t)),
            run_stage("sentiment", timeout, Arc::clone(&text), move |t| sentiment.classify(t)),
            run_stage("intent", timeout, Arc::clone(&text), move |t| intent.detect(t)),
            run_stage("summary", timeout, Arc::clone(&text), move |t| summarizer.summarize(t)),
        )?;

        if let Some(ref dir) = dump_dir {
            diagnostic::dump_json(dir, "01-entities.json", &entities);
            diagnostic::dump_text(dir, "02-summary.txt", &summary);
        }

        let soap_note = self.synthesizer.synthesize(&summary, &entities)?;

        let report = AnalysisReport {
            summary,
            entities,
            sentiment,
            intent,
            soap_note,
        };

        if let Some(ref dir) = dump_dir {
            diagnostic::dump_json(dir, "03-final-result.json", &report);
        }

        tracing::info!(
            entities = report.entities.total(),
            sentiment = %report.sentiment,
            intent = %report.intent,
            severity = %report.soap_note.assessment.severity,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Transcript processed"
        );

        Ok(report)
    }
}

/// Run one stage on the blocking pool under a timeout.
///
/// A timed-out stage keeps running on its thread until the backend call
/// returns; its result is discarded.
async fn run_stage<T, F>(
    stage: &'static str,
    timeout: Duration,
    text: Arc<str>,
    work: F,
) -> Result<T, ProcessingError>
where
    T: Send + 'static,
    F: FnOnce(&str) -> Result<T, AnalysisError> + Send + 'static,
{
    let started = Instant::now();
    let span = tracing::debug_span!("stage", stage);
    let handle = tokio::task::spawn_blocking(move || span.in_scope(|| work(&*text)));

    match tokio::time::timeout(timeout, handle).await {
        Err(_) => {
            tracing::warn!(stage, timeout_ms = timeout.as_millis() as u64, "Stage timed out");
            Err(ProcessingError::Timeout { stage, timeout })
        }
        Ok(Err(e)) => Err(ProcessingError::Join(format!("{stage}: {e}"))),
        Ok(Ok(result)) => {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &result {
                Ok(_) => tracing::debug!(stage, elapsed_ms, "Stage complete"),
                Err(e) => tracing::warn!(stage, elapsed_ms, error = %e, "Stage failed"),
            }
            Ok(result?)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::backend::{BackendError, MockClassifier, MockEmbedder, MockSummarizer, Polarity};
    use crate::models::{EntityCategory, Intent, SentimentLabel, Severity};
    use crate::pipeline::soap::FOLLOW_UP_MONITORING;
    use crate::pipeline_config::SummaryLength;

    const TRANSCRIPT: &str = "I had a car accident and experienced neck pain. \
                              I took painkillers and underwent physiotherapy.";

    fn embedder_pointing_at(intent: Intent) -> MockEmbedder {
        let mut embedder = MockEmbedder::with_dimension(5);
        for (i, candidate) in Intent::ALL.iter().enumerate() {
            let mut v = vec![0.0; 5];
            v[i] = 1.0;
            embedder = embedder.with_vector(candidate.as_str(), v.clone());
            if *candidate == intent {
                embedder = embedder.with_vector(TRANSCRIPT, v);
            }
        }
        embedder
    }

    fn processor_with(
        summarizer: Arc<dyn Summarizer + Send + Sync>,
        config: PipelineConfig,
    ) -> NoteProcessor {
        NoteProcessor::from_backends(
            Arc::new(MockClassifier::fixed(Polarity::positive(0.3))),
            Arc::new(embedder_pointing_at(Intent::ReportingSymptoms)),
            summarizer,
            config,
        )
        .unwrap()
    }

    fn processor() -> NoteProcessor {
        processor_with(
            Arc::new(MockSummarizer::new(
                "Patient had a \"car accident\". Patient had a car accident. Physiotherapy helped.",
            )),
            PipelineConfig::default(),
        )
    }

    #[tokio::test]
    async fn full_report_from_reference_transcript() {
        let report = processor().process(TRANSCRIPT).await.unwrap();

        assert_eq!(
            report.summary,
            "Patient had a car accident. Physiotherapy helped."
        );
        assert!(report.entities.contains(EntityCategory::Diagnosis, "whiplash injury"));
        assert_eq!(report.sentiment, SentimentLabel::Reassured);
        assert_eq!(report.intent, Intent::ReportingSymptoms);
        assert_eq!(report.soap_note.subjective.chief_complaint, "car accident, pain");
        assert_eq!(report.soap_note.subjective.history_of_present_illness, report.summary);
        assert_eq!(report.soap_note.assessment.severity, Severity::Mild);
        assert_eq!(report.soap_note.plan.treatment, "painkillers, physiotherapy");
        assert_eq!(report.soap_note.plan.follow_up, FOLLOW_UP_MONITORING);
    }

    #[tokio::test]
    async fn report_serializes_with_five_keys() {
        let report = processor().process(TRANSCRIPT).await.unwrap();
        let json = serde_json::to_value(&report).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 5);
        assert_eq!(json["NER_Results"]["Treatment"][1], "physiotherapy");
    }

    #[tokio::test]
    async fn short_transcript_rejected() {
        let err = processor().process("neck pain after accident").await.unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::TranscriptTooShort { words: 4, min: 5 }
        ));
        assert!(err.to_string().starts_with("Transcript is too short to process"));
    }

    #[tokio::test]
    async fn empty_transcript_is_invalid_input() {
        let err = processor().process("  \n").await.unwrap_err();
        assert!(matches!(err, ProcessingError::Analysis(AnalysisError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn stage_failure_fails_request() {
        let processor = processor_with(Arc::new(MockSummarizer::failing()), PipelineConfig::default());
        let err = processor.process(TRANSCRIPT).await.unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::Analysis(AnalysisError::Summarization(BackendError::Unavailable(_)))
        ));
    }

    struct SlowSummarizer;

    impl Summarizer for SlowSummarizer {
        fn summarize(&self, _text: &str, _length: SummaryLength) -> Result<String, BackendError> {
            std::thread::sleep(Duration::from_millis(1500));
            Ok("Too late.".into())
        }
    }

    #[tokio::test]
    async fn slow_stage_times_out() {
        let processor = processor_with(Arc::new(SlowSummarizer), PipelineConfig::default())
            .with_stage_timeout(Duration::from_millis(250));
        let err = processor.process(TRANSCRIPT).await.unwrap_err();
        assert!(matches!(err, ProcessingError::Timeout { stage: "summary", .. }));
    }

    #[tokio::test]
    async fn processor_is_reusable_after_failure() {
        let processor = processor();
        assert!(processor.process("too short").await.is_err());
        assert!(processor.process(TRANSCRIPT).await.is_ok());
    }

    #[tokio::test]
    async fn dump_dir_receives_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            dump_dir: Some(tmp.path().to_path_buf()),
            ..PipelineConfig::default()
        };
        let processor = processor_with(Arc::new(MockSummarizer::new("Summary.")), config);
        processor.process(TRANSCRIPT).await.unwrap();

        let request_dirs: Vec<PathBuf> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(request_dirs.len(), 1);
        for name in [
            "00-request.json",
            "01-entities.json",
            "02-summary.txt",
            "03-final-result.json",
        ] {
            assert!(request_dirs[0].join(name).exists(), "{name} missing");
        }
    }
}
