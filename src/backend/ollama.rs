use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::{Classifier, Embedder, Polarity, PolarityLabel, Summarizer};
use super::BackendError;
use crate::pipeline_config::{PipelineConfig, SummaryLength};

/// System prompt for abstractive transcript summarization.
pub const SUMMARY_SYSTEM_PROMPT: &str = "You summarize medical consultation transcripts. \
Write a concise third-person summary of the patient's history, symptoms, treatment \
and outlook in plain sentences. Do not invent facts, do not add headings or lists.";

/// System prompt for binary polarity classification.
pub const SENTIMENT_SYSTEM_PROMPT: &str = "You classify the overall sentiment of a patient's \
words in a medical consultation. Reply with JSON only, in the form \
{\"label\": \"POSITIVE\" or \"NEGATIVE\", \"score\": confidence between 0 and 1}.";

/// Words handed to the summary model per sentiment request; longer text is
/// chunked by the analyzer.
pub const OLLAMA_SENTIMENT_MAX_WORDS: usize = 1024;

/// Enough for the short JSON verdict.
const SENTIMENT_NUM_PREDICT: u32 = 32;

/// Ollama HTTP client for local summarization, sentiment and embedding.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
    summary_model: String,
    embedding_model: String,
}

impl OllamaClient {
    /// Create a client pointing at an Ollama instance.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        summary_model: &str,
        embedding_model: &str,
    ) -> Result<Self, BackendError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| BackendError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
            summary_model: summary_model.to_string(),
            embedding_model: embedding_model.to_string(),
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self, BackendError> {
        Self::new(
            &config.ollama_url,
            config.http_timeout_secs,
            &config.summary_model,
            &config.embedding_model,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn summary_model(&self) -> &str {
        &self.summary_model
    }

    /// Models installed on the Ollama instance.
    pub fn list_models(&self) -> Result<Vec<String>, BackendError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let parsed: OllamaTagsResponse = self.read_json(response)?;
        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }

    /// Non-streaming `/api/generate` call; returns the raw response text.
    fn generate(&self, body: &OllamaGenerateRequest<'_>) -> Result<String, BackendError> {
        let url = format!("{}/api/generate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let parsed: OllamaGenerateResponse = self.read_json(response)?;
        Ok(parsed.response)
    }

    fn map_send_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_connect() {
            BackendError::OllamaConnection(self.base_url.clone())
        } else if e.is_timeout() {
            BackendError::HttpClient(format!("Request timed out after {}s", self.timeout_secs))
        } else {
            BackendError::HttpClient(e.to_string())
        }
    }

    fn read_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::blocking::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::OllamaError {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .map_err(|e| BackendError::ResponseParsing(e.to_string()))
    }
}

/// Sampling options for /api/generate. Temperature 0 with top_k 1 is
/// greedy decoding.
#[derive(Debug, Serialize, PartialEq)]
struct GenerateOptions {
    temperature: f32,
    top_k: u32,
    num_predict: u32,
}

impl GenerateOptions {
    fn greedy(max_tokens: u32) -> Self {
        Self {
            temperature: 0.0,
            top_k: 1,
            num_predict: max_tokens,
        }
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    options: GenerateOptions,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Request body for Ollama /api/embed
#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

/// Response body from Ollama /api/embed
#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Response body from Ollama /api/tags
#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

/// Polarity verdict requested from the summary model.
#[derive(Deserialize)]
struct SentimentReply {
    label: String,
    score: f64,
}

/// Parse the model's JSON verdict. The score range is checked by the
/// sentiment analyzer.
pub fn parse_polarity(raw: &str) -> Result<Polarity, BackendError> {
    let reply: SentimentReply = serde_json::from_str(raw.trim())
        .map_err(|e| BackendError::ResponseParsing(format!("Sentiment verdict: {e}")))?;

    let label = match reply.label.trim().to_uppercase().as_str() {
        "POSITIVE" => PolarityLabel::Positive,
        "NEGATIVE" => PolarityLabel::Negative,
        other => {
            return Err(BackendError::MalformedOutput(format!(
                "Unknown polarity label '{other}'"
            )))
        }
    };
    Ok(Polarity {
        label,
        score: reply.score,
    })
}

/// Build the summarization prompt with the length bounds spelled out;
/// Ollama has no minimum-length knob.
pub fn build_summary_prompt(text: &str, length: SummaryLength) -> String {
    format!(
        "Summarize the following consultation transcript in {} to {} words.\n\n\
         <transcript>\n{}\n</transcript>",
        length.min_tokens,
        length.max_tokens,
        text.trim()
    )
}

/// Generation cap for a summary bounded by `length` words: twice the word
/// bound, so the last sentence is not cut off.
fn summary_num_predict(length: SummaryLength) -> u32 {
    length.max_tokens.saturating_mul(2)
}

impl Summarizer for OllamaClient {
    fn summarize(&self, text: &str, length: SummaryLength) -> Result<String, BackendError> {
        let prompt = build_summary_prompt(text, length);
        self.generate(&OllamaGenerateRequest {
            model: &self.summary_model,
            prompt: &prompt,
            system: SUMMARY_SYSTEM_PROMPT,
            stream: false,
            format: None,
            options: GenerateOptions::greedy(summary_num_predict(length)),
        })
    }
}

impl Classifier for OllamaClient {
    fn classify(&self, text: &str) -> Result<Polarity, BackendError> {
        let prompt = format!("<text>\n{}\n</text>", text.trim());
        let raw = self.generate(&OllamaGenerateRequest {
            model: &self.summary_model,
            prompt: &prompt,
            system: SENTIMENT_SYSTEM_PROMPT,
            stream: false,
            format: Some("json"),
            options: GenerateOptions::greedy(SENTIMENT_NUM_PREDICT),
        })?;
        parse_polarity(&raw)
    }

    /// Whitespace-separated words; the model tokenizer is not exposed.
    fn token_count(&self, text: &str) -> Result<usize, BackendError> {
        Ok(text.split_whitespace().count())
    }

    fn max_input_tokens(&self) -> usize {
        OLLAMA_SENTIMENT_MAX_WORDS
    }
}

impl Embedder for OllamaClient {
    fn embed(&self, text: &str) -> Result<Vec<f32>, BackendError> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| BackendError::MalformedOutput("Ollama returned no embedding".into()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, BackendError> {
        let url = format!("{}/api/embed", self.base_url);
        let body = OllamaEmbedRequest {
            model: &self.embedding_model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let parsed: OllamaEmbedResponse = self.read_json(response)?;
        if parsed.embeddings.len() != texts.len() {
            return Err(BackendError::MalformedOutput(format!(
                "Requested {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }
        Ok(parsed.embeddings)
    }
}

/// Mock summarizer for testing. Returns a configurable response and
/// remembers the length bounds it was called with.
pub struct MockSummarizer {
    response: Option<String>,
    last_length: Mutex<Option<SummaryLength>>,
}

impl MockSummarizer {
    pub fn new(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            last_length: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            last_length: Mutex::new(None),
        }
    }

    pub fn last_length(&self) -> Option<SummaryLength> {
        self.last_length.lock().ok().and_then(|l| *l)
    }
}

impl Summarizer for MockSummarizer {
    fn summarize(&self, _text: &str, length: SummaryLength) -> Result<String, BackendError> {
        if let Ok(mut last) = self.last_length.lock() {
            *last = Some(length);
        }
        self.response
            .clone()
            .ok_or_else(|| BackendError::Unavailable("mock summarizer set to fail".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> OllamaClient {
        OllamaClient::new(url, 120, "llama3.2", "all-minilm").unwrap()
    }

    #[test]
    fn ollama_client_trims_trailing_slash() {
        let client = client("http://localhost:11434/");
        assert_eq!(client.base_url(), "http://localhost:11434");
        assert_eq!(client.timeout_secs, 120);
        assert_eq!(client.summary_model(), "llama3.2");
    }

    #[test]
    fn from_config_uses_configured_models() {
        let config = PipelineConfig::default();
        let client = OllamaClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), config.ollama_url);
        assert_eq!(client.embedding_model, config.embedding_model);
    }

    #[test]
    fn generate_request_is_greedy() {
        let body = OllamaGenerateRequest {
            model: "m",
            prompt: "p",
            system: "s",
            stream: false,
            format: None,
            options: GenerateOptions::greedy(150),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["options"]["temperature"], 0.0);
        assert_eq!(json["options"]["top_k"], 1);
        assert_eq!(json["options"]["num_predict"], 150);
        assert_eq!(json["stream"], false);
        assert!(json.get("format").is_none());
    }

    #[test]
    fn summary_generation_cap_exceeds_word_bound() {
        let length = SummaryLength::default();
        assert_eq!(summary_num_predict(length), 300);
        assert!(summary_num_predict(length) > length.max_tokens);
        let huge = SummaryLength {
            min_tokens: 1,
            max_tokens: u32::MAX,
        };
        assert_eq!(summary_num_predict(huge), u32::MAX);
    }

    #[test]
    fn polarity_verdict_parsed() {
        let polarity = parse_polarity(r#" {"label": "negative", "score": 0.82} "#).unwrap();
        assert_eq!(polarity, Polarity::negative(0.82));
        let polarity = parse_polarity(r#"{"label":"POSITIVE","score":1.0}"#).unwrap();
        assert_eq!(polarity.signed(), 1.0);
    }

    #[test]
    fn bad_polarity_verdicts_rejected() {
        assert!(matches!(
            parse_polarity("I think it is positive"),
            Err(BackendError::ResponseParsing(_))
        ));
        assert!(matches!(
            parse_polarity(r#"{"label": "neutral", "score": 0.5}"#),
            Err(BackendError::MalformedOutput(_))
        ));
        assert!(matches!(
            parse_polarity(r#"{"label": "POSITIVE"}"#),
            Err(BackendError::ResponseParsing(_))
        ));
    }

    #[test]
    fn ollama_classifier_counts_words() {
        let client = client("http://localhost:11434");
        assert_eq!(client.token_count("my  neck\nhurts").unwrap(), 3);
        assert_eq!(client.max_input_tokens(), OLLAMA_SENTIMENT_MAX_WORDS);
    }

    #[test]
    fn summary_prompt_states_bounds_and_wraps_text() {
        let prompt = build_summary_prompt("  Doctor: How are you?  ", SummaryLength::default());
        assert!(prompt.contains("in 50 to 150 words"));
        assert!(prompt.contains("<transcript>\nDoctor: How are you?\n</transcript>"));
    }

    #[test]
    #[ignore = "opens a TCP connection to 127.0.0.1:9"]
    fn unreachable_ollama_reports_connection_error() {
        // Port 9 (discard) is never an Ollama instance.
        let client = client("http://127.0.0.1:9");
        let err = client.summarize("text", SummaryLength::default()).unwrap_err();
        assert!(matches!(
            err,
            BackendError::OllamaConnection(_) | BackendError::HttpClient(_)
        ));
    }

    #[test]
    fn mock_summarizer_records_length() {
        let mock = MockSummarizer::new("A summary.");
        assert_eq!(
            mock.summarize("t", SummaryLength::default()).unwrap(),
            "A summary."
        );
        assert_eq!(mock.last_length(), Some(SummaryLength::default()));
        assert!(MockSummarizer::failing()
            .summarize("t", SummaryLength::default())
            .is_err());
    }
}
