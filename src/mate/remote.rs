use crate::error::RemoteError;
use crate::mate::config::MateInferenceConfig;
use crate::mate::text_metrics::word_count;
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

pub const PRIMARY_TIMEOUT_SECS: u64 = 15;
pub const SECONDARY_TIMEOUT_SECS: u64 = 10;
const MAX_ERROR_BODY_CHARS: usize = 512;

/// The two remote summarizers, tried in fixed priority order by the
/// orchestrator. Implementations perform exactly one attempt per call.
pub trait RemoteSummarizer: Send + Sync {
    fn summarize_primary(&self, text: &str) -> Result<String, RemoteError>;
    fn summarize_secondary(&self, text: &str) -> Result<String, RemoteError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationParameters {
    pub max_length: usize,
    pub min_length: usize,
    pub do_sample: bool,
    pub early_stopping: bool,
}

impl GenerationParameters {
    /// Length bounds derived from the input size; decoding is deterministic.
    pub fn for_word_count(words: usize) -> Self {
        Self {
            max_length: 150.min(words * 3 / 10),
            min_length: 30.max(words / 10),
            do_sample: false,
            early_stopping: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestOptions {
    pub wait_for_model: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferenceRequest<'a> {
    pub inputs: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<GenerationParameters>,
    pub options: RequestOptions,
}

impl<'a> InferenceRequest<'a> {
    pub fn primary(text: &'a str) -> Self {
        Self {
            inputs: text,
            parameters: Some(GenerationParameters::for_word_count(word_count(text))),
            options: RequestOptions {
                wait_for_model: true,
            },
        }
    }

    pub fn secondary(text: &'a str) -> Self {
        Self {
            inputs: text,
            parameters: None,
            options: RequestOptions {
                wait_for_model: true,
            },
        }
    }
}

/// The response shapes the inference endpoints are known to return.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceResponse {
    Sequence(Vec<Value>),
    Object(Map<String, Value>),
}

impl InferenceResponse {
    pub fn decode(value: Value) -> Result<Self, RemoteError> {
        match value {
            Value::Array(items) => Ok(Self::Sequence(items)),
            Value::Object(map) => Ok(Self::Object(map)),
            Value::Null => Err(shape_error("null body")),
            Value::Bool(_) => Err(shape_error("boolean body")),
            Value::Number(_) => Err(shape_error("numeric body")),
            Value::String(_) => Err(shape_error("string body")),
        }
    }

    /// Extract the trimmed summary, preferring `summary_text` over
    /// `generated_text`.
    pub fn into_summary(self) -> Result<String, RemoteError> {
        let map = match self {
            Self::Sequence(items) => match items.into_iter().next() {
                Some(Value::Object(map)) => map,
                Some(_) => return Err(shape_error("sequence element is not an object")),
                None => return Err(shape_error("empty sequence")),
            },
            Self::Object(map) => map,
        };

        let text = ["summary_text", "generated_text"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .ok_or_else(|| shape_error("missing summary_text and generated_text"))?;

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(RemoteError::EmptyResult);
        }
        Ok(trimmed.to_string())
    }
}

fn shape_error(detail: &str) -> RemoteError {
    RemoteError::UnexpectedResponseShape(detail.to_string())
}

fn truncate_body(body: &str) -> String {
    crate::mate::util::truncate_with_ellipsis(body.trim(), MAX_ERROR_BODY_CHARS)
}

/// HTTP client for the hosted inference endpoints.
pub struct InferenceClient {
    client: Client,
    api_key: Option<String>,
    primary_url: String,
    secondary_url: String,
}

impl InferenceClient {
    pub fn new(config: &MateInferenceConfig, api_key: Option<String>) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .build()
            .map_err(|err| RemoteError::Network(err.to_string()))?;
        Ok(Self {
            client,
            api_key,
            primary_url: config.primary_url.clone(),
            secondary_url: config.secondary_url.clone(),
        })
    }

    fn post(
        &self,
        url: &str,
        payload: &InferenceRequest<'_>,
        timeout_secs: u64,
    ) -> Result<String, RemoteError> {
        let mut request = self
            .client
            .post(url)
            .timeout(Duration::from_secs(timeout_secs))
            .json(payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(|err| classify(err, timeout_secs))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RemoteError::HttpError {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let raw = response.text().map_err(|err| classify(err, timeout_secs))?;
        let json: Value = serde_json::from_str(&raw)
            .map_err(|err| shape_error(&format!("body is not json: {err}")))?;
        InferenceResponse::decode(json)?.into_summary()
    }
}

fn classify(err: reqwest::Error, timeout_secs: u64) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout(timeout_secs)
    } else {
        RemoteError::Network(err.to_string())
    }
}

impl RemoteSummarizer for InferenceClient {
    fn summarize_primary(&self, text: &str) -> Result<String, RemoteError> {
        self.post(
            &self.primary_url,
            &InferenceRequest::primary(text),
            PRIMARY_TIMEOUT_SECS,
        )
    }

    fn summarize_secondary(&self, text: &str) -> Result<String, RemoteError> {
        self.post(
            &self.secondary_url,
            &InferenceRequest::secondary(text),
            SECONDARY_TIMEOUT_SECS,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{GenerationParameters, InferenceRequest, InferenceResponse};
    use crate::error::RemoteError;
    use serde_json::json;

    fn summary_of(value: serde_json::Value) -> Result<String, RemoteError> {
        InferenceResponse::decode(value)?.into_summary()
    }

    #[test]
    fn parameters_follow_word_count() {
        let p = GenerationParameters::for_word_count(1000);
        assert_eq!((p.max_length, p.min_length), (150, 100));
        let p = GenerationParameters::for_word_count(57);
        assert_eq!((p.max_length, p.min_length), (17, 30));
        assert!(!p.do_sample);
    }

    #[test]
    fn primary_body_carries_parameters_and_wait_flag() {
        let body = serde_json::to_value(InferenceRequest::primary("one two three")).expect("json");
        assert_eq!(body["inputs"], "one two three");
        assert_eq!(body["parameters"]["min_length"], 30);
        assert_eq!(body["parameters"]["do_sample"], false);
        assert_eq!(body["options"]["wait_for_model"], true);
    }

    #[test]
    fn secondary_body_omits_parameters() {
        let body = serde_json::to_value(InferenceRequest::secondary("text")).expect("json");
        assert!(body.get("parameters").is_none());
        assert_eq!(body["options"]["wait_for_model"], true);
    }

    #[test]
    fn reads_sequence_shape() {
        let got = summary_of(json!([{ "summary_text": "  from bart  " }]));
        assert_eq!(got.as_deref(), Ok("from bart"));
    }

    #[test]
    fn reads_object_shape_with_generated_text() {
        let got = summary_of(json!({ "generated_text": "from generator" }));
        assert_eq!(got.as_deref(), Ok("from generator"));
    }

    #[test]
    fn summary_text_wins_over_generated_text() {
        let got = summary_of(json!({ "generated_text": "second", "summary_text": "first" }));
        assert_eq!(got.as_deref(), Ok("first"));
    }

    #[test]
    fn blank_summary_is_empty_result() {
        assert_eq!(
            summary_of(json!([{ "summary_text": "   " }])),
            Err(RemoteError::EmptyResult)
        );
    }

    #[test]
    fn unmatched_shapes_are_named_failures() {
        for value in [
            json!([]),
            json!(["text"]),
            json!({ "error": "Model is loading" }),
            json!(42),
            json!(null),
        ] {
            assert!(matches!(
                summary_of(value),
                Err(RemoteError::UnexpectedResponseShape(_))
            ));
        }
    }
}
