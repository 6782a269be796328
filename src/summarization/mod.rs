//! Remote summarization client and failure classification.
//!
//! One call to [`Summarize::summarize`] issues exactly one outbound request;
//! retry and re-chunking decisions belong to the reduction pipeline, which
//! inspects the [`SummarizeError`] kind returned from here.

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::Config;

/// Default base URL of the Groq OpenAI-compatible API.
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1";

/// Default completion model identifier.
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

/// Fixed instruction applied to every summarization request.
const SYSTEM_PROMPT: &str = "Summarize the input text below. Limit the summary to 1 paragraph and use a 1st grade reading level.";

/// Groq mentions the per-minute request quota by this marker in 400/429
/// bodies; a body without it means the request itself exceeded the model's
/// input limit.
const RATE_LIMIT_MARKER: &str = "RMP";

/// Failure classifications for a summarization request.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// Service-side instability (HTTP 5xx); retryable after a delay.
    #[error("Summarization service error: {0}")]
    ServerError(String),
    /// A request quota was exhausted; retryable after a delay.
    #[error("Rate limited by summarization service: {0}")]
    RateLimited(String),
    /// The request exceeded the model's input limit; the workload must shrink.
    #[error("Summarization request too large: {0}")]
    RequestTooLarge(String),
    /// Any other failure: invalid request, transport error, malformed response.
    #[error("Summarization request failed: {0}")]
    Api(String),
}

/// Interface between the reduction pipeline and the remote service.
pub trait Summarize {
    /// Produce a simplified one-paragraph summary of `text`.
    fn summarize(&self, text: &str) -> Result<String, SummarizeError>;
}

/// Long-lived handle to the Groq chat-completions endpoint.
///
/// Credentials and model are fixed at construction; the handle is constructed
/// once per run and threaded through the pipeline explicitly.
pub struct GroqClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GroqClient {
    /// Construct a client for the given endpoint, credential, and model.
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        let http = Client::builder()
            .user_agent("docsum/summarize")
            .build()
            .expect("Failed to construct reqwest::Client for summarization");
        Self {
            http,
            base_url,
            api_key,
            model,
        }
    }

    /// Construct a client from configuration, falling back to the Groq defaults.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config
                .api_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            config.api_key.clone(),
            config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl Summarize for GroqClient {
    fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        let payload = json!({
            "messages": [
                {
                    "role": "system",
                    "content": SYSTEM_PROMPT,
                },
                {
                    "role": "user",
                    "content": text,
                }
            ],
            "model": self.model,
        });

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .map_err(|error| {
                SummarizeError::Api(format!("failed to reach {}: {error}", self.base_url))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let body: ChatCompletionResponse = response.json().map_err(|error| {
            SummarizeError::Api(format!("failed to decode completion response: {error}"))
        })?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SummarizeError::Api("completion response contained no choices".into()))?;

        Ok(choice.message.content)
    }
}

/// Map an error response onto one of the four failure kinds.
fn classify_failure(status: StatusCode, body: &str) -> SummarizeError {
    let reason = format!("{status}: {body}");
    if status.is_server_error() {
        SummarizeError::ServerError(reason)
    } else if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::BAD_REQUEST {
        if body.contains(RATE_LIMIT_MARKER) {
            SummarizeError::RateLimited(reason)
        } else {
            SummarizeError::RequestTooLarge(reason)
        }
    } else {
        SummarizeError::Api(reason)
    }
}
