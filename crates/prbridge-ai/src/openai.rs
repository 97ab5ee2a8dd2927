use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use tokio::time::sleep;

use crate::{
    retry::{
        is_transient_status, new_request_id, retry_delay_ms, BACKOFF_UNIT_MS, JITTER_MAX_MS,
        MAX_ATTEMPTS,
    },
    CompletionClient, CompletionRequest, ModelError,
};

pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;
const ERROR_BODY_MAX_CHARS: usize = 800;

#[derive(Debug, Clone)]
/// Connection and retry settings for the OpenAI Responses API.
pub struct OpenAiResponsesConfig {
    pub api_base: String,
    pub api_key: String,
    pub request_timeout_ms: u64,
    pub max_attempts: usize,
    pub backoff_unit_ms: u64,
    pub jitter_max_ms: u64,
}

impl OpenAiResponsesConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            api_key: api_key.into(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_attempts: MAX_ATTEMPTS,
            backoff_unit_ms: BACKOFF_UNIT_MS,
            jitter_max_ms: JITTER_MAX_MS,
        }
    }
}

#[derive(Debug, Clone)]
/// Public struct `OpenAiResponsesClient` used by the bridge runtime.
pub struct OpenAiResponsesClient {
    client: reqwest::Client,
    config: OpenAiResponsesConfig,
}

impl OpenAiResponsesClient {
    pub fn new(config: OpenAiResponsesConfig) -> Result<Self, ModelError> {
        if config.api_key.trim().is_empty() {
            return Err(ModelError::MissingApiKey);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = format!("Bearer {}", config.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|e| ModelError::InvalidResponse(format!("invalid API key header: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()?;

        Ok(Self { client, config })
    }

    fn responses_url(&self) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        if base.ends_with("/responses") {
            return base.to_string();
        }
        format!("{base}/responses")
    }
}

#[async_trait]
impl CompletionClient for OpenAiResponsesClient {
    async fn complete_text(&self, request: CompletionRequest) -> Result<String, ModelError> {
        let body = json!({
            "model": request.model,
            "input": request.input,
        });
        let url = self.responses_url();
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_status = 0_u16;

        for attempt in 1..=max_attempts {
            let response = self
                .client
                .post(&url)
                .header("x-prbridge-request-id", new_request_id())
                .header("x-prbridge-retry-attempt", (attempt - 1).to_string())
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                let raw = response.text().await?;
                let text = parse_responses_output_text(&raw)?;
                tracing::info!(
                    attempt,
                    output_chars = text.chars().count(),
                    "completion request succeeded"
                );
                return Ok(text);
            }

            let raw = response.text().await.unwrap_or_default();
            if is_transient_status(status.as_u16()) {
                last_status = status.as_u16();
                if attempt < max_attempts {
                    let delay_ms = retry_delay_ms(
                        attempt,
                        self.config.backoff_unit_ms,
                        self.config.jitter_max_ms,
                    );
                    tracing::warn!(
                        status = last_status,
                        attempt,
                        max_attempts,
                        delay_ms,
                        "transient completion failure, retrying"
                    );
                    sleep(Duration::from_millis(delay_ms)).await;
                } else {
                    tracing::warn!(
                        status = last_status,
                        attempt,
                        max_attempts,
                        "transient completion failure on final attempt"
                    );
                }
                continue;
            }

            tracing::error!(status = status.as_u16(), "completion request failed");
            return Err(ModelError::HttpStatus {
                status: status.as_u16(),
                body: truncate_error_body(&raw),
            });
        }

        Err(ModelError::TransientExhausted {
            attempts: max_attempts,
            last_status,
        })
    }
}

fn truncate_error_body(raw: &str) -> String {
    if raw.chars().count() <= ERROR_BODY_MAX_CHARS {
        return raw.to_string();
    }
    let mut truncated = raw.chars().take(ERROR_BODY_MAX_CHARS).collect::<String>();
    truncated.push_str("...");
    truncated
}

/// Concatenates every `output_text` fragment of every output item, in order.
pub fn parse_responses_output_text(raw: &str) -> Result<String, ModelError> {
    let parsed: ResponsesEnvelope = serde_json::from_str(raw)?;
    let mut text = String::new();
    for item in parsed.output.unwrap_or_default() {
        for fragment in item.content.unwrap_or_default() {
            if fragment.fragment_type.as_deref() != Some("output_text") {
                continue;
            }
            if let Some(fragment_text) = fragment.text {
                text.push_str(&fragment_text);
            }
        }
    }
    Ok(text.trim().to_string())
}

#[derive(Debug, Deserialize)]
struct ResponsesEnvelope {
    #[serde(default)]
    output: Option<Vec<ResponsesOutputItem>>,
}

#[derive(Debug, Deserialize)]
struct ResponsesOutputItem {
    #[serde(default)]
    content: Option<Vec<ResponsesContentFragment>>,
}

#[derive(Debug, Deserialize)]
struct ResponsesContentFragment {
    #[serde(rename = "type", default)]
    fragment_type: Option<String>,
    #[serde(default)]
    text: Option<String>,
}
