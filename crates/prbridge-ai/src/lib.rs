//! Completion-service client surface for the issue-comment PR bridge.
mod openai;
mod retry;
mod types;

pub use openai::{
    parse_responses_output_text, OpenAiResponsesClient, OpenAiResponsesConfig,
    DEFAULT_OPENAI_API_BASE,
};
pub use retry::{
    backoff_delay_ms, is_transient_status, new_request_id, retry_delay_ms, BACKOFF_UNIT_MS,
    JITTER_MAX_MS, MAX_ATTEMPTS, MAX_BACKOFF_MULTIPLIER, TRANSIENT_STATUSES,
};
pub use types::{CompletionClient, CompletionRequest, ModelError};
