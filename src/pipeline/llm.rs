//! LLM interaction: build chat messages and call the provider with retry.
//!
//! This module is intentionally thin. Prompt wording lives in
//! [`crate::prompts`]; here we only assemble messages, enforce the per-call
//! timeout and retry transient failures.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors and slow responses are the common failure modes of
//! hosted models. Each attempt runs under `api_timeout_secs`; failed attempts
//! are retried with exponential backoff (`retry_backoff_ms * 2^(attempt-1)`),
//! so with a 500 ms base and 3 retries the waits are 500 ms → 1 s → 2 s.

use crate::config::GenerationConfig;
use crate::error::DocGenError;
use crate::progress::Stage;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Text returned by one successful LLM call.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Retries spent before the call succeeded.
    pub retries: u32,
    pub duration_ms: u64,
}

/// Messages for a text-only request: system prompt, then the user prompt.
pub fn text_messages(system_prompt: &str, user_prompt: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(user_prompt),
    ]
}

/// Messages for a vision request.
///
/// The user turn carries no text: the image holds all the content and the
/// system prompt says what to do with it.
pub fn vision_messages(system_prompt: &str, image: ImageData) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user_with_images("", vec![image]),
    ]
}

/// Call the provider, retrying failed or timed-out attempts.
pub async fn complete(
    provider: &Arc<dyn LLMProvider>,
    stage: Stage,
    messages: &[ChatMessage],
    temperature: f32,
    config: &GenerationConfig,
) -> Result<Completion, DocGenError> {
    let start = Instant::now();
    let options = build_options(temperature, config);
    let call_timeout = Duration::from_secs(config.api_timeout_secs);

    let mut last_err: Option<String> = None;
    let mut timed_out = false;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "{}: retry {}/{} after {}ms",
                stage, attempt, config.max_retries, backoff
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_retry(stage, attempt, last_err.as_deref().unwrap_or("unknown error"));
            }
            sleep(Duration::from_millis(backoff)).await;
        }

        match timeout(call_timeout, provider.chat(messages, Some(&options))).await {
            Ok(Ok(response)) => {
                let duration = start.elapsed();
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    stage, response.prompt_tokens, response.completion_tokens, duration
                );
                return Ok(Completion {
                    text: response.content,
                    input_tokens: response.prompt_tokens as u64,
                    output_tokens: response.completion_tokens as u64,
                    retries: attempt,
                    duration_ms: duration.as_millis() as u64,
                });
            }
            Ok(Err(e)) => {
                let err_msg = e.to_string();
                warn!("{}: attempt {} failed: {}", stage, attempt + 1, err_msg);
                timed_out = false;
                last_err = Some(err_msg);
            }
            Err(_) => {
                warn!(
                    "{}: attempt {} timed out after {}s",
                    stage,
                    attempt + 1,
                    config.api_timeout_secs
                );
                timed_out = true;
                last_err = Some(format!("timed out after {}s", config.api_timeout_secs));
            }
        }
    }

    if timed_out {
        return Err(DocGenError::ApiTimeout {
            secs: config.api_timeout_secs,
        });
    }
    Err(DocGenError::LlmApiError {
        message: last_err.unwrap_or_else(|| "Unknown error".to_string()),
        retries: config.max_retries,
    })
}

/// Delay before retry number `attempt` (1-based).
fn backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
}

fn build_options(temperature: f32, config: &GenerationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = GenerationConfig::default();
        let opts = build_options(config.temperature, &config);
        assert_eq!(opts.temperature, Some(0.4));
        assert_eq!(opts.max_tokens, Some(8192));
    }

    #[test]
    fn transcription_options_are_deterministic() {
        let config = GenerationConfig::default();
        let opts = build_options(config.transcription_temperature, &config);
        assert_eq!(opts.temperature, Some(0.0));
    }

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff_ms(500, 1), 500);
        assert_eq!(backoff_ms(500, 2), 1000);
        assert_eq!(backoff_ms(500, 3), 2000);
        assert_eq!(backoff_ms(u64::MAX, 5), u64::MAX);
    }

    #[test]
    fn message_layouts() {
        assert_eq!(text_messages("sys", "user").len(), 2);
        let img = ImageData::new("AAAA".to_string(), "image/png");
        assert_eq!(vision_messages("sys", img).len(), 2);
    }
}
