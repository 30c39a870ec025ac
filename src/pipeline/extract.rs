//! Text extraction: transcribe a question-paper photo with the vision model.

use crate::config::GenerationConfig;
use crate::error::DocGenError;
use crate::pipeline::encode;
use crate::pipeline::input::LoadedImage;
use crate::pipeline::llm::{self, Completion};
use crate::progress::Stage;
use crate::prompts::DEFAULT_TRANSCRIPTION_PROMPT;
use edgequake_llm::LLMProvider;
use std::sync::Arc;
use tracing::{debug, info};

/// Transcribe `image` and check that enough text came back.
///
/// Decoding and downscaling run on the blocking pool because `image` is
/// CPU-bound and a 12 MP photo takes long enough to stall the runtime.
pub async fn extract_text(
    provider: &Arc<dyn LLMProvider>,
    image: LoadedImage,
    config: &GenerationConfig,
) -> Result<Completion, DocGenError> {
    let max_pixels = config.max_image_pixels;
    let image_data = tokio::task::spawn_blocking(move || encode::prepare_image(&image, max_pixels))
        .await
        .map_err(|e| DocGenError::Internal(format!("image task panicked: {e}")))??;

    let prompt = config
        .transcription_prompt
        .as_deref()
        .unwrap_or(DEFAULT_TRANSCRIPTION_PROMPT);
    let messages = llm::vision_messages(prompt, image_data);

    let mut completion = llm::complete(
        provider,
        Stage::Extract,
        &messages,
        config.transcription_temperature,
        config,
    )
    .await?;

    completion.text = check_extracted(&completion.text, config.min_extracted_chars)?;
    info!("Extracted {} characters of question text", completion.text.len());
    Ok(completion)
}

/// Trim the transcription and reject it when fewer than `min_chars`
/// characters remain.
pub fn check_extracted(text: &str, min_chars: usize) -> Result<String, DocGenError> {
    let trimmed = text.trim();
    let chars = trimmed.chars().count();
    debug!("Transcription has {} characters", chars);
    if chars < min_chars {
        return Err(DocGenError::NoTextExtracted {
            chars,
            min: min_chars,
        });
    }
    Ok(trimmed.to_string())
}
