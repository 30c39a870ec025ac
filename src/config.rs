//! Configuration types for notes and solution generation.
//!
//! Every knob lives in [`GenerationConfig`], built via its
//! [`GenerationConfigBuilder`]. The language-model provider is part of the
//! configuration: either a pre-built provider object is injected, or a
//! provider name and model are given and the provider reads its API key from
//! the environment when it is constructed. No credential is ever compiled
//! into the crate.

use crate::error::DocGenError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for a generation run.
///
/// Built via [`GenerationConfig::builder()`] or using
/// [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use gradegear_docgen::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .model("gemini-2.0-flash")
///     .provider_name("gemini")
///     .max_retries(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected from the
    /// environment.
    pub provider_name: Option<String>,

    /// LLM model identifier, e.g. "gemini-2.0-flash", "gpt-4.1-mini".
    /// If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// Sampling temperature for notes and solutions. Default: 0.4.
    ///
    /// Notes benefit from some variety in examples and phrasing; solutions
    /// stay coherent well below 1.0.
    pub temperature: f32,

    /// Sampling temperature for image transcription. Default: 0.0.
    ///
    /// Transcription must reproduce what is printed on the paper, nothing
    /// more, so it runs fully deterministic.
    pub transcription_temperature: f32,

    /// Maximum tokens the LLM may generate per call. Default: 8192.
    ///
    /// Notes are asked to span at least ten pages; 8 192 tokens is roughly
    /// twelve A4 pages of body text.
    pub max_tokens: usize,

    /// Maximum retry attempts on a failed LLM call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    ///
    /// Doubles after each attempt: 500 ms → 1 s → 2 s.
    pub retry_backoff_ms: u64,

    /// Per-LLM-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Largest accepted question-paper image in bytes. Default: 10 MiB.
    pub max_image_bytes: u64,

    /// Longest image side in pixels sent to the vision model. Default: 2000.
    ///
    /// Larger photos are downscaled proportionally before encoding.
    pub max_image_pixels: u32,

    /// Fewest characters a transcription may contain. Default: 10.
    pub min_extracted_chars: usize,

    /// Custom system prompt for notes and solutions. If None, uses the
    /// built-in one.
    pub system_prompt: Option<String>,

    /// Custom transcription prompt. If None, uses the built-in one.
    pub transcription_prompt: Option<String>,

    /// Page geometry of the generated PDF.
    pub layout: PageLayout,

    /// Optional per-stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

/// Model used when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default upload limit for question-paper images.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: None,
            provider_name: None,
            model: None,
            temperature: 0.4,
            transcription_temperature: 0.0,
            max_tokens: 8192,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            max_image_pixels: 2000,
            min_extracted_chars: 10,
            system_prompt: None,
            transcription_prompt: None,
            layout: PageLayout::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("transcription_temperature", &self.transcription_temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_image_bytes", &self.max_image_bytes)
            .field("min_extracted_chars", &self.min_extracted_chars)
            .field("layout", &self.layout)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn GenerationProgressCallback>"),
            )
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model to request, falling back to [`DEFAULT_MODEL`].
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn transcription_temperature(mut self, t: f32) -> Self {
        self.config.transcription_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn max_image_bytes(mut self, bytes: u64) -> Self {
        self.config.max_image_bytes = bytes;
        self
    }

    pub fn max_image_pixels(mut self, px: u32) -> Self {
        self.config.max_image_pixels = px.max(100);
        self
    }

    pub fn min_extracted_chars(mut self, n: usize) -> Self {
        self.config.min_extracted_chars = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn transcription_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.transcription_prompt = Some(prompt.into());
        self
    }

    pub fn layout(mut self, layout: PageLayout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, DocGenError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(DocGenError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(DocGenError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_image_bytes == 0 {
            return Err(DocGenError::InvalidConfig(
                "max_image_bytes must be ≥ 1".into(),
            ));
        }
        c.layout.validate()?;
        Ok(self.config)
    }
}

// ── Page layout ──────────────────────────────────────────────────────────

/// Paper size of the generated PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    /// 210 × 297 mm (default).
    #[default]
    A4,
    /// 8.5 × 11 in.
    Letter,
}

impl PageSize {
    /// Width and height in PDF points (1/72 in).
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
        }
    }
}

/// Page geometry and base type size for PDF output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub size: PageSize,
    /// Margin on all four sides, in points. Default: 50.
    pub margin: f32,
    /// Body text size in points. Default: 11. Headings scale from it.
    pub font_size: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margin: 50.0,
            font_size: 11.0,
        }
    }
}

impl PageLayout {
    /// Width available to text between the margins.
    pub fn content_width(&self) -> f32 {
        self.size.dimensions().0 - 2.0 * self.margin
    }

    fn validate(&self) -> Result<(), DocGenError> {
        let (width, height) = self.size.dimensions();
        if self.margin < 0.0 || self.margin * 2.0 >= width.min(height) - 72.0 {
            return Err(DocGenError::InvalidConfig(format!(
                "page margin {}pt leaves no room for text",
                self.margin
            )));
        }
        if !(6.0..=24.0).contains(&self.font_size) {
            return Err(DocGenError::InvalidConfig(format!(
                "font size must be 6–24pt, got {}",
                self.font_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.max_image_bytes, 10 * 1024 * 1024);
        assert_eq!(config.min_extracted_chars, 10);
        assert_eq!(config.model_or_default(), DEFAULT_MODEL);
        assert!(config.provider.is_none());
    }

    #[test]
    fn builder_clamps_temperature() {
        let config = GenerationConfig::builder()
            .temperature(5.0)
            .transcription_temperature(-1.0)
            .build()
            .unwrap();
        assert_eq!(config.temperature, 2.0);
        assert_eq!(config.transcription_temperature, 0.0);
    }

    #[test]
    fn builder_rejects_zero_tokens() {
        let err = GenerationConfig::builder().max_tokens(0).build().unwrap_err();
        assert!(matches!(err, DocGenError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_huge_margin() {
        let layout = PageLayout {
            margin: 400.0,
            ..PageLayout::default()
        };
        let err = GenerationConfig::builder().layout(layout).build().unwrap_err();
        assert!(err.to_string().contains("margin"));
    }

    #[test]
    fn builder_rejects_tiny_font() {
        let layout = PageLayout {
            font_size: 2.0,
            ..PageLayout::default()
        };
        assert!(GenerationConfig::builder().layout(layout).build().is_err());
    }

    #[test]
    fn debug_hides_provider() {
        let config = GenerationConfig::builder().model("gpt-4.1-mini").build().unwrap();
        let dbg = format!("{config:?}");
        assert!(dbg.contains("gpt-4.1-mini"));
        assert!(dbg.contains("provider: None"));
    }

    #[test]
    fn content_width_subtracts_margins() {
        let layout = PageLayout {
            size: PageSize::Letter,
            margin: 36.0,
            font_size: 11.0,
        };
        assert_eq!(layout.content_width(), 540.0);
    }
}
