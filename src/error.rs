//! Error types for the gradegear-docgen library.
//!
//! The text-to-markup converter itself cannot fail: [`crate::markup::convert`]
//! is total over all strings. Everything that *can* fail lives around it:
//!
//! * the **text source**: reading the question-paper image, transcribing
//!   it, calling the language model (network, timeout, quota, or simply no
//!   legible text in the photo);
//! * the **document renderer**: serialising the PDF and writing it out.
//!
//! All of these surface as a single [`DocGenError`] so callers (a web
//! handler, the CLI) can map each variant to a status code or exit message.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the gradegear-docgen library.
#[derive(Debug, Error)]
pub enum DocGenError {
    // ── Request errors ────────────────────────────────────────────────────
    /// Notes were requested with an empty syllabus.
    #[error("Syllabus is required")]
    MissingSyllabus,

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file is neither a PNG nor a JPEG image.
    #[error("Invalid file type for '{source_name}'. Please upload a JPEG or PNG image.\nFirst bytes: {magic:?}")]
    UnsupportedImage { source_name: String, magic: Vec<u8> },

    /// The image exceeds the configured upload limit.
    #[error("File size exceeds {limit_mb}MB limit ({size} bytes)")]
    ImageTooLarge { size: u64, limit_mb: u64 },

    /// The bytes look like an image but could not be decoded.
    #[error("Failed to decode image '{source_name}': {detail}")]
    ImageDecodeFailed { source_name: String, detail: String },

    // ── Text source errors ────────────────────────────────────────────────
    /// Transcription returned (almost) nothing.
    #[error("Could not extract text from the image. Please upload a clearer image.\n(got {chars} characters, need at least {min})")]
    NoTextExtracted { chars: usize, min: usize },

    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API kept failing after all retries.
    #[error("LLM API error after {retries} retries: {message}")]
    LlmApiError { message: String, retries: u32 },

    /// The model answered with nothing usable.
    #[error("LLM returned an empty response for the {stage} stage")]
    EmptyResponse { stage: &'static str },

    /// LLM call timed out.
    #[error("LLM call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    // ── Output errors ─────────────────────────────────────────────────────
    /// PDF serialisation failed.
    #[error("Failed to render PDF: {0}")]
    RenderFailed(String),

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
