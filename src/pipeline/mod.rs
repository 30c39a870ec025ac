//! Pipeline stages around the converter.
//!
//! Each submodule implements exactly one step, so each is independently
//! testable and only [`llm`], [`extract`] and the URL path of [`input`]
//! touch the network.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ extract ──▶ llm ──▶ postprocess ──▶ markup ──▶ pdf
//! (path/URL) (PNG)     (OCR)     (text)   (cleanup)      (tree)     (bytes)
//! ```
//!
//! 1. [`input`]: load and validate a PNG/JPEG question paper
//! 2. [`encode`]: downscale and base64-wrap it for the vision model
//! 3. [`extract`]: transcribe it and reject near-empty transcriptions
//! 4. [`llm`]: provider calls with timeout and retry/backoff
//! 5. [`postprocess`]: deterministic cleanup of model output quirks
//! 6. [`pdf`]: lay the document tree out as PDF (or HTML)

pub mod encode;
pub mod extract;
pub mod input;
pub mod llm;
pub mod pdf;
pub mod postprocess;
