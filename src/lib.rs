//! # gradegear-docgen
//!
//! Turn a syllabus into study notes and a photographed question paper into
//! worked solutions, delivered as styled HTML and PDF.
//!
//! ## Why this crate?
//!
//! Language models write good explanations but their formatting is loose
//! and inconsistent. This crate asks for a simple line-oriented format
//! (`**Heading**`, `- item`, `> quote`, `a | b` tables and, for solutions,
//! `Question:` / `Approach:` / `Solution:` / `Answer:` labels), cleans what
//! comes back, and converts it with a deterministic single-pass converter
//! into a document tree that the HTML and PDF renderers lay out.
//!
//! ## Pipeline Overview
//!
//! ```text
//! syllabus ─────────────────────────────┐
//!                                       ├─ 3. Generate  notes / solver prompt → LLM
//! photo ─ 1. Input ─ 2. Extract (OCR) ──┘
//!                                          4. Style     cleanup + markup::convert
//!                                          5. Render    HTML + PDF (lopdf)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gradegear_docgen::{generate_notes, GenerationConfig, NotesRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let config = GenerationConfig::default();
//!     let request = NotesRequest::new("Unit 1: Vectors, kinematics, Newton's laws")
//!         .with_reference_books("H.C. Verma, Concepts of Physics");
//!     let doc = generate_notes(&request, &config).await?;
//!     std::fs::write("notes.pdf", &doc.pdf)?;
//!     eprintln!("tokens: {} in / {} out",
//!         doc.stats.total_input_tokens,
//!         doc.stats.total_output_tokens);
//!     Ok(())
//! }
//! ```
//!
//! The converter needs no model at all:
//!
//! ```rust
//! use gradegear_docgen::markup::{convert, DocumentNode, Mode};
//!
//! let tree = convert("Question 1: 2+2?\nAnswer: 4", Mode::Solution);
//! assert_eq!(tree.len(), 2);
//! assert!(matches!(tree.nodes[1], DocumentNode::Callout { .. }));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `gradegear` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! gradegear-docgen = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod markup;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder, PageLayout, PageSize};
pub use error::DocGenError;
pub use generate::{
    generate_notes, generate_notes_sync, generate_notes_to_file, solve_from_bytes,
    solve_from_text, solve_from_text_sync, solve_question_paper, solve_question_paper_sync,
    solve_question_paper_to_file, style_text, write_atomic, NotesRequest,
};
pub use markup::{convert, DocumentNode, DocumentTree, Mode};
pub use output::{GeneratedDocument, GenerationStats};
pub use pipeline::pdf::{DocumentRenderer, HtmlRenderer, PdfRenderer};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
