//! Generation entry points: syllabus → notes, question paper → solutions.
//!
//! Every entry point ends in the same two local stages:
//!
//! ```text
//! model text ──▶ postprocess ──▶ markup::convert ──▶ HTML + PDF
//!                 (cleanup)        (document tree)     (renderers)
//! ```
//!
//! What differs is where the model text comes from: a notes prompt built
//! from the syllabus, a solver prompt built from a transcribed photo or
//! supplied question text, or (for [`style_text`]) no model at all.

use crate::config::{GenerationConfig, DEFAULT_MODEL};
use crate::error::DocGenError;
use crate::markup::{self, html::render_html, Mode};
use crate::output::{GeneratedDocument, GenerationStats};
use crate::pipeline::extract::{check_extracted, extract_text};
use crate::pipeline::input::{self, LoadedImage};
use crate::pipeline::llm::{self, Completion};
use crate::pipeline::pdf::{DocumentRenderer, PdfRenderer};
use crate::pipeline::postprocess::clean_generated_text;
use crate::progress::Stage;
use crate::prompts::{notes_prompt, solver_prompt, DEFAULT_SYSTEM_PROMPT};
use edgequake_llm::{LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Model used with an OpenAI key when no model is configured.
const OPENAI_DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Input for [`generate_notes`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesRequest {
    pub syllabus: String,
    /// Free-form list of books the notes should draw on.
    #[serde(default)]
    pub reference_books: Option<String>,
}

impl NotesRequest {
    pub fn new(syllabus: impl Into<String>) -> Self {
        Self {
            syllabus: syllabus.into(),
            reference_books: None,
        }
    }

    pub fn with_reference_books(mut self, books: impl Into<String>) -> Self {
        self.reference_books = Some(books.into());
        self
    }
}

/// Generate study notes for a syllabus.
///
/// # Errors
/// [`DocGenError::MissingSyllabus`] for a blank syllabus, otherwise the
/// provider and rendering errors of the pipeline.
pub async fn generate_notes(
    request: &NotesRequest,
    config: &GenerationConfig,
) -> Result<GeneratedDocument, DocGenError> {
    let started = Instant::now();
    let syllabus = request.syllabus.trim();
    if syllabus.is_empty() {
        return Err(DocGenError::MissingSyllabus);
    }
    info!("Generating notes ({} chars of syllabus)", syllabus.len());

    let provider = resolve_provider(config)?;
    let prompt = notes_prompt(syllabus, request.reference_books.as_deref());
    let completion = generate(&provider, &prompt, config).await?;

    finish(
        Mode::Notes,
        syllabus.to_string(),
        &completion.text,
        &[&completion],
        0,
        started,
        config,
    )
}

/// Solve a photographed question paper given as a local path or URL.
pub async fn solve_question_paper(
    input_str: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<GeneratedDocument, DocGenError> {
    let started = Instant::now();
    let input_str = input_str.as_ref();
    info!("Solving question paper: {}", input_str);

    stage_start(config, Stage::Input);
    let image =
        input::load_image(input_str, config.max_image_bytes, config.download_timeout_secs).await?;
    stage_complete(config, Stage::Input, image.bytes.len());

    solve_image(image, started, config).await
}

/// Solve a question paper from image bytes already in memory, such as an
/// HTTP upload.
pub async fn solve_from_bytes(
    bytes: Vec<u8>,
    source_name: impl Into<String>,
    config: &GenerationConfig,
) -> Result<GeneratedDocument, DocGenError> {
    let started = Instant::now();
    stage_start(config, Stage::Input);
    let image = input::image_from_bytes(bytes, source_name, config.max_image_bytes)?;
    stage_complete(config, Stage::Input, image.bytes.len());

    solve_image(image, started, config).await
}

/// Solve questions that are already available as text, skipping OCR.
pub async fn solve_from_text(
    question_text: &str,
    config: &GenerationConfig,
) -> Result<GeneratedDocument, DocGenError> {
    let started = Instant::now();
    let questions = check_extracted(question_text, config.min_extracted_chars)?;
    let provider = resolve_provider(config)?;
    solve_with(&provider, questions, None, started, config).await
}

/// Clean and render text without calling a model.
///
/// This is the offline half of the pipeline: useful for re-rendering saved
/// model output and for previewing the converter on hand-written text.
pub fn style_text(
    text: &str,
    mode: Mode,
    config: &GenerationConfig,
) -> Result<GeneratedDocument, DocGenError> {
    finish(mode, text.to_string(), text, &[], 0, Instant::now(), config)
}

/// Generate notes and write the PDF to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn generate_notes_to_file(
    request: &NotesRequest,
    output_path: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<GenerationStats, DocGenError> {
    let doc = generate_notes(request, config).await?;
    write_pdf(doc, output_path.as_ref()).await
}

/// Solve a question paper and write the PDF to `output_path`.
pub async fn solve_question_paper_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &GenerationConfig,
) -> Result<GenerationStats, DocGenError> {
    let doc = solve_question_paper(input_str, config).await?;
    write_pdf(doc, output_path.as_ref()).await
}

/// Synchronous wrapper around [`generate_notes`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_notes_sync(
    request: &NotesRequest,
    config: &GenerationConfig,
) -> Result<GeneratedDocument, DocGenError> {
    runtime()?.block_on(generate_notes(request, config))
}

/// Synchronous wrapper around [`solve_question_paper`].
pub fn solve_question_paper_sync(
    input_str: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<GeneratedDocument, DocGenError> {
    runtime()?.block_on(solve_question_paper(input_str, config))
}

/// Synchronous wrapper around [`solve_from_text`].
pub fn solve_from_text_sync(
    question_text: &str,
    config: &GenerationConfig,
) -> Result<GeneratedDocument, DocGenError> {
    runtime()?.block_on(solve_from_text(question_text, config))
}

/// Write `bytes` to `path` through a temp file in the same directory, so
/// readers never observe a half-written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DocGenError> {
    let write_err = |source| DocGenError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn solve_image(
    image: LoadedImage,
    started: Instant,
    config: &GenerationConfig,
) -> Result<GeneratedDocument, DocGenError> {
    let provider = resolve_provider(config)?;

    stage_start(config, Stage::Extract);
    let extraction = extract_text(&provider, image, config).await?;
    stage_complete(config, Stage::Extract, extraction.text.len());

    let questions = extraction.text.clone();
    solve_with(&provider, questions, Some(extraction), started, config).await
}

async fn solve_with(
    provider: &Arc<dyn LLMProvider>,
    questions: String,
    extraction: Option<Completion>,
    started: Instant,
    config: &GenerationConfig,
) -> Result<GeneratedDocument, DocGenError> {
    let completion = generate(provider, &solver_prompt(&questions), config).await?;

    let extracted_chars = extraction
        .as_ref()
        .map(|c| c.text.chars().count())
        .unwrap_or(0);
    let mut calls: Vec<&Completion> = extraction.iter().collect();
    calls.push(&completion);

    finish(
        Mode::Solution,
        questions,
        &completion.text,
        &calls,
        extracted_chars,
        started,
        config,
    )
}

/// Run the generation stage: one text-only LLM call.
async fn generate(
    provider: &Arc<dyn LLMProvider>,
    prompt: &str,
    config: &GenerationConfig,
) -> Result<Completion, DocGenError> {
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let messages = llm::text_messages(system_prompt, prompt);

    stage_start(config, Stage::Generate);
    let completion = llm::complete(
        provider,
        Stage::Generate,
        &messages,
        config.temperature,
        config,
    )
    .await?;
    if completion.text.trim().is_empty() {
        return Err(DocGenError::EmptyResponse {
            stage: Stage::Generate.as_str(),
        });
    }
    stage_complete(config, Stage::Generate, completion.text.len());
    Ok(completion)
}

/// Style and render stages, plus stats.
fn finish(
    mode: Mode,
    source_text: String,
    raw_text: &str,
    calls: &[&Completion],
    extracted_chars: usize,
    started: Instant,
    config: &GenerationConfig,
) -> Result<GeneratedDocument, DocGenError> {
    stage_start(config, Stage::Style);
    let generated_text = clean_generated_text(raw_text);
    let tree = markup::convert(&generated_text, mode);
    stage_complete(config, Stage::Style, tree.len());

    stage_start(config, Stage::Render);
    let render_start = Instant::now();
    let html = render_html(&tree);
    let pdf = PdfRenderer::new(config.layout).render(&tree)?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    stage_complete(config, Stage::Render, pdf.len());

    let stats = GenerationStats {
        llm_calls: calls.len() as u32,
        total_input_tokens: calls.iter().map(|c| c.input_tokens).sum(),
        total_output_tokens: calls.iter().map(|c| c.output_tokens).sum(),
        retries: calls.iter().map(|c| c.retries).sum(),
        extracted_chars,
        node_count: tree.len(),
        pdf_bytes: pdf.len(),
        llm_duration_ms: calls.iter().map(|c| c.duration_ms).sum(),
        render_duration_ms,
        total_duration_ms: started.elapsed().as_millis() as u64,
    };

    info!(
        "{} document ready: {} nodes, {} PDF bytes, {}ms total",
        mode, stats.node_count, stats.pdf_bytes, stats.total_duration_ms
    );

    Ok(GeneratedDocument {
        mode,
        source_text,
        generated_text,
        tree,
        html,
        pdf,
        stats,
    })
}

async fn write_pdf(doc: GeneratedDocument, path: &Path) -> Result<GenerationStats, DocGenError> {
    let path = path.to_path_buf();
    let GeneratedDocument { pdf, stats, .. } = doc;
    tokio::task::spawn_blocking(move || write_atomic(&path, &pdf))
        .await
        .map_err(|e| DocGenError::Internal(format!("write task panicked: {e}")))??;
    Ok(stats)
}

fn runtime() -> Result<tokio::runtime::Runtime, DocGenError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocGenError::Internal(format!("Failed to create tokio runtime: {}", e)))
}

fn stage_start(config: &GenerationConfig, stage: Stage) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}

fn stage_complete(config: &GenerationConfig, stage: Stage, output_len: usize) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage, output_len);
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, DocGenError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        DocGenError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with the configured model
///    or [`DEFAULT_MODEL`]; the factory reads the matching API key
///    (`GEMINI_API_KEY`, `OPENAI_API_KEY`, …) from the environment.
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 4. **Known keys**: `GEMINI_API_KEY`, then `OPENAI_API_KEY`.
/// 5. **Full auto-detection** via [`ProviderFactory::from_env`].
///
/// The crate never holds a credential of its own.
fn resolve_provider(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, DocGenError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_or_default());
    }

    if let (Some(prov), Some(model)) = (
        non_empty_env("EDGEQUAKE_LLM_PROVIDER"),
        non_empty_env("EDGEQUAKE_MODEL"),
    ) {
        return create_provider(&prov, &model);
    }

    if non_empty_env("GEMINI_API_KEY").is_some() {
        return create_provider("gemini", config.model.as_deref().unwrap_or(DEFAULT_MODEL));
    }
    if non_empty_env("OPENAI_API_KEY").is_some() {
        return create_provider("openai", config.model.as_deref().unwrap_or(OPENAI_DEFAULT_MODEL));
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| DocGenError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY or OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_syllabus_is_rejected_before_any_provider_lookup() {
        let err = generate_notes(&NotesRequest::new("  \n "), &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DocGenError::MissingSyllabus));
        assert_eq!(err.to_string(), "Syllabus is required");
    }

    #[tokio::test]
    async fn short_question_text_is_rejected() {
        let err = solve_from_text("Q1", &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DocGenError::NoTextExtracted { chars: 2, min: 10 }));
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let config = GenerationConfig::builder()
            .max_image_bytes(16)
            .build()
            .unwrap();
        let err = solve_from_bytes(vec![0u8; 32], "upload.png", &config)
            .await
            .unwrap_err();
        assert!(matches!(err, DocGenError::ImageTooLarge { size: 32, .. }));
    }

    #[test]
    fn notes_request_builder() {
        let req = NotesRequest::new("Unit 1").with_reference_books("Feynman Lectures");
        assert_eq!(req.reference_books.as_deref(), Some("Feynman Lectures"));
    }

    #[test]
    fn style_text_builds_every_artifact() {
        let doc = style_text(
            "```\n## Vectors\n- magnitude\n- direction\n```",
            Mode::Notes,
            &GenerationConfig::default(),
        )
        .unwrap();
        assert_eq!(doc.generated_text, "**Vectors**\n- magnitude\n- direction");
        assert_eq!(doc.tree.len(), 2);
        assert!(doc.html.contains("<h2>Vectors</h2>"));
        assert!(doc.pdf.starts_with(b"%PDF"));
        assert_eq!(doc.stats.llm_calls, 0);
        assert_eq!(doc.stats.node_count, 2);
        assert_eq!(doc.stats.pdf_bytes, doc.pdf.len());
    }

    #[test]
    fn style_text_reports_stages() {
        use crate::progress::GenerationProgressCallback;
        use std::sync::Mutex;

        #[derive(Default)]
        struct Recorder(Mutex<Vec<Stage>>);
        impl GenerationProgressCallback for Recorder {
            fn on_stage_complete(&self, stage: Stage, _len: usize) {
                self.0.lock().unwrap().push(stage);
            }
        }

        let recorder = Arc::new(Recorder::default());
        let config = GenerationConfig::builder()
            .progress_callback(recorder.clone())
            .build()
            .unwrap();
        style_text("Answer: 4", Mode::Solution, &config).unwrap();
        assert_eq!(*recorder.0.lock().unwrap(), vec![Stage::Style, Stage::Render]);
    }

    #[test]
    fn write_atomic_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/notes.pdf");
        write_atomic(&path, b"%PDF-1.5").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.5");
        // No temp files left next to the output.
        let entries = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        std::fs::write(&path, b"old contents").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }
}
