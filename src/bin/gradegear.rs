//! CLI binary for gradegear-docgen.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GenerationConfig`, runs one of the generation entry points and writes
//! the chosen artifact.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gradegear_docgen::{
    generate_notes, solve_from_text, solve_question_paper, style_text, write_atomic,
    GeneratedDocument, GenerationConfig, GenerationProgressCallback, Mode, NotesRequest,
    PageLayout, PageSize, ProgressCallback, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner plus one log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Mutex<HashMap<Stage, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Starting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            started: Mutex::new(HashMap::new()),
        })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

fn stage_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Input => "Loading question paper…",
        Stage::Extract => "Reading the question paper…",
        Stage::Generate => "Waiting for the model…",
        Stage::Style => "Formatting…",
        Stage::Render => "Rendering PDF…",
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        if let Ok(mut started) = self.started.lock() {
            started.insert(stage, Instant::now());
        }
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message(stage_message(stage));
    }

    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        let elapsed_ms = self
            .started
            .lock()
            .ok()
            .and_then(|mut started| started.remove(&stage))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);
        let unit = if stage == Stage::Style { "nodes" } else { "bytes" };
        self.bar.println(format!(
            "  {} {:<9} {:<14}  {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{output_len:>7} {unit}")),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_retry(&self, stage: Stage, attempt: u32, error: &str) {
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:<9} retry {}  {}",
            cyan("↻"),
            stage.to_string(),
            attempt,
            red(&msg)
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Study notes from a syllabus file
  gradegear notes syllabus.txt -o notes.pdf

  # Notes from inline text, with reference books
  gradegear notes "Unit 1: Thermodynamics" --books "Cengel & Boles" -o notes.pdf

  # Solve a photographed question paper
  gradegear solve paper.jpg -o solutions.pdf

  # Solve questions you already have as text
  gradegear solve --text questions.txt -o solutions.pdf

  # Re-render saved model output without calling a model
  gradegear style answer.txt --mode solution -o solutions.html

  # Full result as JSON (PDF base64-encoded)
  gradegear notes syllabus.txt --json > notes.json

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
"#;

/// Generate study notes and question-paper solutions as PDF.
#[derive(Parser, Debug)]
#[command(
    name = "gradegear",
    version,
    about = "Generate study notes and question-paper solutions as styled PDFs",
    long_about = "Generate detailed study notes from a syllabus, or worked solutions from a \
photographed question paper, using an LLM. Output is a styled PDF, HTML page or JSON document.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Write output to this file instead of stdout.
    #[arg(short, long, global = true, env = "GRADEGEAR_OUTPUT")]
    output: Option<PathBuf>,

    /// Output format. Inferred from the --output extension when omitted.
    #[arg(long, global = true, value_enum, env = "GRADEGEAR_FORMAT")]
    format: Option<FormatArg>,

    /// Shorthand for --format json.
    #[arg(long, global = true, env = "GRADEGEAR_JSON")]
    json: bool,

    /// LLM model ID (e.g. gemini-2.0-flash, gpt-4.1-mini).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Max LLM output tokens per call.
    #[arg(long, global = true, env = "GRADEGEAR_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// LLM temperature for notes and solutions (0.0–2.0).
    #[arg(long, global = true, env = "GRADEGEAR_TEMPERATURE", default_value_t = 0.4)]
    temperature: f32,

    /// Retries per LLM call.
    #[arg(long, global = true, env = "GRADEGEAR_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-call LLM timeout in seconds.
    #[arg(long, global = true, env = "GRADEGEAR_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds for image URLs.
    #[arg(long, global = true, env = "GRADEGEAR_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, global = true, env = "GRADEGEAR_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// PDF paper size.
    #[arg(long, global = true, value_enum, env = "GRADEGEAR_PAGE_SIZE", default_value = "a4")]
    page_size: PageSizeArg,

    /// PDF body font size in points (6–24).
    #[arg(long, global = true, env = "GRADEGEAR_FONT_SIZE", default_value_t = 11.0)]
    font_size: f32,

    /// Disable the progress spinner.
    #[arg(long, global = true, env = "GRADEGEAR_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "GRADEGEAR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "GRADEGEAR_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate study notes from a syllabus.
    Notes {
        /// Syllabus text, or a path to a file containing it ("-" for stdin).
        syllabus: String,

        /// Reference books the notes should draw on.
        #[arg(long, env = "GRADEGEAR_BOOKS")]
        books: Option<String>,
    },

    /// Solve a question paper from a photo (path or URL) or from text.
    Solve {
        /// JPEG or PNG photo of the question paper: local path or HTTP/HTTPS URL.
        #[arg(required_unless_present = "text", conflicts_with = "text")]
        image: Option<String>,

        /// Question text, or a path to a file containing it ("-" for stdin).
        #[arg(long)]
        text: Option<String>,

        /// Largest accepted image in MiB.
        #[arg(long, env = "GRADEGEAR_MAX_IMAGE_MB", default_value_t = 10)]
        max_image_mb: u64,
    },

    /// Format existing text without calling a model.
    Style {
        /// Text file to format ("-" for stdin).
        input: String,

        /// Formatting rules to apply.
        #[arg(long, value_enum, default_value = "notes")]
        mode: ModeArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    Pdf,
    Html,
    Json,
    /// The cleaned model text.
    Text,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Notes,
    Solution,
}

impl From<ModeArg> for Mode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Notes => Mode::Notes,
            ModeArg::Solution => Mode::Solution,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    A4,
    Letter,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Letter => PageSize::Letter,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active; the
    // per-stage lines carry the same information.
    let format = resolve_format(&cli);
    let show_progress = !cli.quiet && !cli.no_progress && io::stderr().is_terminal();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    if format == FormatArg::Pdf && cli.output.is_none() && io::stdout().is_terminal() {
        bail!("Refusing to write a PDF to the terminal; pass -o FILE or choose --format html|json|text");
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        &cli,
        progress.clone().map(|cb| cb as ProgressCallback),
    )
    .await?;

    // ── Run ──────────────────────────────────────────────────────────────
    let result = run(&cli.command, &config).await;
    if let Some(ref cb) = progress {
        cb.finish();
    }
    let doc = result?;

    let bytes = render_output(&doc, format)?;
    match cli.output {
        Some(ref path) => {
            write_atomic(path, &bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(&bytes)
                .context("Failed to write to stdout")?;
            if format != FormatArg::Pdf && !bytes.ends_with(b"\n") {
                handle.write_all(b"\n").ok();
            }
        }
    }

    if !cli.quiet {
        let target = cli
            .output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".to_string());
        eprintln!(
            "{}  {} document, {} nodes, {} PDF bytes  {}ms  →  {}",
            green("✔"),
            doc.mode,
            doc.stats.node_count,
            doc.stats.pdf_bytes,
            doc.stats.total_duration_ms,
            bold(&target),
        );
        if doc.stats.llm_calls > 0 {
            eprintln!(
                "   {} tokens in  /  {} tokens out  ({} LLM calls, {} retries)",
                dim(&doc.stats.total_input_tokens.to_string()),
                dim(&doc.stats.total_output_tokens.to_string()),
                doc.stats.llm_calls,
                doc.stats.retries,
            );
        }
    }

    Ok(())
}

async fn run(command: &Command, config: &GenerationConfig) -> Result<GeneratedDocument> {
    match command {
        Command::Notes { syllabus, books } => {
            let syllabus = read_text_arg(syllabus).await?;
            let mut request = NotesRequest::new(syllabus);
            request.reference_books = books.clone();
            generate_notes(&request, config)
                .await
                .context("Notes generation failed")
        }
        Command::Solve {
            text: Some(text), ..
        } => {
            let questions = read_text_arg(text).await?;
            solve_from_text(&questions, config)
                .await
                .context("Solving failed")
        }
        Command::Solve {
            image: Some(image), ..
        } => solve_question_paper(image, config)
            .await
            .context("Solving failed"),
        Command::Solve { .. } => bail!("Provide a question-paper image or --text"),
        Command::Style { input, mode } => {
            let text = read_text_arg(input).await?;
            style_text(&text, (*mode).into(), config).context("Formatting failed")
        }
    }
}

/// Map CLI args to `GenerationConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .layout(PageLayout {
            size: cli.page_size.into(),
            font_size: cli.font_size,
            ..PageLayout::default()
        });

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Command::Solve { max_image_mb, .. } = cli.command {
        builder = builder.max_image_bytes(max_image_mb.saturating_mul(1024 * 1024));
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// An argument that is either inline text, a file path, or "-" for stdin.
async fn read_text_arg(arg: &str) -> Result<String> {
    if arg == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    let path = Path::new(arg);
    if path.is_file() {
        return tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()));
    }
    Ok(arg.to_string())
}

fn resolve_format(cli: &Cli) -> FormatArg {
    if let Some(format) = cli.format {
        return format;
    }
    if cli.json {
        return FormatArg::Json;
    }
    let extension = cli
        .output
        .as_ref()
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("html") | Some("htm") => FormatArg::Html,
        Some("json") => FormatArg::Json,
        Some("txt") | Some("md") => FormatArg::Text,
        _ => FormatArg::Pdf,
    }
}

fn render_output(doc: &GeneratedDocument, format: FormatArg) -> Result<Vec<u8>> {
    Ok(match format {
        FormatArg::Pdf => doc.pdf.clone(),
        FormatArg::Html => doc.html.clone().into_bytes(),
        FormatArg::Json => serde_json::to_vec_pretty(doc).context("Failed to serialise output")?,
        FormatArg::Text => doc.generated_text.clone().into_bytes(),
    })
}
