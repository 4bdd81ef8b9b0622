//! CLI binary for pdfsum.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `SummarizerConfig`, drives a `PipelineController` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdfsum::export::write_atomic;
use pdfsum::models::{DEFAULT_MODEL, MODEL_CATALOG};
use pdfsum::pipeline::chunk::chunk_count;
use pdfsum::{
    OutputType, PdfSumError, Phase, PipelineController, PipelineState, StateObserver,
    SummarizerConfig, SummaryOutput,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress observer using indicatif ────────────────────────────────────

/// Renders the controller's state as a spinner while extracting and a chunk
/// bar while summarising.
struct CliProgress {
    bar: ProgressBar,
    /// Chunks already logged, so each completion prints once.
    logged_chunks: AtomicUsize,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            logged_chunks: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} chunks  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Summarizing");
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Summarizing {total} chunks…"))
        ));
    }
}

impl StateObserver for CliProgress {
    fn on_state_change(&self, state: &PipelineState) {
        match state.phase {
            Phase::Extracting => {
                self.bar.set_prefix("Extracting");
                self.bar.set_message("reading pages…");
            }
            Phase::Summarizing => {
                if self.bar.length() != Some(state.chunks_total as u64) {
                    self.activate_bar(state.chunks_total);
                }
                let logged = self.logged_chunks.load(Ordering::SeqCst);
                if state.chunks_done > logged {
                    self.logged_chunks.store(state.chunks_done, Ordering::SeqCst);
                    self.bar.println(format!(
                        "  {} Chunk {:>3}/{:<3}  {}",
                        green("✓"),
                        state.chunks_done,
                        state.chunks_total,
                        dim(&format!("{:>3}%", state.progress)),
                    ));
                    self.bar.set_position(state.chunks_done as u64);
                }
            }
            // The error itself is reported once, by `main`.
            Phase::Done | Phase::Failed => self.bar.finish_and_clear(),
            Phase::Idle => {}
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarise to stdout
  pdfsum report.pdf

  # Summarise to a file
  pdfsum report.pdf -o report-summary.md

  # Export under a timestamped name (summary-<UTC time>.txt)
  pdfsum report.pdf --output-dir ./summaries

  # Plain extracted text, no API key needed
  pdfsum --mode plain report.pdf

  # Pick another free model
  pdfsum --model mistralai/mistral-7b-instruct:free report.pdf

  # Summarise from URL
  pdfsum https://arxiv.org/pdf/1706.03762 -o attention.md

  # Route through an edgequake-llm provider instead of OpenRouter
  pdfsum --provider openai --model gpt-4.1-nano report.pdf

  # JSON output with per-chunk stats
  pdfsum --json report.pdf > summary.json

ENVIRONMENT VARIABLES:
  OPENROUTER_API_KEY   OpenRouter API key (required for summaries)
  PDFSUM_MODEL         Default model ID
  PDFIUM_LIB_PATH      Path to libpdfium (file or directory)
  RUST_LOG             Override the log filter

LIMITS:
  Files up to 5 MiB, media type application/pdf. Text is split into chunks
  of 15 000 characters; each chunk is one request.
"#;

/// Summarise PDF files and URLs with a chat-completion model.
#[derive(Parser, Debug)]
#[command(
    name = "pdfsum",
    version,
    about = "Summarise PDF files and URLs with an LLM",
    long_about = "Extract the text of a PDF (local file or URL), split it into chunks and \
summarise each chunk with a model on OpenRouter, or any provider edgequake-llm supports. \
Plain mode prints the extracted text instead.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    #[arg(required_unless_present = "list_models")]
    input: Option<String>,

    /// Write the result to this file instead of stdout.
    #[arg(short, long, env = "PDFSUM_OUTPUT", conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Write the result into this directory as summary-<timestamp>.txt.
    #[arg(long, env = "PDFSUM_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// summary: one model summary per chunk. plain: extracted text only.
    #[arg(long, env = "PDFSUM_MODE", value_enum, default_value = "summary")]
    mode: ModeArg,

    /// Model ID, e.g. deepseek/deepseek-r1:free.
    #[arg(long, env = "PDFSUM_MODEL")]
    model: Option<String>,

    /// Print the built-in model catalog and exit.
    #[arg(long)]
    list_models: bool,

    /// edgequake-llm provider (openai, anthropic, gemini, ollama) instead of OpenRouter.
    /// Needs --model, since the default model id is an OpenRouter one.
    #[arg(long, env = "PDFSUM_PROVIDER", requires = "model")]
    provider: Option<String>,

    /// OpenRouter API key.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Chat-completion endpoint.
    #[arg(long, env = "PDFSUM_API_URL")]
    api_url: Option<String>,

    /// Maximum chunk length in characters.
    #[arg(long, env = "PDFSUM_CHUNK_SIZE", default_value_t = pdfsum::config::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Max LLM output tokens per chunk.
    #[arg(long, env = "PDFSUM_MAX_TOKENS", default_value_t = 2000)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDFSUM_TEMPERATURE", default_value_t = 0.5)]
    temperature: f32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFSUM_PASSWORD")]
    password: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PDFSUM_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Output structured JSON (SummaryOutput) instead of text.
    #[arg(long, env = "PDFSUM_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFSUM_NO_PROGRESS")]
    no_progress: bool,

    /// Extract only and print page and chunk counts; no API calls.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFSUM_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFSUM_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFSUM_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-chunk LLM call timeout in seconds.
    #[arg(long, env = "PDFSUM_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Summary,
    Plain,
}

impl From<ModeArg> for OutputType {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Summary => OutputType::Summary,
            ModeArg::Plain => OutputType::Plain,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_models {
        print_models();
        return Ok(());
    }

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
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

    let input = cli
        .input
        .clone()
        .context("An input path or URL is required")?;
    let config = build_config(&cli).await?;
    let model = config.model.clone();
    let controller =
        PipelineController::new(config).context("Failed to set up the summarizer")?;

    controller
        .select_input(&input)
        .await
        .with_context(|| format!("Failed to load {input}"))?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let output = controller
            .run(OutputType::Plain, model)
            .await
            .context("Failed to extract text")?;
        let chunk_size = controller.config().chunk_size;
        let chunks = chunk_count(output.stats.extracted_chars, chunk_size);

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&output.stats).context("Failed to serialise stats")?
            );
        } else {
            println!("File:         {}", input);
            println!("Pages:        {}", output.stats.page_count);
            println!("Characters:   {}", output.stats.extracted_chars);
            println!("Chunks:       {} (≤{} chars each)", chunks, chunk_size);
            println!("Extraction:   {}ms", output.stats.extract_duration_ms);
        }
        return Ok(());
    }

    // ── Run ──────────────────────────────────────────────────────────────
    if show_progress {
        controller.observe(CliProgress::new());
    }

    let output_type = OutputType::from(cli.mode);
    let output = match controller.run(output_type, model).await {
        Ok(output) => output,
        Err(e) => {
            // A failed summary keeps the chunks that succeeded.
            let partial = controller.state().output;
            if matches!(e, PdfSumError::Summarization { .. }) && !partial.is_empty() {
                emit_text(&cli, &partial).await?;
                if !cli.quiet {
                    eprintln!(
                        "{} partial summary written ({} chars)",
                        cyan("⚠"),
                        partial.chars().count()
                    );
                }
            }
            return Err(e).context("Summarization failed");
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        emit_text(&cli, &json).await?;
    } else {
        emit_text(&cli, &output.text).await?;
    }

    if !cli.quiet {
        print_summary(&output);
    }

    Ok(())
}

/// Write `text` to `--output`, `--output-dir` or stdout.
async fn emit_text(cli: &Cli, text: &str) -> Result<()> {
    if let Some(ref path) = cli.output {
        write_atomic(path, text)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
        }
    } else if let Some(ref dir) = cli.output_dir {
        let path = pdfsum::export::export_to_dir(dir, text)
            .await
            .context("Export failed")?;
        if !cli.quiet {
            eprintln!("{}  →  {}", green("✔"), bold(&path.display().to_string()));
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        if !text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }
    Ok(())
}

fn print_summary(output: &SummaryOutput) {
    let stats = &output.stats;
    if output.is_plain() {
        eprintln!(
            "{}  {} pages  {} chars  {}ms",
            green("✔"),
            stats.page_count,
            stats.extracted_chars,
            stats.total_duration_ms
        );
    } else {
        eprintln!(
            "{}  {} pages  {} chunks  {}ms  {}",
            green("✔"),
            stats.page_count,
            stats.chunk_count,
            stats.total_duration_ms,
            dim(&output.model),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&stats.total_prompt_tokens.to_string()),
            dim(&stats.total_completion_tokens.to_string()),
        );
    }
}

fn print_models() {
    for category in MODEL_CATALOG {
        println!("{}", bold(category.vendor));
        for m in category.models {
            let marker = if m.id == DEFAULT_MODEL { green("*") } else { " ".into() };
            println!("  {} {:<48} {}", marker, m.id, dim(m.description));
        }
    }
}

/// Map CLI args to `SummarizerConfig`.
async fn build_config(cli: &Cli) -> Result<SummarizerConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = SummarizerConfig::builder()
        .chunk_size(cli.chunk_size)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref url) = cli.api_url {
        builder = builder.api_url(url);
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}
