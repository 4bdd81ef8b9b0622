//! # pdfsum
//!
//! Summarise PDF documents with a chat-completion model, or pull out their
//! plain text.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Select   validate size (≤ 5 MiB) and media type
//!  ├─ 2. Extract  text of every page via pdfium (spawn_blocking)
//!  ├─ 3. Chunk    ≤ 15 000 characters per chunk
//!  ├─ 4. Model    one request per chunk, strictly in order
//!  └─ 5. Output   summaries joined by blank lines, or the raw text
//! ```
//!
//! Everything runs through a [`PipelineController`], which keeps one
//! [`PipelineState`] (loading flag, progress, error, output so far) and
//! publishes every change to observers and a `watch` channel. The output
//! grows chunk by chunk, so a UI can render partial summaries while the
//! rest are in flight.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfsum::{OutputType, PipelineController, SummarizerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key read from OPENROUTER_API_KEY at request time
//!     let controller = PipelineController::new(SummarizerConfig::default())?;
//!     controller.select_input("report.pdf").await?;
//!     let output = controller
//!         .run(OutputType::Summary, "deepseek/deepseek-r1:free")
//!         .await?;
//!     println!("{}", output.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfsum` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdfsum = { version = "0.1", default-features = false }
//! ```
//!
//! ## Choosing a Model
//!
//! [`models::MODEL_CATALOG`] lists the free OpenRouter models offered by
//! default, grouped by vendor. Any `vendor/model[:tag]` id is accepted. With
//! [`SummarizerConfig::provider_name`] set, requests go through
//! `edgequake-llm` instead and the model id is whatever that provider uses.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod export;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod state;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OutputType, SummarizerConfig, SummarizerConfigBuilder};
pub use controller::PipelineController;
pub use document::Document;
pub use error::{ExtractError, FileError, PdfSumError, SummarizeError};
pub use output::{ChunkResult, RunStats, SummaryOutput};
pub use pipeline::extract::{PdfiumExtractor, TextExtractor};
pub use pipeline::summarize::{ChunkSummary, OpenRouterClient, ProviderSummarizer, Summarizer};
pub use state::{Phase, PipelineState, SharedObserver, StateObserver};
pub use stream::StateStream;
