//! Results of a completed run.

use crate::config::OutputType;
use serde::Serialize;

/// What a successful [`crate::controller::PipelineController::run`] returns.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryOutput {
    pub output_type: OutputType,
    pub model: String,
    pub document_name: String,
    /// The final text: extracted text (plain) or joined summaries (summary).
    pub text: String,
    /// One entry per chunk; empty in plain mode.
    pub chunks: Vec<ChunkResult>,
    pub stats: RunStats,
}

/// Accounting for one summarised chunk.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkResult {
    /// 1-indexed.
    pub index: usize,
    pub input_chars: usize,
    pub summary_chars: usize,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub duration_ms: u64,
}

/// Aggregate figures for the whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub page_count: usize,
    pub extracted_chars: usize,
    pub chunk_count: usize,
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub extract_duration_ms: u64,
    pub summarize_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl SummaryOutput {
    pub fn is_plain(&self) -> bool {
        self.output_type == OutputType::Plain
    }
}
