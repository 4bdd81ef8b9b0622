//! The pipeline controller: extraction → chunking → summarisation → output.
//!
//! ## Admission
//!
//! At most one run is in flight. [`PipelineController::run`] records a run
//! id under the state lock; a second call while that id is set fails with
//! [`PdfSumError::AlreadyRunning`] and leaves the state untouched.
//!
//! ## Cancellation
//!
//! Selecting another file, removing the file or clearing drops the active
//! run id. The in-flight run keeps awaiting whatever it was waiting on, but
//! every later state write checks the id first; a stale run writes nothing
//! and returns [`PdfSumError::Cancelled`].
//!
//! ## Sequencing
//!
//! Chunks are summarised one at a time, in document order. This keeps the
//! progress value monotonic, keeps the accumulated output in document order
//! and puts at most one request at a time on a rate-limited API.

use crate::config::{OutputType, SummarizerConfig};
use crate::document::Document;
use crate::error::{PdfSumError, SummarizeError};
use crate::export;
use crate::output::{ChunkResult, RunStats, SummaryOutput};
use crate::pipeline::chunk::split_into_chunks;
use crate::pipeline::extract::{extract_text, PdfiumExtractor, TextExtractor};
use crate::pipeline::input;
use crate::pipeline::summarize::{resolve_summarizer, Summarizer};
use crate::state::{progress_percent, Phase, PipelineState, SharedObserver};
use crate::stream::{state_stream, StateStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, info, warn};

struct Inner {
    document: Option<Document>,
    active_run: Option<u64>,
    next_run_id: u64,
    state: PipelineState,
    observers: Vec<SharedObserver>,
}

/// Owns the current document and [`PipelineState`] and runs the pipeline.
pub struct PipelineController {
    config: SummarizerConfig,
    extractor: Arc<dyn TextExtractor>,
    summarizer: Arc<dyn Summarizer>,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<PipelineState>,
}

impl PipelineController {
    /// Controller with the pdfium extractor and the summariser `config`
    /// asks for (see [`resolve_summarizer`]).
    pub fn new(config: SummarizerConfig) -> Result<Self, PdfSumError> {
        let extractor = Arc::new(PdfiumExtractor::new(
            config.pdfium_lib_path.clone(),
            config.password.clone(),
        ));
        let summarizer = resolve_summarizer(&config)?;
        Ok(Self::with_components(config, extractor, summarizer))
    }

    /// Controller with caller-supplied extraction and summarisation.
    pub fn with_components(
        config: SummarizerConfig,
        extractor: Arc<dyn TextExtractor>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        let state = PipelineState::new(config.model.clone());
        let (state_tx, _) = watch::channel(state.clone());
        Self {
            config,
            extractor,
            summarizer,
            inner: Mutex::new(Inner {
                document: None,
                active_run: None,
                next_run_id: 1,
                state,
                observers: Vec::new(),
            }),
            state_tx,
        }
    }

    pub fn config(&self) -> &SummarizerConfig {
        &self.config
    }

    // ── State access ─────────────────────────────────────────────────────

    /// Snapshot of the current state.
    pub fn state(&self) -> PipelineState {
        self.lock().state.clone()
    }

    /// Receiver that always holds the latest state.
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state_tx.subscribe()
    }

    /// Stream of state snapshots, starting with the current one.
    pub fn state_stream(&self) -> StateStream {
        state_stream(self.subscribe())
    }

    /// Register an observer for every subsequent transition.
    pub fn observe(&self, observer: SharedObserver) {
        self.lock().observers.push(observer);
    }

    // ── Selection commands ───────────────────────────────────────────────

    /// Make `document` the current document.
    ///
    /// A document over the size limit or with a media type other than PDF is
    /// rejected and the state is left as it was. On success any output, error
    /// and in-flight run belonging to the previous document are dropped.
    pub fn select_file(&self, document: Document) -> Result<(), PdfSumError> {
        if let Err(e) = document.validate(self.config.max_file_bytes) {
            warn!("Rejected '{}': {}", document.name(), e);
            return Err(e.into());
        }

        info!(
            "Selected '{}' ({:.2} MB)",
            document.name(),
            document.len() as f64 / 1024.0 / 1024.0
        );
        self.update(|inner| {
            inner.active_run = None;
            inner.state.reset_run();
            inner.state.has_document = true;
            inner.state.document_name = Some(document.name().to_string());
            inner.document = Some(document);
        });
        Ok(())
    }

    /// Resolve a path or URL and select the result.
    pub async fn select_input(&self, input_str: &str) -> Result<(), PdfSumError> {
        let document = input::resolve_input(
            input_str,
            self.config.max_file_bytes,
            self.config.download_timeout_secs,
        )
        .await?;
        self.select_file(document)
    }

    /// Drop the current document together with its output and error.
    pub fn remove_file(&self) {
        self.update(|inner| {
            if inner.active_run.take().is_some() {
                debug!("In-flight run invalidated by remove");
            }
            inner.document = None;
            inner.state.reset_run();
            inner.state.has_document = false;
            inner.state.document_name = None;
        });
    }

    /// Reset to an empty workspace. Selections (output type, model) survive.
    pub fn clear(&self) {
        self.remove_file();
    }

    pub fn set_output_type(&self, output_type: OutputType) {
        self.update(|inner| inner.state.output_type = output_type);
    }

    pub fn set_model(&self, model: impl Into<String>) -> Result<(), PdfSumError> {
        let model = model.into();
        self.check_model(&model)?;
        self.update(|inner| inner.state.model = model);
        Ok(())
    }

    /// Write the current output to `dir` under a timestamped name.
    pub async fn export_output(&self, dir: &Path) -> Result<PathBuf, PdfSumError> {
        let text = self.lock().state.output.clone();
        export::export_to_dir(dir, &text).await
    }

    // ── Running ──────────────────────────────────────────────────────────

    /// [`Self::run`] with the output type and model held in the state.
    pub async fn run_selected(&self) -> Result<SummaryOutput, PdfSumError> {
        let (output_type, model) = {
            let inner = self.lock();
            (inner.state.output_type, inner.state.model.clone())
        };
        self.run(output_type, model).await
    }

    /// Run the pipeline on the current document.
    ///
    /// `model` is only consulted in summary mode; plain runs accept any id.
    ///
    /// Extraction failures leave the output empty. A summarisation failure
    /// stops at the failing chunk; summaries of the chunks before it stay in
    /// the state's output. Either way the state ends with `loading = false`
    /// and the error message set.
    pub async fn run(
        &self,
        output_type: OutputType,
        model: impl Into<String>,
    ) -> Result<SummaryOutput, PdfSumError> {
        let model = model.into();
        if output_type == OutputType::Summary {
            self.check_model(&model)?;
        }
        let (run_id, document) = self.admit(output_type, &model)?;

        match self.execute(run_id, &document, output_type, &model).await {
            Ok(output) => Ok(output),
            Err(PdfSumError::Cancelled) => {
                info!("Run {} cancelled", run_id);
                Err(PdfSumError::Cancelled)
            }
            Err(e) => {
                if self.fail(run_id, &e) {
                    warn!("Run {} failed: {}", run_id, e);
                    Err(e)
                } else {
                    info!("Run {} failed after being cancelled: {}", run_id, e);
                    Err(PdfSumError::Cancelled)
                }
            }
        }
    }

    async fn execute(
        &self,
        run_id: u64,
        document: &Document,
        output_type: OutputType,
        model: &str,
    ) -> Result<SummaryOutput, PdfSumError> {
        let total_start = Instant::now();
        info!(
            "Run {}: {} of '{}' with {}",
            run_id,
            output_type,
            document.name(),
            model
        );

        // ── Step 1: Extract ──────────────────────────────────────────────
        let extract_start = Instant::now();
        let extracted = extract_text(Arc::clone(&self.extractor), document.bytes()).await?;
        let mut stats = RunStats {
            page_count: extracted.page_count,
            extracted_chars: extracted.text.chars().count(),
            extract_duration_ms: extract_start.elapsed().as_millis() as u64,
            ..Default::default()
        };

        // ── Step 2a: Plain text ──────────────────────────────────────────
        if output_type == OutputType::Plain {
            let text = extracted.text;
            self.finish(run_id, |s| s.output = text.clone())?;
            stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
            info!("Run {}: plain text ready, {} chars", run_id, stats.extracted_chars);
            return Ok(SummaryOutput {
                output_type,
                model: model.to_string(),
                document_name: document.name().to_string(),
                text,
                chunks: Vec::new(),
                stats,
            });
        }

        // ── Step 2b: Chunk ───────────────────────────────────────────────
        let chunks = split_into_chunks(&extracted.text, self.config.chunk_size);
        let total = chunks.len();
        stats.chunk_count = total;
        info!("Run {}: {} chunks of ≤{} chars", run_id, total, self.config.chunk_size);
        self.apply(run_id, |s| {
            s.phase = Phase::Summarizing;
            s.chunks_total = total;
        })?;

        // ── Step 3: Summarise, one chunk at a time ───────────────────────
        let summarize_start = Instant::now();
        let mut accumulated = String::new();
        let mut results = Vec::with_capacity(total);

        for (idx, chunk) in chunks.iter().enumerate() {
            let chunk_num = idx + 1;
            let chunk_start = Instant::now();
            debug!("Run {}: chunk {}/{} sent", run_id, chunk_num, total);

            let summary = self
                .summarizer
                .summarize(chunk, model)
                .await
                .and_then(|s| {
                    if s.content.trim().is_empty() {
                        Err(SummarizeError::EmptyContent)
                    } else {
                        Ok(s)
                    }
                })
                .map_err(|source| PdfSumError::Summarization {
                    chunk: chunk_num,
                    total,
                    source,
                })?;

            accumulated.push_str(&summary.content);
            accumulated.push_str("\n\n");
            let visible = accumulated.trim().to_string();
            self.apply(run_id, |s| {
                s.output = visible;
                s.chunks_done = chunk_num;
                s.progress = progress_percent(chunk_num, total);
            })?;

            let duration_ms = chunk_start.elapsed().as_millis() as u64;
            debug!(
                "Run {}: chunk {}/{} done, {} chars in {}ms",
                run_id,
                chunk_num,
                total,
                summary.content.len(),
                duration_ms
            );
            stats.total_prompt_tokens += summary.prompt_tokens as u64;
            stats.total_completion_tokens += summary.completion_tokens as u64;
            results.push(ChunkResult {
                index: chunk_num,
                input_chars: chunk.chars().count(),
                summary_chars: summary.content.chars().count(),
                prompt_tokens: summary.prompt_tokens,
                completion_tokens: summary.completion_tokens,
                duration_ms,
            });
        }

        // ── Step 4: Assemble ─────────────────────────────────────────────
        let text = accumulated.trim().to_string();
        self.finish(run_id, |_| {})?;
        stats.summarize_duration_ms = summarize_start.elapsed().as_millis() as u64;
        stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

        info!(
            "Run {} complete: {} chunks, {} chars, {}ms",
            run_id,
            total,
            text.chars().count(),
            stats.total_duration_ms
        );

        Ok(SummaryOutput {
            output_type,
            model: model.to_string(),
            document_name: document.name().to_string(),
            text,
            chunks: results,
            stats,
        })
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_model(&self, model: &str) -> Result<(), PdfSumError> {
        if self.config.uses_openrouter() && !crate::models::is_valid_model_id(model) {
            return Err(PdfSumError::InvalidConfig(format!(
                "Malformed model identifier '{model}' (expected vendor/model[:tag])"
            )));
        }
        Ok(())
    }

    /// Claim the single run slot.
    fn admit(&self, output_type: OutputType, model: &str) -> Result<(u64, Document), PdfSumError> {
        let mut inner = self.lock();
        if inner.active_run.is_some() {
            warn!("Run rejected: another run is in progress");
            return Err(PdfSumError::AlreadyRunning);
        }
        let document = inner.document.clone().ok_or(PdfSumError::NoDocument)?;

        let run_id = inner.next_run_id;
        inner.next_run_id += 1;
        inner.active_run = Some(run_id);

        let state = &mut inner.state;
        state.reset_run();
        state.loading = true;
        state.phase = Phase::Extracting;
        state.output_type = output_type;
        state.model = model.to_string();
        self.publish(&inner);

        Ok((run_id, document))
    }

    /// Mutate the state if `run_id` is still the active run.
    fn apply(
        &self,
        run_id: u64,
        f: impl FnOnce(&mut PipelineState),
    ) -> Result<(), PdfSumError> {
        let mut inner = self.lock();
        if inner.active_run != Some(run_id) {
            return Err(PdfSumError::Cancelled);
        }
        f(&mut inner.state);
        self.publish(&inner);
        Ok(())
    }

    /// Like [`Self::apply`], then mark the run done and release the slot.
    fn finish(
        &self,
        run_id: u64,
        f: impl FnOnce(&mut PipelineState),
    ) -> Result<(), PdfSumError> {
        let mut inner = self.lock();
        if inner.active_run != Some(run_id) {
            return Err(PdfSumError::Cancelled);
        }
        inner.active_run = None;
        let state = &mut inner.state;
        f(state);
        state.loading = false;
        state.progress = 100;
        state.error = None;
        state.phase = Phase::Done;
        self.publish(&inner);
        Ok(())
    }

    /// Record `error` on the active run. Returns false if the run is stale.
    fn fail(&self, run_id: u64, error: &PdfSumError) -> bool {
        let mut inner = self.lock();
        if inner.active_run != Some(run_id) {
            return false;
        }
        inner.active_run = None;
        inner.state.loading = false;
        inner.state.error = Some(error.to_string());
        inner.state.phase = Phase::Failed;
        self.publish(&inner);
        true
    }

    fn update(&self, f: impl FnOnce(&mut Inner)) {
        let mut inner = self.lock();
        f(&mut inner);
        self.publish(&inner);
    }

    fn publish(&self, inner: &Inner) {
        self.state_tx.send_replace(inner.state.clone());
        for observer in &inner.observers {
            observer.on_state_change(&inner.state);
        }
    }
}
