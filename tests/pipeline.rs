//! Controller behaviour with in-memory extraction and summarisation.
//!
//! No pdfium library and no network are needed: the extractor returns fixed
//! page texts and the summariser echoes or fails on demand.

use futures::future::BoxFuture;
use pdfsum::pipeline::summarize::OpenRouterClient;
use pdfsum::{
    ChunkSummary, Document, ExtractError, FileError, OutputType, PdfSumError, Phase,
    PipelineController, PipelineState, SummarizeError, Summarizer, SummarizerConfig,
    TextExtractor,
};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio_stream::StreamExt;

const MODEL: &str = "deepseek/deepseek-r1:free";

// ── Test doubles ─────────────────────────────────────────────────────────────

struct FixedPages(Result<Vec<String>, ExtractError>);

impl FixedPages {
    fn text(text: &str) -> Arc<Self> {
        Arc::new(Self(Ok(vec![text.to_string()])))
    }

    fn failing(e: ExtractError) -> Arc<Self> {
        Arc::new(Self(Err(e)))
    }
}

impl TextExtractor for FixedPages {
    fn extract_pages(&self, _bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
        self.0.clone()
    }
}

/// Summarises chunk `n` as `S<n>`, records every call, and optionally fails
/// on one chunk or waits on a gate before answering.
#[derive(Default)]
struct ScriptedSummarizer {
    calls: Mutex<Vec<(usize, String)>>,
    fail_on: Option<usize>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedSummarizer {
    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Summarizer for ScriptedSummarizer {
    fn summarize<'a>(
        &'a self,
        chunk: &'a str,
        model: &'a str,
    ) -> BoxFuture<'a, Result<ChunkSummary, SummarizeError>> {
        Box::pin(async move {
            let n = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((chunk.chars().count(), model.to_string()));
                calls.len()
            };
            if let Some(ref gate) = self.gate {
                gate.notified().await;
            }
            if self.fail_on == Some(n) {
                return Err(SummarizeError::Http {
                    status: 500,
                    body: "upstream exploded".into(),
                });
            }
            Ok(ChunkSummary {
                content: format!("S{n}"),
                prompt_tokens: 10,
                completion_tokens: 2,
            })
        })
    }
}

fn config() -> SummarizerConfig {
    SummarizerConfig::builder()
        .api_key_env("PDFSUM_TEST_NO_SUCH_KEY")
        .build()
        .unwrap()
}

fn pdf(name: &str) -> Document {
    Document::new(name, "application/pdf", b"%PDF-1.7 test".to_vec())
}

fn controller(
    extractor: Arc<dyn TextExtractor>,
    summarizer: Arc<dyn Summarizer>,
) -> PipelineController {
    PipelineController::with_components(config(), extractor, summarizer)
}

/// Collect every state transition in order.
fn record(controller: &PipelineController) -> Arc<Mutex<Vec<PipelineState>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    controller.observe(Arc::new(move |s: &PipelineState| {
        sink.lock().unwrap().push(s.clone());
    }));
    seen
}

// ── File constraints ─────────────────────────────────────────────────────────

#[test]
fn oversized_file_is_rejected_and_state_untouched() {
    let c = controller(FixedPages::text("x"), Arc::new(ScriptedSummarizer::default()));
    let big = vec![b'%'; 5 * 1024 * 1024 + 1];
    let err = c
        .select_file(Document::new("big.pdf", "application/pdf", big))
        .unwrap_err();

    assert!(matches!(
        err,
        PdfSumError::File(FileError::TooLarge { max, .. }) if max == 5 * 1024 * 1024
    ));
    let s = c.state();
    assert!(!s.has_document);
    assert!(s.document_name.is_none());
    assert!(s.error.is_none());
}

#[test]
fn file_at_exact_limit_is_accepted() {
    let c = controller(FixedPages::text("x"), Arc::new(ScriptedSummarizer::default()));
    let exact = vec![b'%'; 5 * 1024 * 1024];
    c.select_file(Document::new("exact.pdf", "application/pdf", exact))
        .unwrap();
    assert!(c.state().has_document);
}

#[test]
fn non_pdf_is_rejected_and_previous_selection_kept() {
    let c = controller(FixedPages::text("x"), Arc::new(ScriptedSummarizer::default()));
    c.select_file(pdf("first.pdf")).unwrap();

    let err = c
        .select_file(Document::new("notes.txt", "text/plain", b"hello".to_vec()))
        .unwrap_err();
    assert!(matches!(err, PdfSumError::File(FileError::WrongMediaType { .. })));
    assert_eq!(c.state().document_name.as_deref(), Some("first.pdf"));
}

// ── Summary runs ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn long_document_is_summarised_in_three_ordered_chunks() {
    let text = "a".repeat(32_000);
    let summarizer = Arc::new(ScriptedSummarizer::default());
    let c = controller(FixedPages::text(&text), summarizer.clone());
    c.select_file(pdf("long.pdf")).unwrap();
    let seen = record(&c);

    let out = c.run(OutputType::Summary, MODEL).await.unwrap();

    let calls = summarizer.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![
            (15_000, MODEL.to_string()),
            (15_000, MODEL.to_string()),
            (2_000, MODEL.to_string()),
        ]
    );
    assert_eq!(out.text, "S1\n\nS2\n\nS3");
    assert_eq!(out.stats.chunk_count, 3);
    assert_eq!(out.stats.total_prompt_tokens, 30);
    assert_eq!(out.chunks.iter().map(|c| c.index).collect::<Vec<_>>(), vec![1, 2, 3]);

    let seen = seen.lock().unwrap();
    let progress: Vec<u8> = seen.iter().map(|s| s.progress).collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
    for expected in [33, 67, 100] {
        assert!(progress.contains(&expected), "missing {expected} in {progress:?}");
    }

    let outputs: Vec<&str> = seen
        .iter()
        .filter(|s| s.phase == Phase::Summarizing && s.chunks_done > 0)
        .map(|s| s.output.as_str())
        .collect();
    assert_eq!(outputs, vec!["S1", "S1\n\nS2", "S1\n\nS2\n\nS3"]);

    let last = seen.last().unwrap();
    assert!(!last.loading);
    assert_eq!(last.phase, Phase::Done);
    assert_eq!(last.progress, 100);
    assert!(last.error.is_none());
}

#[tokio::test]
async fn loading_is_set_while_running() {
    let c = controller(FixedPages::text("short"), Arc::new(ScriptedSummarizer::default()));
    c.select_file(pdf("a.pdf")).unwrap();
    let seen = record(&c);

    c.run(OutputType::Summary, MODEL).await.unwrap();

    let seen = seen.lock().unwrap();
    let first = seen.first().unwrap();
    assert!(first.loading);
    assert_eq!(first.progress, 0);
    assert_eq!(first.phase, Phase::Extracting);
    assert!(!seen.last().unwrap().loading);
}

#[tokio::test]
async fn failure_keeps_earlier_chunks_and_stops() {
    let text = "b".repeat(32_000);
    let summarizer = Arc::new(ScriptedSummarizer {
        fail_on: Some(2),
        ..Default::default()
    });
    let c = controller(FixedPages::text(&text), summarizer.clone());
    c.select_file(pdf("long.pdf")).unwrap();

    let err = c.run(OutputType::Summary, MODEL).await.unwrap_err();
    assert!(matches!(
        err,
        PdfSumError::Summarization { chunk: 2, total: 3, .. }
    ));
    assert_eq!(summarizer.call_count(), 2);

    let s = c.state();
    assert_eq!(s.output, "S1");
    assert!(!s.loading);
    assert_eq!(s.phase, Phase::Failed);
    let msg = s.error.unwrap();
    assert!(msg.contains("chunk 2/3"), "got: {msg}");
    assert!(msg.contains("500"), "got: {msg}");
}

#[tokio::test]
async fn blank_summary_counts_as_failure() {
    struct Blank;
    impl Summarizer for Blank {
        fn summarize<'a>(
            &'a self,
            _chunk: &'a str,
            _model: &'a str,
        ) -> BoxFuture<'a, Result<ChunkSummary, SummarizeError>> {
            Box::pin(async { Ok(ChunkSummary::from_text("  \n ")) })
        }
    }

    let c = controller(FixedPages::text("text"), Arc::new(Blank));
    c.select_file(pdf("a.pdf")).unwrap();
    let err = c.run(OutputType::Summary, MODEL).await.unwrap_err();
    assert!(matches!(
        err,
        PdfSumError::Summarization {
            source: SummarizeError::EmptyContent,
            ..
        }
    ));
    assert!(c.state().output.is_empty());
}

#[tokio::test]
async fn missing_credential_fails_first_chunk_with_empty_output() {
    let config = config();
    let client = OpenRouterClient::new(&config).unwrap();
    let c = PipelineController::with_components(
        config,
        FixedPages::text("some document text"),
        Arc::new(client),
    );
    c.select_file(pdf("a.pdf")).unwrap();

    let err = c.run(OutputType::Summary, MODEL).await.unwrap_err();
    assert!(matches!(
        err,
        PdfSumError::Summarization {
            chunk: 1,
            source: SummarizeError::MissingApiKey { .. },
            ..
        }
    ));
    let s = c.state();
    assert!(s.output.is_empty());
    assert!(s.error.unwrap().contains("PDFSUM_TEST_NO_SUCH_KEY"));
}

// ── Plain runs ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn plain_run_returns_text_without_model_calls() {
    let summarizer = Arc::new(ScriptedSummarizer::default());
    let c = PipelineController::with_components(
        config(),
        Arc::new(FixedPages(Ok(vec!["Page one.".into(), "Page two.".into()]))),
        summarizer.clone(),
    );
    c.select_file(pdf("two.pdf")).unwrap();

    let first = c.run(OutputType::Plain, MODEL).await.unwrap();
    let second = c.run(OutputType::Plain, MODEL).await.unwrap();

    assert_eq!(first.text, "Page one.\n\nPage two.");
    assert_eq!(first.text, second.text);
    assert_eq!(first.stats.page_count, 2);
    assert!(first.chunks.is_empty());
    assert_eq!(summarizer.call_count(), 0);

    let s = c.state();
    assert_eq!(s.output, first.text);
    assert_eq!(s.progress, 100);
}

#[tokio::test]
async fn plain_run_ignores_model_format() {
    let summarizer = Arc::new(ScriptedSummarizer::default());
    let c = controller(FixedPages::text("hello"), summarizer.clone());
    c.select_file(pdf("a.pdf")).unwrap();

    let out = c.run(OutputType::Plain, "gpt-4o").await.unwrap();
    assert_eq!(out.text, "hello");
    assert_eq!(c.state().output, "hello");
    assert_eq!(summarizer.call_count(), 0);

    let err = c.run(OutputType::Summary, "gpt-4o").await.unwrap_err();
    assert!(matches!(err, PdfSumError::InvalidConfig(_)));
}

#[tokio::test]
async fn extraction_failure_sets_error_and_empty_output() {
    let c = controller(
        FixedPages::failing(ExtractError::PasswordRequired),
        Arc::new(ScriptedSummarizer::default()),
    );
    c.select_file(pdf("locked.pdf")).unwrap();

    let err = c.run(OutputType::Summary, MODEL).await.unwrap_err();
    assert!(matches!(
        err,
        PdfSumError::Extraction(ExtractError::PasswordRequired)
    ));
    let s = c.state();
    assert!(s.output.is_empty());
    assert!(!s.loading);
    assert!(s.error.unwrap().contains("password"));
}

#[tokio::test]
async fn blank_pdf_reports_no_text() {
    let c = controller(
        Arc::new(FixedPages(Ok(vec!["  ".into(), "\n".into()]))),
        Arc::new(ScriptedSummarizer::default()),
    );
    c.select_file(pdf("blank.pdf")).unwrap();
    for mode in [OutputType::Plain, OutputType::Summary] {
        let err = c.run(mode, MODEL).await.unwrap_err();
        assert!(matches!(err, PdfSumError::Extraction(ExtractError::EmptyText)));
        assert!(c.state().output.is_empty());
    }
}

// ── Admission and cancellation ───────────────────────────────────────────────

fn gated() -> (Arc<ScriptedSummarizer>, Arc<Notify>) {
    let gate = Arc::new(Notify::new());
    let summarizer = Arc::new(ScriptedSummarizer {
        gate: Some(Arc::clone(&gate)),
        ..Default::default()
    });
    (summarizer, gate)
}

async fn until_summarizing(c: &PipelineController) {
    let mut rx = c.subscribe();
    pdfsum::stream::wait_for(&mut rx, |s| s.phase == Phase::Summarizing)
        .await
        .unwrap();
}

#[tokio::test]
async fn second_run_while_busy_is_rejected() {
    let (summarizer, gate) = gated();
    let c = Arc::new(controller(FixedPages::text("text"), summarizer.clone()));
    c.select_file(pdf("a.pdf")).unwrap();

    let runner = Arc::clone(&c);
    let first = tokio::spawn(async move { runner.run(OutputType::Summary, MODEL).await });
    until_summarizing(&c).await;

    let before = c.state();
    let err = c.run(OutputType::Summary, MODEL).await.unwrap_err();
    assert!(matches!(err, PdfSumError::AlreadyRunning));
    assert_eq!(c.state(), before);

    gate.notify_one();
    let out = first.await.unwrap().unwrap();
    assert_eq!(out.text, "S1");
    assert_eq!(summarizer.call_count(), 1);
}

#[tokio::test]
async fn removing_the_file_cancels_the_run() {
    let (summarizer, gate) = gated();
    let c = Arc::new(controller(FixedPages::text("text"), summarizer));
    c.select_file(pdf("a.pdf")).unwrap();

    let runner = Arc::clone(&c);
    let run = tokio::spawn(async move { runner.run(OutputType::Summary, MODEL).await });
    until_summarizing(&c).await;

    c.remove_file();
    gate.notify_one();

    let err = run.await.unwrap().unwrap_err();
    assert!(matches!(err, PdfSumError::Cancelled));
    let s = c.state();
    assert!(!s.has_document);
    assert!(s.output.is_empty());
    assert!(s.error.is_none());
    assert!(!s.loading);
}

#[tokio::test]
async fn selecting_another_file_cancels_and_allows_a_new_run() {
    let (summarizer, gate) = gated();
    let c = Arc::new(controller(FixedPages::text("text"), summarizer));
    c.select_file(pdf("old.pdf")).unwrap();

    let runner = Arc::clone(&c);
    let run = tokio::spawn(async move { runner.run(OutputType::Summary, MODEL).await });
    until_summarizing(&c).await;

    c.select_file(pdf("new.pdf")).unwrap();
    gate.notify_one();
    assert!(matches!(run.await.unwrap(), Err(PdfSumError::Cancelled)));

    let s = c.state();
    assert_eq!(s.document_name.as_deref(), Some("new.pdf"));
    assert!(s.output.is_empty());

    gate.notify_one();
    let out = c.run(OutputType::Summary, MODEL).await.unwrap();
    assert_eq!(out.document_name, "new.pdf");
}

#[tokio::test]
async fn clear_resets_everything_but_selections() {
    let c = controller(FixedPages::text("text"), Arc::new(ScriptedSummarizer::default()));
    c.set_output_type(OutputType::Plain);
    c.select_file(pdf("a.pdf")).unwrap();
    c.run_selected().await.unwrap();

    c.clear();
    let s = c.state();
    assert!(!s.has_document);
    assert!(s.output.is_empty());
    assert_eq!(s.progress, 0);
    assert_eq!(s.output_type, OutputType::Plain);
    assert!(matches!(
        c.run_selected().await.unwrap_err(),
        PdfSumError::NoDocument
    ));
}

// ── Output surfaces ──────────────────────────────────────────────────────────

#[tokio::test]
async fn export_writes_current_output() {
    let c = controller(FixedPages::text("text"), Arc::new(ScriptedSummarizer::default()));
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        c.export_output(dir.path()).await.unwrap_err(),
        PdfSumError::NoOutput
    ));

    c.select_file(pdf("a.pdf")).unwrap();
    c.run(OutputType::Summary, MODEL).await.unwrap();
    let path = c.export_output(dir.path()).await.unwrap();

    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("summary-") && name.ends_with(".txt"), "{name}");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "S1");
}

#[tokio::test]
async fn state_stream_ends_on_final_state() {
    let c = controller(FixedPages::text("text"), Arc::new(ScriptedSummarizer::default()));
    c.select_file(pdf("a.pdf")).unwrap();
    let mut stream = c.state_stream();

    let initial = stream.next().await.unwrap();
    assert!(initial.has_document);

    c.run(OutputType::Summary, MODEL).await.unwrap();
    let latest = stream.next().await.unwrap();
    assert_eq!(latest.phase, Phase::Done);
    assert_eq!(latest.output, "S1");
}
