//! Error types for the pdfsum library.
//!
//! Errors are split by the stage that produces them:
//!
//! * [`FileError`]: the selected file violates a constraint (size, media
//!   type) or could not be read at all. Detected before any processing.
//!
//! * [`ExtractError`]: pdfium could not turn the bytes into text, or the
//!   text it produced is blank.
//!
//! * [`SummarizeError`]: the summarisation endpoint refused the request or
//!   answered with something unusable.
//!
//! * [`PdfSumError`]: the top-level error returned by
//!   [`crate::controller::PipelineController`]. It wraps the stage errors with
//!   the phase they happened in and adds the controller's own outcomes
//!   (rejected admission, cancelled run).
//!
//! Every variant renders a single human-readable message, which is what ends
//! up in [`crate::state::PipelineState::error`].

use std::path::PathBuf;
use thiserror::Error;

/// The selected file cannot become the current document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FileError {
    /// File is larger than the configured maximum.
    #[error("File is too large: {size} bytes (maximum is {max} bytes)")]
    TooLarge { size: usize, max: usize },

    /// File is not a PDF.
    #[error("Invalid file format '{media_type}': please select a PDF file")]
    WrongMediaType { media_type: String },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    NotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },
}

/// Text extraction failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    BindingFailed(String),

    /// pdfium could not parse the document.
    #[error("PDF could not be read: {detail}")]
    Unreadable { detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF is encrypted and requires a password")]
    PasswordRequired,

    /// A password was provided but it is wrong.
    #[error("Wrong password for encrypted PDF")]
    WrongPassword,

    /// The document parsed but has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// A single page could not be read.
    #[error("Failed to extract text from page {page}: {detail}")]
    PageFailed { page: usize, detail: String },

    /// Every page was read, but together they hold no text.
    #[error("No text could be extracted from the PDF")]
    EmptyText,

    /// The blocking extraction task died.
    #[error("Extraction task failed: {0}")]
    Internal(String),
}

/// A summarisation request failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SummarizeError {
    /// No credential configured for the endpoint.
    #[error("API key is not configured\nSet {env_var} or pass --api-key.")]
    MissingApiKey { env_var: String },

    /// The endpoint answered with a non-success status.
    #[error("API request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never got an answer (DNS, TLS, timeout, …).
    #[error("API request could not be sent: {0}")]
    Transport(String),

    /// The response body was not the expected JSON shape.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// The response carried no choices.
    #[error("No summary generated in API response")]
    NoChoices,

    /// The first choice's content was empty.
    #[error("Empty summary in API response")]
    EmptyContent,

    /// An `edgequake-llm` provider failed or could not be created.
    #[error("LLM provider '{provider}' failed: {detail}")]
    Provider { provider: String, detail: String },
}

/// All errors returned by the pdfsum library.
#[derive(Debug, Error)]
pub enum PdfSumError {
    // ── Stage errors ──────────────────────────────────────────────────────
    #[error(transparent)]
    File(#[from] FileError),

    #[error("Failed to extract text from PDF: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Summarization failed on chunk {chunk}/{total}: {source}")]
    Summarization {
        chunk: usize,
        total: usize,
        #[source]
        source: SummarizeError,
    },

    // ── Controller outcomes ───────────────────────────────────────────────
    /// `run` was called with no document selected.
    #[error("No document selected")]
    NoDocument,

    /// `run` was called while another run is still in flight.
    #[error("A run is already in progress")]
    AlreadyRunning,

    /// The document was removed or replaced while the run was in flight.
    #[error("Run cancelled: the document was removed or replaced")]
    Cancelled,

    /// Export was requested but there is nothing to export.
    #[error("There is no output to export")]
    NoOutput,

    // ── Config / I/O ──────────────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}
