//! Text extraction: PDF bytes → ordered page texts → one document string.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is CPU-bound and not
//! safe to drive from async contexts. [`extract_text`] moves the work onto
//! Tokio's blocking pool so worker threads never stall on a large document.
//!
//! The [`TextExtractor`] trait is the seam: the pipeline only needs
//! "bytes → page strings", so tests and alternative backends plug in
//! without pdfium being present.

use crate::error::ExtractError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Separator placed between page texts.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Turns raw PDF bytes into one string per page, in page order.
///
/// Implementations are called from a blocking thread and must not drop
/// pages: a page that cannot be read is an error carrying its 1-based index.
pub trait TextExtractor: Send + Sync {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError>;
}

/// The document's text after extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// Page texts joined with [`PAGE_SEPARATOR`].
    pub text: String,
    /// Number of pages read.
    pub page_count: usize,
}

/// Run `extractor` on the blocking pool and assemble the document text.
pub async fn extract_text(
    extractor: Arc<dyn TextExtractor>,
    bytes: Arc<[u8]>,
) -> Result<ExtractedText, ExtractError> {
    let pages = tokio::task::spawn_blocking(move || extractor.extract_pages(&bytes))
        .await
        .map_err(|e| ExtractError::Internal(format!("Extraction task panicked: {e}")))??;

    assemble_pages(pages)
}

/// Join page texts; zero pages or an all-blank result is an error.
pub fn assemble_pages(pages: Vec<String>) -> Result<ExtractedText, ExtractError> {
    if pages.is_empty() {
        return Err(ExtractError::NoPages);
    }

    let page_count = pages.len();
    let text = pages.join(PAGE_SEPARATOR);
    if text.trim().is_empty() {
        return Err(ExtractError::EmptyText);
    }

    info!(
        "Text extraction complete: {} pages, {} chars",
        page_count,
        text.chars().count()
    );
    Ok(ExtractedText { text, page_count })
}

// ── pdfium backend ───────────────────────────────────────────────────────

/// [`TextExtractor`] backed by pdfium.
///
/// The library is located, in order, at `lib_path`, at `PDFIUM_LIB_PATH`,
/// or wherever the platform loader finds a system copy. Either path may
/// name the library file itself or the directory containing it.
#[derive(Debug, Clone, Default)]
pub struct PdfiumExtractor {
    lib_path: Option<PathBuf>,
    password: Option<String>,
}

impl PdfiumExtractor {
    pub fn new(lib_path: Option<PathBuf>, password: Option<String>) -> Self {
        Self { lib_path, password }
    }

    fn bind(&self) -> Result<Pdfium, ExtractError> {
        let configured = self
            .lib_path
            .clone()
            .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

        let bindings = match configured {
            Some(path) => Pdfium::bind_to_library(library_file(&path)),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ExtractError::BindingFailed(format!("{e:?}")))?;

        Ok(Pdfium::new(bindings))
    }
}

/// Resolve a directory to the platform library name inside it.
fn library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}

impl TextExtractor for PdfiumExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
        let pdfium = self.bind()?;
        let password = self.password.as_deref();

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| {
                let err_str = format!("{e:?}");
                if err_str.contains("Password") || err_str.contains("password") {
                    if password.is_some() {
                        ExtractError::WrongPassword
                    } else {
                        ExtractError::PasswordRequired
                    }
                } else {
                    ExtractError::Unreadable { detail: err_str }
                }
            })?;

        let pages = document.pages();
        let total = pages.len() as usize;
        info!("PDF loaded: {} pages", total);

        let mut texts = Vec::with_capacity(total);
        for (idx, page) in pages.iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| ExtractError::PageFailed {
                    page: idx + 1,
                    detail: format!("{e:?}"),
                })?
                .all();
            debug!("Page {} extracted, {} chars", idx + 1, text.chars().count());
            texts.push(text);
        }

        Ok(texts)
    }
}
