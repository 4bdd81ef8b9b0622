//! Pipeline stages for PDF summarisation.
//!
//! Each submodule implements one transformation step and is tested on its
//! own; [`crate::controller`] sequences them and owns the state.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ chunk ──▶ summarize
//! (path/URL) (pdfium)   (chars)   (chat API, one chunk at a time)
//! ```
//!
//! 1. [`input`]     turns the user-supplied path or URL into a
//!    [`crate::document::Document`]
//! 2. [`extract`]   pulls the text out of every page; runs in
//!    `spawn_blocking` because pdfium is synchronous
//! 3. [`chunk`]     cuts the text into pieces of at most `chunk_size`
//!    characters
//! 4. [`summarize`] sends one chunk to the model; the only stage with
//!    network I/O apart from URL downloads

pub mod chunk;
pub mod extract;
pub mod input;
pub mod summarize;
