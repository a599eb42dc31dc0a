//! PDF parsing layer for the outline extractor.
//!
//! Loads a document with `lopdf`, walks every page's content stream and hands
//! back the text as pages of [`TextSpan`]s in drawing order.

use thiserror::Error;

use parser::backend::LopdfBackend;

pub mod parser;
pub mod types;

pub use outline_core::TextSpan;
pub use types::*;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse PDF bytes into pages of spans.
///
/// The outer `Vec` is in page-tree order and each span's `page_index` equals
/// its page's position in it.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<Vec<TextSpan>>, PdfError> {
    let backend = LopdfBackend::load_bytes(bytes)?;
    parser::layout::extract_all_pages(&backend)
}

/// Document metadata without walking any content streams.
pub fn info(bytes: &[u8]) -> Result<DocumentMetadata, PdfError> {
    let backend = LopdfBackend::load_bytes(bytes)?;
    Ok(extract_metadata(&backend))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn extract_metadata(backend: &LopdfBackend) -> DocumentMetadata {
    let mut raw = backend.info();
    DocumentMetadata {
        title: raw.remove("Title"),
        author: raw.remove("Author"),
        creator: raw.remove("Creator"),
        producer: raw.remove("Producer"),
        page_count: backend.page_count(),
    }
}
