//! Text extraction from downloaded documents.
//!
//! [`TextExtractionService`] is the seam the orchestrator depends on. The
//! bundled [`LocalTextExtractor`] shells out to Poppler and Tesseract:
//!
//! - pdftotext for PDFs with a text layer
//! - pdftoppm + Tesseract for scanned PDFs
//! - Tesseract for PNG, JPEG and TIFF images

mod extractor;

use std::path::Path;

use async_trait::async_trait;

use crate::models::DocumentType;

pub use extractor::{ExtractionError, LocalTextExtractor};

/// Turns a local file into plain text.
///
/// Implementations must be safe to call concurrently; the orchestrator runs
/// one call per attached document inside a tier.
#[async_trait]
pub trait TextExtractionService: Send + Sync {
    async fn extract(&self, path: &Path, doc_type: DocumentType) -> Result<String, ExtractionError>;
}
