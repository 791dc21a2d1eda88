//! Concrete text-extraction backends.
//!
//! Every backend has the same per-page contract: parse the whole document
//! from memory and return one string per page, in page order. Errors are
//! returned as [`BackendError`]; deciding what to do about them is the
//! chain's job ([`super::extract`]).

use crate::capabilities::PdfiumLibrary;
use crate::error::BackendError;
use tracing::{debug, warn};

/// Name of the pdfium backend, as reported in stats and logs.
pub const PDFIUM_BACKEND: &str = "pdfium";
/// Name of the pdf-extract backend.
pub const PDF_EXTRACT_BACKEND: &str = "pdf-extract";

/// A strategy for pulling per-page text out of PDF bytes.
pub trait ExtractionBackend: Send + Sync {
    /// Stable short name used in stats and log lines.
    fn name(&self) -> &'static str;

    /// Extract the text of every page, in page order.
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, BackendError>;
}

// ── pdfium ───────────────────────────────────────────────────────────────────

/// Primary backend: PDFium through `pdfium-render`.
///
/// Binds the library on every call. Whether it binds at all was checked once
/// by [`crate::capabilities::Capabilities::detect`].
pub struct PdfiumBackend {
    library: PdfiumLibrary,
}

impl PdfiumBackend {
    pub fn new(library: PdfiumLibrary) -> Self {
        Self { library }
    }
}

impl ExtractionBackend for PdfiumBackend {
    fn name(&self) -> &'static str {
        PDFIUM_BACKEND
    }

    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, BackendError> {
        let pdfium = self.library.bind().map_err(|e| {
            debug!("pdfium bind failed: {:?}", e);
            BackendError::Unavailable {
                backend: PDFIUM_BACKEND.to_string(),
            }
        })?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| BackendError::Failed {
                backend: PDFIUM_BACKEND.to_string(),
                detail: format!("{:?}", e),
            })?;

        let mut pages = Vec::new();
        for (idx, page) in document.pages().iter().enumerate() {
            // An unreadable text layer on one page leaves a gap, not a failure.
            let text = match page.text() {
                Ok(text) => text.all(),
                Err(e) => {
                    warn!("pdfium: no text layer on page {}: {:?}", idx + 1, e);
                    String::new()
                }
            };
            pages.push(text);
        }

        debug!("pdfium: {} pages", pages.len());
        Ok(pages)
    }
}

// ── pdf-extract ──────────────────────────────────────────────────────────────

/// Secondary backend: the pure Rust `pdf-extract` crate.
///
/// pdf-extract can panic on malformed input, so the call is wrapped in
/// `catch_unwind` and a panic is reported as [`BackendError::Panicked`].
#[derive(Debug, Default)]
pub struct PdfExtractBackend;

impl ExtractionBackend for PdfExtractBackend {
    fn name(&self) -> &'static str {
        PDF_EXTRACT_BACKEND
    }

    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>, BackendError> {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        }));

        match result {
            Ok(Ok(pages)) => {
                debug!("pdf-extract: {} pages", pages.len());
                Ok(pages)
            }
            Ok(Err(e)) => Err(BackendError::Failed {
                backend: PDF_EXTRACT_BACKEND.to_string(),
                detail: e.to_string(),
            }),
            Err(_) => Err(BackendError::Panicked {
                backend: PDF_EXTRACT_BACKEND.to_string(),
            }),
        }
    }
}
