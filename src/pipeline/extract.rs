//! Text Extractor: best-effort text from PDF bytes through an ordered backend chain.
//!
//! Backends are tried in order. A backend that errors, is unavailable, or
//! yields no text is recorded and the next one is tried; the first backend
//! that produces text wins. The chain never returns an error: the only
//! observable result of a total failure is [`Extraction::Empty`] (and an
//! empty string from [`TextExtractor::extract`]).
//!
//! Extraction never truncates. Cutting text down to the request budget is
//! done later by [`super::request`].

use super::backend::{ExtractionBackend, PdfExtractBackend, PdfiumBackend};
use crate::capabilities::Capabilities;
use crate::error::BackendError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// What happened when one backend was tried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// The backend is not usable in this process.
    Unavailable,
    /// The backend could not parse the document.
    Failed(String),
    /// The backend parsed the document but found no text on any of its pages.
    NoText { pages: usize },
}

/// One unsuccessful backend attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendAttempt {
    pub backend: String,
    pub outcome: AttemptOutcome,
}

/// Result of running the chain over one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// A backend produced text.
    Success {
        /// Page texts joined with `\n`, in page order.
        text: String,
        /// Name of the backend that produced it.
        backend: &'static str,
        /// Number of pages the backend reported.
        pages: usize,
        /// Backends tried (and passed over) before this one.
        skipped: Vec<BackendAttempt>,
    },
    /// No backend produced text.
    Empty { attempts: Vec<BackendAttempt> },
}

impl Extraction {
    /// The extracted text, or an empty string.
    pub fn into_text(self) -> String {
        match self {
            Extraction::Success { text, .. } => text,
            Extraction::Empty { .. } => String::new(),
        }
    }

    pub fn backend(&self) -> Option<&'static str> {
        match self {
            Extraction::Success { backend, .. } => Some(backend),
            Extraction::Empty { .. } => None,
        }
    }

    /// Largest page count any backend reported while finding no text.
    ///
    /// `Some` means the document opened but carried no text layer, as
    /// opposed to no backend being able to open it at all.
    pub fn textless_pages(&self) -> Option<usize> {
        match self {
            Extraction::Success { .. } => None,
            Extraction::Empty { attempts } => attempts
                .iter()
                .filter_map(|a| match a.outcome {
                    AttemptOutcome::NoText { pages } => Some(pages),
                    _ => None,
                })
                .max(),
        }
    }

    /// Human-readable summary of the failed attempts.
    pub fn failure_summary(&self) -> String {
        let attempts = match self {
            Extraction::Success { skipped, .. } => skipped,
            Extraction::Empty { attempts } => attempts,
        };
        if attempts.is_empty() {
            return "no extraction backend available".to_string();
        }
        attempts
            .iter()
            .map(|a| match &a.outcome {
                AttemptOutcome::Unavailable => format!("{}: unavailable", a.backend),
                AttemptOutcome::Failed(detail) => format!("{}: {}", a.backend, detail),
                AttemptOutcome::NoText { pages } => {
                    format!("{}: {} page(s) without text", a.backend, pages)
                }
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Ordered chain of extraction backends.
#[derive(Clone)]
pub struct TextExtractor {
    backends: Vec<Arc<dyn ExtractionBackend>>,
}

impl std::fmt::Debug for TextExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.backends.iter().map(|b| b.name()).collect();
        f.debug_struct("TextExtractor").field("backends", &names).finish()
    }
}

impl TextExtractor {
    /// A chain over exactly these backends, in this order.
    pub fn new(backends: Vec<Arc<dyn ExtractionBackend>>) -> Self {
        Self { backends }
    }

    /// The standard chain: pdfium (if bound) then pdf-extract (if enabled).
    pub fn from_capabilities(caps: &Capabilities) -> Self {
        let mut backends: Vec<Arc<dyn ExtractionBackend>> = Vec::new();
        if let Some(lib) = caps.pdfium() {
            backends.push(Arc::new(PdfiumBackend::new(lib.clone())));
        }
        if caps.pdf_extract() {
            backends.push(Arc::new(PdfExtractBackend));
        }
        Self { backends }
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Extract text, discarding diagnostics. Never fails; may return `""`.
    pub fn extract(&self, bytes: &[u8]) -> String {
        self.run(bytes).into_text()
    }

    /// Run the chain and report which backend won or why all of them lost.
    pub fn run(&self, bytes: &[u8]) -> Extraction {
        let mut attempts = Vec::new();

        for backend in &self.backends {
            let name = backend.name();
            match backend.extract_pages(bytes) {
                Ok(pages) if pages.iter().any(|p| !p.trim().is_empty()) => {
                    let text = pages.join("\n");
                    info!(
                        "Extracted {} chars from {} pages with {}",
                        text.chars().count(),
                        pages.len(),
                        name
                    );
                    return Extraction::Success {
                        text,
                        backend: name,
                        pages: pages.len(),
                        skipped: attempts,
                    };
                }
                Ok(pages) => {
                    debug!("{}: {} pages, no text; trying next backend", name, pages.len());
                    attempts.push(BackendAttempt {
                        backend: name.to_string(),
                        outcome: AttemptOutcome::NoText { pages: pages.len() },
                    });
                }
                Err(BackendError::Unavailable { .. }) => {
                    debug!("{}: unavailable; trying next backend", name);
                    attempts.push(BackendAttempt {
                        backend: name.to_string(),
                        outcome: AttemptOutcome::Unavailable,
                    });
                }
                Err(BackendError::Failed { detail, .. }) => {
                    debug!("{} failed: {}; trying next backend", name, detail);
                    attempts.push(BackendAttempt {
                        backend: name.to_string(),
                        outcome: AttemptOutcome::Failed(detail),
                    });
                }
                Err(BackendError::Panicked { .. }) => {
                    debug!("{} panicked; trying next backend", name);
                    attempts.push(BackendAttempt {
                        backend: name.to_string(),
                        outcome: AttemptOutcome::Failed("panicked while parsing".to_string()),
                    });
                }
            }
        }

        Extraction::Empty { attempts }
    }
}
