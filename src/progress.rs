//! Progress-callback trait for comparison stage events.
//!
//! Inject an [`Arc<dyn ComparisonProgressCallback>`] via
//! [`crate::config::ComparisonConfigBuilder::progress_callback`] to be told
//! when each stage starts and finishes. The CLI uses it to drive a spinner;
//! a web front end could forward the same events to a status widget.
//!
//! # Example
//!
//! ```rust
//! use polis_compare::{ComparisonProgressCallback, ComparisonConfig};
//! use std::sync::Arc;
//!
//! struct Logger;
//!
//! impl ComparisonProgressCallback for Logger {
//!     fn on_extraction_complete(&self, document: &str, chars: usize, backend: Option<&str>) {
//!         eprintln!("{document}: {chars} chars via {backend:?}");
//!     }
//! }
//!
//! let config = ComparisonConfig::builder()
//!     .progress_callback(Arc::new(Logger) as Arc<dyn ComparisonProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the comparison pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ComparisonProgressCallback: Send + Sync {
    /// Called before a document's text is extracted.
    fn on_extraction_start(&self, document: &str) {
        let _ = document;
    }

    /// Called after extraction.
    ///
    /// # Arguments
    /// * `document`: display label of the document
    /// * `chars`: characters extracted (0 when every backend came up empty)
    /// * `backend`: name of the backend that produced the text, if any
    fn on_extraction_complete(&self, document: &str, chars: usize, backend: Option<&str>) {
        let _ = (document, chars, backend);
    }

    /// Called just before the request is sent to the generation service.
    fn on_generation_start(&self, model: &str) {
        let _ = model;
    }

    /// Called when the model answered.
    ///
    /// # Arguments
    /// * `response_len`: byte length of the model response
    /// * `table_found`: whether a CSV block was recovered from it
    fn on_generation_complete(&self, response_len: usize, table_found: bool) {
        let _ = (response_len, table_found);
    }

    /// Called when the comparison is aborted.
    fn on_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ComparisonProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ComparisonConfig`].
pub type ProgressCallback = Arc<dyn ComparisonProgressCallback>;
