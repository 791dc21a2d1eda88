//! Error types for the polis-compare library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`CompareError`]: the current comparison cannot proceed (unreadable
//!   input, no text in a document, missing API key, remote call failed).
//!   Returned as `Err(CompareError)` from the top-level `compare*` functions.
//!   None of these are fatal to the process: the caller reports the message
//!   and the user may retry.
//!
//! * [`BackendError`]: a single extraction backend failed. These never leave
//!   the extraction chain; they are recorded in
//!   [`crate::pipeline::extract::BackendAttempt`] and the next backend is tried.

use std::path::PathBuf;
use thiserror::Error;

/// All errors that abort a comparison.
///
/// Backend-level failures use [`BackendError`] and are swallowed by the
/// extraction chain rather than propagated here.
#[derive(Debug, Error)]
pub enum CompareError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The input was read, but is not a PDF.
    #[error("Input is not a valid PDF: '{source_name}'\nFirst bytes: {magic:?}")]
    NotAPdf { source_name: String, magic: [u8; 4] },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Every backend failed to open the document (corrupt, encrypted, or no
    /// backend available).
    #[error("Could not extract text from '{document}'.\nTry another file or a better quality export.\n{detail}")]
    ExtractionFailed { document: String, detail: String },

    /// At least one backend opened the document but no page carried text.
    /// Usually a scanned PDF without a text layer.
    #[error("'{document}' has {pages} page(s) but no extractable text (scanned document?).")]
    NoExtractableText { document: String, pages: usize },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// No API key from the command line, secrets store or environment.
    #[error("No API key found.\nPass --api-key, add {primary} to {secrets}, or export {primary}.")]
    MissingCredential { primary: String, secrets: String },

    /// The configured provider is not initialised (unknown name etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The generation service returned a non-retryable error.
    #[error("Error from AI call: {message}")]
    LlmApiError { message: String },

    /// The provider reported a rate limit.
    #[error("Rate limit exceeded for provider '{provider}'")]
    RateLimitExceeded {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    /// The provider rejected the credential.
    #[error("Authentication error from provider '{provider}': {detail}")]
    AuthError { provider: String, detail: String },

    /// The call did not finish within `api_timeout_secs`.
    #[error("AI call timed out after {elapsed_ms}ms\nIncrease --api-timeout or lower --max-chars.")]
    ApiTimeout { elapsed_ms: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the CSV file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CompareError {
    /// True for the remote-call failures a user can fix by simply retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CompareError::RateLimitExceeded { .. }
                | CompareError::ApiTimeout { .. }
                | CompareError::DownloadTimeout { .. }
        )
    }
}

/// A failure of a single extraction backend.
#[derive(Debug, Clone, Error, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BackendError {
    /// The backend is not available in this process (library not bound).
    #[error("{backend}: backend unavailable")]
    Unavailable { backend: String },

    /// The backend could not parse the document.
    #[error("{backend}: {detail}")]
    Failed { backend: String, detail: String },

    /// The backend panicked while parsing (malformed input).
    #[error("{backend}: panicked while parsing the document")]
    Panicked { backend: String },
}
