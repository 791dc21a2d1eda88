//! # polis-compare
//!
//! Compare two insurance policy documents (an ASR policy and one from another
//! insurer) with a chat LLM, and recover the comparison table as CSV.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF × 2
//!  │
//!  ├─ 1. Input    read local files or download URLs into memory
//!  ├─ 2. Extract  pdfium, falling back to pdf-extract (spawn_blocking)
//!  ├─ 3. Request  truncate each text to the character budget, fill the prompt
//!  ├─ 4. Generate one chat call, bounded by a timeout
//!  ├─ 5. Recover  first ```csv block → parsed table, raw text, or nothing
//!  └─ 6. Output   Markdown response + table + per-document stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use polis_compare::{compare, ComparisonConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key from --api-key, .polis-compare/secrets.toml, or OPENAI_API_KEY
//!     let config = ComparisonConfig::default();
//!     let output = compare("asr.pdf", "other.pdf", &config).await?;
//!     println!("{}", output.content);
//!     if let Some(table) = output.table.table() {
//!         println!("{}", table.to_markdown());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `polis-compare` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! polis-compare = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod capabilities;
pub mod compare;
pub mod config;
pub mod credentials;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use capabilities::{Capabilities, PdfiumLibrary};
pub use compare::{
    compare, compare_documents, compare_sync, compare_with_capabilities, resolve_generator,
    table_outcome, write_csv, DEFAULT_CSV_FILE_NAME,
};
pub use config::{ComparisonConfig, ComparisonConfigBuilder, ComparisonMode};
pub use credentials::{resolve_credential, Credential, CredentialSource, SecretsStore};
pub use error::{BackendError, CompareError};
pub use output::{ComparisonOutput, ComparisonStats, DocumentStats, TableOutcome};
pub use pipeline::extract::{Extraction, TextExtractor};
pub use pipeline::input::Document;
pub use pipeline::llm::{Generation, GenerationService, ProviderService};
pub use pipeline::recover::{recover_block, CsvTable};
pub use pipeline::request::{assemble_request, truncate_chars, ComparisonRequest};
pub use progress::{ComparisonProgressCallback, NoopProgressCallback, ProgressCallback};
