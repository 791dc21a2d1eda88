//! Comparison entry points.
//!
//! [`compare`] is the whole user action: pick a generation service, read
//! both documents, extract, assemble the request, call the model once, then
//! recover the CSV block. [`compare_with_capabilities`] is the same with a
//! registry the caller detected. [`compare_documents`] takes the documents,
//! extractor and service directly, which is what front ends holding uploads
//! in memory (and the tests) use.
//!
//! Every failure aborts the current comparison only. Nothing here is fatal to
//! the process.

use crate::capabilities::Capabilities;
use crate::config::ComparisonConfig;
use crate::credentials::{self, SecretsStore, PRIMARY_KEY_NAME};
use crate::error::CompareError;
use crate::output::{ComparisonOutput, ComparisonStats, DocumentStats, TableOutcome};
use crate::pipeline::extract::{Extraction, TextExtractor};
use crate::pipeline::input::{self, Document};
use crate::pipeline::llm::{generate_with_timeout, GenerationService, ProviderService};
use crate::pipeline::recover;
use crate::pipeline::request::assemble_request;
use edgequake_llm::{LLMProvider, OpenAIProvider, ProviderFactory};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// File name offered for the recovered CSV table.
pub const DEFAULT_CSV_FILE_NAME: &str = "asr_vs_ander_vergelijking.csv";

static DETECTED: OnceCell<Capabilities> = OnceCell::new();

/// Compare two PDFs given as file paths or HTTP(S) URLs.
///
/// Extraction backends are detected on the first call and reused afterwards.
///
/// # Errors
/// - [`CompareError::MissingCredential`] when no API key can be found
/// - [`CompareError::FileNotFound`], [`CompareError::NotAPdf`], ... for unreadable input
/// - [`CompareError::ExtractionFailed`] / [`CompareError::NoExtractableText`]
/// - [`CompareError::ApiTimeout`] and the other remote-call errors
pub async fn compare(
    left_input: impl AsRef<str>,
    right_input: impl AsRef<str>,
    config: &ComparisonConfig,
) -> Result<ComparisonOutput, CompareError> {
    let caps = detected_capabilities().await?;
    compare_with_capabilities(left_input, right_input, config, caps).await
}

/// [`compare`] with a capability registry the caller already built.
///
/// The credential is resolved before any input is read, so a missing key is
/// reported without touching the documents.
pub async fn compare_with_capabilities(
    left_input: impl AsRef<str>,
    right_input: impl AsRef<str>,
    config: &ComparisonConfig,
    caps: &Capabilities,
) -> Result<ComparisonOutput, CompareError> {
    compare_inputs(
        left_input.as_ref(),
        right_input.as_ref(),
        config,
        caps,
        credentials::process_env,
    )
    .await
}

/// Synchronous wrapper around [`compare`].
///
/// Creates a temporary tokio runtime internally.
pub fn compare_sync(
    left_input: impl AsRef<str>,
    right_input: impl AsRef<str>,
    config: &ComparisonConfig,
) -> Result<ComparisonOutput, CompareError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CompareError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(compare(left_input, right_input, config))
}

async fn compare_inputs<F>(
    left_input: &str,
    right_input: &str,
    config: &ComparisonConfig,
    caps: &Capabilities,
    env: F,
) -> Result<ComparisonOutput, CompareError>
where
    F: Fn(&str) -> Option<String>,
{
    info!("Comparing '{}' with '{}'", left_input, right_input);

    // ── Step 1: Pick the generation service ──────────────────────────────
    let secrets = SecretsStore::load(&config.secrets_path).await;
    let generator = resolve_generator(config, &secrets, env)?;

    // ── Step 2: Read both documents ──────────────────────────────────────
    let left = input::resolve_input(left_input, config.download_timeout_secs).await?;
    let right = input::resolve_input(right_input, config.download_timeout_secs).await?;

    let extractor = TextExtractor::from_capabilities(caps);
    compare_documents(left, right, config, &extractor, &generator).await
}

/// The process-wide registry, detected off the async runtime on first use.
async fn detected_capabilities() -> Result<&'static Capabilities, CompareError> {
    if let Some(caps) = DETECTED.get() {
        return Ok(caps);
    }
    let caps = tokio::task::spawn_blocking(Capabilities::detect)
        .await
        .map_err(|e| CompareError::Internal(format!("capability detection failed: {e}")))?;
    Ok(DETECTED.get_or_init(|| caps))
}

/// Compare two documents already in memory with the given collaborators.
pub async fn compare_documents<G: GenerationService>(
    left: Document,
    right: Document,
    config: &ComparisonConfig,
    extractor: &TextExtractor,
    service: &G,
) -> Result<ComparisonOutput, CompareError> {
    let result = run_comparison(left, right, config, extractor, service).await;
    if let (Err(e), Some(cb)) = (&result, &config.progress_callback) {
        cb.on_error(&e.to_string());
    }
    result
}

async fn run_comparison<G: GenerationService>(
    left: Document,
    right: Document,
    config: &ComparisonConfig,
    extractor: &TextExtractor,
    service: &G,
) -> Result<ComparisonOutput, CompareError> {
    let total_start = Instant::now();

    // ── Step 1: Extract both texts (sequential) ──────────────────────────
    let extraction_start = Instant::now();
    let (left_text, left_backend) =
        extract_document(left, &config.left_label, extractor, config).await?;
    let (right_text, right_backend) =
        extract_document(right, &config.right_label, extractor, config).await?;
    let extraction_ms = extraction_start.elapsed().as_millis() as u64;

    // ── Step 2: Assemble the request ─────────────────────────────────────
    let (request, left_cut, right_cut) = assemble_request(&left_text, &right_text, config);
    if left_cut.dropped_chars > 0 || right_cut.dropped_chars > 0 {
        info!(
            "Truncated to {} chars per document ({} / {} chars dropped)",
            config.max_chars, left_cut.dropped_chars, right_cut.dropped_chars
        );
    }

    // ── Step 3: One remote call, bounded ─────────────────────────────────
    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_start(&request.model);
    }
    info!(
        "Requesting {} comparison from {} ({})",
        config.mode,
        service.provider_label(),
        request.model
    );
    let generation_start = Instant::now();
    let generation = generate_with_timeout(
        service,
        &request,
        Duration::from_secs(config.api_timeout_secs),
    )
    .await?;
    let generation_ms = generation_start.elapsed().as_millis() as u64;

    // ── Step 4: Recover the CSV block ────────────────────────────────────
    let table = table_outcome(&generation.content);
    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_complete(generation.content.len(), !table.is_absent());
    }

    let stats = ComparisonStats {
        input_tokens: generation.input_tokens,
        output_tokens: generation.output_tokens,
        extraction_ms,
        generation_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Comparison complete: {} in / {} out tokens, {}ms total",
        stats.input_tokens, stats.output_tokens, stats.total_ms
    );

    Ok(ComparisonOutput {
        content: generation.content,
        table,
        left: DocumentStats {
            label: config.left_label.clone(),
            chars: left_cut.kept_chars + left_cut.dropped_chars,
            truncated_chars: left_cut.dropped_chars,
            backend: left_backend.map(str::to_string),
        },
        right: DocumentStats {
            label: config.right_label.clone(),
            chars: right_cut.kept_chars + right_cut.dropped_chars,
            truncated_chars: right_cut.dropped_chars,
            backend: right_backend.map(str::to_string),
        },
        stats,
    })
}

/// Run the extractor off the async runtime and turn an empty result into an error.
async fn extract_document(
    document: Document,
    label: &str,
    extractor: &TextExtractor,
    config: &ComparisonConfig,
) -> Result<(String, Option<&'static str>), CompareError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(label);
    }

    let name = document.name.clone();
    let chain = extractor.clone();
    let extraction = tokio::task::spawn_blocking(move || chain.run(&document.bytes))
        .await
        .map_err(|e| CompareError::Internal(format!("extraction task failed: {e}")))?;

    for attempt in match &extraction {
        Extraction::Success { skipped, .. } => skipped.as_slice(),
        Extraction::Empty { attempts } => attempts.as_slice(),
    } {
        debug!("{}: passed over {:?}", name, attempt);
    }

    let backend = extraction.backend();
    let text = match extraction {
        Extraction::Success { ref text, .. } if !text.trim().is_empty() => text.trim().to_string(),
        empty => {
            if let Some(ref cb) = config.progress_callback {
                cb.on_extraction_complete(label, 0, None);
            }
            warn!("No text from '{}': {}", name, empty.failure_summary());
            return Err(match empty.textless_pages() {
                Some(pages) => CompareError::NoExtractableText {
                    document: name,
                    pages,
                },
                None => CompareError::ExtractionFailed {
                    document: name,
                    detail: empty.failure_summary(),
                },
            });
        }
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(label, text.chars().count(), backend);
    }
    Ok((text, backend))
}

/// Classify the CSV block of a model response.
///
/// An empty block is treated like a missing one: there is nothing to show
/// or download.
pub fn table_outcome(content: &str) -> TableOutcome {
    let csv = match recover::recover_csv(content) {
        Some(csv) if !csv.is_empty() => csv,
        Some(_) => {
            debug!("CSV block is empty");
            return TableOutcome::Absent;
        }
        None => {
            debug!("No CSV block in response");
            return TableOutcome::Absent;
        }
    };

    match recover::parse_table(csv) {
        Ok(table) => {
            debug!(
                "Parsed CSV block: {} columns, {} rows",
                table.column_count(),
                table.rows.len()
            );
            TableOutcome::Parsed {
                csv: csv.to_string(),
                table,
            }
        }
        Err(e) => {
            warn!("CSV block did not parse: {}", e);
            TableOutcome::Unparsed {
                csv: csv.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

/// Write CSV text as UTF-8.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_csv(path: impl AsRef<Path>, csv: &str) -> Result<(), CompareError> {
    let path = path.as_ref();
    let write_err = |source| CompareError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("csv.tmp");
    tokio::fs::write(&tmp_path, csv.as_bytes())
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!("Wrote {} bytes of CSV to {}", csv.len(), path.display());
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Instantiate a named edgequake-llm provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, CompareError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        CompareError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the generation service, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`, anything but `openai`),
///    created through [`ProviderFactory`], which reads that provider's own
///    key from the environment.
/// 3. **OpenAI key** resolved by [`credentials::resolve_credential`]:
///    explicit, secrets store, environment.
/// 4. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
///
/// Otherwise [`CompareError::MissingCredential`].
pub fn resolve_generator<F>(
    config: &ComparisonConfig,
    secrets: &SecretsStore,
    env: F,
) -> Result<ProviderService, CompareError>
where
    F: Fn(&str) -> Option<String>,
{
    // 1) User-provided provider takes priority
    if let Some(ref provider) = config.provider {
        return Ok(ProviderService::new(Arc::clone(provider), "custom"));
    }

    // 2) Named non-OpenAI provider
    if let Some(ref name) = config.provider_name {
        if !name.eq_ignore_ascii_case("openai") {
            let provider = create_provider(name, config.effective_model())?;
            return Ok(ProviderService::new(provider, name.as_str()));
        }
    }

    // 3) OpenAI with the resolved key
    if let Some(credential) = credentials::resolve_credential(config.api_key.as_deref(), secrets, &env) {
        info!("Using API key from {}", credential.source());
        let provider = OpenAIProvider::compatible(credential.value(), config.base_url.as_str())
            .with_model(config.effective_model());
        return Ok(ProviderService::new(Arc::new(provider), "openai"));
    }

    // 4) Provider chosen at the environment level
    if let (Some(prov), Some(model)) = (env("EDGEQUAKE_LLM_PROVIDER"), env("EDGEQUAKE_MODEL")) {
        if !prov.is_empty() && !model.is_empty() {
            let provider = create_provider(&prov, &model)?;
            return Ok(ProviderService::new(provider, prov));
        }
    }

    Err(CompareError::MissingCredential {
        primary: PRIMARY_KEY_NAME.to_string(),
        secrets: config.secrets_path.display().to_string(),
    })
}
