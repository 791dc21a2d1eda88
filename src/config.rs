//! Configuration types for a policy comparison.
//!
//! All comparison behaviour is controlled through [`ComparisonConfig`], built
//! via its [`ComparisonConfigBuilder`]. Every knob lives in one struct so a
//! front end (the CLI, a web handler) only has to map its inputs onto the
//! builder and call [`crate::compare::compare`].

use crate::credentials::DEFAULT_SECRETS_PATH;
use crate::error::CompareError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Smallest accepted character budget per document.
pub const MIN_MAX_CHARS: usize = 5_000;
/// Largest accepted character budget per document.
pub const MAX_MAX_CHARS: usize = 200_000;
/// Default character budget per document.
pub const DEFAULT_MAX_CHARS: usize = 40_000;
/// Model used when neither the caller nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default OpenAI-compatible API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for one comparison of two policy documents.
///
/// # Example
/// ```rust
/// use polis_compare::{ComparisonConfig, ComparisonMode};
///
/// let config = ComparisonConfig::builder()
///     .max_chars(60_000)
///     .mode(ComparisonMode::Differences)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_chars, 60_000);
/// ```
#[derive(Clone)]
pub struct ComparisonConfig {
    /// Characters kept per document when assembling the request.
    /// Range: 5 000–200 000. Default: 40 000.
    ///
    /// The budget keeps the prompt inside the model's context window. It is
    /// applied after extraction, so the extracted text itself is never cut.
    pub max_chars: usize,

    /// Prompt variant. Default: [`ComparisonMode::Literal`].
    pub mode: ComparisonMode,

    /// Model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// Sampling temperature override. If None, the mode's fixed temperature is used.
    pub temperature: Option<f32>,

    /// Maximum tokens the model may generate. If None, the service default applies.
    pub max_tokens: Option<usize>,

    /// API key typed in by the user. Wins over the secrets store and environment.
    pub api_key: Option<String>,

    /// LLM provider name for edgequake-llm (e.g. "anthropic", "ollama").
    /// If None, the OpenAI chat-completions client is used.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over everything else.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// OpenAI-compatible API root. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Secrets store consulted for the API key.
    pub secrets_path: PathBuf,

    /// Custom system prompt. If None, uses the mode's built-in prompt.
    pub system_prompt: Option<String>,

    /// Display label of the first document. Default: "ASR".
    pub left_label: String,

    /// Display label of the second document. Default: "Andere verzekeraar".
    pub right_label: String,

    /// Upper bound on the remote call in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Stage events for front ends. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            mode: ComparisonMode::default(),
            model: None,
            temperature: None,
            max_tokens: None,
            api_key: None,
            provider_name: None,
            provider: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            secrets_path: PathBuf::from(DEFAULT_SECRETS_PATH),
            system_prompt: None,
            left_label: "ASR".to_string(),
            right_label: "Andere verzekeraar".to_string(),
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ComparisonConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparisonConfig")
            .field("max_chars", &self.max_chars)
            .field("mode", &self.mode)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("base_url", &self.base_url)
            .field("secrets_path", &self.secrets_path)
            .field("left_label", &self.left_label)
            .field("right_label", &self.right_label)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl ComparisonConfig {
    /// Create a new builder for `ComparisonConfig`.
    pub fn builder() -> ComparisonConfigBuilder {
        ComparisonConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model that will be requested.
    pub fn effective_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// The temperature that will be requested: override, else the mode's.
    pub fn effective_temperature(&self) -> f32 {
        self.temperature.unwrap_or_else(|| self.mode.temperature())
    }
}

/// Builder for [`ComparisonConfig`].
pub struct ComparisonConfigBuilder {
    config: ComparisonConfig,
}

impl fmt::Debug for ComparisonConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparisonConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ComparisonConfigBuilder {
    pub fn max_chars(mut self, n: usize) -> Self {
        self.config.max_chars = n.clamp(MIN_MAX_CHARS, MAX_MAX_CHARS);
        self
    }

    pub fn mode(mut self, mode: ComparisonMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn secrets_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.secrets_path = path.into();
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn labels(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.config.left_label = left.into();
        self.config.right_label = right.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ComparisonConfig, CompareError> {
        let c = &self.config;
        if !(MIN_MAX_CHARS..=MAX_MAX_CHARS).contains(&c.max_chars) {
            return Err(CompareError::InvalidConfig(format!(
                "max_chars must be {MIN_MAX_CHARS}–{MAX_MAX_CHARS}, got {}",
                c.max_chars
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(CompareError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.left_label.trim().is_empty() || c.right_label.trim().is_empty() {
            return Err(CompareError::InvalidConfig(
                "Document labels must not be empty".into(),
            ));
        }
        if !c.base_url.starts_with("http://") && !c.base_url.starts_with("https://") {
            return Err(CompareError::InvalidConfig(format!(
                "base_url must be an HTTP(S) URL, got '{}'",
                c.base_url
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Prompt variant sent as the system instruction.
///
/// Each mode has a fixed sampling temperature. The literal modes stay close
/// to zero so the model quotes rather than paraphrases.
///
/// | Mode | Output | Temperature |
/// |------|--------|-------------|
/// | Literal | Full four-column comparison of every provision | 0.1 |
/// | Differences | Only the provisions that differ | 0.1 |
/// | Summary | Short management summary with key items | 0.3 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComparisonMode {
    /// Complete literal comparison (default).
    #[default]
    Literal,
    /// Differences only.
    Differences,
    /// Management summary.
    Summary,
}

impl ComparisonMode {
    /// All variants in display order.
    pub const ALL: [ComparisonMode; 3] = [
        ComparisonMode::Literal,
        ComparisonMode::Differences,
        ComparisonMode::Summary,
    ];

    /// Fixed sampling temperature for this mode.
    pub fn temperature(self) -> f32 {
        match self {
            ComparisonMode::Literal | ComparisonMode::Differences => 0.1,
            ComparisonMode::Summary => 0.3,
        }
    }

    /// Short lowercase name used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonMode::Literal => "literal",
            ComparisonMode::Differences => "differences",
            ComparisonMode::Summary => "summary",
        }
    }
}

impl fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let c = ComparisonConfig::default();
        assert_eq!(c.max_chars, 40_000);
        assert_eq!(c.effective_model(), "gpt-4o-mini");
        assert_eq!(c.effective_temperature(), 0.1);
        assert_eq!(c.mode, ComparisonMode::Literal);
    }

    #[test]
    fn max_chars_is_clamped() {
        let c = ComparisonConfig::builder().max_chars(10).build().unwrap();
        assert_eq!(c.max_chars, MIN_MAX_CHARS);
        let c = ComparisonConfig::builder()
            .max_chars(1_000_000)
            .build()
            .unwrap();
        assert_eq!(c.max_chars, MAX_MAX_CHARS);
    }

    #[test]
    fn temperature_override_beats_mode() {
        let c = ComparisonConfig::builder()
            .mode(ComparisonMode::Summary)
            .build()
            .unwrap();
        assert_eq!(c.effective_temperature(), 0.3);

        let c = ComparisonConfig::builder()
            .mode(ComparisonMode::Summary)
            .temperature(0.0)
            .build()
            .unwrap();
        assert_eq!(c.effective_temperature(), 0.0);
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = ComparisonConfig::builder()
            .api_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, CompareError::InvalidConfig(_)));
    }

    #[test]
    fn blank_label_rejected() {
        let err = ComparisonConfig::builder()
            .labels("ASR", "  ")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("labels"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = ComparisonConfig::builder()
            .api_key("sk-secret")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn mode_names() {
        let names: Vec<_> = ComparisonMode::ALL.iter().map(|m| m.to_string()).collect();
        assert_eq!(names, ["literal", "differences", "summary"]);
    }
}
