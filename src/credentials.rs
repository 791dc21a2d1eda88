//! API key resolution.
//!
//! The key is looked up in a fixed order and the first non-empty value wins:
//!
//! 1. the value typed in by the user (`--api-key`)
//! 2. the secrets store, primary name `OPENAI_API_KEY`
//! 3. the secrets store, legacy name `OPENAI_KEY`
//! 4. the environment, primary name
//! 5. the environment, legacy name
//!
//! The secrets store is a flat TOML file of `NAME = "value"` pairs. A missing
//! or malformed file behaves like an empty store; the lookup never fails.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Primary key name in the secrets store and environment.
pub const PRIMARY_KEY_NAME: &str = "OPENAI_API_KEY";
/// Legacy key name, consulted after the primary one.
pub const LEGACY_KEY_NAME: &str = "OPENAI_KEY";
/// Default location of the secrets store, relative to the working directory.
pub const DEFAULT_SECRETS_PATH: &str = ".polis-compare/secrets.toml";

/// Where a resolved credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Explicit,
    Secrets(&'static str),
    Environment(&'static str),
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Explicit => f.write_str("command line"),
            CredentialSource::Secrets(name) => write!(f, "secrets store ({name})"),
            CredentialSource::Environment(name) => write!(f, "environment ({name})"),
        }
    }
}

/// A resolved API key. `Debug` never prints the value.
#[derive(Clone)]
pub struct Credential {
    value: String,
    source: CredentialSource,
}

impl Credential {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Flat key/value secrets loaded from a TOML file.
#[derive(Debug, Clone, Default)]
pub struct SecretsStore {
    values: HashMap<String, String>,
}

impl SecretsStore {
    /// An empty store.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a TOML document; only top-level string values are kept.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = s.parse()?;
        let values = table
            .into_iter()
            .filter_map(|(k, v)| match v {
                toml::Value::String(s) => Some((k, s)),
                _ => None,
            })
            .collect();
        Ok(Self { values })
    }

    /// Load the store from `path`, falling back to an empty store.
    pub async fn load(path: &Path) -> Self {
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => Self::parse_or_empty(&raw, path),
            Err(e) => {
                debug!("No secrets store at {}: {}", path.display(), e);
                Self::empty()
            }
        }
    }

    fn parse_or_empty(raw: &str, path: &Path) -> Self {
        match Self::from_toml_str(raw) {
            Ok(store) => {
                debug!("Loaded {} secret(s) from {}", store.values.len(), path.display());
                store
            }
            Err(e) => {
                warn!("Ignoring malformed secrets store {}: {}", path.display(), e);
                Self::empty()
            }
        }
    }

    /// Insert a value (used by tests and embedding front ends).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Look up a key; empty values count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// Resolve the API key in the documented order.
///
/// `env` abstracts the process environment so callers (and tests) can
/// substitute their own lookup; pass [`process_env`] for the real one.
pub fn resolve_credential<F>(
    explicit: Option<&str>,
    secrets: &SecretsStore,
    env: F,
) -> Option<Credential>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |s: &str| !s.trim().is_empty();

    if let Some(v) = explicit.filter(|v| non_empty(v)) {
        return Some(Credential {
            value: v.trim().to_string(),
            source: CredentialSource::Explicit,
        });
    }

    for name in [PRIMARY_KEY_NAME, LEGACY_KEY_NAME] {
        if let Some(v) = secrets.get(name) {
            return Some(Credential {
                value: v.trim().to_string(),
                source: CredentialSource::Secrets(name),
            });
        }
    }

    for name in [PRIMARY_KEY_NAME, LEGACY_KEY_NAME] {
        if let Some(v) = env(name).filter(|v| non_empty(v)) {
            return Some(Credential {
                value: v.trim().to_string(),
                source: CredentialSource::Environment(name),
            });
        }
    }

    None
}

/// Environment lookup backed by [`std::env::var`].
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
