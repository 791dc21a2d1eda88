//! Input resolution: turn a user-supplied path or URL into document bytes.
//!
//! Both extraction backends work from an in-memory buffer, so a URL is
//! downloaded straight into memory and a local file is read whole. The PDF
//! magic bytes (`%PDF`) are checked here so callers get a meaningful error
//! instead of two silent backend failures.

use crate::error::CompareError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Raw bytes of one uploaded document plus a name for messages.
///
/// The bytes are owned by the caller for the duration of one comparison and
/// never written anywhere.
#[derive(Clone)]
pub struct Document {
    /// File name or URL, used in log lines and error messages.
    pub name: String,
    /// Raw PDF bytes.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl Document {
    /// Wrap bytes that are already in memory (e.g. an upload), checking the magic.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, CompareError> {
        let name = name.into();
        check_magic(&name, &bytes)?;
        Ok(Self { name, bytes })
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Read the input string into a [`Document`].
///
/// If the input is a URL, download it into memory.
/// If the input is a local file, validate it exists and is readable.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<Document, CompareError> {
    if input.trim().is_empty() {
        return Err(CompareError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

async fn read_local(path: &Path) -> Result<Document, CompareError> {
    let path: PathBuf = path.to_path_buf();

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(CompareError::PermissionDenied { path });
        }
        Err(_) => return Err(CompareError::FileNotFound { path }),
    };

    let name = path.display().to_string();
    check_magic(&name, &bytes)?;

    debug!("Read local PDF: {} ({} bytes)", name, bytes.len());
    Ok(Document { name, bytes })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Document, CompareError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| CompareError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            CompareError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            CompareError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(CompareError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| CompareError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?
        .to_vec();

    check_magic(url, &bytes)?;

    info!("Downloaded {} bytes from {}", bytes.len(), url);
    Ok(Document {
        name: url.to_string(),
        bytes,
    })
}

/// Reject inputs whose first four bytes are not `%PDF`.
///
/// Inputs shorter than four bytes are let through; the backends will report
/// them as unreadable.
fn check_magic(name: &str, bytes: &[u8]) -> Result<(), CompareError> {
    if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(CompareError::NotAPdf {
            source_name: name.to_string(),
            magic,
        });
    }
    Ok(())
}
