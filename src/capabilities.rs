//! Capability registry: which optional extraction backends this process can use.
//!
//! The registry is built once at startup (normally with
//! [`Capabilities::detect`]) and handed to
//! [`crate::pipeline::extract::TextExtractor::from_capabilities`]. Components
//! never look for libraries on their own, so a test can construct exactly the
//! set of backends it wants.

use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming the pdfium shared library (file or directory).
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// How to bind the pdfium shared library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfiumLibrary {
    /// An explicit library file.
    File(PathBuf),
    /// The platform library name inside this directory.
    Directory(PathBuf),
    /// Whatever the system loader finds.
    System,
}

impl PdfiumLibrary {
    /// Bind a fresh `Pdfium` instance to this library.
    pub fn bind(&self) -> Result<Pdfium, PdfiumError> {
        let bindings = match self {
            PdfiumLibrary::File(path) => Pdfium::bind_to_library(path)?,
            PdfiumLibrary::Directory(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))?
            }
            PdfiumLibrary::System => Pdfium::bind_to_system_library()?,
        };
        Ok(Pdfium::new(bindings))
    }

    fn from_env_value(value: &str) -> Self {
        let path = Path::new(value);
        if path.is_dir() {
            PdfiumLibrary::Directory(path.to_path_buf())
        } else {
            PdfiumLibrary::File(path.to_path_buf())
        }
    }
}

/// Optional backends available to this process.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    pdfium: Option<PdfiumLibrary>,
    pdf_extract: bool,
}

impl Capabilities {
    /// Detect the available backends.
    ///
    /// pdfium is tried from `PDFIUM_LIB_PATH`, then from the working
    /// directory, then from the system loader; the first library that binds
    /// is recorded. `pdf-extract` is compiled in and always available.
    pub fn detect() -> Self {
        let mut candidates = Vec::new();
        if let Ok(v) = std::env::var(PDFIUM_LIB_PATH_ENV) {
            if !v.trim().is_empty() {
                candidates.push(PdfiumLibrary::from_env_value(v.trim()));
            }
        }
        candidates.push(PdfiumLibrary::Directory(PathBuf::from(".")));
        candidates.push(PdfiumLibrary::System);

        let pdfium = candidates.into_iter().find(|lib| match lib.bind() {
            Ok(_) => {
                debug!("pdfium bound via {:?}", lib);
                true
            }
            Err(e) => {
                debug!("pdfium not bindable via {:?}: {:?}", lib, e);
                false
            }
        });

        match &pdfium {
            Some(lib) => info!("Primary extraction backend: pdfium ({:?})", lib),
            None => warn!(
                "pdfium library not found; falling back to pdf-extract only. \
                 Set {} to enable the primary backend.",
                PDFIUM_LIB_PATH_ENV
            ),
        }

        Self {
            pdfium,
            pdf_extract: true,
        }
    }

    /// No optional backend at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_pdfium(mut self, lib: PdfiumLibrary) -> Self {
        self.pdfium = Some(lib);
        self
    }

    pub fn with_pdf_extract(mut self, enabled: bool) -> Self {
        self.pdf_extract = enabled;
        self
    }

    pub fn pdfium(&self) -> Option<&PdfiumLibrary> {
        self.pdfium.as_ref()
    }

    pub fn pdf_extract(&self) -> bool {
        self.pdf_extract
    }

    /// Names of the usable backends, in chain order.
    pub fn backend_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.pdfium.is_some() {
            names.push(crate::pipeline::backend::PDFIUM_BACKEND);
        }
        if self.pdf_extract {
            names.push(crate::pipeline::backend::PDF_EXTRACT_BACKEND);
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_has_no_backends() {
        assert!(Capabilities::none().backend_names().is_empty());
    }

    #[test]
    fn builder_orders_pdfium_first() {
        let caps = Capabilities::none()
            .with_pdf_extract(true)
            .with_pdfium(PdfiumLibrary::System);
        assert_eq!(caps.backend_names(), vec!["pdfium", "pdf-extract"]);
    }

    #[test]
    fn env_value_directory_vs_file() {
        let dir = tempfile::tempdir().unwrap();
        let lib = PdfiumLibrary::from_env_value(dir.path().to_str().unwrap());
        assert_eq!(lib, PdfiumLibrary::Directory(dir.path().to_path_buf()));

        let lib = PdfiumLibrary::from_env_value("/opt/pdfium/libpdfium.so");
        assert_eq!(lib, PdfiumLibrary::File(PathBuf::from("/opt/pdfium/libpdfium.so")));
    }

    #[test]
    fn binding_a_missing_library_fails_cleanly() {
        let lib = PdfiumLibrary::File(PathBuf::from("/definitely/not/libpdfium.so"));
        assert!(lib.bind().is_err());
    }
}
