//! pdfium binding and document loading.
//!
//! Resolution order for the shared library:
//! 1. `PDFIUM_LIB_PATH`, either the library file itself or its directory
//! 2. the working directory (`./libpdfium.so` and platform equivalents)
//! 3. the system library search path

use crate::error::LayoutError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable pointing at a pdfium library or the directory holding one.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to a pdfium library and return a ready instance.
pub fn bind() -> Result<Pdfium, LayoutError> {
    if let Some(path) = env_library_path() {
        debug!("Binding pdfium from {}", path.display());
        return Pdfium::bind_to_library(&path)
            .map(Pdfium::new)
            .map_err(|e| LayoutError::PdfiumBindingFailed(format!("{}: {:?}", path.display(), e)));
    }

    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| LayoutError::PdfiumBindingFailed(format!("{:?}", e)))
}

/// `PDFIUM_LIB_PATH` resolved to a library file, if set.
fn env_library_path() -> Option<PathBuf> {
    let raw = std::env::var_os(PDFIUM_LIB_PATH_ENV)?;
    if raw.is_empty() {
        return None;
    }
    let path = PathBuf::from(raw);
    if path.is_dir() {
        Some(Pdfium::pdfium_platform_library_name_at_path(&path))
    } else {
        Some(path)
    }
}

/// Open a document, mapping pdfium failures to the matching [`LayoutError`].
pub fn open<'a>(
    pdfium: &'a Pdfium,
    path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, LayoutError> {
    pdfium
        .load_pdf_from_file(path, password)
        .map_err(|e| classify_load_error(path, password.is_some(), format!("{:?}", e)))
}

/// pdfium reports bad passwords through its error text only.
fn classify_load_error(path: &Path, had_password: bool, detail: String) -> LayoutError {
    if detail.to_ascii_lowercase().contains("password") {
        if had_password {
            LayoutError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            LayoutError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        LayoutError::CorruptPdf {
            path: path.to_path_buf(),
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_errors_are_told_apart() {
        let p = Path::new("a.pdf");
        assert!(matches!(
            classify_load_error(p, false, "PdfiumLibraryInternalError(PasswordError)".into()),
            LayoutError::PasswordRequired { .. }
        ));
        assert!(matches!(
            classify_load_error(p, true, "PdfiumLibraryInternalError(PasswordError)".into()),
            LayoutError::WrongPassword { .. }
        ));
        assert!(matches!(
            classify_load_error(p, false, "PdfiumLibraryInternalError(FormatError)".into()),
            LayoutError::CorruptPdf { .. }
        ));
    }

    #[test]
    fn document_borrows_pdfium_and_password_together() {
        // The password must live as long as the document pdfium returns.
        type OpenFn =
            for<'a> fn(&'a Pdfium, &Path, Option<&'a str>) -> Result<PdfDocument<'a>, LayoutError>;
        let _open: OpenFn = open;
    }
}
