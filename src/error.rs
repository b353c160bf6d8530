//! Error types for the edgequake-pdflayout library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`LayoutError`] — **Fatal**: the extraction cannot proceed at all
//!   (bad input file, wrong password, pdfium missing, invalid parameters).
//!   Returned as `Err(LayoutError)` from the top-level `extract*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed (text layer
//!   unreadable, OCR engine crashed on one bitmap) but all other pages are
//!   fine. Stored inside [`crate::output::PageResult`] so callers can inspect
//!   partial success rather than losing the whole document to one bad page.
//!
//! The clustering core itself never fails: every stage is total over
//! well-typed input. Errors only come from the collaborators that produce
//! tokens (download, pdfium, tesseract) or from invalid configuration.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdflayout library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::PageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum LayoutError {
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

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Selected page numbers exceed the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// Every selected page failed; output would be empty.
    #[error("All {total} pages failed.\nFirst error: {first_error}")]
    AllPagesFailed { total: usize, first_error: String },

    /// Some pages were reconstructed but at least one failed.
    ///
    /// Returned by [`crate::output::ExtractionOutput::into_result`] when the
    /// caller treats any page failure as an error.
    #[error("{failed}/{total} pages failed during extraction.\nFirst error: {first_error}")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
        first_error: String,
    },

    // ── Collaborator errors ───────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium for your platform, or\n\
set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    /// The OCR engine could not be started at all.
    #[error("OCR engine '{binary}' is unavailable: {detail}\nInstall tesseract or pass --ocr never.")]
    OcrUnavailable { binary: String, detail: String },

    // ── Geometry errors ───────────────────────────────────────────────────
    /// Image or page dimensions cannot be used to build a coordinate mapping.
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
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

/// A non-fatal error for a single page.
///
/// Stored alongside [`crate::output::PageResult`] when a page fails.
/// The overall extraction continues unless ALL pages fail.
#[derive(Debug, Clone, Error, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// pdfium could not load or read the page's text layer.
    #[error("Page {page}: text extraction failed: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    /// Page rasterisation for the OCR fallback failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The OCR engine ran but reported a failure.
    #[error("Page {page}: OCR failed: {detail}")]
    OcrFailed { page: usize, detail: String },

    /// The OCR engine did not finish in time.
    #[error("Page {page}: OCR timed out after {secs}s")]
    OcrTimeout { page: usize, secs: u64 },
}

impl PageError {
    /// 1-indexed page number the error refers to.
    pub fn page(&self) -> usize {
        match self {
            PageError::TextExtractionFailed { page, .. }
            | PageError::RenderFailed { page, .. }
            | PageError::OcrFailed { page, .. }
            | PageError::OcrTimeout { page, .. } => *page,
        }
    }
}
