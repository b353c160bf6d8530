//! Pipeline stages that feed the layout core with tokens.
//!
//! Each submodule implements one step. The layout core never sees a PDF or
//! an image; it only receives cleaned tokens in page coordinates.
//!
//! ## Data Flow (per page)
//!
//! ```text
//! input ──▶ extract ──(no words?)──▶ render ──▶ ocr ──▶ clean ──▶ layout
//! (URL/path) (pdfium chars)          (pdfium)   (tesseract)
//!                 └──────────────(words found)───────────▶ clean ──▶ layout
//! ```
//!
//! 1. [`input`]   — canonicalise the user-supplied path or URL to a local file
//! 2. [`extract`] — words from the text layer, flipped to a top-left origin
//! 3. [`render`]  — rasterise a page for OCR; also reads document metadata
//! 4. [`ocr`]     — tesseract TSV words, rescaled from pixels to page units
//! 5. [`clean`]   — invisible characters, ligatures and whitespace in word text
//!
//! [`pdfium`] holds the library binding shared by the pdfium stages, which
//! all run in `spawn_blocking`.

pub mod clean;
pub mod extract;
pub mod input;
pub mod ocr;
pub mod pdfium;
pub mod render;
