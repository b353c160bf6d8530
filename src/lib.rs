//! # edgequake-pdflayout
//!
//! Reconstruct lines and paragraphs from the positioned words of a PDF.
//!
//! ## Why this crate?
//!
//! PDF text layers store glyphs with coordinates, not sentences. Naive
//! extraction comes out in drawing order, with words from adjacent columns
//! or headers interleaved. This crate reads every word with its bounding box
//! (from pdfium, or from tesseract when a page is a scanned image) and
//! rebuilds the reading structure geometrically: words on the same visual
//! row become a line, vertically close lines become a paragraph. Every
//! threshold scales with the median text height measured on the page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Words      pdfium text layer, or render + tesseract OCR if empty
//!  ├─ 3. Clean      invisible characters, ligatures, whitespace
//!  ├─ 4. Validate   non-finite / inverted boxes (repair or discard)
//!  ├─ 5. Lines      row buckets + left-to-right merge sweep
//!  ├─ 6. Paragraphs top-to-bottom gap sweep
//!  └─ 7. Output     paragraphs in reading order + per-page stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdflayout::{extract, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let output = extract("document.pdf", &config).await?;
//!     for p in &output.paragraphs {
//!         println!("[{}] {:?} {}", p.page, p.bbox.to_array(), p.text);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The clustering core needs no PDF at all:
//!
//! ```rust
//! use edgequake_pdflayout::{reconstruct, BBox, LayoutParams, Token};
//!
//! let tokens = vec![
//!     Token::new("0", "Hello", BBox::new(0.0, 0.0, 30.0, 10.0), 0),
//!     Token::new("1", "world", BBox::new(32.0, 0.0, 60.0, 10.0), 0),
//! ];
//! let paragraphs = reconstruct(tokens, &LayoutParams::default());
//! assert_eq!(paragraphs[0].text, "Hello world");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdflayout` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-pdflayout = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirements
//!
//! pdfium is loaded at runtime from `PDFIUM_LIB_PATH`, the working directory
//! or the system library path. tesseract is only needed for pages without a
//! text layer (or with [`OcrMode::Always`]).

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, OcrConfig, OcrMode, PageSelection};
pub use error::{LayoutError, PageError};
pub use extract::{
    extract, extract_from_bytes, extract_sync, extract_to_file, inspect, write_atomic,
};
pub use layout::{
    reconstruct, reconstruct_page, BBox, CoordinateNormalizer, GeometryPolicy, LayoutParams, Line,
    Paragraph, Token, ValidationReport,
};
pub use output::{DocumentMetadata, ExtractionOutput, ExtractionStats, PageResult, TextSource};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{extract_stream, extract_stream_from_bytes, PageStream};
