//! Configuration types for layout extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across concurrent page tasks, log them, and
//! diff two runs to understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A fifteen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest.

use crate::error::LayoutError;
use crate::layout::{GeometryPolicy, LayoutParams};
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for a layout extraction run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdflayout::{ExtractionConfig, OcrMode};
///
/// let config = ExtractionConfig::builder()
///     .concurrency(4)
///     .ocr_mode(OcrMode::Never)
///     .paragraph_gap(2.0)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Clustering multipliers. Default: 0.25 / 0.3 / 1.5, default height 1.0.
    pub layout: LayoutParams,

    /// How malformed token boxes are treated before clustering. Default: Repair.
    pub geometry: GeometryPolicy,

    /// When to fall back to OCR. Default: [`OcrMode::Auto`].
    pub ocr_mode: OcrMode,

    /// OCR engine settings.
    pub ocr: OcrConfig,

    /// Number of pages processed at once. Default: 4.
    ///
    /// Pages are independent, so this only bounds how many pdfium readers and
    /// tesseract processes run at the same time. OCR is CPU-heavy; raising
    /// this past the core count rarely helps.
    pub concurrency: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            layout: LayoutParams::default(),
            geometry: GeometryPolicy::default(),
            ocr_mode: OcrMode::default(),
            ocr: OcrConfig::default(),
            concurrency: 4,
            password: None,
            pages: PageSelection::default(),
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("layout", &self.layout)
            .field("geometry", &self.geometry)
            .field("ocr_mode", &self.ocr_mode)
            .field("ocr", &self.ocr)
            .field("concurrency", &self.concurrency)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pages", &self.pages)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn layout(mut self, params: LayoutParams) -> Self {
        self.config.layout = params;
        self
    }

    /// Bucket height as a fraction of the median token height.
    pub fn line_tolerance(mut self, v: f64) -> Self {
        self.config.layout.line_tolerance = v;
        self
    }

    /// Horizontal merge slack as a fraction of the median token height.
    pub fn merge_tolerance(mut self, v: f64) -> Self {
        self.config.layout.merge_tolerance = v;
        self
    }

    /// Paragraph break gap as a multiple of the median line height.
    pub fn paragraph_gap(mut self, v: f64) -> Self {
        self.config.layout.paragraph_gap = v;
        self
    }

    pub fn geometry(mut self, policy: GeometryPolicy) -> Self {
        self.config.geometry = policy;
        self
    }

    pub fn ocr_mode(mut self, mode: OcrMode) -> Self {
        self.config.ocr_mode = mode;
        self
    }

    pub fn ocr(mut self, ocr: OcrConfig) -> Self {
        self.config.ocr = ocr;
        self
    }

    pub fn tesseract_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ocr.tesseract_path = path.into();
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr.language = lang.into();
        self
    }

    pub fn ocr_timeout_secs(mut self, secs: u64) -> Self {
        self.config.ocr.timeout_secs = secs.max(1);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.ocr.max_rendered_pixels = px.max(100);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
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
    pub fn build(self) -> Result<ExtractionConfig, LayoutError> {
        let c = &self.config;
        c.layout.validate()?;
        if c.concurrency == 0 {
            return Err(LayoutError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.ocr.language.trim().is_empty() {
            return Err(LayoutError::InvalidConfig(
                "OCR language must not be empty".into(),
            ));
        }
        if c.ocr.page_segmentation_mode > 13 {
            return Err(LayoutError::InvalidConfig(format!(
                "Page segmentation mode must be 0–13, got {}",
                c.ocr.page_segmentation_mode
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// When pages are sent through the OCR engine instead of the text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OcrMode {
    /// OCR only pages whose text layer yields no words. (default)
    #[default]
    Auto,
    /// Never OCR; image-only pages come back empty.
    Never,
    /// Always OCR, ignoring the text layer.
    Always,
}

/// Settings for the tesseract OCR fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Path or name of the tesseract executable. Default: "tesseract".
    pub tesseract_path: PathBuf,

    /// Tesseract language pack(s), e.g. "eng" or "eng+deu". Default: "eng".
    pub language: String,

    /// Tesseract `--psm` value. Default: 3 (fully automatic page segmentation).
    pub page_segmentation_mode: u8,

    /// Longest edge of the rendered page image in pixels. Default: 2000.
    ///
    /// Caps memory on oversized pages while keeping body text well above the
    /// ~20 px x-height tesseract needs.
    pub max_rendered_pixels: u32,

    /// Per-page OCR timeout in seconds. Default: 60.
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            page_segmentation_mode: 3,
            max_rendered_pixels: 2000,
            timeout_secs: 60,
        }
    }
}

/// Specifies which pages of the PDF to process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// Process all pages (default).
    #[default]
    All,
    /// Process a single page (1-indexed).
    Single(usize),
    /// Process a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Process specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_builds() {
        let c = ExtractionConfig::builder().build().expect("defaults are valid");
        assert_eq!(c.layout, LayoutParams::default());
        assert_eq!(c.ocr_mode, OcrMode::Auto);
        assert_eq!(c.concurrency, 4);
    }

    #[test]
    fn multipliers_are_overridable() {
        let c = ExtractionConfig::builder()
            .line_tolerance(0.5)
            .merge_tolerance(1.0)
            .paragraph_gap(2.0)
            .build()
            .unwrap();
        assert_eq!(c.layout.line_tolerance, 0.5);
        assert_eq!(c.layout.merge_tolerance, 1.0);
        assert_eq!(c.layout.paragraph_gap, 2.0);
    }

    #[test]
    fn invalid_multiplier_is_rejected() {
        let err = ExtractionConfig::builder()
            .line_tolerance(-1.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, LayoutError::InvalidConfig(_)));
    }

    #[test]
    fn concurrency_is_clamped() {
        let c = ExtractionConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn empty_language_is_rejected() {
        assert!(ExtractionConfig::builder().ocr_language(" ").build().is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let c = ExtractionConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(3), vec![0, 1, 2]);
        assert_eq!(PageSelection::Single(2).to_indices(3), vec![1]);
        assert_eq!(PageSelection::Single(4).to_indices(3), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 9).to_indices(3), vec![1, 2]);
        assert_eq!(PageSelection::Set(vec![3, 1, 3]).to_indices(5), vec![0, 2]);
    }
}
