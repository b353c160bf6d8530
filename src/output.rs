//! Result types returned by the extraction entry points.

use crate::error::{LayoutError, PageError};
use crate::layout::{Line, Paragraph, Token, ValidationReport};
use serde::{Deserialize, Serialize};

/// Where a page's tokens came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSource {
    /// The PDF text layer, read through pdfium.
    #[default]
    Native,
    /// Tesseract run on a rendered bitmap of the page.
    Ocr,
    /// Neither produced any words (blank page, or OCR disabled).
    Empty,
}

/// Reconstruction result for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    pub source: TextSource,
    /// Page size in PDF points.
    pub width: f64,
    pub height: f64,
    pub token_count: usize,
    pub line_count: usize,
    pub paragraphs: Vec<Paragraph>,
    pub validation: ValidationReport,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PageError>,
}

impl PageResult {
    /// A result for a page that failed before clustering.
    pub fn failed(page_num: usize, error: PageError, duration_ms: u64) -> Self {
        Self {
            page_num,
            source: TextSource::Empty,
            width: 0.0,
            height: 0.0,
            token_count: 0,
            line_count: 0,
            paragraphs: Vec::new(),
            validation: ValidationReport::default(),
            duration_ms,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Lines of every paragraph, top to bottom.
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.paragraphs.iter().flat_map(|p| p.lines.iter())
    }

    /// Tokens of every line, in line order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.lines().flat_map(|l| l.tokens.iter())
    }
}

/// Document metadata read by pdfium.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Counters for a whole extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub total_pages: usize,
    pub processed_pages: usize,
    pub failed_pages: usize,
    pub ocr_pages: usize,
    pub total_tokens: usize,
    pub total_lines: usize,
    pub total_paragraphs: usize,
    pub repaired_tokens: usize,
    pub dropped_tokens: usize,
    pub total_duration_ms: u64,
}

impl ExtractionStats {
    /// Aggregate per-page counters.
    pub fn from_pages(total_pages: usize, pages: &[PageResult], total_duration_ms: u64) -> Self {
        let ok = || pages.iter().filter(|p| p.is_ok());
        Self {
            total_pages,
            processed_pages: ok().count(),
            failed_pages: pages.iter().filter(|p| !p.is_ok()).count(),
            ocr_pages: ok().filter(|p| p.source == TextSource::Ocr).count(),
            total_tokens: ok().map(|p| p.token_count).sum(),
            total_lines: ok().map(|p| p.line_count).sum(),
            total_paragraphs: ok().map(|p| p.paragraphs.len()).sum(),
            repaired_tokens: pages.iter().map(|p| p.validation.repaired).sum(),
            dropped_tokens: pages.iter().map(|p| p.validation.dropped).sum(),
            total_duration_ms,
        }
    }
}

/// Everything an extraction run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// All paragraphs in reading order: page, then top to bottom.
    pub paragraphs: Vec<Paragraph>,
    /// Per-page detail, sorted by page number.
    pub pages: Vec<PageResult>,
    pub metadata: DocumentMetadata,
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    /// Treat any failed page as an error.
    pub fn into_result(self) -> Result<Self, LayoutError> {
        match self.pages.iter().find_map(|p| p.error.as_ref()) {
            Some(e) => Err(LayoutError::PartialFailure {
                success: self.stats.processed_pages,
                failed: self.stats.failed_pages,
                total: self.pages.len(),
                first_error: e.to_string(),
            }),
            None => Ok(self),
        }
    }

    /// Lines across the document in reading order.
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.paragraphs.iter().flat_map(|p| p.lines.iter())
    }

    /// Words across the document in reading order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.lines().flat_map(|l| l.tokens.iter())
    }

    /// Paragraph texts separated by blank lines.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
