//! Eager (full-document) extraction entry points.
//!
//! ## Why eager vs. streaming?
//!
//! This module provides the simpler API: wait for all pages, then return.
//! It collects every [`PageResult`] into memory and flattens the paragraphs
//! into reading order before returning. Use [`crate::stream::extract_stream`]
//! instead when you want pages progressively.

use crate::config::{ExtractionConfig, OcrMode, PageSelection};
use crate::error::{LayoutError, PageError};
use crate::layout::{reconstruct_page, validate_tokens, Token};
use crate::output::{DocumentMetadata, ExtractionOutput, ExtractionStats, PageResult, TextSource};
use crate::pipeline::extract as native_text;
use crate::pipeline::{clean, input, ocr, render};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract paragraphs from a PDF file or URL.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(ExtractionOutput)` on success, even if some pages failed
/// (check `output.stats.failed_pages`).
///
/// # Errors
/// Returns `Err(LayoutError)` only for fatal errors:
/// - File not found / permission denied / not a PDF
/// - pdfium cannot be loaded, or the password is missing or wrong
/// - `OcrMode::Always` with no usable tesseract
/// - Every selected page failed
pub async fn extract(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, LayoutError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting extraction: {}", input_str);

    let prepared = prepare(input_str, config).await?;
    let pdf_path = prepared.resolved.path().to_path_buf();
    let selected = prepared.page_indices.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_start(selected);
    }

    let mut pages: Vec<PageResult> = stream::iter(prepared.page_indices.iter().copied())
        .map(|idx| process_page(&pdf_path, idx, selected, config))
        .buffer_unordered(config.concurrency)
        .collect()
        .await;
    pages.sort_by_key(|p| p.page_num);

    let stats = ExtractionStats::from_pages(
        prepared.metadata.page_count,
        &pages,
        total_start.elapsed().as_millis() as u64,
    );

    if selected > 0 && stats.processed_pages == 0 {
        let first_error = pages
            .iter()
            .find_map(|p| p.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(LayoutError::AllPagesFailed {
            total: pages.len(),
            first_error,
        });
    }

    info!(
        "Extraction complete: {}/{} pages, {} paragraphs, {}ms total",
        stats.processed_pages, selected, stats.total_paragraphs, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_extraction_complete(selected, stats.processed_pages);
    }

    let paragraphs = pages
        .iter()
        .flat_map(|p| p.paragraphs.iter().cloned())
        .collect();

    Ok(ExtractionOutput {
        paragraphs,
        pages,
        metadata: prepared.metadata,
        stats,
    })
}

/// Extract and write the output as pretty-printed JSON.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn extract_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionStats, LayoutError> {
    let output = extract(input_str, config).await?;
    let path = output_path.as_ref();
    let json = serde_json::to_vec_pretty(&output)
        .map_err(|e| LayoutError::Internal(format!("JSON encode: {}", e)))?;
    write_atomic(path, &json).await?;
    Ok(output.stats)
}

/// Write `bytes` to `path` through a sibling temp file and a rename.
///
/// Missing parent directories are created. An interrupted write leaves the
/// previous file (or none) in place, never a truncated one.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), LayoutError> {
    let write_failed = |source| LayoutError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, bytes).await.map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_failed)
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, LayoutError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| LayoutError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(input_str, config))
}

/// Read PDF metadata without extracting any page.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<DocumentMetadata, LayoutError> {
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    render::extract_metadata(resolved.path(), config.password.as_deref()).await
}

/// Extract paragraphs from PDF bytes held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is removed on return.
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdflayout::{extract_from_bytes, ExtractionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("document.pdf")?;
/// let output = extract_from_bytes(&bytes, &ExtractionConfig::default()).await?;
/// for p in &output.paragraphs {
///     println!("{}", p.text);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn extract_from_bytes(
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, LayoutError> {
    let tmp = bytes_to_tempfile(bytes)?;
    let path = tmp.path().to_string_lossy().to_string();
    extract(&path, config).await
}

pub(crate) fn bytes_to_tempfile(bytes: &[u8]) -> Result<tempfile::NamedTempFile, LayoutError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("pdflayout-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| LayoutError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| LayoutError::Internal(format!("tempfile write: {e}")))?;
    Ok(tmp)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Everything resolved before any page is touched.
pub(crate) struct Prepared {
    pub resolved: input::ResolvedInput,
    pub metadata: DocumentMetadata,
    /// Sorted 0-indexed pages to process.
    pub page_indices: Vec<usize>,
}

/// Resolve the input, open the document and select pages.
pub(crate) async fn prepare(
    input_str: &str,
    config: &ExtractionConfig,
) -> Result<Prepared, LayoutError> {
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;

    if config.ocr_mode == OcrMode::Always {
        let version = ocr::probe(&config.ocr).await?;
        debug!("OCR engine: {}", version);
    }

    let metadata = render::extract_metadata(resolved.path(), config.password.as_deref()).await?;
    let total_pages = metadata.page_count;
    info!("PDF has {} pages", total_pages);

    let page_indices = config.pages.to_indices(total_pages);
    if page_indices.is_empty() && total_pages > 0 {
        return Err(LayoutError::PageOutOfRange {
            page: first_requested(&config.pages),
            total: total_pages,
        });
    }
    debug!("Selected {} pages for extraction", page_indices.len());

    Ok(Prepared {
        resolved,
        metadata,
        page_indices,
    })
}

fn first_requested(selection: &PageSelection) -> usize {
    match selection {
        PageSelection::All => 1,
        PageSelection::Single(p) => *p,
        PageSelection::Range(start, _) => *start,
        PageSelection::Set(pages) => pages.iter().copied().min().unwrap_or(0),
    }
}

/// Read, clean, validate and cluster one page. Never fails: errors end up in
/// [`PageResult::error`].
pub(crate) async fn process_page(
    pdf_path: &Path,
    index: usize,
    total: usize,
    config: &ExtractionConfig,
) -> PageResult {
    let start = Instant::now();
    let page_num = index + 1;
    if let Some(ref cb) = config.progress_callback {
        cb.on_page_start(page_num, total);
    }

    let result = match read_tokens(pdf_path, index, config).await {
        Ok(scan) => build_page(page_num, scan, config, start),
        Err(e) => {
            warn!("{}", e);
            PageResult::failed(page_num, e, start.elapsed().as_millis() as u64)
        }
    };

    if let Some(ref cb) = config.progress_callback {
        match &result.error {
            None => cb.on_page_complete(&result, total),
            Some(e) => cb.on_page_error(page_num, total, &e.to_string()),
        }
    }
    result
}

/// Cleaned tokens of one page and where they came from.
struct PageScan {
    source: TextSource,
    width: f64,
    height: f64,
    tokens: Vec<Token>,
}

async fn read_tokens(
    pdf_path: &Path,
    index: usize,
    config: &ExtractionConfig,
) -> Result<PageScan, PageError> {
    let password = config.password.as_deref();

    if config.ocr_mode != OcrMode::Always {
        let native = native_text::extract_page_words(pdf_path, password, index).await?;
        let tokens = clean::clean_tokens(native.tokens);
        if !tokens.is_empty() || config.ocr_mode == OcrMode::Never {
            let source = if tokens.is_empty() {
                TextSource::Empty
            } else {
                TextSource::Native
            };
            return Ok(PageScan {
                source,
                width: native.width,
                height: native.height,
                tokens,
            });
        }
        debug!("Page {}: no text layer, falling back to OCR", index + 1);
    }

    let rendered =
        render::render_page(pdf_path, password, index, config.ocr.max_rendered_pixels).await?;
    let (width, height) = (rendered.page_width, rendered.page_height);
    let tokens = clean::clean_tokens(ocr::ocr_page(rendered, &config.ocr).await?);
    let source = if tokens.is_empty() {
        TextSource::Empty
    } else {
        TextSource::Ocr
    };
    Ok(PageScan {
        source,
        width,
        height,
        tokens,
    })
}

fn build_page(page_num: usize, scan: PageScan, config: &ExtractionConfig, start: Instant) -> PageResult {
    let (tokens, validation) = validate_tokens(scan.tokens, config.geometry);
    let token_count = tokens.len();
    let paragraphs = reconstruct_page(tokens, &config.layout);
    let line_count = paragraphs.iter().map(|p| p.lines.len()).sum();

    debug!(
        "Page {} ({:?}): {} tokens → {} lines → {} paragraphs",
        page_num,
        scan.source,
        token_count,
        line_count,
        paragraphs.len()
    );

    PageResult {
        page_num,
        source: scan.source,
        width: scan.width,
        height: scan.height,
        token_count,
        line_count,
        paragraphs,
        validation,
        duration_ms: start.elapsed().as_millis() as u64,
        error: None,
    }
}
