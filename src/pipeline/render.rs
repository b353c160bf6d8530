//! Page rasterisation for the OCR fallback, plus document metadata.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a synchronous C++ library. `tokio::task::spawn_blocking` keeps
//! rendering off the async worker threads.
//!
//! ## Why cap pixels, not DPI?
//!
//! Page sizes vary wildly: an A0 poster at 300 DPI would produce a
//! 10,000 × 14,000 px bitmap. `max_rendered_pixels` caps the longest edge
//! regardless of physical size. The OCR stage maps pixel boxes back to page
//! units with the actual bitmap size, so the cap never distorts coordinates.

use crate::error::{LayoutError, PageError};
use crate::output::DocumentMetadata;
use crate::pipeline::pdfium;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A rendered page and the page size it was rendered from.
pub struct RenderedPage {
    /// 0-indexed page.
    pub index: usize,
    pub image: DynamicImage,
    /// Page size in PDF points.
    pub page_width: f64,
    pub page_height: f64,
}

/// Rasterise page `index` (0-based) with its longest edge at most `max_pixels`.
pub async fn render_page(
    pdf_path: &Path,
    password: Option<&str>,
    index: usize,
    max_pixels: u32,
) -> Result<RenderedPage, PageError> {
    let path: PathBuf = pdf_path.to_path_buf();
    let pwd = password.map(str::to_string);

    tokio::task::spawn_blocking(move || {
        render_page_blocking(&path, pwd.as_deref(), index, max_pixels)
    })
    .await
    .map_err(|e| PageError::RenderFailed {
        page: index + 1,
        detail: format!("render task panicked: {}", e),
    })?
}

fn render_page_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    index: usize,
    max_pixels: u32,
) -> Result<RenderedPage, PageError> {
    let failed = |detail: String| PageError::RenderFailed {
        page: index + 1,
        detail,
    };

    let pdfium = pdfium::bind().map_err(|e| failed(e.to_string()))?;
    let document = pdfium::open(&pdfium, pdf_path, password).map_err(|e| failed(e.to_string()))?;
    let page_index = u16::try_from(index).map_err(|_| failed("page index exceeds u16".into()))?;
    let page = document
        .pages()
        .get(page_index)
        .map_err(|e| failed(format!("{:?}", e)))?;

    let px = i32::try_from(max_pixels).unwrap_or(i32::MAX);
    let render_config = PdfRenderConfig::new()
        .set_target_width(px)
        .set_maximum_height(px);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| failed(format!("{:?}", e)))?;
    let image = bitmap.as_image();

    debug!(
        "Rendered page {} → {}x{} px",
        index + 1,
        image.width(),
        image.height()
    );

    Ok(RenderedPage {
        index,
        image,
        page_width: page.width().value as f64,
        page_height: page.height().value as f64,
    })
}

/// Read document metadata and page count without touching page content.
///
/// This is also the first pdfium call of a run, so binding and password
/// problems surface here as fatal errors.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, LayoutError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| LayoutError::Internal(format!("Metadata task panicked: {}", e)))?
}

fn extract_metadata_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, LayoutError> {
    let pdfium = pdfium::bind()?;
    let document = pdfium::open(&pdfium, pdf_path, password)?;

    let metadata = document.metadata();
    let page_count = document.pages().len() as usize;
    info!("PDF loaded: {} pages", page_count);

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata
            .get(tag)
            .map(|t| t.value().trim().to_string())
            .filter(|v| !v.is_empty())
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count,
        pdf_version: format!("{:?}", document.version()),
    })
}
