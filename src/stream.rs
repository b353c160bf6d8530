//! Streaming extraction API: emit pages as they complete.
//!
//! Large scanned documents take minutes to OCR. [`extract_stream`] yields
//! each page's [`PageResult`] as soon as it is reconstructed, so callers can
//! show partial results or write pages incrementally. Pages arrive in
//! completion order; sort by `page_num` if order matters.
//!
//! The stream owns the resolved input, so a downloaded or in-memory PDF
//! stays on disk until the stream is dropped.

use crate::config::ExtractionConfig;
use crate::error::{LayoutError, PageError};
use crate::extract::{bytes_to_tempfile, prepare, process_page};
use crate::output::PageResult;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of page results.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<PageResult, PageError>> + Send>>;

/// Extract a PDF, streaming pages as they are ready.
///
/// # Returns
/// - `Ok(PageStream)` — a stream of `Result<PageResult, PageError>`
/// - `Err(LayoutError)` — fatal error (file not found, not a PDF, etc.)
pub async fn extract_stream(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<PageStream, LayoutError> {
    let input_str = input_str.as_ref();
    info!("Starting streaming extraction: {}", input_str);

    let prepared = prepare(input_str, config).await?;
    let total = prepared.page_indices.len();
    let indices = prepared.page_indices;
    let resolved = Arc::new(prepared.resolved);
    let config = Arc::new(config.clone());
    let concurrency = config.concurrency;

    let s = stream::iter(indices.into_iter().map(move |idx| {
        let resolved = Arc::clone(&resolved);
        let cfg = Arc::clone(&config);
        async move {
            let mut result = process_page(resolved.path(), idx, total, &cfg).await;
            match result.error.take() {
                None => Ok(result),
                Some(err) => Err(err),
            }
        }
    }))
    .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}

/// Streaming equivalent of [`crate::extract::extract_from_bytes`].
///
/// The temporary PDF lives until the returned stream is dropped.
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdflayout::{extract_stream_from_bytes, ExtractionConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("document.pdf")?;
/// let mut stream = extract_stream_from_bytes(bytes, &ExtractionConfig::default()).await?;
/// while let Some(page) = stream.next().await {
///     match page {
///         Ok(p) => println!("Page {}: {} paragraphs", p.page_num, p.paragraphs.len()),
///         Err(e) => eprintln!("Error: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub async fn extract_stream_from_bytes(
    bytes: impl AsRef<[u8]>,
    config: &ExtractionConfig,
) -> Result<PageStream, LayoutError> {
    let tmp = bytes_to_tempfile(bytes.as_ref())?;
    let path = tmp.path().to_string_lossy().to_string();
    let inner = extract_stream(&path, config).await?;

    // Hold the temp file until the last page has been yielded.
    let s = inner.map(move |item| {
        let _keep = &tmp;
        item
    });
    Ok(Box::pin(s))
}
