//! Progress-callback trait for per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the pipeline processes each page.
//!
//! Pages are read concurrently, so events for different pages interleave and
//! arrive from different tasks. A page reports either `on_page_complete` or
//! `on_page_error`, never both. Forward them to a channel, a log or a
//! progress bar as needed.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdflayout::{ExtractionConfig, ExtractionProgressCallback, PageResult};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct WordCounter {
//!     words: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for WordCounter {
//!     fn on_page_complete(&self, page: &PageResult, total_pages: usize) {
//!         self.words.fetch_add(page.token_count, Ordering::SeqCst);
//!         eprintln!("Page {}/{}: {} words", page.page_num, total_pages, page.token_count);
//!     }
//! }
//!
//! let counter = Arc::new(WordCounter { words: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::PageResult;
use std::sync::Arc;

/// Called by the extraction pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `on_page_*` may be called concurrently from
/// different tasks; protect shared state accordingly.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once, after page selection, before any page is read.
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called when work on a page begins (1-indexed `page_num`).
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page has been reconstructed.
    ///
    /// `page` carries the text source and word, line and paragraph counts;
    /// all may be 0 for blank pages.
    fn on_page_complete(&self, page: &PageResult, total_pages: usize) {
        let _ = (page, total_pages);
    }

    /// Called when a page fails (text layer unreadable, OCR failure).
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after all selected pages have been attempted.
    fn on_extraction_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ValidationReport;
    use crate::output::TextSource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn done(page_num: usize, token_count: usize) -> PageResult {
        PageResult {
            page_num,
            source: TextSource::Native,
            width: 612.0,
            height: 792.0,
            token_count,
            line_count: 0,
            paragraphs: Vec::new(),
            validation: ValidationReport::default(),
            duration_ms: 0,
            error: None,
        }
    }

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        words: AtomicUsize,
        succeeded: AtomicUsize,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_page_start(&self, _page_num: usize, _total_pages: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, page: &PageResult, _total_pages: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            self.words.fetch_add(page.token_count, Ordering::SeqCst);
        }

        fn on_page_error(&self, _page_num: usize, _total_pages: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_extraction_complete(&self, _total_pages: usize, success_count: usize) {
            self.succeeded.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn default_methods_ignore_events() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start(3);
        cb.on_page_start(1, 3);
        cb.on_page_complete(&done(1, 0), 3);
        cb.on_page_error(2, 3, "tesseract exited with status 1");
        cb.on_extraction_complete(3, 2);
    }

    #[test]
    fn one_outcome_per_page() {
        let tracker = TrackingCallback::default();

        tracker.on_page_start(1, 2);
        tracker.on_page_complete(&done(1, 4), 2);
        tracker.on_page_start(2, 2);
        tracker.on_page_error(2, 2, "Page 2: OCR timed out after 120s");
        tracker.on_extraction_complete(2, 1);

        let starts = tracker.starts.load(Ordering::SeqCst);
        let outcomes =
            tracker.completes.load(Ordering::SeqCst) + tracker.errors.load(Ordering::SeqCst);
        assert_eq!(starts, outcomes);
        assert_eq!(tracker.words.load(Ordering::SeqCst), 4);
        assert_eq!(tracker.succeeded.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shared_tracker_counts_across_threads() {
        let tracker = Arc::new(TrackingCallback::default());
        let cb: ProgressCallback = tracker.clone();

        let handles: Vec<_> = (1..=8)
            .map(|page| {
                let cb = Arc::clone(&cb);
                std::thread::spawn(move || {
                    cb.on_page_start(page, 8);
                    cb.on_page_complete(&done(page, page), 8);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(tracker.completes.load(Ordering::SeqCst), 8);
        assert_eq!(tracker.words.load(Ordering::SeqCst), 36);
    }
}
