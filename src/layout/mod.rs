//! Layout reconstruction: positioned words → lines → paragraphs.
//!
//! This is the pure core of the crate. It does no I/O and never fails; the
//! [`crate::pipeline`] stages feed it tokens from pdfium or tesseract.
//!
//! ## Data Flow (per page)
//!
//! ```text
//! tokens ──▶ validate ──▶ median height ──▶ lines ──▶ median line height ──▶ paragraphs
//!            (geometry)   (token boxes)    (bucket     (line boxes)           (gap sweep)
//!                                           + sweep)
//! ```
//!
//! Every threshold is a multiple of a median measured on the page itself
//! (see [`LayoutParams`]), so the same code handles 6 pt footnotes and 40 pt
//! slide titles. OCR tokens must go through [`CoordinateNormalizer`] first.

pub mod aggregate;
pub mod height;
pub mod lines;
pub mod normalize;
pub mod paragraphs;
pub mod params;
pub mod types;
pub mod validate;

use std::collections::BTreeMap;

pub use aggregate::{aggregate, Aggregate, Bounded};
pub use height::{median, median_height};
pub use lines::LineClusterer;
pub use normalize::CoordinateNormalizer;
pub use paragraphs::ParagraphClusterer;
pub use params::LayoutParams;
pub use types::{BBox, Line, Paragraph, Token};
pub use validate::{validate_tokens, GeometryPolicy, ValidationReport};

/// Group one page's tokens into lines, sizing tolerances from the tokens.
pub fn cluster_lines(tokens: Vec<Token>, params: &LayoutParams) -> Vec<Line> {
    LineClusterer::for_tokens(&tokens, params).cluster(tokens)
}

/// Group one page's lines into paragraphs, sizing the gap from the lines.
pub fn cluster_paragraphs(lines: Vec<Line>, params: &LayoutParams) -> Vec<Paragraph> {
    ParagraphClusterer::for_lines(&lines, params).cluster(lines)
}

/// Reconstruct the paragraphs of a single page.
///
/// Tokens are expected to share one page index; if they do not, pages are
/// still kept apart but share one set of thresholds. Use [`reconstruct`] for
/// multi-page input.
pub fn reconstruct_page(tokens: Vec<Token>, params: &LayoutParams) -> Vec<Paragraph> {
    if tokens.is_empty() {
        return Vec::new();
    }
    let lines = cluster_lines(tokens, params);
    cluster_paragraphs(lines, params)
}

/// Reconstruct paragraphs for tokens spanning any number of pages.
///
/// Thresholds are measured per page. Output is ordered by page, then top to
/// bottom. The result does not depend on the order of `tokens`.
pub fn reconstruct(tokens: Vec<Token>, params: &LayoutParams) -> Vec<Paragraph> {
    let mut by_page: BTreeMap<usize, Vec<Token>> = BTreeMap::new();
    for token in tokens {
        by_page.entry(token.page).or_default().push(token);
    }
    by_page
        .into_values()
        .flat_map(|page_tokens| reconstruct_page(page_tokens, params))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(id: &str, text: &str, b: [f64; 4], page: usize) -> Token {
        Token::new(id, text, BBox::from(b), page)
    }

    #[test]
    fn empty_page_has_no_output() {
        let params = LayoutParams::default();
        assert!(cluster_lines(Vec::new(), &params).is_empty());
        assert!(reconstruct_page(Vec::new(), &params).is_empty());
        assert!(reconstruct(Vec::new(), &params).is_empty());
    }

    #[test]
    fn two_paragraphs_on_one_page() {
        let params = LayoutParams::default();
        let paras = reconstruct_page(
            vec![
                tok("0", "Hello", [0.0, 0.0, 30.0, 10.0], 0),
                tok("1", "world.", [32.0, 0.0, 60.0, 10.0], 0),
                tok("2", "Second", [0.0, 12.0, 40.0, 22.0], 0),
                tok("3", "line.", [42.0, 12.0, 60.0, 22.0], 0),
                tok("4", "New", [0.0, 80.0, 20.0, 90.0], 0),
                tok("5", "block.", [22.0, 80.0, 50.0, 90.0], 0),
            ],
            &params,
        );
        let texts: Vec<&str> = paras.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello world. Second line.", "New block."]);
        assert_eq!(paras[0].bbox, BBox::new(0.0, 0.0, 60.0, 22.0));
        assert_eq!(paras[0].lines.len(), 2);
        assert_eq!(paras[0].lines[0].id, "0");
    }

    #[test]
    fn thresholds_are_measured_per_page() {
        // Page 0 uses 10-unit text, page 1 uses 40-unit text. With a shared
        // median the page 0 gap of 20 would be absorbed.
        let params = LayoutParams::default();
        let paras = reconstruct(
            vec![
                tok("a", "small", [0.0, 0.0, 30.0, 10.0], 0),
                tok("b", "text", [0.0, 30.0, 30.0, 40.0], 0),
                tok("c", "BIG", [0.0, 0.0, 100.0, 40.0], 1),
                tok("d", "TEXT", [0.0, 60.0, 100.0, 100.0], 1),
                tok("e", "MORE", [0.0, 120.0, 100.0, 160.0], 1),
            ],
            &params,
        );
        let texts: Vec<&str> = paras.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["small", "text", "BIG TEXT MORE"]);
        assert_eq!(paras[2].page, 1);
    }
}
