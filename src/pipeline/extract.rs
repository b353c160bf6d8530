//! Native word extraction from the PDF text layer.
//!
//! pdfium exposes characters, not words. Characters are grouped into words
//! here: a word ends at whitespace, at a jump to another baseline, at a
//! backwards jump, or at a horizontal gap wider than half the glyph height.
//! Boxes are flipped from pdfium's bottom-left origin to the top-left origin
//! the layout core expects.

use crate::error::PageError;
use crate::layout::{BBox, Token};
use crate::pipeline::pdfium;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Horizontal gap, as a fraction of glyph height, that starts a new word.
const WORD_GAP_RATIO: f64 = 0.5;

/// Words read from one page's text layer.
#[derive(Debug, Clone)]
pub struct NativePage {
    /// 0-indexed page.
    pub index: usize,
    pub width: f64,
    pub height: f64,
    pub tokens: Vec<Token>,
}

/// A character with its box already in top-left page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedChar {
    pub ch: char,
    pub bbox: BBox,
}

/// Read the words of page `index` (0-based).
///
/// Runs in `spawn_blocking`; pdfium calls are synchronous.
pub async fn extract_page_words(
    pdf_path: &Path,
    password: Option<&str>,
    index: usize,
) -> Result<NativePage, PageError> {
    let path: PathBuf = pdf_path.to_path_buf();
    let pwd = password.map(str::to_string);

    tokio::task::spawn_blocking(move || extract_page_words_blocking(&path, pwd.as_deref(), index))
        .await
        .map_err(|e| PageError::TextExtractionFailed {
            page: index + 1,
            detail: format!("text task panicked: {}", e),
        })?
}

fn extract_page_words_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    index: usize,
) -> Result<NativePage, PageError> {
    let failed = |detail: String| PageError::TextExtractionFailed {
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

    let width = page.width().value as f64;
    let height = page.height().value as f64;
    let text = page.text().map_err(|e| failed(format!("{:?}", e)))?;

    let chars = position_chars(text.chars().iter().filter_map(|ch| {
        let c = ch.unicode_char()?;
        let bbox = ch.tight_bounds().or_else(|_| ch.loose_bounds()).ok().map(|rect| {
            flip_rect(
                rect.left().value as f64,
                rect.top().value as f64,
                rect.right().value as f64,
                rect.bottom().value as f64,
                height,
            )
        });
        Some((c, bbox))
    }));

    let tokens = group_words(&chars, index);
    debug!(
        "Page {}: {} chars → {} words ({}x{} pt)",
        index + 1,
        chars.len(),
        tokens.len(),
        width,
        height
    );

    Ok(NativePage {
        index,
        width,
        height,
        tokens,
    })
}

/// Keep characters that can be placed on the page.
///
/// Separators (whitespace, control) are kept even without bounds, since they
/// only end the current word; other characters without bounds are dropped.
pub fn position_chars(
    chars: impl IntoIterator<Item = (char, Option<BBox>)>,
) -> Vec<PositionedChar> {
    chars
        .into_iter()
        .filter_map(|(ch, bbox)| {
            if is_separator(ch) {
                Some(PositionedChar {
                    ch,
                    bbox: bbox.unwrap_or_default(),
                })
            } else {
                bbox.map(|bbox| PositionedChar { ch, bbox })
            }
        })
        .collect()
}

fn is_separator(ch: char) -> bool {
    ch.is_whitespace() || ch.is_control()
}

/// Convert a bottom-left-origin rectangle to top-left origin.
pub fn flip_rect(left: f64, pdf_top: f64, right: f64, pdf_bottom: f64, page_height: f64) -> BBox {
    BBox::new(left, page_height - pdf_top, right, page_height - pdf_bottom)
}

/// Group characters into word tokens with ids `w{page}-{n}`.
pub fn group_words(chars: &[PositionedChar], page: usize) -> Vec<Token> {
    let mut words = Vec::new();
    let mut text = String::new();
    let mut bbox: Option<BBox> = None;
    let mut prev: Option<BBox> = None;

    let mut flush = |text: &mut String, bbox: &mut Option<BBox>| {
        if let Some(b) = bbox.take() {
            if !text.is_empty() {
                let id = format!("w{}-{}", page, words.len());
                words.push(Token::new(id, std::mem::take(text), b, page));
            }
        }
        text.clear();
    };

    for pc in chars {
        if is_separator(pc.ch) {
            flush(&mut text, &mut bbox);
            prev = None;
            continue;
        }
        if let Some(p) = prev {
            if breaks_word(&p, &pc.bbox) {
                flush(&mut text, &mut bbox);
            }
        }
        text.push(pc.ch);
        bbox = Some(bbox.map_or(pc.bbox, |b| b.union(&pc.bbox)));
        prev = Some(pc.bbox);
    }
    flush(&mut text, &mut bbox);

    words
}

/// `true` when `next` cannot continue the word that ended with `prev`.
fn breaks_word(prev: &BBox, next: &BBox) -> bool {
    let h = prev.height().abs().max(next.height().abs());
    if h <= 0.0 {
        return next.left < prev.left;
    }
    let prev_mid = (prev.top + prev.bottom) / 2.0;
    let next_mid = (next.top + next.bottom) / 2.0;
    let other_baseline = (next_mid - prev_mid).abs() > h / 2.0;
    let backwards = next.right < prev.left;
    let gap = next.left - prev.right > h * WORD_GAP_RATIO;
    other_baseline || backwards || gap
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pc(ch: char, left: f64, top: f64, right: f64, bottom: f64) -> PositionedChar {
        PositionedChar {
            ch,
            bbox: BBox::new(left, top, right, bottom),
        }
    }

    fn word(s: &str, start: f64, top: f64) -> Vec<PositionedChar> {
        s.chars()
            .enumerate()
            .map(|(i, c)| {
                let l = start + i as f64 * 5.0;
                pc(c, l, top, l + 5.0, top + 10.0)
            })
            .collect()
    }

    #[test]
    fn flip_moves_origin_to_top_left() {
        // A glyph 10pt tall sitting 100pt above the bottom of a 792pt page.
        let b = flip_rect(72.0, 110.0, 80.0, 100.0, 792.0);
        assert_eq!(b, BBox::new(72.0, 682.0, 80.0, 692.0));
        assert!(!b.is_inverted());
    }

    #[test]
    fn whitespace_splits_words() {
        let mut chars = word("Hello", 0.0, 0.0);
        chars.push(pc(' ', 25.0, 0.0, 28.0, 10.0));
        chars.extend(word("world", 28.0, 0.0));
        let words = group_words(&chars, 3);
        let texts: Vec<&str> = words.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", "world"]);
        assert_eq!(words[0].bbox, BBox::new(0.0, 0.0, 25.0, 10.0));
        assert_eq!(words[1].id, "w3-1");
        assert_eq!(words[1].page, 3);
    }

    #[test]
    fn baseline_change_splits_words() {
        let mut chars = word("end", 0.0, 0.0);
        chars.extend(word("next", 15.0, 20.0));
        let words = group_words(&chars, 0);
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].text, "next");
    }

    #[test]
    fn wide_gap_splits_words() {
        let mut chars = word("ab", 0.0, 0.0);
        chars.extend(word("cd", 16.0, 0.0));
        assert_eq!(group_words(&chars, 0).len(), 2);

        let mut tight = word("ab", 0.0, 0.0);
        tight.extend(word("cd", 11.0, 0.0));
        let words = group_words(&tight, 0);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "abcd");
    }

    #[test]
    fn space_without_bounds_still_splits_words() {
        // Generated spaces can come back without a box; "a" and "b" sit
        // close enough that only the space separates them.
        let a = BBox::new(0.0, 0.0, 5.0, 10.0);
        let b = BBox::new(6.0, 0.0, 11.0, 10.0);
        let chars = position_chars([('a', Some(a)), (' ', None), ('b', Some(b))]);
        assert_eq!(chars.len(), 3);
        let words = group_words(&chars, 0);
        let texts: Vec<&str> = words.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn glyph_without_bounds_is_dropped() {
        let a = BBox::new(0.0, 0.0, 5.0, 10.0);
        let chars = position_chars([('a', Some(a)), ('x', None)]);
        assert_eq!(chars, vec![PositionedChar { ch: 'a', bbox: a }]);
    }

    #[test]
    fn empty_and_blank_input_gives_no_words() {
        assert!(group_words(&[], 0).is_empty());
        assert!(group_words(&[pc(' ', 0.0, 0.0, 1.0, 1.0), pc('\n', 1.0, 0.0, 1.0, 1.0)], 0).is_empty());
    }
}
