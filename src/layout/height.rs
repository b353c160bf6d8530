//! Typographic scale estimation.
//!
//! The median is used instead of the mean so a few giant headings or
//! degenerate OCR boxes cannot drag the thresholds around.

use super::aggregate::Bounded;

/// Median of `values`, averaging the two middle values for even lengths.
///
/// Sorts `values` in place. Returns `None` for an empty slice.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Median box height of `items`, ignoring non-positive or non-finite heights.
///
/// Falls back to `default` when no item has a usable height; the fallback
/// only keeps downstream thresholds non-zero.
pub fn median_height<T: Bounded>(items: &[T], default: f64) -> f64 {
    let mut heights: Vec<f64> = items
        .iter()
        .map(|item| item.bbox().height())
        .filter(|h| h.is_finite() && *h > 0.0)
        .collect();
    median(&mut heights).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::types::{BBox, Token};

    fn with_height(h: f64) -> Token {
        Token::new("t", "x", BBox::new(0.0, 0.0, 1.0, h), 0)
    }

    #[test]
    fn odd_count() {
        let toks: Vec<Token> = [12.0, 10.0, 50.0].into_iter().map(with_height).collect();
        assert_eq!(median_height(&toks, 1.0), 12.0);
    }

    #[test]
    fn even_count_averages_middle_pair() {
        let toks: Vec<Token> = [10.0, 20.0, 8.0, 30.0].into_iter().map(with_height).collect();
        assert_eq!(median_height(&toks, 1.0), 15.0);
    }

    #[test]
    fn non_positive_heights_are_discarded() {
        let toks: Vec<Token> = [0.0, -4.0, 9.0].into_iter().map(with_height).collect();
        assert_eq!(median_height(&toks, 1.0), 9.0);
    }

    #[test]
    fn falls_back_to_default() {
        assert_eq!(median_height::<Token>(&[], 1.0), 1.0);
        let degenerate = vec![with_height(0.0), with_height(f64::NAN)];
        assert_eq!(median_height(&degenerate, 1.0), 1.0);
    }
}
