//! Geometry validation run before clustering.
//!
//! The clusterers accept any box and never fail. Malformed geometry from a
//! token source would still degrade their output silently, so the pipeline
//! screens tokens here first and reports what it changed.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::types::Token;

/// What to do with a token whose box has inverted edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeometryPolicy {
    /// Swap the inverted edges back into order. (default)
    #[default]
    Repair,
    /// Drop the token.
    Discard,
}

/// Counts from one validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Tokens passed on to clustering (including repaired ones).
    pub kept: usize,
    /// Tokens whose box was reordered.
    pub repaired: usize,
    /// Tokens removed: empty text, non-finite coordinates, or inverted under
    /// [`GeometryPolicy::Discard`].
    pub dropped: usize,
}

/// Screen `tokens` for malformed geometry.
///
/// Tokens with blank text or any non-finite coordinate are always dropped.
/// Inverted boxes are handled per `policy`. Zero-width and zero-height boxes
/// are valid and kept as-is.
pub fn validate_tokens(tokens: Vec<Token>, policy: GeometryPolicy) -> (Vec<Token>, ValidationReport) {
    let mut report = ValidationReport::default();
    let mut kept = Vec::with_capacity(tokens.len());

    for mut token in tokens {
        if token.text.trim().is_empty() {
            debug!("Dropping token {} with blank text", token.id);
            report.dropped += 1;
            continue;
        }
        if !token.bbox.is_finite() {
            warn!(
                "Dropping token {} ({:?}) with non-finite box {:?}",
                token.id, token.text, token.bbox
            );
            report.dropped += 1;
            continue;
        }
        if token.bbox.is_inverted() {
            match policy {
                GeometryPolicy::Repair => {
                    debug!("Repairing inverted box on token {}", token.id);
                    token.bbox = token.bbox.normalized();
                    report.repaired += 1;
                }
                GeometryPolicy::Discard => {
                    debug!("Discarding token {} with inverted box", token.id);
                    report.dropped += 1;
                    continue;
                }
            }
        }
        kept.push(token);
    }

    report.kept = kept.len();
    if report.repaired > 0 || report.dropped > 0 {
        warn!(
            "Token validation: kept {}, repaired {}, dropped {}",
            report.kept, report.repaired, report.dropped
        );
    }
    (kept, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::types::BBox;

    fn tok(text: &str, b: [f64; 4]) -> Token {
        Token::new(text, text, BBox::from(b), 0)
    }

    #[test]
    fn repairs_inverted_boxes_by_default() {
        let (out, report) = validate_tokens(
            vec![tok("quick", [11.0, 0.0, 10.0, 20.0])],
            GeometryPolicy::default(),
        );
        assert_eq!(out[0].bbox, BBox::new(10.0, 0.0, 11.0, 20.0));
        assert_eq!(
            report,
            ValidationReport {
                kept: 1,
                repaired: 1,
                dropped: 0
            }
        );
    }

    #[test]
    fn discard_policy_drops_inverted_boxes() {
        let (out, report) = validate_tokens(
            vec![
                tok("ok", [0.0, 0.0, 10.0, 10.0]),
                tok("bad", [0.0, 10.0, 10.0, 0.0]),
            ],
            GeometryPolicy::Discard,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "ok");
        assert_eq!(report.dropped, 1);
        assert_eq!(report.kept, 1);
    }

    #[test]
    fn always_drops_blank_and_non_finite() {
        let (out, report) = validate_tokens(
            vec![
                tok("   ", [0.0, 0.0, 10.0, 10.0]),
                tok("nan", [f64::NAN, 0.0, 10.0, 10.0]),
                tok("inf", [0.0, 0.0, f64::INFINITY, 10.0]),
            ],
            GeometryPolicy::Repair,
        );
        assert!(out.is_empty());
        assert_eq!(report.dropped, 3);
    }

    #[test]
    fn zero_extent_boxes_are_kept() {
        let (out, report) = validate_tokens(
            vec![tok("dot", [5.0, 5.0, 5.0, 5.0])],
            GeometryPolicy::Discard,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(report.repaired, 0);
    }
}
