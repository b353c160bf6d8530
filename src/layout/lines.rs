//! Token → line clustering.
//!
//! Tokens are bucketed by the top edge (bucket height = a fraction of the
//! median token height), ordered `(page, bucket, left)`, then swept left to
//! right. A token joins the running group when it sits in the same bucket on
//! the same page and starts no further than `horizontal_tolerance` past the
//! group's right edge.
//!
//! Bucket edges are hard: two tokens one unit apart across a boundary never
//! share a line, even if visually aligned. The error scales with text size.

use std::cmp::Ordering;

use super::height::median_height;
use super::params::LayoutParams;
use super::types::{Line, Token};

/// Groups a page's tokens into left-to-right lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineClusterer {
    vertical_tolerance: f64,
    horizontal_tolerance: f64,
}

impl LineClusterer {
    /// Clusterer sized for a page whose median token height is `median_height`.
    pub fn new(median_height: f64, params: &LayoutParams) -> Self {
        Self {
            vertical_tolerance: params.vertical_tolerance(median_height),
            horizontal_tolerance: params.horizontal_tolerance(median_height),
        }
    }

    /// Clusterer sized from the tokens themselves.
    pub fn for_tokens(tokens: &[Token], params: &LayoutParams) -> Self {
        Self::new(median_height(tokens, params.default_height), params)
    }

    pub fn vertical_tolerance(&self) -> f64 {
        self.vertical_tolerance
    }

    pub fn horizontal_tolerance(&self) -> f64 {
        self.horizontal_tolerance
    }

    /// Vertical bucket index for a top coordinate.
    pub fn bucket(&self, top: f64) -> i64 {
        // `as` saturates on overflow and maps NaN to 0, keeping this total.
        (top / self.vertical_tolerance).floor() as i64
    }

    /// Partition `tokens` into lines.
    ///
    /// Output is ordered by page, bucket, then left edge of the first token.
    /// Input order never affects the result.
    pub fn cluster(&self, tokens: Vec<Token>) -> Vec<Line> {
        let mut keyed: Vec<(i64, Token)> = tokens
            .into_iter()
            .map(|t| (self.bucket(t.bbox.top), t))
            .collect();
        keyed.sort_by(|(ba, a), (bb, b)| reading_order(*ba, a, *bb, b));

        let mut lines = Vec::new();
        let mut group: Option<MergeGroup> = None;

        for (bucket, token) in keyed {
            group = match group {
                Some(mut g) if g.accepts(bucket, &token, self.horizontal_tolerance) => {
                    g.push(token);
                    Some(g)
                }
                Some(g) => {
                    lines.extend(g.finish());
                    Some(MergeGroup::start(bucket, token))
                }
                None => Some(MergeGroup::start(bucket, token)),
            };
        }
        if let Some(g) = group {
            lines.extend(g.finish());
        }

        lines
    }
}

/// `(page, bucket, left)` with the remaining fields as tie-breakers, so
/// equal-looking tokens still land in one fixed order.
fn reading_order(ba: i64, a: &Token, bb: i64, b: &Token) -> Ordering {
    a.page
        .cmp(&b.page)
        .then(ba.cmp(&bb))
        .then(a.bbox.left.total_cmp(&b.bbox.left))
        .then(a.bbox.top.total_cmp(&b.bbox.top))
        .then(a.bbox.right.total_cmp(&b.bbox.right))
        .then(a.bbox.bottom.total_cmp(&b.bbox.bottom))
        .then_with(|| a.text.cmp(&b.text))
        .then_with(|| a.id.cmp(&b.id))
}

/// Tokens collected for the line currently being built.
struct MergeGroup {
    page: usize,
    bucket: i64,
    right: f64,
    tokens: Vec<Token>,
}

impl MergeGroup {
    fn start(bucket: i64, token: Token) -> Self {
        Self {
            page: token.page,
            bucket,
            right: token.bbox.right,
            tokens: vec![token],
        }
    }

    fn accepts(&self, bucket: i64, token: &Token, horizontal_tolerance: f64) -> bool {
        token.page == self.page
            && bucket == self.bucket
            && token.bbox.left <= self.right + horizontal_tolerance
    }

    fn push(&mut self, token: Token) {
        self.right = self.right.max(token.bbox.right);
        self.tokens.push(token);
    }

    fn finish(self) -> Option<Line> {
        Line::from_tokens(self.tokens)
    }
}
