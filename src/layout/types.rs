//! Record types shared by every clustering stage.
//!
//! All coordinates live in one space: page units, top-left origin, y growing
//! downward. `bottom` is therefore always the larger y of a well-formed box,
//! and unions take `max` for the bottom edge at every level.

use serde::{Deserialize, Serialize};

use super::aggregate::{aggregate, Bounded};

/// Axis-aligned rectangle `(left, top, right, bottom)` in page units.
///
/// Serialises as a 4-element JSON array, matching the output record shape.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BBox {
    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build from an origin plus extent, as OCR engines report boxes.
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn is_finite(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.right.is_finite()
            && self.bottom.is_finite()
    }

    /// `true` when either pair of edges is in the wrong order.
    pub fn is_inverted(&self) -> bool {
        self.left > self.right || self.top > self.bottom
    }

    /// Same rectangle with edges swapped back into order where needed.
    pub fn normalized(&self) -> Self {
        Self::new(
            self.left.min(self.right),
            self.top.min(self.bottom),
            self.left.max(self.right),
            self.top.max(self.bottom),
        )
    }

    /// Smallest rectangle covering both boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    /// Scale x and y coordinates independently.
    pub fn scale(&self, sx: f64, sy: f64) -> BBox {
        BBox::new(
            self.left * sx,
            self.top * sy,
            self.right * sx,
            self.bottom * sy,
        )
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.left, self.top, self.right, self.bottom]
    }
}

impl From<[f64; 4]> for BBox {
    fn from(v: [f64; 4]) -> Self {
        BBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f64; 4] {
    fn from(b: BBox) -> Self {
        b.to_array()
    }
}

/// Smallest positioned unit of text (a word).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    pub text: String,
    pub bbox: BBox,
    /// Zero-based page index in source order.
    pub page: usize,
}

impl Token {
    pub fn new(id: impl Into<String>, text: impl Into<String>, bbox: BBox, page: usize) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            bbox,
            page,
        }
    }
}

/// Tokens merged along one visual row, left to right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Inherited from the first constituent token.
    pub id: String,
    pub text: String,
    pub bbox: BBox,
    pub page: usize,
    #[serde(skip)]
    pub tokens: Vec<Token>,
}

impl Line {
    /// Collapse an ordered, non-empty group of tokens into a line.
    ///
    /// Returns `None` for an empty group.
    pub fn from_tokens(tokens: Vec<Token>) -> Option<Line> {
        let first = tokens.first()?;
        let id = first.id.clone();
        let page = first.page;
        let agg = aggregate(&tokens)?;
        Some(Line {
            id,
            text: agg.text,
            bbox: agg.bbox,
            page,
            tokens,
        })
    }
}

/// Consecutive lines forming one block of text, top to bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub id: String,
    pub text: String,
    pub bbox: BBox,
    pub page: usize,
    #[serde(skip)]
    pub lines: Vec<Line>,
}

impl Paragraph {
    /// Collapse an ordered, non-empty group of lines into a paragraph.
    ///
    /// Returns `None` for an empty group.
    pub fn from_lines(id: impl Into<String>, lines: Vec<Line>) -> Option<Paragraph> {
        let page = lines.first()?.page;
        let agg = aggregate(&lines)?;
        Some(Paragraph {
            id: id.into(),
            text: agg.text,
            bbox: agg.bbox,
            page,
            lines,
        })
    }

    /// Number of tokens across all lines.
    pub fn token_count(&self) -> usize {
        self.lines.iter().map(|l| l.tokens.len()).sum()
    }
}

impl Bounded for Token {
    fn bbox(&self) -> BBox {
        self.bbox
    }
    fn text(&self) -> &str {
        &self.text
    }
}

impl Bounded for Line {
    fn bbox(&self) -> BBox {
        self.bbox
    }
    fn text(&self) -> &str {
        &self.text
    }
}

impl Bounded for Paragraph {
    fn bbox(&self) -> BBox {
        self.bbox
    }
    fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_serialises_as_array() {
        let b = BBox::new(1.0, 2.0, 3.0, 4.5);
        assert_eq!(serde_json::to_string(&b).unwrap(), "[1.0,2.0,3.0,4.5]");
        let back: BBox = serde_json::from_str("[1.0,2.0,3.0,4.5]").unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn normalized_swaps_inverted_edges() {
        let b = BBox::new(11.0, 20.0, 10.0, 0.0);
        assert!(b.is_inverted());
        let n = b.normalized();
        assert_eq!(n, BBox::new(10.0, 0.0, 11.0, 20.0));
        assert!(!n.is_inverted());
    }

    #[test]
    fn union_takes_max_bottom() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(5.0, 8.0, 12.0, 30.0);
        assert_eq!(a.union(&b), BBox::new(0.0, 0.0, 12.0, 30.0));
    }

    #[test]
    fn from_origin_size() {
        let b = BBox::from_origin_size(10.0, 20.0, 5.0, 2.0);
        assert_eq!(b, BBox::new(10.0, 20.0, 15.0, 22.0));
        assert_eq!(b.width(), 5.0);
        assert_eq!(b.height(), 2.0);
    }

    #[test]
    fn line_inherits_first_token_id() {
        let line = Line::from_tokens(vec![
            Token::new("a", "Hello", BBox::new(0.0, 0.0, 20.0, 10.0), 3),
            Token::new("b", "world", BBox::new(22.0, 1.0, 40.0, 11.0), 3),
        ])
        .expect("non-empty");
        assert_eq!(line.id, "a");
        assert_eq!(line.text, "Hello world");
        assert_eq!(line.page, 3);
        assert_eq!(line.bbox, BBox::new(0.0, 0.0, 40.0, 11.0));
    }

    #[test]
    fn empty_groups_produce_nothing() {
        assert!(Line::from_tokens(Vec::new()).is_none());
        assert!(Paragraph::from_lines("p0-0", Vec::new()).is_none());
    }

    #[test]
    fn paragraph_output_record_omits_children() {
        let line = Line::from_tokens(vec![Token::new(
            "t",
            "Hi",
            BBox::new(0.0, 0.0, 5.0, 5.0),
            0,
        )])
        .unwrap();
        let p = Paragraph::from_lines("p0-0", vec![line]).unwrap();
        let v: serde_json::Value = serde_json::to_value(&p).unwrap();
        assert_eq!(v["id"], "p0-0");
        assert_eq!(v["text"], "Hi");
        assert_eq!(v["page"], 0);
        assert!(v.get("lines").is_none());
        assert_eq!(p.token_count(), 1);
    }
}
