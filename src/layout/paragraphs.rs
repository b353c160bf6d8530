//! Line → paragraph clustering.
//!
//! Lines are sorted by `(page, top)` and swept once from top to bottom. A
//! line joins the open paragraph while the gap between its top and the
//! previous line's bottom stays within `gap_threshold`; a larger gap or a
//! page change closes the paragraph. Lines are never reassigned backwards.

use super::height::median_height;
use super::params::LayoutParams;
use super::types::{Line, Paragraph};

/// Groups consecutive lines into paragraphs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParagraphClusterer {
    gap_threshold: f64,
}

impl ParagraphClusterer {
    /// Clusterer sized for a page whose median line height is `median_line_height`.
    pub fn new(median_line_height: f64, params: &LayoutParams) -> Self {
        Self {
            gap_threshold: params.gap_threshold(median_line_height),
        }
    }

    /// Clusterer sized from the lines themselves (not from their tokens).
    pub fn for_lines(lines: &[Line], params: &LayoutParams) -> Self {
        Self::new(median_height(lines, params.default_height), params)
    }

    pub fn gap_threshold(&self) -> f64 {
        self.gap_threshold
    }

    /// Partition `lines` into paragraphs.
    ///
    /// Paragraph ids are `p{page}-{n}`, `n` counting from 0 on each page.
    pub fn cluster(&self, mut lines: Vec<Line>) -> Vec<Paragraph> {
        // Stable: lines sharing a top keep their left-to-right order.
        lines.sort_by(|a, b| {
            a.page
                .cmp(&b.page)
                .then(a.bbox.top.total_cmp(&b.bbox.top))
        });

        let mut paragraphs: Vec<Paragraph> = Vec::new();
        let mut open: Vec<Line> = Vec::new();
        let mut ids = ParagraphIds::default();

        for line in lines {
            let continues = open.last().is_some_and(|last| {
                last.page == line.page && line.bbox.top - last.bbox.bottom <= self.gap_threshold
            });
            if !continues && !open.is_empty() {
                let closed = std::mem::take(&mut open);
                paragraphs.extend(ids.close(closed));
            }
            open.push(line);
        }
        if !open.is_empty() {
            paragraphs.extend(ids.close(open));
        }

        paragraphs
    }
}

/// Per-page paragraph numbering.
#[derive(Default)]
struct ParagraphIds {
    page: Option<usize>,
    next: usize,
}

impl ParagraphIds {
    /// Turn a finished run of lines into a paragraph with the next id on its page.
    fn close(&mut self, lines: Vec<Line>) -> Option<Paragraph> {
        let page = lines.first()?.page;
        if self.page != Some(page) {
            self.page = Some(page);
            self.next = 0;
        }
        let id = format!("p{page}-{}", self.next);
        self.next += 1;
        Paragraph::from_lines(id, lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::types::{BBox, Token};

    fn line(text: &str, b: [f64; 4], page: usize) -> Line {
        Line::from_tokens(vec![Token::new(text, text, BBox::from(b), page)]).unwrap()
    }

    #[test]
    fn empty_input_gives_no_paragraphs() {
        let c = ParagraphClusterer::new(10.0, &LayoutParams::default());
        assert!(c.cluster(Vec::new()).is_empty());
    }

    #[test]
    fn wide_gap_splits_paragraphs() {
        let lines = vec![
            line("first", [0.0, 0.0, 100.0, 10.0], 0),
            line("second", [0.0, 50.0, 100.0, 60.0], 0),
        ];
        let c = ParagraphClusterer::for_lines(&lines, &LayoutParams::default());
        assert_eq!(c.gap_threshold(), 15.0);
        let paras = c.cluster(lines);
        assert_eq!(paras.len(), 2);
        assert_eq!(paras[0].text, "first");
        assert_eq!(paras[1].text, "second");
    }

    #[test]
    fn gap_exactly_at_threshold_merges() {
        let c = ParagraphClusterer::new(10.0, &LayoutParams::default());
        let paras = c.cluster(vec![
            line("a", [0.0, 0.0, 100.0, 10.0], 0),
            line("b", [0.0, 25.0, 100.0, 35.0], 0),
        ]);
        assert_eq!(paras.len(), 1);
        assert_eq!(paras[0].text, "a b");
        assert_eq!(paras[0].bbox, BBox::new(0.0, 0.0, 100.0, 35.0));
    }

    #[test]
    fn gap_past_threshold_splits() {
        let c = ParagraphClusterer::new(10.0, &LayoutParams::default());
        let paras = c.cluster(vec![
            line("a", [0.0, 0.0, 100.0, 10.0], 0),
            line("b", [0.0, 25.5, 100.0, 35.5], 0),
        ]);
        assert_eq!(paras.len(), 2);
    }

    #[test]
    fn sorts_lines_top_to_bottom() {
        let c = ParagraphClusterer::new(10.0, &LayoutParams::default());
        let paras = c.cluster(vec![
            line("third", [0.0, 24.0, 100.0, 34.0], 0),
            line("first", [0.0, 0.0, 100.0, 10.0], 0),
            line("second", [0.0, 12.0, 100.0, 22.0], 0),
        ]);
        assert_eq!(paras.len(), 1);
        assert_eq!(paras[0].text, "first second third");
        assert_eq!(paras[0].lines.len(), 3);
    }

    #[test]
    fn page_change_closes_paragraph_and_resets_ids() {
        let c = ParagraphClusterer::new(10.0, &LayoutParams::default());
        let paras = c.cluster(vec![
            line("p0a", [0.0, 0.0, 100.0, 10.0], 0),
            line("p0b", [0.0, 100.0, 100.0, 110.0], 0),
            line("p1a", [0.0, 0.0, 100.0, 10.0], 1),
        ]);
        let ids: Vec<&str> = paras.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p0-0", "p0-1", "p1-0"]);
    }

    #[test]
    fn overlapping_lines_stay_together() {
        // Negative gap (next line starts above the previous bottom).
        let c = ParagraphClusterer::new(10.0, &LayoutParams::default());
        let paras = c.cluster(vec![
            line("sup", [0.0, 0.0, 20.0, 10.0], 0),
            line("base", [0.0, 6.0, 20.0, 16.0], 0),
        ]);
        assert_eq!(paras.len(), 1);
    }
}
