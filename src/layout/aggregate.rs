//! Bounding-box union and text concatenation for a group of child records.
//!
//! The same contract serves both clustering levels (tokens → line,
//! lines → paragraph), so it is written once against the [`Bounded`] trait.

use super::types::BBox;

/// Anything that occupies a rectangle on the page and carries text.
pub trait Bounded {
    fn bbox(&self) -> BBox;
    fn text(&self) -> &str;
}

/// Result of collapsing a group of children.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub bbox: BBox,
    pub text: String,
}

/// Union bbox and space-joined text of `children`, in the given order.
///
/// Returns `None` when `children` is empty.
pub fn aggregate<T: Bounded>(children: &[T]) -> Option<Aggregate> {
    let (first, rest) = children.split_first()?;

    let bbox = rest
        .iter()
        .fold(first.bbox(), |acc, child| acc.union(&child.bbox()));

    let capacity = children.iter().map(|c| c.text().len() + 1).sum();
    let mut text = String::with_capacity(capacity);
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            text.push(' ');
        }
        text.push_str(child.text());
    }

    Some(Aggregate { bbox, text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::types::Token;

    fn tok(text: &str, b: [f64; 4]) -> Token {
        Token::new(text, text, BBox::from(b), 0)
    }

    #[test]
    fn empty_group_is_none() {
        assert!(aggregate::<Token>(&[]).is_none());
    }

    #[test]
    fn single_child_is_identity() {
        let agg = aggregate(&[tok("solo", [1.0, 2.0, 3.0, 4.0])]).unwrap();
        assert_eq!(agg.text, "solo");
        assert_eq!(agg.bbox, BBox::new(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn union_and_join_in_given_order() {
        let agg = aggregate(&[
            tok("b", [10.0, 5.0, 20.0, 15.0]),
            tok("a", [0.0, 0.0, 8.0, 12.0]),
        ])
        .unwrap();
        assert_eq!(agg.text, "b a");
        assert_eq!(agg.bbox, BBox::new(0.0, 0.0, 20.0, 15.0));
    }
}
