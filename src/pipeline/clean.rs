//! Token text cleanup applied to words from either source.
//!
//! pdfium hands back whatever code points the font maps to, including
//! zero-width joiners, soft hyphens and presentation-form ligatures;
//! tesseract occasionally emits stray whitespace inside a word. Both are
//! normalised here so that line and paragraph text joins cleanly.
//!
//! ## Rule Order
//!
//! Invisible characters go first so that a word made only of them becomes
//! empty and is dropped. Ligatures expand before whitespace collapsing.

use crate::layout::Token;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

/// Clean every token's text and drop tokens left empty.
pub fn clean_tokens(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .filter_map(|mut t| {
            let cleaned = clean_text(&t.text);
            if cleaned.is_empty() {
                trace!("Dropping empty token {}", t.id);
                return None;
            }
            t.text = cleaned;
            Some(t)
        })
        .collect()
}

/// Apply all cleanup rules to one word.
pub fn clean_text(input: &str) -> String {
    let s = remove_invisible_chars(input);
    let s = expand_ligatures(&s);
    collapse_whitespace(&s)
}

// ── Rule 1: Strip invisible Unicode ──────────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| {
            !matches!(
                c,
                '\u{200B}' // zero-width space
                | '\u{200C}' // zero-width non-joiner
                | '\u{200D}' // zero-width joiner
                | '\u{2060}' // word joiner
                | '\u{FEFF}' // BOM
                | '\u{00AD}' // soft hyphen
                | '\u{FFFE}'
                | '\u{FFFF}'
            ) && (!c.is_control() || c.is_whitespace())
        })
        .collect()
}

// ── Rule 2: Expand ligatures ─────────────────────────────────────────────────

fn expand_ligatures(input: &str) -> String {
    if !input.chars().any(|c| ('\u{FB00}'..='\u{FB06}').contains(&c)) {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len() + 4);
    for c in input.chars() {
        match c {
            '\u{FB00}' => out.push_str("ff"),
            '\u{FB01}' => out.push_str("fi"),
            '\u{FB02}' => out.push_str("fl"),
            '\u{FB03}' => out.push_str("ffi"),
            '\u{FB04}' => out.push_str("ffl"),
            '\u{FB05}' | '\u{FB06}' => out.push_str("st"),
            other => out.push(other),
        }
    }
    out
}

// ── Rule 3: Collapse whitespace ──────────────────────────────────────────────

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn collapse_whitespace(input: &str) -> String {
    RE_WHITESPACE.replace_all(input.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BBox;

    #[test]
    fn test_remove_invisible() {
        assert_eq!(clean_text("hel\u{200B}lo\u{FEFF}"), "hello");
        assert_eq!(clean_text("co\u{00AD}operate"), "cooperate");
    }

    #[test]
    fn test_expand_ligatures() {
        assert_eq!(clean_text("\u{FB01}nal"), "final");
        assert_eq!(clean_text("e\u{FB03}cient"), "efficient");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(clean_text("  New \t York \n"), "New York");
    }

    #[test]
    fn test_control_chars_removed() {
        assert_eq!(clean_text("a\u{0002}b"), "ab");
    }

    #[test]
    fn test_clean_tokens_drops_empty() {
        let b = BBox::new(0.0, 0.0, 1.0, 1.0);
        let out = clean_tokens(vec![
            Token::new("0", " word ", b, 0),
            Token::new("1", "\u{200B}", b, 0),
            Token::new("2", "   ", b, 0),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text, "word");
        assert_eq!(out[0].id, "0");
    }
}
