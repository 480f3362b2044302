//! Chapter segmentation.
//!
//! A corpus is plain text where each chapter opens with a `CHAPTER <n>` marker
//! at the start of a line, optionally followed by `:` and a title:
//!
//! ```text
//! CHAPTER 1: The Executive
//! The President is head of state.
//! CHAPTER 2: The Legislature
//! ...
//! ```
//!
//! Splitting is a lookahead split: every boundary sits immediately before a
//! marker, and the marker stays with the chapter it opens. Text ahead of the
//! first marker becomes its own candidate and is only dropped when it is
//! whitespace.

use regex::Regex;
use std::sync::LazyLock;

/// Title used when a chapter has no usable marker line.
pub const UNKNOWN_TITLE: &str = "Unknown Chapter";

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^CHAPTER \d+").expect("chapter marker pattern"));

// `\s+` may cross a line break, so a bare `CHAPTER 3` line takes its title
// from the next non-blank line.
static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"CHAPTER \d+:?\s+(.*)").expect("chapter title pattern"));

/// Split `document` into chapter candidates, in document order.
///
/// Candidates that are empty after trimming are dropped, so a marker with no
/// text before the next marker still yields its own (non-empty) candidate,
/// while leading whitespace before the first marker disappears.
pub fn split_chapters(document: &str) -> Vec<&str> {
    let mut bounds: Vec<usize> = MARKER.find_iter(document).map(|m| m.start()).collect();
    if bounds.first() != Some(&0) {
        bounds.insert(0, 0);
    }
    bounds.push(document.len());

    bounds
        .windows(2)
        .map(|w| &document[w[0]..w[1]])
        .filter(|candidate| !candidate.trim().is_empty())
        .collect()
}

/// Derive the chapter title from its marker line.
pub fn chapter_title(candidate: &str) -> String {
    TITLE
        .captures(candidate)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|t| !t.is_empty())
        .unwrap_or(UNKNOWN_TITLE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "CHAPTER 1: The Executive\nThe President is head of state.\nCHAPTER 2: The Legislature\nMoney Bill requires President's assent.";

    #[test]
    fn test_split_two_chapters() {
        let parts = split_chapters(DOC);
        assert_eq!(parts.len(), 2);
        assert!(parts[0].starts_with("CHAPTER 1"));
        assert!(parts[1].starts_with("CHAPTER 2"));
    }

    #[test]
    fn test_split_is_total() {
        let doc = "Preface text\n\nCHAPTER 1: A\nalpha\nCHAPTER 2: B\nbeta\n";
        let parts = split_chapters(doc);
        assert_eq!(parts.concat(), doc);
        assert_eq!(parts[0], "Preface text\n\n");
    }

    #[test]
    fn test_leading_whitespace_dropped() {
        let parts = split_chapters("\n  \nCHAPTER 1: A\nbody");
        assert_eq!(parts, vec!["CHAPTER 1: A\nbody"]);
    }

    #[test]
    fn test_marker_must_start_line() {
        let parts = split_chapters("CHAPTER 1: A\nsee CHAPTER 2 for details\n");
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn test_consecutive_markers() {
        let parts = split_chapters("CHAPTER 1\nCHAPTER 2: Real\ntext");
        assert_eq!(parts, vec!["CHAPTER 1\n", "CHAPTER 2: Real\ntext"]);
    }

    #[test]
    fn test_marker_needs_digits() {
        let parts = split_chapters("CHAPTER ONE\ntext\nCHAPTER 7 Seven\nmore");
        assert_eq!(parts.len(), 2);
        assert_eq!(chapter_title(parts[1]), "Seven");
    }

    #[test]
    fn test_title_with_colon() {
        assert_eq!(chapter_title("CHAPTER 12: Fundamental Rights\n..."), "Fundamental Rights");
    }

    #[test]
    fn test_title_without_colon() {
        assert_eq!(chapter_title("CHAPTER 3 Parliament  \nbody"), "Parliament");
    }

    #[test]
    fn test_title_on_next_line() {
        assert_eq!(chapter_title("CHAPTER 4\nEmergency Provisions\n"), "Emergency Provisions");
    }

    #[test]
    fn test_title_fallback() {
        assert_eq!(chapter_title("Preface text only"), UNKNOWN_TITLE);
        assert_eq!(chapter_title("CHAPTER 9:   "), UNKNOWN_TITLE);
    }
}
