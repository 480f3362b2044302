//! Line classification for the document renderer.
//!
//! Note text is flat Markdown-like text: `#` headings, `-`/`*` bullets, plain
//! paragraphs, and `**bold**` markers. [`LineClassifier`] walks it one line at
//! a time as a small state machine whose state is the current *run*:
//!
//! | line (after sanitizing)         | block       | run         |
//! |----------------------------------|-------------|-------------|
//! | empty after trim                 | `Blank`     | `Blank`     |
//! | starts with `#`                  | `Heading`   | `Heading`   |
//! | trimmed starts with `-` or `*`   | `Bullet`    | `Bullets`   |
//! | anything else                    | `Paragraph` | `Paragraph` |
//!
//! Every line yields exactly one [`Block`]. The run state lets layout know
//! when a block opens a new run (for example the first bullet after a
//! paragraph, or the first paragraph after a bullet list), which is where
//! extra vertical space goes.

/// One logical block of a [`RenderDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: usize, text: String },
    Bullet { text: String },
    Paragraph { text: String },
    Blank,
}

/// The run a classifier is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Run {
    Blank,
    Heading,
    Bullets,
    Paragraph,
}

impl Run {
    fn of(block: &Block) -> Self {
        match block {
            Block::Heading { .. } => Run::Heading,
            Block::Bullet { .. } => Run::Bullets,
            Block::Paragraph { .. } => Run::Paragraph,
            Block::Blank => Run::Blank,
        }
    }
}

/// A block plus whether it opened a new run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub block: Block,
    pub run_start: bool,
    /// Run the classifier was in before this block.
    pub previous: Run,
}

/// Ordered blocks produced from one input text.
pub type RenderDocument = Vec<Classified>;

/// Incremental line classifier.
#[derive(Debug)]
pub struct LineClassifier {
    state: Run,
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LineClassifier {
    pub fn new() -> Self {
        Self { state: Run::Blank }
    }

    pub fn state(&self) -> Run {
        self.state
    }

    /// Classify one raw line and advance the state.
    pub fn feed(&mut self, raw: &str) -> Classified {
        let line = sanitize_line(raw);
        let block = classify_line(&line);
        let next = Run::of(&block);
        let previous = self.state;
        // Headings are always their own run, even when stacked.
        let run_start = next != previous || next == Run::Heading;
        self.state = next;
        Classified {
            block,
            run_start,
            previous,
        }
    }
}

fn classify_line(line: &str) -> Block {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Block::Blank;
    }

    if line.starts_with('#') {
        let level = line.chars().take_while(|c| *c == '#').count();
        return Block::Heading {
            level,
            text: strip_bold(line.trim_start_matches('#').trim()),
        };
    }

    // `**` opens bold text, not a bullet.
    let bullet = if trimmed.starts_with("**") {
        None
    } else {
        trimmed
            .strip_prefix('-')
            .or_else(|| trimmed.strip_prefix('*'))
    };
    if let Some(rest) = bullet {
        return Block::Bullet {
            text: strip_bold(rest.trim_start()),
        };
    }

    Block::Paragraph {
        text: strip_bold(trimmed),
    }
}

/// Classify a whole text.
pub fn classify(text: &str) -> RenderDocument {
    let mut classifier = LineClassifier::new();
    text.lines().map(|line| classifier.feed(line)).collect()
}

/// Keep only printable ASCII (32..=126). Other characters are dropped, not
/// replaced, so any input can be drawn with the standard Helvetica faces.
pub fn sanitize_line(line: &str) -> String {
    line.chars().filter(|c| matches!(*c, ' '..='~')).collect()
}

/// Remove literal `**` bold markers.
pub fn strip_bold(text: &str) -> String {
    text.replace("**", "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(text: &str) -> Vec<Block> {
        classify(text).into_iter().map(|c| c.block).collect()
    }

    #[test]
    fn test_minimal_fixture() {
        let b = blocks("# Title\n- point one\n- point two\nplain paragraph");
        assert_eq!(
            b,
            vec![
                Block::Heading {
                    level: 1,
                    text: "Title".into()
                },
                Block::Bullet {
                    text: "point one".into()
                },
                Block::Bullet {
                    text: "point two".into()
                },
                Block::Paragraph {
                    text: "plain paragraph".into()
                },
            ]
        );
    }

    #[test]
    fn test_bold_markers_removed_everywhere() {
        let b = blocks("## **Key** Linkages\n* the **Speaker** certifies\nA **Money Bill** is special");
        assert_eq!(
            b,
            vec![
                Block::Heading {
                    level: 2,
                    text: "Key Linkages".into()
                },
                Block::Bullet {
                    text: "the Speaker certifies".into()
                },
                Block::Paragraph {
                    text: "A Money Bill is special".into()
                },
            ]
        );
    }

    #[test]
    fn test_heading_levels() {
        let b = blocks("###   Deep  ");
        assert_eq!(
            b,
            vec![Block::Heading {
                level: 3,
                text: "Deep".into()
            }]
        );
    }

    #[test]
    fn test_indented_hash_is_paragraph() {
        // Only a `#` in the first column makes a heading.
        let b = blocks("  # not a heading");
        assert_eq!(
            b,
            vec![Block::Paragraph {
                text: "# not a heading".into()
            }]
        );
    }

    #[test]
    fn test_indented_bullet() {
        let b = blocks("    -   nested point");
        assert_eq!(
            b,
            vec![Block::Bullet {
                text: "nested point".into()
            }]
        );
    }

    #[test]
    fn test_bold_line_is_paragraph_not_bullet() {
        let b = blocks("**Overview**\n* **Veto** power");
        assert_eq!(
            b,
            vec![
                Block::Paragraph {
                    text: "Overview".into()
                },
                Block::Bullet {
                    text: "Veto power".into()
                },
            ]
        );
    }

    #[test]
    fn test_blank_lines() {
        let b = blocks("a\n\n   \nb");
        assert_eq!(b[1], Block::Blank);
        assert_eq!(b[2], Block::Blank);
        assert_eq!(b.len(), 4);
    }

    #[test]
    fn test_sanitize_drops_non_ascii() {
        assert_eq!(sanitize_line("Article 370 – abrogated ✅"), "Article 370  abrogated ");
        assert_eq!(sanitize_line("संविधान"), "");
        assert_eq!(sanitize_line("tab\there"), "tabhere");
    }

    #[test]
    fn test_non_ascii_only_lines_become_blank() {
        let b = blocks("🎉🎉\n日本語");
        assert_eq!(b, vec![Block::Blank, Block::Blank]);
    }

    #[test]
    fn test_run_transitions() {
        let doc = classify("# H\n- a\n- b\npara\nmore\n\n- c");
        let starts: Vec<bool> = doc.iter().map(|c| c.run_start).collect();
        assert_eq!(starts, vec![true, true, false, true, false, true, true]);
        assert_eq!(doc[3].previous, Run::Bullets);
    }

    #[test]
    fn test_stacked_headings_each_start_a_run() {
        let doc = classify("# A\n## B");
        assert!(doc[0].run_start);
        assert!(doc[1].run_start);
    }

    #[test]
    fn test_state_machine_tracks_last_run() {
        let mut c = LineClassifier::new();
        assert_eq!(c.state(), Run::Blank);
        c.feed("- x");
        assert_eq!(c.state(), Run::Bullets);
        c.feed("text");
        assert_eq!(c.state(), Run::Paragraph);
    }
}
