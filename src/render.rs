//! Note text → paginated PDF.
//!
//! Rendering happens in two steps so the geometry can be tested without
//! parsing PDF output:
//!
//! 1. [`layout`] flows classified blocks onto pages and returns positioned
//!    [`TextRun`]s. Wrapping uses the Helvetica AFM advance widths, page breaks
//!    happen automatically when the next line would cross the bottom margin.
//! 2. [`write_pdf`] turns the pages into a PDF with `lopdf`, using the
//!    standard Type 1 Helvetica faces (no embedded fonts).
//!
//! All input is sanitized to printable ASCII before layout, so the content of
//! the text can never make rendering fail. Only a fault inside the PDF writer
//! surfaces as a [`RenderError`].

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::classify::{self, Block, RenderDocument, Run};
use crate::config::RenderConfig;
use crate::error::RenderError;

pub const PDF_MIME: &str = "application/pdf";

/// Helvetica advance widths for codes 32..=126, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advance widths for codes 32..=126, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Regular,
    Bold,
}

impl Face {
    fn resource(self) -> &'static str {
        match self {
            Face::Regular => "F1",
            Face::Bold => "F2",
        }
    }

    fn base_font(self) -> &'static str {
        match self {
            Face::Regular => "Helvetica",
            Face::Bold => "Helvetica-Bold",
        }
    }

    fn glyph_width(self, c: char) -> u32 {
        let table = match self {
            Face::Regular => &HELVETICA,
            Face::Bold => &HELVETICA_BOLD,
        };
        (c as usize)
            .checked_sub(32)
            .and_then(|i| table.get(i))
            .map(|w| u32::from(*w))
            .unwrap_or(556)
    }
}

/// Advance width of `text` in points.
pub fn text_width(text: &str, face: Face, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| face.glyph_width(c)).sum();
    units as f32 * size / 1000.0
}

/// Greedy word wrap. Runs of whitespace collapse to one space; a word wider
/// than `max_width` on its own is broken between characters.
pub fn wrap(text: &str, face: Face, size: f32, max_width: f32) -> Vec<String> {
    let space = text_width(" ", face, size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0;

    for word in text.split_whitespace() {
        let word_width = text_width(word, face, size);
        let needed = if current.is_empty() {
            word_width
        } else {
            current_width + space + word_width
        };
        if needed <= max_width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_width = needed;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0.0;
        }
        if word_width <= max_width {
            current.push_str(word);
            current_width = word_width;
            continue;
        }

        for c in word.chars() {
            let w = text_width(c.encode_utf8(&mut [0; 4]), face, size);
            if !current.is_empty() && current_width + w > max_width {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            }
            current.push(c);
            current_width += w;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// A single line of text at a fixed position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    /// Baseline, measured down from the top edge of the page.
    pub baseline: f32,
    pub face: Face,
    pub size: f32,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub runs: Vec<TextRun>,
}

/// Vertical flow across pages.
struct Flow<'a> {
    cfg: &'a RenderConfig,
    done: Vec<Page>,
    current: Page,
    cursor: f32,
}

impl<'a> Flow<'a> {
    fn new(cfg: &'a RenderConfig) -> Self {
        Self {
            cfg,
            done: Vec::new(),
            current: Page::default(),
            cursor: cfg.margin,
        }
    }

    fn body_line_height(&self) -> f32 {
        self.cfg.body_size * self.cfg.line_spacing
    }

    fn space(&mut self, amount: f32) {
        self.cursor += amount;
    }

    /// Place one line made of `(x, text)` runs sharing a baseline, breaking
    /// to a new page first if the line does not fit.
    fn line(&mut self, runs: Vec<(f32, String)>, face: Face, size: f32) {
        let height = size * self.cfg.line_spacing;
        let bottom = self.cfg.page_height - self.cfg.margin;
        if self.cursor + height > bottom && self.cursor > self.cfg.margin {
            self.done.push(std::mem::take(&mut self.current));
            self.cursor = self.cfg.margin;
        }

        let baseline = self.cursor + size;
        for (x, text) in runs {
            if text.is_empty() {
                continue;
            }
            self.current.runs.push(TextRun {
                x,
                baseline,
                face,
                size,
                text,
            });
        }
        self.cursor += height;
    }

    /// All pages, including the one being filled. Never empty.
    fn finish(mut self) -> Vec<Page> {
        self.done.push(self.current);
        self.done
    }
}

fn heading_size(cfg: &RenderConfig, level: usize) -> f32 {
    let step = 1.5 * level.saturating_sub(1) as f32;
    (cfg.heading_size - step).max(cfg.body_size)
}

/// Lay out classified blocks under a centered title.
pub fn layout(doc: &RenderDocument, title: &str, cfg: &RenderConfig) -> Vec<Page> {
    let mut flow = Flow::new(cfg);
    let left = cfg.margin;
    let width = cfg.text_width();
    let body_lh = flow.body_line_height();

    let title = classify::strip_bold(classify::sanitize_line(title).trim());
    if !title.is_empty() {
        for line in wrap(&title, Face::Bold, cfg.title_size, width) {
            let w = text_width(&line, Face::Bold, cfg.title_size);
            let x = left + (width - w) / 2.0;
            flow.line(vec![(x, line)], Face::Bold, cfg.title_size);
        }
        flow.space(body_lh);
    }

    for item in doc {
        // A bullet list is set off from the paragraphs around it.
        if item.run_start
            && matches!(
                (item.previous, &item.block),
                (Run::Paragraph, Block::Bullet { .. }) | (Run::Bullets, Block::Paragraph { .. })
            )
        {
            flow.space(body_lh * 0.25);
        }

        match &item.block {
            Block::Blank => flow.space(body_lh * 0.5),
            Block::Heading { level, text } => {
                let size = heading_size(cfg, *level);
                flow.space(body_lh * 0.5);
                for line in wrap(text, Face::Bold, size, width) {
                    flow.line(vec![(left, line)], Face::Bold, size);
                }
                flow.space(body_lh * 0.25);
            }
            Block::Bullet { text } => {
                let dash_x = left + cfg.bullet_offset;
                let text_x = left + cfg.bullet_indent;
                let mut lines =
                    wrap(text, Face::Regular, cfg.body_size, width - cfg.bullet_indent).into_iter();
                let first = lines.next().unwrap_or_default();
                flow.line(
                    vec![(dash_x, "-".to_string()), (text_x, first)],
                    Face::Regular,
                    cfg.body_size,
                );
                for line in lines {
                    flow.line(vec![(text_x, line)], Face::Regular, cfg.body_size);
                }
            }
            Block::Paragraph { text } => {
                for line in wrap(text, Face::Regular, cfg.body_size, width) {
                    flow.line(vec![(left, line)], Face::Regular, cfg.body_size);
                }
            }
        }
    }

    flow.finish()
}

/// Serialize laid-out pages as a PDF.
pub fn write_pdf(pages: &[Page], title: &str, cfg: &RenderConfig) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for face in [Face::Regular, Face::Bold] {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource(), font_id);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
    });

    let media_box: Vec<Object> = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(cfg.page_width),
        Object::Real(cfg.page_height),
    ];

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let mut operations = Vec::with_capacity(page.runs.len() * 5);
        for run in &page.runs {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![run.face.resource().into(), Object::Real(run.size)],
            ));
            operations.push(Operation::new(
                "Td",
                vec![
                    Object::Real(run.x),
                    Object::Real(cfg.page_height - run.baseline),
                ],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(run.text.as_str())],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| RenderError::Content(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources_id,
            "MediaBox" => media_box.clone(),
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => media_box,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let created = chrono::Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(classify::sanitize_line(title)),
        "Producer" => Object::string_literal(concat!("polity-linker ", env!("CARGO_PKG_VERSION"))),
        "CreationDate" => Object::string_literal(created),
    });
    doc.trailer.set("Info", info_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| RenderError::Serialize(e.to_string()))?;
    Ok(out)
}

/// Render Markdown-like note text to PDF bytes.
pub fn render_document(
    text: &str,
    title: &str,
    cfg: &RenderConfig,
) -> Result<Vec<u8>, RenderError> {
    let doc = classify::classify(text);
    let pages = layout(&doc, title, cfg);
    tracing::debug!(blocks = doc.len(), pages = pages.len(), "laid out document");
    write_pdf(&pages, title, cfg)
}

/// Download file name for notes about `query`.
pub fn artifact_name(query: &str) -> String {
    let stem: String = query
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "polity_notes.pdf".to_string()
    } else {
        format!("{}_notes.pdf", stem)
    }
}

/// Text shown by `Tj` operators across all pages, one line per run.
#[cfg(test)]
pub(crate) fn shown_text(pdf: &[u8]) -> String {
    let doc = Document::load_mem(pdf).unwrap();
    let mut out = Vec::new();
    for page_id in doc.get_pages().into_values() {
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        for op in content.operations.iter().filter(|op| op.operator == "Tj") {
            let bytes = op.operands[0].as_str().unwrap();
            out.push(String::from_utf8_lossy(bytes).into_owned());
        }
    }
    out.join("\n")
}
