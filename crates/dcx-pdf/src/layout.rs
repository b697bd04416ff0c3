//! Page layout for the conversation document.
//!
//! Produces positioned text runs only; drawing them is the caller's job.
//! All distances are millimetres measured from the top-left corner of an A4
//! portrait page.

use dcx_core::{domain::MessageRecord, export::format_message};

use crate::metrics::{char_width_mm, pt_to_mm, text_width_mm, to_latin1_lossy, FontStyle};

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;

pub const HEADER_TITLE: &str = "Discord Conversation Export";
pub const BODY_TITLE: &str = "Combined Discord Conversation";

const MARGIN: f32 = 10.0;
const CELL_PADDING: f32 = 1.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const BREAK_MARGIN: f32 = 15.0;
const PAGE_BREAK_Y: f32 = PAGE_HEIGHT - BREAK_MARGIN;

const HEADER_SIZE: f32 = 12.0;
const HEADER_CELL: f32 = 10.0;
const HEADER_GAP: f32 = 5.0;

const FOOTER_SIZE: f32 = 8.0;
const FOOTER_CELL: f32 = 10.0;
const FOOTER_OFFSET: f32 = 15.0;

const TITLE_SIZE: f32 = 12.0;
const TITLE_CELL: f32 = 10.0;
const TITLE_GAP: f32 = 4.0;

const BODY_SIZE: f32 = 12.0;
const BODY_LINE: f32 = 10.0;
const ENTRY_GAP: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Align {
    Left,
    Center,
}

/// One line of text at a fixed position.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub style: FontStyle,
    pub size_pt: f32,
    pub x: f32,
    /// Baseline, from the top edge.
    pub baseline: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub number: usize,
    pub runs: Vec<TextRun>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.runs.iter().map(|r| r.text.as_str())
    }
}

/// Lay out the heading and one wrapped paragraph per record.
pub fn layout(records: &[MessageRecord]) -> Vec<Page> {
    let mut doc = Layout::default();
    doc.add_page();

    doc.line(BODY_TITLE, FontStyle::Bold, TITLE_SIZE, TITLE_CELL);
    doc.y += TITLE_GAP;

    let wrap_width = CONTENT_WIDTH - 2.0 * CELL_PADDING;
    for record in records {
        let body = to_latin1_lossy(&format_message(record));
        for line in wrap_text(&body, wrap_width, FontStyle::Regular, BODY_SIZE) {
            doc.line(&line, FontStyle::Regular, BODY_SIZE, BODY_LINE);
        }
        doc.y += ENTRY_GAP;
    }

    doc.pages
}

#[derive(Default)]
struct Layout {
    pages: Vec<Page>,
    y: f32,
}

impl Layout {
    fn add_page(&mut self) {
        let number = self.pages.len() + 1;
        let mut page = Page {
            number,
            runs: Vec::new(),
        };

        page.runs.push(cell_run(
            HEADER_TITLE,
            FontStyle::Bold,
            HEADER_SIZE,
            MARGIN,
            HEADER_CELL,
            Align::Center,
        ));
        page.runs.push(cell_run(
            &format!("Page {number}"),
            FontStyle::Oblique,
            FOOTER_SIZE,
            PAGE_HEIGHT - FOOTER_OFFSET,
            FOOTER_CELL,
            Align::Center,
        ));

        self.pages.push(page);
        self.y = MARGIN + HEADER_CELL + HEADER_GAP;
    }

    /// Left-aligned cell of height `h`, breaking the page first if it would
    /// cross the bottom margin.
    fn line(&mut self, text: &str, style: FontStyle, size_pt: f32, h: f32) {
        if self.y + h > PAGE_BREAK_Y {
            self.add_page();
        }
        let run = cell_run(text, style, size_pt, self.y, h, Align::Left);
        if let Some(page) = self.pages.last_mut() {
            page.runs.push(run);
        }
        self.y += h;
    }
}

fn cell_run(
    text: &str,
    style: FontStyle,
    size_pt: f32,
    top: f32,
    h: f32,
    align: Align,
) -> TextRun {
    let x = match align {
        Align::Left => MARGIN + CELL_PADDING,
        Align::Center => MARGIN + (CONTENT_WIDTH - text_width_mm(text, style, size_pt)) / 2.0,
    };
    TextRun {
        text: text.to_string(),
        style,
        size_pt,
        x,
        // Vertically centred in the cell.
        baseline: top + h / 2.0 + 0.3 * pt_to_mm(size_pt),
    }
}

/// Greedy word wrap at `max_width`.
///
/// Breaks at the last space that fits (the space is dropped), or mid-word
/// when a single word is wider than the line. Explicit newlines always break.
pub fn wrap_text(text: &str, max_width: f32, style: FontStyle, size_pt: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for para in text.split('\n') {
        let chars: Vec<char> = para.chars().collect();
        let mut start = 0usize;
        let mut i = 0usize;
        let mut last_space: Option<usize> = None;
        let mut width = 0.0f32;

        while i < chars.len() {
            let c = chars[i];
            if c == ' ' {
                last_space = Some(i);
            }
            width += char_width_mm(c, style, size_pt);

            if width > max_width {
                match last_space {
                    Some(sp) if sp > start => {
                        lines.push(chars[start..sp].iter().collect());
                        start = sp + 1;
                    }
                    _ => {
                        let end = if i == start { i + 1 } else { i };
                        lines.push(chars[start..end].iter().collect());
                        start = end;
                    }
                }
                i = start;
                last_space = None;
                width = 0.0;
                continue;
            }
            i += 1;
        }

        lines.push(chars[start..].iter().collect());
    }

    lines
}
