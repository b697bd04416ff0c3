//! Helvetica glyph widths and the Latin-1 text fallback used by the builtin fonts.

/// Advance widths (1/1000 em) for printable ASCII `' '..='~'`, Helvetica.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

/// Same range, Helvetica-Bold.
#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

// Accented Latin-1 letters are close to their base letter; use an average.
const LATIN1_UPPER_WIDTH: u16 = 556;

const PT_TO_MM: f32 = 25.4 / 72.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Oblique,
}

pub fn pt_to_mm(pt: f32) -> f32 {
    pt * PT_TO_MM
}

fn glyph_units(c: char, style: FontStyle) -> u16 {
    let table = match style {
        FontStyle::Bold => &HELVETICA_BOLD,
        FontStyle::Regular | FontStyle::Oblique => &HELVETICA,
    };
    match c {
        ' '..='~' => table[c as usize - ' ' as usize],
        _ => LATIN1_UPPER_WIDTH,
    }
}

pub fn char_width_mm(c: char, style: FontStyle, size_pt: f32) -> f32 {
    glyph_units(c, style) as f32 / 1000.0 * pt_to_mm(size_pt)
}

pub fn text_width_mm(text: &str, style: FontStyle, size_pt: f32) -> f32 {
    text.chars().map(|c| char_width_mm(c, style, size_pt)).sum()
}

/// Reduce `text` to what the builtin fonts can show: printable Latin-1.
///
/// Newlines survive, tabs become spaces, carriage returns are dropped and
/// everything else outside the range becomes `?`.
pub fn to_latin1_lossy(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\r')
        .map(|c| match c {
            '\n' | ' '..='~' | '\u{a0}'..='\u{ff}' => c,
            '\t' => ' ',
            _ => '?',
        })
        .collect()
}
