//! Glyph width metrics for the built-in Helvetica fonts.
//!
//! Right-aligned invoice cells need real text widths. The built-in PDF
//! fonts have fixed, published metrics (the Adobe AFM files), so the
//! printable ASCII widths are embedded here in thousandths of the font
//! size. Characters outside the table fall back to an average glyph width.

/// Points-to-millimeters conversion factor (1 pt = 1/72 inch).
pub const PT_TO_MM: f32 = 25.4 / 72.0;

const FIRST_CHAR: usize = 32;
const FALLBACK_WIDTH: u16 = 556;

/// Helvetica widths for ASCII 32..=126, in 1/1000 of the font size.
#[rustfmt::skip]
static HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278,
    584, 584, 584, 556, 1015, 667, 667, 722, 722, 667, 611, 778, 722, 278,
    500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556,
    278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
    278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold widths for ASCII 32..=126, in 1/1000 of the font size.
#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333,
    584, 584, 584, 611, 975, 722, 722, 722, 722, 667, 611, 778, 722, 278,
    556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556,
    333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556,
    333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn glyph_width(table: &[u16; 95], c: char) -> u16 {
    (c as usize)
        .checked_sub(FIRST_CHAR)
        .and_then(|index| table.get(index).copied())
        .unwrap_or(FALLBACK_WIDTH)
}

/// Returns the rendered width of `text` in millimeters at `font_size` points.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn text_width_mm(text: &str, font_size: f32, bold: bool) -> f32 {
    let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
    let units: u32 = text.chars().map(|c| u32::from(glyph_width(table, c))).sum();
    units as f32 / 1000.0 * font_size * PT_TO_MM
}
