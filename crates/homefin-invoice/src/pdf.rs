//! Invoice PDF rendering with the built-in Helvetica fonts.
//!
//! The layout is a single-column A4 sheet: title block, issuing address,
//! bill-to/ship-to columns, an itemized table of weekly line items, and a
//! terms block anchored near the page bottom. Table rows flow onto new
//! pages when they would cross the bottom margin.

use chrono::NaiveDate;
use homefin_common::types::Address;
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Rect, Rgb,
};
use thiserror::Error;

use crate::billing::WeekBill;
use crate::metrics;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const BOTTOM_MARGIN: f32 = 20.0;
const CELL_PADDING: f32 = 1.0;

/// Helvetica cap height from the AFM metrics, as a fraction of the em.
const CAP_HEIGHT_RATIO: f32 = 0.718;

const SIZE_TITLE: f32 = 24.0;
const SIZE_NAME: f32 = 15.0;
const SIZE_BODY: f32 = 10.0;

const NET_DAYS: u32 = 15;
const LAYER_NAME: &str = "invoice";

type Tint = (f32, f32, f32);

const BLACK: Tint = (0.0, 0.0, 0.0);
const WHITE: Tint = (1.0, 1.0, 1.0);
const ROW_GRAY: Tint = (245.0 / 255.0, 245.0 / 255.0, 245.0 / 255.0);

/// Column width fractions: quantity, description, unit price, amount.
const TABLE_COLUMNS: [f32; 4] = [0.15, 0.55, 0.15, 0.15];

/// Invoice rendering failure.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The underlying PDF writer reported an error.
    #[error("PDF generation failed: {message}")]
    Pdf {
        /// Writer error description.
        message: String,
    },
}

fn pdf_error(err: impl std::fmt::Display) -> RenderError {
    RenderError::Pdf {
        message: err.to_string(),
    }
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

#[derive(Clone, Copy)]
struct CellStyle {
    size: f32,
    bold: bool,
    align: Align,
    fill: Option<Tint>,
    ink: Tint,
}

impl CellStyle {
    const fn new(size: f32) -> Self {
        Self {
            size,
            bold: false,
            align: Align::Left,
            fill: None,
            ink: BLACK,
        }
    }

    const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    const fn right(mut self) -> Self {
        self.align = Align::Right;
        self
    }

    const fn filled(mut self, fill: Tint) -> Self {
        self.fill = Some(fill);
        self
    }

    /// White text on a black band, used for section headers.
    const fn inverted(mut self) -> Self {
        self.fill = Some(BLACK);
        self.ink = WHITE;
        self
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Top-down drawing cursor over the document. `y` is measured from the top
/// of the page in millimeters; PDF coordinates grow upward, so every draw
/// call converts.
struct Canvas<'a> {
    doc: &'a PdfDocumentReference,
    fonts: &'a Fonts,
    layer: PdfLayerReference,
    y: f32,
}

impl Canvas<'_> {
    fn line_feed(&mut self, height: f32) {
        self.y += height;
    }

    fn break_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = MARGIN;
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y + height > PAGE_HEIGHT - BOTTOM_MARGIN {
            self.break_page();
        }
    }

    fn set_ink(&self, (r, g, b): Tint) {
        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(r, g, b, None)));
    }

    /// Draws one cell without moving the cursor; multi-cell rows advance
    /// with an explicit [`Self::line_feed`].
    fn cell(&mut self, x: f32, width: f32, height: f32, text: &str, style: CellStyle) {
        if let Some(fill) = style.fill {
            self.set_ink(fill);
            let rect = Rect::new(
                Mm(x),
                Mm(PAGE_HEIGHT - self.y - height),
                Mm(x + width),
                Mm(PAGE_HEIGHT - self.y),
            )
            .with_mode(PaintMode::Fill);
            self.layer.add_rect(rect);
        }

        let text_width = metrics::text_width_mm(text, style.size, style.bold);
        let text_x = match style.align {
            Align::Left => x + CELL_PADDING,
            Align::Right => x + width - text_width - CELL_PADDING,
        };
        let cap_height = style.size * metrics::PT_TO_MM * CAP_HEIGHT_RATIO;
        let baseline = self.y + (height + cap_height) / 2.0;

        self.set_ink(style.ink);
        let font = if style.bold {
            &self.fonts.bold
        } else {
            &self.fonts.regular
        };
        self.layer.use_text(
            text,
            style.size,
            Mm(text_x),
            Mm(PAGE_HEIGHT - baseline),
            font,
        );
    }

    /// Full-width cell that advances the cursor by its height.
    fn row(&mut self, height: f32, text: &str, style: CellStyle) {
        self.cell(MARGIN, CONTENT_WIDTH, height, text, style);
        self.line_feed(height);
    }
}

/// Renders a complete invoice document and returns the PDF bytes.
///
/// The ship-to column mirrors `bill_to`, the way the generated invoices
/// have always shipped.
///
/// # Errors
///
/// Returns an error when the PDF writer fails to assemble the document.
pub fn render_invoice(
    corporation: &Address,
    bill_to: &Address,
    bills: &[WeekBill],
    invoice_number: i64,
    invoice_date: NaiveDate,
) -> Result<Vec<u8>, RenderError> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Invoice {invoice_number}"),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        LAYER_NAME,
    );
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?,
    };
    let mut canvas = Canvas {
        doc: &doc,
        fonts: &fonts,
        layer: doc.get_page(page).get_layer(layer),
        y: MARGIN,
    };

    draw_header(&mut canvas, corporation, invoice_number, invoice_date);
    draw_addresses(&mut canvas, bill_to, bill_to);
    draw_item_table(&mut canvas, bills);

    canvas.line_feed(5.0);
    canvas.row(
        10.0,
        &format!("Make all checks payable to {}", corporation.company_name),
        CellStyle::new(SIZE_BODY),
    );
    draw_terms(&mut canvas);

    tracing::debug!(
        items = bills.len(),
        invoice = invoice_number,
        "invoice laid out"
    );
    doc.save_to_bytes().map_err(pdf_error)
}

fn draw_header(canvas: &mut Canvas<'_>, corporation: &Address, number: i64, date: NaiveDate) {
    canvas.row(20.0, "INVOICE", CellStyle::new(SIZE_TITLE).bold());
    canvas.line_feed(5.0);
    canvas.row(10.0, &corporation.company_name, CellStyle::new(SIZE_NAME));
    canvas.row(5.0, &corporation.street, CellStyle::new(SIZE_BODY));
    canvas.row(5.0, &corporation.city_line(), CellStyle::new(SIZE_BODY));
    canvas.row(5.0, &corporation.phone_number, CellStyle::new(SIZE_BODY));
    canvas.line_feed(5.0);
    canvas.row(
        5.0,
        &format!("Date: {}", date.format("%Y-%m-%d")),
        CellStyle::new(SIZE_BODY).bold(),
    );
    canvas.row(
        5.0,
        &format!("Invoice # {number}"),
        CellStyle::new(SIZE_BODY).bold(),
    );
}

fn draw_addresses(canvas: &mut Canvas<'_>, bill_to: &Address, ship_to: &Address) {
    canvas.line_feed(5.0);

    let column = CONTENT_WIDTH / 2.0;
    let band_width = column - 2.0;
    let band = CellStyle::new(SIZE_BODY).bold().inverted();
    canvas.cell(MARGIN, band_width, 8.0, "BILL TO", band);
    canvas.cell(MARGIN + band_width + 4.0, band_width, 8.0, "SHIP TO", band);
    canvas.line_feed(8.0);

    let body = CellStyle::new(SIZE_BODY);
    let bill_city = bill_to.city_line();
    let ship_city = ship_to.city_line();
    let rows = [
        (bill_to.company_name.as_str(), ship_to.company_name.as_str()),
        (bill_to.recipient.as_str(), ship_to.recipient.as_str()),
        (bill_to.street.as_str(), ship_to.street.as_str()),
        (bill_city.as_str(), ship_city.as_str()),
    ];
    for (left, right) in rows {
        canvas.cell(MARGIN, column, 5.0, left, body);
        canvas.cell(MARGIN + column, column, 5.0, right, body);
        canvas.line_feed(5.0);
    }
}

fn draw_item_table(canvas: &mut Canvas<'_>, bills: &[WeekBill]) {
    canvas.line_feed(5.0);

    let widths = TABLE_COLUMNS.map(|fraction| CONTENT_WIDTH * fraction);
    let header = CellStyle::new(SIZE_BODY).bold().right().inverted();
    let mut x = MARGIN;
    for (label, width) in ["QUANTITY", "DESCRIPTION", "UNIT PRICE", "AMOUNT"]
        .into_iter()
        .zip(widths)
    {
        canvas.cell(x, width, 8.0, label, header);
        x += width;
    }
    canvas.line_feed(8.0);

    let mut total = 0.0;
    for (index, bill) in bills.iter().enumerate() {
        canvas.ensure_room(8.0);
        let fill = if index % 2 == 1 { ROW_GRAY } else { WHITE };
        let body = CellStyle::new(SIZE_BODY).filled(fill);

        let quantity = format!("{:.1}", bill.quantity);
        let description = format!(
            "{} - {}",
            bill.start_date.format("%B %d %Y"),
            bill.end_date.format("%B %d %Y")
        );

        canvas.cell(MARGIN, widths[0], 8.0, &quantity, body);
        canvas.cell(MARGIN + widths[0], widths[1], 8.0, &description, body.right());
        canvas.cell(
            MARGIN + widths[0] + widths[1],
            widths[2],
            8.0,
            &format_money(bill.hourly_rate),
            body.right(),
        );
        canvas.cell(
            MARGIN + widths[0] + widths[1] + widths[2],
            widths[3],
            8.0,
            &format_money(bill.amount()),
            body.right(),
        );
        canvas.line_feed(8.0);

        total += bill.amount();
    }

    canvas.ensure_room(8.0);
    let total_style = CellStyle::new(SIZE_BODY).bold().right();
    let label_width = CONTENT_WIDTH * 0.85;
    canvas.cell(MARGIN, label_width, 8.0, "Total", total_style);
    canvas.cell(
        MARGIN + label_width,
        CONTENT_WIDTH * 0.15,
        8.0,
        &format_money(total),
        total_style,
    );
    canvas.line_feed(8.0);
}

/// The terms block sits 45 mm above the page bottom unless the table has
/// already pushed past it, in which case it follows the content.
fn draw_terms(canvas: &mut Canvas<'_>) {
    if canvas.y > PAGE_HEIGHT - 50.0 {
        canvas.line_feed(10.0);
    } else {
        canvas.y = PAGE_HEIGHT - 45.0;
    }
    let style = CellStyle::new(SIZE_BODY);
    canvas.row(5.0, "Terms", style);
    canvas.row(5.0, "Thank you for your business!", style);
    canvas.row(5.0, &format!("Payment terms: Net {NET_DAYS}"), style);
}

/// Formats a dollar amount with thousands separators and two decimals.
#[must_use]
pub fn format_money(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let formatted = format!("{:.2}", amount.abs());
    let (whole, cents) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("${sign}{grouped}.{cents}")
}
