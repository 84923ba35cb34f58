//! Monthly PDF report rendering

use std::io::BufWriter;

use chrono::{DateTime, Datelike, Utc};
use printpdf::*;

use crate::analytics::period::{month_name, previous_month, previous_month_window, server_zone};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{Transaction, TransactionType, User};

// US Letter dimensions (mm)
const PAGE_W: f32 = 215.9;
const PAGE_H: f32 = 279.4;
const MARGIN_TOP: f32 = 25.4;
const MARGIN_BOTTOM: f32 = 25.4;
const MARGIN_LEFT: f32 = 19.05;
const MARGIN_RIGHT: f32 = 19.05;
const ROW_H: f32 = 5.0;
const FONT_SIZE: f32 = 9.0;
const TITLE_SIZE: f32 = 16.0;
const SUBTITLE_SIZE: f32 = 10.0;

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.len() as f32 * size * 0.18
}

fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

struct Col {
    width: f32,
    align: Align,
}

/// Everything the renderer needs for one user's report
pub struct MonthlyReport<'a> {
    pub user: &'a User,
    /// Transactions of the report month, oldest first
    pub transactions: &'a [Transaction],
    pub total_income: f64,
    pub total_expense: f64,
    pub month_name: &'a str,
    pub year: i32,
    /// Shown as the generation date in the header
    pub generated_on: chrono::NaiveDate,
}

impl MonthlyReport<'_> {
    pub fn net_balance(&self) -> f64 {
        self.total_income - self.total_expense
    }
}

struct ReportWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    current_page: PdfPageIndex,
    current_layer: PdfLayerIndex,
    y: f32,
}

impl ReportWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| Error::Pdf(format!("{e:?}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| Error::Pdf(format!("{e:?}")))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            current_page: page,
            current_layer: layer,
            y: MARGIN_TOP,
        })
    }

    fn pdf_y(&self) -> f32 {
        PAGE_H - self.y
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer");
        self.current_page = page;
        self.current_layer = layer;
        self.y = MARGIN_TOP;
    }

    fn ensure_space(&mut self, needed: f32) {
        if self.y + needed > PAGE_H - MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn text(&self, s: &str, x: f32, size: f32, bold: bool) {
        let font = if bold {
            self.font_bold.clone()
        } else {
            self.font.clone()
        };
        let layer = self
            .doc
            .get_page(self.current_page)
            .get_layer(self.current_layer);
        layer.use_text(s, size, Mm(x), Mm(self.pdf_y()), &font);
    }

    fn hline(&self, x1: f32, x2: f32) {
        let layer = self
            .doc
            .get_page(self.current_page)
            .get_layer(self.current_layer);
        layer.set_outline_thickness(0.5);
        let line = Line {
            points: vec![
                (Point::new(Mm(x1), Mm(self.pdf_y())), false),
                (Point::new(Mm(x2), Mm(self.pdf_y())), false),
            ],
            is_closed: false,
        };
        layer.add_line(line);
    }

    fn header(&mut self, report: &MonthlyReport<'_>) {
        self.text("Monthly Financial Report", MARGIN_LEFT, TITLE_SIZE, true);
        self.y += 7.0;
        self.text(
            &format!("For {}", report.user.name),
            MARGIN_LEFT,
            SUBTITLE_SIZE,
            false,
        );
        self.y += 5.0;
        self.text(
            &format!("Email: {}", report.user.email),
            MARGIN_LEFT,
            SUBTITLE_SIZE,
            false,
        );
        self.y += 5.0;
        self.text(
            &format!("Report Period: {} {}", report.month_name, report.year),
            MARGIN_LEFT,
            SUBTITLE_SIZE,
            false,
        );
        self.y += 5.0;
        self.text(
            &report
                .generated_on
                .format("Generated On: %Y-%m-%d")
                .to_string(),
            MARGIN_LEFT,
            8.0,
            false,
        );
        self.y += 5.0;
        self.hline(MARGIN_LEFT, PAGE_W - MARGIN_RIGHT);
        self.y += 6.0;
    }

    fn section_label(&mut self, label: &str) {
        self.ensure_space(ROW_H * 2.0);
        self.text(label, MARGIN_LEFT, SUBTITLE_SIZE + 2.0, true);
        self.y += ROW_H + 2.0;
    }

    /// Three stat columns across the page width
    fn summary_row(&mut self, entries: &[(&str, String)]) {
        self.ensure_space(ROW_H * 3.0);
        let col_w = (PAGE_W - MARGIN_LEFT - MARGIN_RIGHT) / entries.len() as f32;

        let mut x = MARGIN_LEFT;
        for (label, _) in entries {
            self.text(label, x, FONT_SIZE, false);
            x += col_w;
        }
        self.y += ROW_H;

        let mut x = MARGIN_LEFT;
        for (_, value) in entries {
            self.text(value, x, SUBTITLE_SIZE + 2.0, true);
            x += col_w;
        }
        self.y += ROW_H + 3.0;
    }

    fn table_header(&mut self, cols: &[Col], headers: &[&str]) {
        self.ensure_space(ROW_H * 2.0);
        let mut x = MARGIN_LEFT;
        for (i, col) in cols.iter().enumerate() {
            if i < headers.len() {
                match col.align {
                    Align::Left => self.text(headers[i], x, FONT_SIZE, true),
                    Align::Right => {
                        let tw = approx_text_width(headers[i], FONT_SIZE);
                        self.text(headers[i], x + col.width - tw, FONT_SIZE, true);
                    }
                }
            }
            x += col.width;
        }
        self.y += ROW_H;
        self.hline(MARGIN_LEFT, PAGE_W - MARGIN_RIGHT);
        self.y += 2.0;
    }

    fn table_row(&mut self, cols: &[Col], values: &[&str]) {
        self.ensure_space(ROW_H);
        let mut x = MARGIN_LEFT;
        for (i, col) in cols.iter().enumerate() {
            if i < values.len() {
                match col.align {
                    Align::Left => self.text(values[i], x, FONT_SIZE, false),
                    Align::Right => {
                        let tw = approx_text_width(values[i], FONT_SIZE);
                        self.text(values[i], x + col.width - tw, FONT_SIZE, false);
                    }
                }
            }
            x += col.width;
        }
        self.y += ROW_H;
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| Error::Pdf(format!("{e:?}")))?;
        buf.into_inner().map_err(|e| Error::Pdf(e.to_string()))
    }
}

/// Render a user's monthly report to PDF bytes
pub fn render_monthly_report(report: &MonthlyReport<'_>) -> Result<Vec<u8>> {
    let mut pdf = ReportWriter::new("Monthly Financial Report")?;
    pdf.header(report);

    pdf.section_label("Summary");
    pdf.summary_row(&[
        ("Total Income", money(report.total_income)),
        ("Total Expense", money(report.total_expense)),
        ("Net Balance", money(report.net_balance())),
    ]);

    pdf.section_label("Transactions");
    let cols = &[
        Col { width: 28.0, align: Align::Left },   // date
        Col { width: 68.0, align: Align::Left },   // description
        Col { width: 32.0, align: Align::Left },   // category
        Col { width: 22.0, align: Align::Left },   // type
        Col { width: 27.8, align: Align::Right },  // amount
    ];
    pdf.table_header(cols, &["Date", "Description", "Category", "Type", "Amount"]);

    for tx in report.transactions {
        let date = tx.date.format("%Y-%m-%d").to_string();
        let tx_type = match tx.tx_type {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        };
        let amount = money(tx.amount);
        pdf.table_row(
            cols,
            &[&date, &tx.description, tx.category.as_str(), tx_type, &amount],
        );
    }

    pdf.to_bytes()
}

/// Assemble and render the previous calendar month's report for one user.
/// Returns None when the month had no activity (no report is sent then).
pub fn previous_month_report(
    db: &Database,
    user: &User,
    now: DateTime<Utc>,
) -> Result<Option<(String, i32, Vec<u8>)>> {
    let window = previous_month_window(now, server_zone());
    let mut transactions = db.find_transactions(user.id, Some(window), None)?;
    if transactions.is_empty() {
        return Ok(None);
    }
    // The table reads oldest first
    transactions.reverse();

    let mut total_income = 0.0;
    let mut total_expense = 0.0;
    for tx in &transactions {
        match tx.tx_type {
            TransactionType::Income => total_income += tx.amount,
            TransactionType::Expense => total_expense += tx.amount,
        }
    }

    let local = now.with_timezone(&server_zone());
    let (year, month) = previous_month(local.year(), local.month());
    let name = month_name(month);

    let report = MonthlyReport {
        user,
        transactions: &transactions,
        total_income,
        total_expense,
        month_name: name,
        year,
        generated_on: now.date_naive(),
    };

    let bytes = render_monthly_report(&report)?;
    Ok(Some((name.to_string(), year, bytes)))
}
