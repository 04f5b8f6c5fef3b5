//! Receipt rendering to a plain PDF 1.4 document.
//!
//! Only the built-in Helvetica font is used, so the file needs no embedded
//! font data. Text is written with WinAnsi encoding: Latin-1 characters are
//! kept, everything else becomes `?`.

use std::fmt::Write as _;

use crate::domain::errors::DomainError;
use crate::domain::money::checked_sum;
use crate::domain::ports::ReceiptRenderer;
use crate::domain::purchase::{Purchase, ReceiptLine};

pub const DEFAULT_LINE_LIMIT_CHARS: usize = 20;

/// Width of the product column, in characters. Names are wrapped to it.
const NAME_COLUMN_CHARS: usize = 14;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const LINE_HEIGHT: f32 = 14.0;
const BODY_FONT: f32 = 10.0;
const TITLE_FONT: f32 = 18.0;

const COL_PRODUCT: f32 = MARGIN;
const COL_TYPE: f32 = 200.0;
const COL_QUANTITY: f32 = 320.0;
const COL_UNIT: f32 = 380.0;
const COL_TOTAL: f32 = 470.0;

#[derive(Debug, Clone)]
pub struct PdfReceiptRenderer {
    line_limit_chars: usize,
}

impl PdfReceiptRenderer {
    pub fn new(line_limit_chars: usize) -> Self {
        Self {
            line_limit_chars: line_limit_chars.max(1),
        }
    }
}

impl Default for PdfReceiptRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_LIMIT_CHARS)
    }
}

impl ReceiptRenderer for PdfReceiptRenderer {
    fn render(&self, purchase: &Purchase, lines: &[ReceiptLine]) -> Result<Vec<u8>, DomainError> {
        let grand_total = checked_sum(lines.iter().map(|l| l.total_price))?;

        let mut header = vec![
            Row::single(COL_PRODUCT, "Purchase Receipt").sized(TITLE_FONT),
            Row::blank(),
            Row::single(COL_PRODUCT, format!("Purchase: {}", purchase.id)),
            Row::single(
                COL_PRODUCT,
                format!(
                    "Date: {}",
                    purchase.transaction_date.format("%Y-%m-%d %H:%M UTC")
                ),
            ),
            Row::single(COL_PRODUCT, format!("Ship to: {}", purchase.address.street())),
            Row::single(
                COL_PRODUCT,
                format!(
                    "         {}, {}, {}",
                    purchase.address.commune(),
                    purchase.address.city(),
                    purchase.address.country()
                ),
            ),
            Row::blank(),
        ];
        header.extend(table_header());

        let mut body = Vec::new();
        for line in lines {
            let name = fit_to_limit(&line.product_name, self.line_limit_chars);
            let mut name_rows = wrap_words(&name, NAME_COLUMN_CHARS).into_iter();
            let first = name_rows.next().unwrap_or_default();
            body.push(Row {
                cells: vec![
                    (COL_PRODUCT, first),
                    (
                        COL_TYPE,
                        fit_to_limit(&line.product_type, NAME_COLUMN_CHARS),
                    ),
                    (COL_QUANTITY, line.quantity.to_string()),
                    (COL_UNIT, line.unit_price.to_string()),
                    (COL_TOTAL, line.total_price.to_string()),
                ],
                size: BODY_FONT,
            });
            body.extend(name_rows.map(|rest| Row::single(COL_PRODUCT, rest)));
        }

        let footer = vec![
            Row::single(COL_PRODUCT, rule()),
            Row {
                cells: vec![
                    (COL_UNIT, "Total".to_string()),
                    (COL_TOTAL, grand_total.to_string()),
                ],
                size: BODY_FONT,
            },
        ];

        let pages = paginate(header, body, footer);
        Ok(write_document(&pages))
    }
}

/// Shortens `text` to `limit` characters, marking the cut with an ellipsis.
pub fn fit_to_limit(text: &str, limit: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str("...");
    cut
}

/// Greedy word wrap. Words longer than `width` are split.
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                rows.push(std::mem::take(&mut current));
            }
            rows.push(word.drain(..width).collect());
        }
        if word.is_empty() {
            continue;
        }
        let needed = if current.is_empty() {
            word.len()
        } else {
            current.chars().count() + 1 + word.len()
        };
        if needed > width {
            rows.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }
    if !current.is_empty() || rows.is_empty() {
        rows.push(current);
    }
    rows
}

#[derive(Debug, Clone)]
struct Row {
    cells: Vec<(f32, String)>,
    size: f32,
}

impl Row {
    fn single(x: f32, text: impl Into<String>) -> Self {
        Row {
            cells: vec![(x, text.into())],
            size: BODY_FONT,
        }
    }

    fn blank() -> Self {
        Row {
            cells: Vec::new(),
            size: BODY_FONT,
        }
    }

    fn sized(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    fn height(&self) -> f32 {
        self.size.max(BODY_FONT) + (LINE_HEIGHT - BODY_FONT)
    }
}

fn rule() -> String {
    "-".repeat(96)
}

fn table_header() -> Vec<Row> {
    vec![
        Row {
            cells: vec![
                (COL_PRODUCT, "Product".to_string()),
                (COL_TYPE, "Type".to_string()),
                (COL_QUANTITY, "Qty".to_string()),
                (COL_UNIT, "Unit price".to_string()),
                (COL_TOTAL, "Total".to_string()),
            ],
            size: BODY_FONT,
        },
        Row::single(COL_PRODUCT, rule()),
    ]
}

/// Splits rows into pages. Continuation pages repeat the table header and the
/// footer is never split.
fn paginate(header: Vec<Row>, body: Vec<Row>, footer: Vec<Row>) -> Vec<Vec<Row>> {
    let usable = PAGE_HEIGHT - 2.0 * MARGIN - LINE_HEIGHT;
    let mut pages: Vec<Vec<Row>> = Vec::new();
    let mut page = header;
    let mut used: f32 = page.iter().map(Row::height).sum();

    let mut break_page = |page: &mut Vec<Row>, used: &mut f32| {
        pages.push(std::mem::replace(page, table_header()));
        *used = page.iter().map(Row::height).sum();
    };

    for row in body {
        if used + row.height() > usable {
            break_page(&mut page, &mut used);
        }
        used += row.height();
        page.push(row);
    }

    let footer_height: f32 = footer.iter().map(Row::height).sum();
    if used + footer_height > usable {
        break_page(&mut page, &mut used);
    }
    page.extend(footer);

    pages.push(page);
    pages
}

fn page_content(rows: &[Row], page_no: usize, page_count: usize) -> String {
    let mut out = String::new();
    let mut y = PAGE_HEIGHT - MARGIN;
    for row in rows {
        y -= row.height();
        for (x, text) in &row.cells {
            let _ = writeln!(
                out,
                "BT /F1 {:.1} Tf {:.2} {:.2} Td ({}) Tj ET",
                row.size,
                x,
                y,
                escape_text(text)
            );
        }
    }
    let _ = writeln!(
        out,
        "BT /F1 8.0 Tf {:.2} {:.2} Td (Page {} of {}) Tj ET",
        PAGE_WIDTH - MARGIN - 60.0,
        MARGIN / 2.0,
        page_no,
        page_count
    );
    out
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(out, "\\{:03o}", u32::from(c));
            }
            _ => out.push('?'),
        }
    }
    out
}

/// Serializes pages into a complete PDF file with a valid cross-reference table.
fn write_document(pages: &[Vec<Row>]) -> Vec<u8> {
    let page_count = pages.len();
    // 1: catalog, 2: page tree, 3: font, then a (page, content) pair per page.
    let page_ids: Vec<usize> = (0..page_count).map(|i| 4 + 2 * i).collect();

    let mut objects: Vec<String> = Vec::with_capacity(3 + 2 * page_count);
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    let kids: Vec<String> = page_ids.iter().map(|id| format!("{id} 0 R")).collect();
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        page_count
    ));
    objects.push(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    );
    for (index, rows) in pages.iter().enumerate() {
        let content_id = page_ids[index] + 1;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>"
        ));
        let stream = page_content(rows, index + 1, page_count);
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            stream.len(),
            stream
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        let _ = write!(out, "{} 0 obj\n{}\nendobj\n", index + 1, body);
    }

    let xref_at = out.len();
    let _ = write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(out, "{offset:010} 00000 n \n");
    }
    let _ = write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    );
    out.into_bytes()
}
