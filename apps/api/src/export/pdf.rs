use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};

use crate::errors::AppError;
use crate::export::text_metrics::split_text_to_size;
use crate::export::{sub_score_text, ExportDocument, ExportMode, ExportRow};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_X_MM: f32 = 14.0;
const INDENT_X_MM: f32 = 18.0;
const TOP_Y_MM: f32 = 20.0;
const BOTTOM_Y_MM: f32 = 280.0;
const WRAP_WIDTH_MM: f32 = 180.0;
const LINE_HEIGHT_MM: f32 = 5.0;
const TABLE_ROW_MM: f32 = 7.0;

/// The first candidate starts a new page when the rankings table ends below this.
const TABLE_BREAK_Y_MM: f32 = 240.0;
const QUESTIONS_BREAK_Y_MM: f32 = 240.0;
const REASONING_BREAK_Y_MM: f32 = 220.0;

const AI_COLUMNS: [(&str, f32); 5] = [
    ("Rank", 15.0),
    ("Name", 40.0),
    ("Score", 20.0),
    ("Recommendation", 60.0),
    ("Breakdown", 35.0),
];
const REGEX_COLUMNS: [(&str, f32); 4] = [
    ("Rank", 15.0),
    ("Name", 60.0),
    ("Score", 20.0),
    ("Recommendation", 75.0),
];

/// Renders the report as an A4 PDF.
pub fn render_pdf(document: &ExportDocument) -> Result<Vec<u8>, AppError> {
    let writer = layout(document).map_err(pdf_error)?;
    writer.doc.save_to_bytes().map_err(pdf_error)
}

fn pdf_error(e: printpdf::Error) -> AppError {
    AppError::Export(format!("pdf: {e}"))
}

/// Writes text top-down; `y` values are millimetres from the top edge.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    pages: usize,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self, printpdf::Error> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            pages: 1,
        })
    }

    fn add_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.pages += 1;
    }

    fn text(&self, text: &str, size: f32, x: f32, y: f32) {
        self.layer
            .use_text(text, size, Mm(x), Mm(PAGE_HEIGHT_MM - y), &self.regular);
    }

    fn heading(&self, text: &str, size: f32, x: f32, y: f32) {
        self.layer
            .use_text(text, size, Mm(x), Mm(PAGE_HEIGHT_MM - y), &self.bold);
    }

    /// Writes wrapped lines at 10pt and returns the next free `y`.
    fn wrapped(&mut self, text: &str, x: f32, mut y: f32) -> f32 {
        for line in split_text_to_size(text, 10.0, WRAP_WIDTH_MM) {
            if y > BOTTOM_Y_MM {
                self.add_page();
                y = TOP_Y_MM;
            }
            self.text(&line, 10.0, x, y);
            y += LINE_HEIGHT_MM;
        }
        y
    }
}

fn layout(document: &ExportDocument) -> Result<PageWriter, printpdf::Error> {
    let mut w = PageWriter::new("Candidate Evaluation Report")?;

    w.heading("Candidate Evaluation Report", 20.0, MARGIN_X_MM, 20.0);
    w.text(&format!("Job Title: {}", document.job_title), 12.0, MARGIN_X_MM, 30.0);
    w.text(
        &format!("Evaluation Mode: {}", document.mode.label()),
        12.0,
        MARGIN_X_MM,
        36.0,
    );
    w.text(
        &format!("Date: {}", document.date.format("%Y-%m-%d")),
        12.0,
        MARGIN_X_MM,
        42.0,
    );

    w.heading("Summary", 14.0, MARGIN_X_MM, 52.0);
    let counts = [
        format!("Total Candidates: {}", document.total_candidates),
        format!("Advance to Interview: {}", document.advance_to_interview),
        format!("Phone Screen First: {}", document.phone_screen),
        format!("Declined: {}", document.declined),
    ];
    for (i, line) in counts.iter().enumerate() {
        w.text(line, 11.0, MARGIN_X_MM, 58.0 + 6.0 * i as f32);
    }

    let mut y = 82.0;
    if let (ExportMode::Ai, Some(usage)) = (document.mode, document.usage) {
        w.text(&format!("Total Cost: ${:.4}", usage.cost), 11.0, MARGIN_X_MM, y);
        y += 6.0;
    }

    y += 8.0;
    w.heading("Candidate Rankings", 14.0, MARGIN_X_MM, y);
    y += 6.0;
    let table_end = rankings_table(&mut w, document, y);

    if document.mode == ExportMode::Ai {
        for (index, row) in document.rows.iter().enumerate() {
            let start = if index > 0 || table_end > TABLE_BREAK_Y_MM {
                w.add_page();
                TOP_Y_MM
            } else {
                table_end + 10.0
            };
            candidate_detail(&mut w, index, row, start);
        }
    }

    Ok(w)
}

fn rankings_table(w: &mut PageWriter, document: &ExportDocument, mut y: f32) -> f32 {
    let columns: &[(&str, f32)] = match document.mode {
        ExportMode::Ai => &AI_COLUMNS,
        ExportMode::Regex => &REGEX_COLUMNS,
    };

    y += TABLE_ROW_MM / 2.0;
    table_header(w, columns, y);
    y += TABLE_ROW_MM;

    for (index, row) in document.rows.iter().enumerate() {
        if y > BOTTOM_Y_MM {
            w.add_page();
            y = TOP_Y_MM;
            table_header(w, columns, y);
            y += TABLE_ROW_MM;
        }
        let mut cells = vec![
            (index + 1).to_string(),
            row.name.clone(),
            row.score.to_string(),
            row.recommendation.clone(),
        ];
        if document.mode == ExportMode::Ai {
            cells.push(format!(
                "Q:{} E:{} R:{}",
                sub_score_text(row.qualifications_score),
                sub_score_text(row.experience_score),
                sub_score_text(row.risk_flags_score)
            ));
        }

        let mut x = MARGIN_X_MM;
        for (cell, (_, width)) in cells.iter().zip(columns) {
            let fitted = split_text_to_size(cell, 9.0, width - 2.0);
            let first = fitted.first().map(String::as_str).unwrap_or_default();
            w.text(first, 9.0, x, y);
            x += width;
        }
        y += TABLE_ROW_MM;
    }

    y
}

fn table_header(w: &PageWriter, columns: &[(&str, f32)], y: f32) {
    let mut x = MARGIN_X_MM;
    for (title, width) in columns {
        w.heading(title, 9.0, x, y);
        x += width;
    }
}

fn candidate_detail(w: &mut PageWriter, index: usize, row: &ExportRow, mut y: f32) {
    w.heading(&format!("{}. {}", index + 1, row.name), 14.0, MARGIN_X_MM, y);
    y += 8.0;
    w.text(
        &format!("Score: {}/100 | {}", row.score, row.recommendation),
        11.0,
        MARGIN_X_MM,
        y,
    );

    y += 8.0;
    w.heading("Key Strengths:", 12.0, MARGIN_X_MM, y);
    y += 6.0;
    for strength in &row.key_strengths {
        y = w.wrapped(&format!("- {strength}"), INDENT_X_MM, y);
    }

    y += 4.0;
    w.heading("Key Concerns:", 12.0, MARGIN_X_MM, y);
    y += 6.0;
    for concern in &row.key_concerns {
        y = w.wrapped(&format!("- {concern}"), INDENT_X_MM, y);
    }

    if y > QUESTIONS_BREAK_Y_MM {
        w.add_page();
        y = TOP_Y_MM;
    }
    y += 4.0;
    w.heading("Suggested Interview Questions:", 12.0, MARGIN_X_MM, y);
    y += 6.0;
    for (qi, question) in row.interview_questions.iter().enumerate() {
        y = w.wrapped(&format!("{}. {}", qi + 1, question), INDENT_X_MM, y);
    }

    if let Some(reasoning) = &row.reasoning {
        if y > REASONING_BREAK_Y_MM {
            w.add_page();
            y = TOP_Y_MM;
        }
        y += 4.0;
        w.heading("AI Reasoning:", 12.0, MARGIN_X_MM, y);
        y += 6.0;
        w.wrapped(reasoning, MARGIN_X_MM, y);
    }
}
