use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet, XlsxError};

use crate::errors::AppError;
use crate::export::{numbered, sub_score_text, ExportDocument, ExportMode};

const ANALYSIS_COLUMN_WIDTHS: [f64; 5] = [20.0, 50.0, 50.0, 60.0, 80.0];

/// Builds the `Summary`, `Rankings` and (AI mode) `Detailed Analysis` sheets.
pub fn render_workbook(document: &ExportDocument) -> Result<Vec<u8>, AppError> {
    build(document).map_err(|e| AppError::Export(format!("xlsx: {e}")))
}

fn build(document: &ExportDocument) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let summary = workbook.add_worksheet();
    summary.set_name("Summary")?;
    write_summary(summary, document, &bold)?;

    let rankings = workbook.add_worksheet();
    rankings.set_name("Rankings")?;
    write_rankings(rankings, document, &bold)?;

    if document.mode == ExportMode::Ai {
        let analysis = workbook.add_worksheet();
        analysis.set_name("Detailed Analysis")?;
        write_analysis(analysis, document, &bold)?;
    }

    workbook.save_to_buffer()
}

fn write_summary(
    sheet: &mut Worksheet,
    document: &ExportDocument,
    bold: &Format,
) -> Result<(), XlsxError> {
    sheet.write_string_with_format(0, 0, "Candidate Evaluation Report", bold)?;

    let details: [(&str, String); 3] = [
        ("Job Title", document.job_title.clone()),
        ("Evaluation Mode", document.mode.label().to_string()),
        ("Evaluation Date", document.date.format("%Y-%m-%d").to_string()),
    ];
    let mut row = 2;
    for (label, value) in details {
        sheet.write_string(row, 0, label)?;
        sheet.write_string(row, 1, value)?;
        row += 1;
    }
    sheet.write_string(row, 0, "Total Candidates")?;
    sheet.write_number(row, 1, document.total_candidates as f64)?;

    row += 2;
    sheet.write_string_with_format(row, 0, "Results Summary", bold)?;
    let counts = [
        ("Advance to Interview", document.advance_to_interview),
        ("Phone Screen First", document.phone_screen),
        ("Declined", document.declined),
    ];
    for (label, count) in counts {
        row += 1;
        sheet.write_string(row, 0, label)?;
        sheet.write_number(row, 1, count as f64)?;
    }

    if let (ExportMode::Ai, Some(usage)) = (document.mode, document.usage) {
        row += 2;
        sheet.write_string_with_format(row, 0, "Cost Analysis", bold)?;
        sheet.write_string(row + 1, 0, "Total Cost")?;
        sheet.write_string(row + 1, 1, format!("${:.4}", usage.cost))?;
        sheet.write_string(row + 2, 0, "Avg Cost per Candidate")?;
        sheet.write_string(row + 2, 1, format!("${:.4}", usage.avg_cost_per_candidate))?;
        sheet.write_string(row + 3, 0, "Input Tokens")?;
        sheet.write_number(row + 3, 1, usage.input_tokens as f64)?;
        sheet.write_string(row + 4, 0, "Output Tokens")?;
        sheet.write_number(row + 4, 1, usage.output_tokens as f64)?;
    }

    sheet.set_column_width(0, 24)?;
    sheet.set_column_width(1, 40)?;
    Ok(())
}

fn write_rankings(
    sheet: &mut Worksheet,
    document: &ExportDocument,
    bold: &Format,
) -> Result<(), XlsxError> {
    let mut headers = vec!["Rank", "Candidate Name", "Score", "Recommendation"];
    match document.mode {
        ExportMode::Ai => {
            headers.extend(["Qualifications Score", "Experience Score", "Risk Flags Score"])
        }
        ExportMode::Regex => headers.extend(["Matched Keywords", "Missing Keywords"]),
    }
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, bold)?;
    }

    for (index, candidate) in document.rows.iter().enumerate() {
        let row = index as u32 + 1;
        sheet.write_number(row, 0, (index + 1) as f64)?;
        sheet.write_string(row, 1, &candidate.name)?;
        sheet.write_number(row, 2, candidate.score)?;
        sheet.write_string(row, 3, &candidate.recommendation)?;

        match document.mode {
            ExportMode::Ai => {
                let sub_scores = [
                    candidate.qualifications_score,
                    candidate.experience_score,
                    candidate.risk_flags_score,
                ];
                for (offset, value) in sub_scores.into_iter().enumerate() {
                    let col = 4 + offset as u16;
                    match value {
                        Some(v) => sheet.write_number(row, col, v)?,
                        None => sheet.write_string(row, col, sub_score_text(None))?,
                    };
                }
            }
            ExportMode::Regex => {
                sheet.write_string(row, 4, candidate.matched_keywords.join(", "))?;
                sheet.write_string(row, 5, candidate.missing_keywords.join(", "))?;
            }
        }
    }

    sheet.set_column_width(1, 30)?;
    sheet.set_column_width(3, 20)?;
    Ok(())
}

fn write_analysis(
    sheet: &mut Worksheet,
    document: &ExportDocument,
    bold: &Format,
) -> Result<(), XlsxError> {
    let wrapped = Format::new().set_text_wrap().set_align(FormatAlign::Top);
    let headers = [
        "Candidate",
        "Key Strengths",
        "Key Concerns",
        "Interview Questions",
        "Reasoning",
    ];
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, bold)?;
    }

    for (index, candidate) in document.rows.iter().enumerate() {
        let row = index as u32 + 1;
        let cells = [
            candidate.name.clone(),
            numbered(&candidate.key_strengths),
            numbered(&candidate.key_concerns),
            numbered(&candidate.interview_questions),
            candidate.reasoning.clone().unwrap_or_default(),
        ];
        for (col, value) in cells.into_iter().enumerate() {
            sheet.write_string_with_format(row, col as u16, value, &wrapped)?;
        }
    }

    for (col, width) in ANALYSIS_COLUMN_WIDTHS.into_iter().enumerate() {
        sheet.set_column_width(col as u16, width)?;
    }
    Ok(())
}
