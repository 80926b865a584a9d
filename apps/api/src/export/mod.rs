//! Results export to spreadsheet and PDF. Rendering is a pure function of an
//! [`ExportDocument`]; nothing here touches the store.

pub mod handlers;
pub mod pdf;
pub mod text_metrics;
pub mod xlsx;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::AppError;
use crate::evaluation::keyword::KeywordReport;
use crate::models::evaluation::UsageTotals;
use crate::results::ResultsReport;

pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    #[default]
    Ai,
    Regex,
}

impl ExportMode {
    pub fn label(&self) -> &'static str {
        match self {
            ExportMode::Ai => "AI Evaluation",
            ExportMode::Regex => "Regex Keyword Matching",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

/// One ranked line of the export. AI-only and regex-only fields are left
/// empty in the other mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportRow {
    pub name: String,
    pub score: f64,
    pub recommendation: String,
    pub qualifications_score: Option<f64>,
    pub experience_score: Option<f64>,
    pub risk_flags_score: Option<f64>,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub key_strengths: Vec<String>,
    pub key_concerns: Vec<String>,
    pub interview_questions: Vec<String>,
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub job_title: String,
    pub mode: ExportMode,
    pub date: NaiveDate,
    pub total_candidates: usize,
    pub advance_to_interview: usize,
    pub phone_screen: usize,
    pub declined: usize,
    /// Present in AI mode only.
    pub usage: Option<UsageTotals>,
    /// In rank order.
    pub rows: Vec<ExportRow>,
}

impl ExportDocument {
    pub fn from_results(report: &ResultsReport, date: NaiveDate) -> Self {
        let rows = report
            .candidates
            .iter()
            .map(|ranked| {
                let evaluation = ranked.evaluation.as_ref();
                ExportRow {
                    name: ranked.candidate.name.clone(),
                    score: ranked.score().unwrap_or(0.0),
                    recommendation: ranked
                        .recommendation()
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                    qualifications_score: evaluation.and_then(|e| e.sub_scores.qualifications),
                    experience_score: evaluation.and_then(|e| e.sub_scores.experience),
                    risk_flags_score: evaluation.and_then(|e| e.sub_scores.risk_flags),
                    key_strengths: evaluation.map(|e| e.key_strengths.clone()).unwrap_or_default(),
                    key_concerns: evaluation.map(|e| e.concerns.clone()).unwrap_or_default(),
                    interview_questions: evaluation
                        .map(|e| e.interview_questions.clone())
                        .unwrap_or_default(),
                    reasoning: evaluation.and_then(|e| e.reasoning.clone()),
                    ..Default::default()
                }
            })
            .collect();

        ExportDocument {
            job_title: report.job.title.clone(),
            mode: ExportMode::Ai,
            date,
            total_candidates: report.summary.total,
            advance_to_interview: report.summary.advance_to_interview,
            phone_screen: report.summary.phone_screen,
            declined: report.summary.declined,
            usage: Some(report.usage),
            rows,
        }
    }

    pub fn from_keywords(job_title: &str, report: &KeywordReport, date: NaiveDate) -> Self {
        let rows = report
            .results
            .iter()
            .map(|result| ExportRow {
                name: result.name.clone(),
                score: result.score,
                recommendation: result.recommendation.to_string(),
                matched_keywords: result.matched_keywords.clone(),
                missing_keywords: result.missing_keywords.clone(),
                ..Default::default()
            })
            .collect();

        ExportDocument {
            job_title: job_title.to_string(),
            mode: ExportMode::Regex,
            date,
            total_candidates: report.summary.total_candidates,
            advance_to_interview: report.summary.advance_to_interview,
            phone_screen: report.summary.phone_screen,
            declined: report.summary.declined,
            usage: None,
            rows,
        }
    }
}

/// `evaluation_<sanitised title>_<YYYY-MM-DD>.<ext>`: every non-alphanumeric
/// character of the title becomes `_`, then the result is lower-cased.
pub fn export_filename(job_title: &str, date: NaiveDate, format: ExportFormat) -> String {
    let sanitized: String = job_title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .to_lowercase();
    format!(
        "evaluation_{}_{}.{}",
        sanitized,
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

pub fn render(document: &ExportDocument, format: ExportFormat) -> Result<Vec<u8>, AppError> {
    match format {
        ExportFormat::Xlsx => xlsx::render_workbook(document),
        ExportFormat::Pdf => pdf::render_pdf(document),
    }
}

pub(crate) fn sub_score_text(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
}

pub(crate) fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}
