//! Keyword screen. A free, deterministic alternative to the AI evaluator.
//!
//! Scoring (0–100):
//! 1. Keywords (60): share of job keywords found in the lower-cased resume.
//!    Keywords are the must-have requirements (preferred ones when there are
//!    no must-haves) plus education and licences. No keywords → full marks.
//! 2. Experience (20): candidate years vs required years, proportional when
//!    short. No requirement → full marks; a zero-year requirement or nothing
//!    found → 0.
//! 3. Education (20): PhD / Master / Bachelor ladder, see `score_education`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

use crate::evaluation::recommendation::recommendation_for_score;
use crate::models::candidate::Candidate;
use crate::models::evaluation::Recommendation;
use crate::models::job::Job;

pub const WEIGHT_KEYWORDS: f64 = 60.0;
pub const WEIGHT_EXPERIENCE: f64 = 20.0;
pub const WEIGHT_EDUCATION: f64 = 20.0;

const MAX_LISTED_KEYWORDS: usize = 10;
/// Employment spans outside (0, 50) years are ignored.
const MAX_SPAN_YEARS: i32 = 50;

static REQUIRED_YEARS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(\d+)\s*\+?\s*years?\s+(?:of\s+)?experience",
        r"(?i)minimum\s+of\s+(\d+)\s+years?",
        r"(?i)at\s+least\s+(\d+)\s+years?",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid required-years regex"))
    .collect()
});

static CANDIDATE_YEARS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(\d+)\s*\+?\s*years?\s+(?:of\s+)?experience",
        r"(\d+)\s*\+?\s*years?\s+in\s+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid candidate-years regex"))
    .collect()
});

static DATE_RANGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{4})\s*[-–]\s*(\d{4}|present)").expect("Invalid date range regex")
});

const PHD_KEYWORDS: &[&str] = &["ph.d", "phd", "doctorate", "doctoral"];
const MASTERS_KEYWORDS: &[&str] = &["master", "m.a.", "m.s.", "mba", "m.div", "m.t.s"];
const BACHELORS_KEYWORDS: &[&str] = &["bachelor", "b.a.", "b.s.", "b.sc", "undergraduate degree"];

// ────────────────────────────────────────────────────────────────────────────
// Output models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KeywordBreakdown {
    pub required_keywords: f64,
    pub experience_years: f64,
    pub education_match: f64,
}

impl KeywordBreakdown {
    pub fn total(&self) -> f64 {
        self.required_keywords + self.experience_years + self.education_match
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordResult {
    pub candidate_id: Uuid,
    pub name: String,
    /// Whole number, 0–100.
    pub score: f64,
    pub recommendation: Recommendation,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub breakdown: KeywordBreakdown,
    pub experience_years_found: Option<u32>,
    pub experience_years_required: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeywordSummary {
    pub total_candidates: usize,
    pub advance_to_interview: usize,
    pub phone_screen: usize,
    pub declined: usize,
    pub top_candidate: Option<String>,
    pub top_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeywordReport {
    /// Score descending.
    pub results: Vec<KeywordResult>,
    pub summary: KeywordSummary,
}

// ────────────────────────────────────────────────────────────────────────────
// Screening
// ────────────────────────────────────────────────────────────────────────────

/// Screens every candidate and ranks them by score.
pub fn screen_all(job: &Job, candidates: &[Candidate], current_year: i32) -> KeywordReport {
    let mut results: Vec<KeywordResult> = candidates
        .iter()
        .map(|c| screen_candidate(job, c, current_year))
        .collect();
    results.sort_by(|a, b| b.score.total_cmp(&a.score));

    let count = |r: &Recommendation| results.iter().filter(|x| &x.recommendation == r).count();
    let summary = KeywordSummary {
        total_candidates: results.len(),
        advance_to_interview: count(&Recommendation::Interview),
        phone_screen: count(&Recommendation::PhoneScreen),
        declined: count(&Recommendation::Decline),
        top_candidate: results.first().map(|r| r.name.clone()),
        top_score: results.first().map_or(0.0, |r| r.score),
    };

    KeywordReport { results, summary }
}

pub fn screen_candidate(job: &Job, candidate: &Candidate, current_year: i32) -> KeywordResult {
    let resume = candidate
        .resume_text
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();

    let keywords = job_keywords(job);
    let (matched, missing): (Vec<String>, Vec<String>) =
        keywords.into_iter().partition(|k| resume.contains(k.as_str()));

    let required_keywords = if matched.is_empty() && missing.is_empty() {
        WEIGHT_KEYWORDS
    } else {
        matched.len() as f64 / (matched.len() + missing.len()) as f64 * WEIGHT_KEYWORDS
    };

    let required_years = extract_required_years(job);
    let candidate_years = extract_candidate_years(&resume, current_year);
    let experience_years = match (required_years, candidate_years) {
        (None, _) => WEIGHT_EXPERIENCE,
        (Some(required), Some(found)) if required > 0 && found > 0 => {
            if found >= required {
                WEIGHT_EXPERIENCE
            } else {
                found as f64 / required as f64 * WEIGHT_EXPERIENCE
            }
        }
        _ => 0.0,
    };

    let education_required = job
        .education
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_lowercase();
    let education_match = if education_required.is_empty() {
        WEIGHT_EDUCATION
    } else {
        score_education(&education_required, &resume)
    };

    let breakdown = KeywordBreakdown {
        required_keywords,
        experience_years,
        education_match,
    };
    let total = breakdown.total();
    let score = total.round_ties_even();

    KeywordResult {
        candidate_id: candidate.id,
        name: candidate.name.clone(),
        score,
        recommendation: recommendation_for_score(total),
        matched_keywords: matched.into_iter().take(MAX_LISTED_KEYWORDS).collect(),
        missing_keywords: missing.into_iter().take(MAX_LISTED_KEYWORDS).collect(),
        breakdown,
        experience_years_found: candidate_years,
        experience_years_required: required_years,
    }
}

fn job_keywords(job: &Job) -> Vec<String> {
    let requirements = if job.requirements.must_have.is_empty() {
        &job.requirements.preferred
    } else {
        &job.requirements.must_have
    };

    requirements
        .iter()
        .map(String::as_str)
        .chain(job.education.as_deref())
        .chain(job.licenses.as_deref())
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Years demanded by the requirements or description, first pattern wins.
pub fn extract_required_years(job: &Job) -> Option<u32> {
    let mut text = job.requirements.all().join(" ");
    if let Some(description) = &job.description {
        text.push(' ');
        text.push_str(description);
    }

    REQUIRED_YEARS_PATTERNS.iter().find_map(|re| {
        re.captures(&text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    })
}

/// Years of experience claimed by a lower-cased resume. Falls back to
/// summing `YYYY-YYYY` / `YYYY-present` employment spans.
pub fn extract_candidate_years(resume: &str, current_year: i32) -> Option<u32> {
    let stated = CANDIDATE_YEARS_PATTERNS.iter().find_map(|re| {
        re.captures(resume)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    });
    if stated.is_some() {
        return stated;
    }

    let total: i32 = DATE_RANGE_REGEX
        .captures_iter(resume)
        .filter_map(|caps| {
            let start: i32 = caps.get(1)?.as_str().parse().ok()?;
            let end_raw = caps.get(2)?.as_str();
            let end = if end_raw.eq_ignore_ascii_case("present") {
                current_year
            } else {
                end_raw.parse().ok()?
            };
            let span = end - start;
            (span > 0 && span < MAX_SPAN_YEARS).then_some(span)
        })
        .sum();

    (total > 0).then_some(total as u32)
}

/// Education points (0–20) for a lower-cased requirement and resume.
pub fn score_education(required: &str, resume: &str) -> f64 {
    let mentions = |keywords: &[&str], text: &str| keywords.iter().any(|k| text.contains(k));
    let has_phd = mentions(PHD_KEYWORDS, resume);
    let has_masters = mentions(MASTERS_KEYWORDS, resume);
    let has_bachelors = mentions(BACHELORS_KEYWORDS, resume);

    if mentions(PHD_KEYWORDS, required) {
        if has_phd {
            20.0
        } else if has_masters {
            10.0
        } else if has_bachelors {
            5.0
        } else {
            0.0
        }
    } else if mentions(MASTERS_KEYWORDS, required) {
        if has_phd || has_masters {
            20.0
        } else if has_bachelors {
            10.0
        } else {
            0.0
        }
    } else if mentions(BACHELORS_KEYWORDS, required) {
        if has_phd || has_masters || has_bachelors {
            20.0
        } else {
            0.0
        }
    } else if has_phd || has_masters || has_bachelors {
        20.0
    } else {
        0.0
    }
}
