//! Mapping between the evaluator's free-text recommendation strings and the
//! stored recommendation values.

use crate::models::evaluation::Recommendation;

/// Score at or above which the keyword screen recommends an interview.
pub const INTERVIEW_THRESHOLD: f64 = 85.0;
/// Score at or above which the keyword screen recommends a phone screen.
pub const PHONE_SCREEN_THRESHOLD: f64 = 70.0;

/// Evaluator wording → stored value. Matching is exact.
const RECOMMENDATION_MAP: &[(&str, &str)] = &[
    ("ADVANCE TO INTERVIEW", "INTERVIEW"),
    ("PHONE SCREEN FIRST", "PHONE_SCREEN"),
    ("DECLINE", "DECLINE"),
    ("ERROR", "ERROR"),
];

/// Maps an evaluator recommendation to its stored form. Unknown strings pass
/// through unchanged, so the mapping is idempotent on stored values.
pub fn map_recommendation(raw: &str) -> String {
    RECOMMENDATION_MAP
        .iter()
        .find(|(wire, _)| *wire == raw)
        .map(|(_, stored)| (*stored).to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Typed variant of [`map_recommendation`].
pub fn parse_recommendation(raw: &str) -> Recommendation {
    Recommendation::from_stored(&map_recommendation(raw))
}

/// Keyword-screen recommendation for a 0–100 score.
pub fn recommendation_for_score(score: f64) -> Recommendation {
    if score >= INTERVIEW_THRESHOLD {
        Recommendation::Interview
    } else if score >= PHONE_SCREEN_THRESHOLD {
        Recommendation::PhoneScreen
    } else {
        Recommendation::Decline
    }
}
