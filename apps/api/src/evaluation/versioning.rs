//! Version numbering and score deltas for the append-only evaluation log.

use serde::{Deserialize, Serialize};

/// What caused a new evaluation to be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationTrigger {
    Evaluate,
    ManualRetry,
}

/// The version after `current_max`. First evaluation is version 1.
pub fn next_version(current_max: Option<i32>) -> i32 {
    current_max.unwrap_or(0) + 1
}

/// `None` for the first version; otherwise the difference from the previous
/// highest version's score.
pub fn score_change(version: i32, previous_score: Option<f64>, current_score: f64) -> Option<f64> {
    if version <= 1 {
        return None;
    }
    previous_score.map(|previous| current_score - previous)
}

pub fn change_reason(trigger: EvaluationTrigger, version: i32) -> Option<String> {
    match trigger {
        EvaluationTrigger::ManualRetry => Some("Manual retry".to_string()),
        EvaluationTrigger::Evaluate if version > 1 => Some("Re-evaluation".to_string()),
        EvaluationTrigger::Evaluate => None,
    }
}
