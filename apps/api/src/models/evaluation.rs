use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

// ────────────────────────────────────────────────────────────────────────────
// Recommendation
// ────────────────────────────────────────────────────────────────────────────

/// Persisted recommendation. Values outside the closed set are kept verbatim
/// in `Other` so that an unexpected evaluator answer is never lost.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Recommendation {
    Interview,
    PhoneScreen,
    Decline,
    Error,
    Other(String),
}

impl Recommendation {
    pub fn as_str(&self) -> &str {
        match self {
            Recommendation::Interview => "INTERVIEW",
            Recommendation::PhoneScreen => "PHONE_SCREEN",
            Recommendation::Decline => "DECLINE",
            Recommendation::Error => "ERROR",
            Recommendation::Other(s) => s.as_str(),
        }
    }

    /// Parses a stored value by exact match.
    pub fn from_stored(value: &str) -> Self {
        match value {
            "INTERVIEW" => Recommendation::Interview,
            "PHONE_SCREEN" => Recommendation::PhoneScreen,
            "DECLINE" => Recommendation::Decline,
            "ERROR" => Recommendation::Error,
            other => Recommendation::Other(other.to_string()),
        }
    }
}

impl From<String> for Recommendation {
    fn from(value: String) -> Self {
        Recommendation::from_stored(&value)
    }
}

impl From<Recommendation> for String {
    fn from(value: Recommendation) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stage
// ────────────────────────────────────────────────────────────────────────────

/// Which scoring pass produced an evaluation. Quick scores live only on the
/// candidate's tier columns and never produce an evaluation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStage {
    Stage1,
    Stage2,
}

impl EvaluationStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationStage::Stage1 => "stage1",
            EvaluationStage::Stage2 => "stage2",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "stage1" => Some(EvaluationStage::Stage1),
            "stage2" => Some(EvaluationStage::Stage2),
            _ => None,
        }
    }

    /// Maps the evaluator's numeric stage (1 or 2).
    pub fn from_number(stage: u8) -> Option<Self> {
        match stage {
            1 => Some(EvaluationStage::Stage1),
            2 => Some(EvaluationStage::Stage2),
            _ => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Shared value types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
    #[serde(default)]
    pub cost: f64,
}

/// Token and cost totals over a set of evaluations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct UsageTotals {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
    /// `cost / count`, with an empty set counted as one.
    pub avg_cost_per_candidate: f64,
}

impl UsageTotals {
    pub fn sum<'a>(usages: impl IntoIterator<Item = &'a TokenUsage>) -> Self {
        let mut totals = UsageTotals::default();
        let mut count = 0usize;
        for usage in usages {
            totals.input_tokens += u64::from(usage.input_tokens);
            totals.output_tokens += u64::from(usage.output_tokens);
            totals.cost += usage.cost;
            count += 1;
        }
        totals.avg_cost_per_candidate = totals.cost / count.max(1) as f64;
        totals
    }
}

/// Sub-scores reported by the evaluator. A-T-Q components and the legacy
/// qualifications/experience/risk components are all optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub accomplishments: Option<f64>,
    pub trajectory: Option<f64>,
    pub qualifications: Option<f64>,
    pub experience: Option<f64>,
    pub risk_flags: Option<f64>,
}

/// Accomplishments / Trajectory / Qualifications breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtqBreakdown {
    pub accomplishments: f64,
    pub trajectory: f64,
    pub qualifications: f64,
}

impl SubScores {
    pub fn atq(&self) -> Option<AtqBreakdown> {
        Some(AtqBreakdown {
            accomplishments: self.accomplishments?,
            trajectory: self.trajectory?,
            qualifications: self.qualifications?,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// DB row and domain record
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EvaluationRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub version: i32,
    pub stage: String,
    pub overall_score: f64,
    pub recommendation: String,
    pub confidence: Option<f64>,
    pub key_strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub interview_questions: Vec<String>,
    pub accomplishments_score: Option<f64>,
    pub trajectory_score: Option<f64>,
    pub qualifications_score: Option<f64>,
    pub experience_score: Option<f64>,
    pub risk_flags_score: Option<f64>,
    pub reasoning: Option<String>,
    pub model: Option<String>,
    pub prompt_tokens: i32,
    pub completion_tokens: i32,
    pub cost: f64,
    pub score_change: Option<f64>,
    pub change_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One evaluation attempt for a candidate. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub version: i32,
    pub stage: EvaluationStage,
    pub overall_score: f64,
    pub recommendation: Recommendation,
    pub confidence: Option<f64>,
    pub key_strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub interview_questions: Vec<String>,
    pub sub_scores: SubScores,
    pub reasoning: Option<String>,
    pub model: Option<String>,
    pub usage: TokenUsage,
    pub score_change: Option<f64>,
    pub change_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<EvaluationRow> for Evaluation {
    type Error = AppError;

    fn try_from(row: EvaluationRow) -> Result<Self, Self::Error> {
        let stage = EvaluationStage::parse(&row.stage).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "evaluation {} has unknown stage '{}'",
                row.id,
                row.stage
            ))
        })?;

        Ok(Evaluation {
            id: row.id,
            candidate_id: row.candidate_id,
            job_id: row.job_id,
            user_id: row.user_id,
            version: row.version,
            stage,
            overall_score: row.overall_score,
            recommendation: Recommendation::from_stored(&row.recommendation),
            confidence: row.confidence,
            key_strengths: row.key_strengths,
            concerns: row.concerns,
            interview_questions: row.interview_questions,
            sub_scores: SubScores {
                accomplishments: row.accomplishments_score,
                trajectory: row.trajectory_score,
                qualifications: row.qualifications_score,
                experience: row.experience_score,
                risk_flags: row.risk_flags_score,
            },
            reasoning: row.reasoning,
            model: row.model,
            usage: TokenUsage {
                input_tokens: row.prompt_tokens.max(0) as u32,
                output_tokens: row.completion_tokens.max(0) as u32,
                cost: row.cost,
            },
            score_change: row.score_change,
            change_reason: row.change_reason,
            created_at: row.created_at,
        })
    }
}

impl From<Evaluation> for EvaluationRow {
    fn from(e: Evaluation) -> Self {
        EvaluationRow {
            id: e.id,
            candidate_id: e.candidate_id,
            job_id: e.job_id,
            user_id: e.user_id,
            version: e.version,
            stage: e.stage.as_str().to_string(),
            overall_score: e.overall_score,
            recommendation: e.recommendation.as_str().to_string(),
            confidence: e.confidence,
            key_strengths: e.key_strengths,
            concerns: e.concerns,
            interview_questions: e.interview_questions,
            accomplishments_score: e.sub_scores.accomplishments,
            trajectory_score: e.sub_scores.trajectory,
            qualifications_score: e.sub_scores.qualifications,
            experience_score: e.sub_scores.experience,
            risk_flags_score: e.sub_scores.risk_flags,
            reasoning: e.reasoning,
            model: e.model,
            prompt_tokens: e.usage.input_tokens as i32,
            completion_tokens: e.usage.output_tokens as i32,
            cost: e.usage.cost,
            score_change: e.score_change,
            change_reason: e.change_reason,
            created_at: e.created_at,
        }
    }
}

/// Everything needed to append an evaluation. `version` and `score_change`
/// are computed by the caller before commit.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRecord {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub version: i32,
    pub stage: EvaluationStage,
    pub overall_score: f64,
    pub recommendation: Recommendation,
    pub confidence: Option<f64>,
    pub key_strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub interview_questions: Vec<String>,
    pub sub_scores: SubScores,
    pub reasoning: Option<String>,
    pub model: Option<String>,
    pub usage: TokenUsage,
    pub score_change: Option<f64>,
    pub change_reason: Option<String>,
}
