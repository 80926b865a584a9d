//! Evaluator client: the only path to the external AI evaluation backend.
//!
//! Orchestration depends on the `CandidateEvaluator` trait; `AppState` holds
//! an `Arc<dyn CandidateEvaluator>` so tests can script responses.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::models::candidate::Candidate;
use crate::models::evaluation::{SubScores, TokenUsage};
use crate::models::job::{Job, PerformanceProfile};

pub mod http;

pub use http::HttpEvaluator;

pub const DEFAULT_PROVIDER: &str = "anthropic";
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Retry budget for a recruiter-initiated retry.
pub const MANUAL_RETRY_MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Evaluator error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Evaluator rejected the candidate: {0}")]
    Rejected(String),

    #[error("Malformed evaluator response: {0}")]
    Malformed(String),
}

impl EvaluatorError {
    /// Transport failures, rate limits and 5xx are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            EvaluatorError::Http(_) => true,
            EvaluatorError::Api { status, .. } => *status == 429 || *status >= 500,
            EvaluatorError::Rejected(_) | EvaluatorError::Malformed(_) => false,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire shapes
// ────────────────────────────────────────────────────────────────────────────

/// Job description as the evaluator expects it.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationJob {
    pub title: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub must_have_requirements: Vec<String>,
    pub preferred_requirements: Vec<String>,
    pub education: Option<String>,
    pub licenses: Option<String>,
    pub years_experience_min: Option<i32>,
    pub years_experience_max: Option<i32>,
    pub compensation_min: Option<f64>,
    pub compensation_max: Option<f64>,
    pub performance_profile: Option<PerformanceProfile>,
}

impl From<&Job> for EvaluationJob {
    fn from(job: &Job) -> Self {
        EvaluationJob {
            title: job.title.clone(),
            description: job.description.clone(),
            department: job.department.clone(),
            location: job.location.clone(),
            employment_type: job.employment_type.clone(),
            must_have_requirements: job.requirements.must_have.clone(),
            preferred_requirements: job.requirements.preferred.clone(),
            education: job.education.clone(),
            licenses: job.licenses.clone(),
            years_experience_min: job.experience.min_years,
            years_experience_max: job.experience.max_years,
            compensation_min: job.compensation.min,
            compensation_max: job.compensation.max,
            performance_profile: job.performance_profile.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationCandidate {
    pub name: String,
    pub text: String,
    pub full_name: String,
    pub email: String,
}

impl From<&Candidate> for EvaluationCandidate {
    fn from(candidate: &Candidate) -> Self {
        EvaluationCandidate {
            name: candidate.name.clone(),
            text: candidate.resume_text.clone().unwrap_or_default(),
            full_name: candidate.name.clone(),
            email: candidate.contact.email.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluateOptions {
    /// 1 or 2.
    pub stage: u8,
    pub provider: String,
    pub model: Option<String>,
    pub additional_instructions: Option<String>,
    pub max_retries: u32,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            stage: 1,
            provider: DEFAULT_PROVIDER.to_string(),
            model: None,
            additional_instructions: None,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// The evaluator's verdict on one candidate. Every field tolerates absence.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Assessment {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub score: Option<f64>,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default)]
    pub key_strengths: Vec<String>,
    #[serde(default, alias = "concerns")]
    pub key_concerns: Vec<String>,
    #[serde(default)]
    pub interview_questions: Vec<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub confidence: Option<f64>,
    #[serde(default, alias = "a_score", deserialize_with = "lenient_f64")]
    pub accomplishments_score: Option<f64>,
    #[serde(default, alias = "t_score", deserialize_with = "lenient_f64")]
    pub trajectory_score: Option<f64>,
    #[serde(default, alias = "q_score", deserialize_with = "lenient_f64")]
    pub qualifications_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub experience_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub risk_flags_score: Option<f64>,
}

impl Assessment {
    pub fn sub_scores(&self) -> SubScores {
        SubScores {
            accomplishments: self.accomplishments_score,
            trajectory: self.trajectory_score,
            qualifications: self.qualifications_score,
            experience: self.experience_score,
            risk_flags: self.risk_flags_score,
        }
    }
}

/// Accepts a JSON number or a numeric string; anything else becomes `None`.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluatorResponse {
    #[serde(default)]
    pub success: bool,
    pub evaluation: Option<Assessment>,
    #[serde(default)]
    pub usage: TokenUsage,
    pub model: Option<String>,
    pub error: Option<String>,
}

/// A successful evaluation call.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatorOutcome {
    pub assessment: Assessment,
    pub usage: TokenUsage,
    pub model: Option<String>,
}

impl TryFrom<EvaluatorResponse> for EvaluatorOutcome {
    type Error = EvaluatorError;

    fn try_from(response: EvaluatorResponse) -> Result<Self, Self::Error> {
        if !response.success {
            return Err(EvaluatorError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| "evaluation was not successful".to_string()),
            ));
        }
        let assessment = response
            .evaluation
            .ok_or_else(|| EvaluatorError::Malformed("missing evaluation".to_string()))?;

        Ok(EvaluatorOutcome {
            assessment,
            usage: response.usage,
            model: response.model,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait CandidateEvaluator: Send + Sync {
    /// Evaluates one candidate, retrying up to `options.max_retries` times.
    async fn evaluate(
        &self,
        job: &EvaluationJob,
        candidate: &EvaluationCandidate,
        options: &EvaluateOptions,
    ) -> Result<EvaluatorOutcome, EvaluatorError>;
}
