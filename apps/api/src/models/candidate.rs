use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::evaluation::{AtqBreakdown, Recommendation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Pending,
    Evaluating,
    Evaluated,
    Failed,
}

impl EvaluationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationStatus::Pending => "pending",
            EvaluationStatus::Evaluating => "evaluating",
            EvaluationStatus::Evaluated => "evaluated",
            EvaluationStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(EvaluationStatus::Pending),
            "evaluating" => Some(EvaluationStatus::Evaluating),
            "evaluated" => Some(EvaluationStatus::Evaluated),
            "failed" => Some(EvaluationStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub resume_text: Option<String>,
    pub resume_file_url: Option<String>,
    pub resume_file_name: Option<String>,
    pub skills: Vec<String>,
    pub education: Vec<String>,
    pub additional_notes: Option<String>,
    pub evaluation_status: String,
    pub shortlisted: bool,
    pub recruiter_notes: Option<String>,
    pub score: Option<f64>,
    pub recommendation: Option<String>,
    pub evaluated_at: Option<DateTime<Utc>>,
    pub evaluation_count: i32,
    pub quick_score: Option<f64>,
    pub quick_score_model: Option<String>,
    pub quick_score_at: Option<DateTime<Utc>>,
    pub stage1_score: Option<f64>,
    pub stage1_a_score: Option<f64>,
    pub stage1_t_score: Option<f64>,
    pub stage1_q_score: Option<f64>,
    pub stage1_evaluated_at: Option<DateTime<Utc>>,
    pub stage2_score: Option<f64>,
    pub stage2_evaluated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeFile {
    pub url: Option<String>,
    pub file_name: Option<String>,
}

/// Denormalized copy of the latest evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub score: Option<f64>,
    pub recommendation: Option<Recommendation>,
    pub evaluated_at: Option<DateTime<Utc>>,
    pub evaluation_count: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuickTier {
    pub score: f64,
    pub model: Option<String>,
    pub scored_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stage1Tier {
    pub score: f64,
    /// Present only when all three components were stored.
    pub atq: Option<AtqBreakdown>,
    pub evaluated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stage2Tier {
    pub score: f64,
    pub evaluated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreTiers {
    pub quick: Option<QuickTier>,
    pub stage1: Option<Stage1Tier>,
    pub stage2: Option<Stage2Tier>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub contact: ContactInfo,
    pub resume_text: Option<String>,
    pub resume_file: ResumeFile,
    pub skills: Vec<String>,
    pub education: Vec<String>,
    pub additional_notes: Option<String>,
    pub evaluation_status: EvaluationStatus,
    pub shortlisted: bool,
    pub recruiter_notes: Option<String>,
    pub summary: EvaluationSummary,
    pub tiers: ScoreTiers,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    pub fn has_resume_text(&self) -> bool {
        self.resume_text
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }
}

impl TryFrom<CandidateRow> for Candidate {
    type Error = AppError;

    fn try_from(row: CandidateRow) -> Result<Self, Self::Error> {
        let evaluation_status = EvaluationStatus::parse(&row.evaluation_status).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "candidate {} has unknown evaluation status '{}'",
                row.id,
                row.evaluation_status
            ))
        })?;

        let quick = row.quick_score.map(|score| QuickTier {
            score,
            model: row.quick_score_model.clone(),
            scored_at: row.quick_score_at,
        });
        let stage1 = row.stage1_score.map(|score| Stage1Tier {
            score,
            atq: match (row.stage1_a_score, row.stage1_t_score, row.stage1_q_score) {
                (Some(a), Some(t), Some(q)) => Some(AtqBreakdown {
                    accomplishments: a,
                    trajectory: t,
                    qualifications: q,
                }),
                _ => None,
            },
            evaluated_at: row.stage1_evaluated_at,
        });
        let stage2 = row.stage2_score.map(|score| Stage2Tier {
            score,
            evaluated_at: row.stage2_evaluated_at,
        });

        Ok(Candidate {
            id: row.id,
            job_id: row.job_id,
            user_id: row.user_id,
            name: row.name,
            contact: ContactInfo {
                email: row.email,
                phone: row.phone,
                location: row.location,
            },
            resume_text: row.resume_text,
            resume_file: ResumeFile {
                url: row.resume_file_url,
                file_name: row.resume_file_name,
            },
            skills: row.skills,
            education: row.education,
            additional_notes: row.additional_notes,
            evaluation_status,
            shortlisted: row.shortlisted,
            recruiter_notes: row.recruiter_notes,
            summary: EvaluationSummary {
                score: row.score,
                recommendation: row.recommendation.as_deref().map(Recommendation::from_stored),
                evaluated_at: row.evaluated_at,
                evaluation_count: row.evaluation_count,
            },
            tiers: ScoreTiers {
                quick,
                stage1,
                stage2,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<Candidate> for CandidateRow {
    fn from(c: Candidate) -> Self {
        let quick = c.tiers.quick;
        let stage1 = c.tiers.stage1;
        let stage2 = c.tiers.stage2;
        let atq = stage1.as_ref().and_then(|s| s.atq);

        CandidateRow {
            id: c.id,
            job_id: c.job_id,
            user_id: c.user_id,
            name: c.name,
            email: c.contact.email,
            phone: c.contact.phone,
            location: c.contact.location,
            resume_text: c.resume_text,
            resume_file_url: c.resume_file.url,
            resume_file_name: c.resume_file.file_name,
            skills: c.skills,
            education: c.education,
            additional_notes: c.additional_notes,
            evaluation_status: c.evaluation_status.as_str().to_string(),
            shortlisted: c.shortlisted,
            recruiter_notes: c.recruiter_notes,
            score: c.summary.score,
            recommendation: c.summary.recommendation.map(String::from),
            evaluated_at: c.summary.evaluated_at,
            evaluation_count: c.summary.evaluation_count,
            quick_score: quick.as_ref().map(|q| q.score),
            quick_score_model: quick.as_ref().and_then(|q| q.model.clone()),
            quick_score_at: quick.as_ref().and_then(|q| q.scored_at),
            stage1_score: stage1.as_ref().map(|s| s.score),
            stage1_a_score: atq.map(|a| a.accomplishments),
            stage1_t_score: atq.map(|a| a.trajectory),
            stage1_q_score: atq.map(|a| a.qualifications),
            stage1_evaluated_at: stage1.as_ref().and_then(|s| s.evaluated_at),
            stage2_score: stage2.as_ref().map(|s| s.score),
            stage2_evaluated_at: stage2.as_ref().and_then(|s| s.evaluated_at),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Request body for creating a candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCandidate {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub resume_text: Option<String>,
    pub resume_file_url: Option<String>,
    pub resume_file_name: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
    pub additional_notes: Option<String>,
}

impl NewCandidate {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Candidate name is required".to_string()));
        }
        Ok(())
    }
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub resume_text: Option<String>,
    pub resume_file_url: Option<String>,
    pub resume_file_name: Option<String>,
    pub skills: Option<Vec<String>>,
    pub education: Option<Vec<String>>,
    pub additional_notes: Option<String>,
    pub shortlisted: Option<bool>,
    pub recruiter_notes: Option<String>,
}
