use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    Closed,
    OnHold,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::Closed => "closed",
            JobStatus::OnHold => "on_hold",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(JobStatus::Open),
            "closed" => Some(JobStatus::Closed),
            "on_hold" => Some(JobStatus::OnHold),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub must_have_requirements: Vec<String>,
    pub preferred_requirements: Vec<String>,
    pub education: Option<String>,
    pub licenses: Option<String>,
    pub compensation_min: Option<f64>,
    pub compensation_max: Option<f64>,
    pub experience_min_years: Option<i32>,
    pub experience_max_years: Option<i32>,
    pub status: String,
    pub performance_profile: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default)]
    pub must_have: Vec<String>,
    #[serde(default)]
    pub preferred: Vec<String>,
}

impl Requirements {
    /// Must-haves first, then preferred.
    pub fn all(&self) -> Vec<String> {
        self.must_have
            .iter()
            .chain(self.preferred.iter())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompensationRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceRange {
    pub min_years: Option<i32>,
    pub max_years: Option<i32>,
}

/// Structured "what success looks like" profile attached to a job.
/// Unknown keys are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceProfile {
    #[serde(default)]
    pub year_one_outcomes: Vec<String>,
    #[serde(default)]
    pub dealbreakers: Vec<String>,
    #[serde(default)]
    pub motivation_drivers: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub requirements: Requirements,
    pub education: Option<String>,
    pub licenses: Option<String>,
    pub compensation: CompensationRange,
    pub experience: ExperienceRange,
    pub status: JobStatus,
    pub performance_profile: Option<PerformanceProfile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = AppError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = JobStatus::parse(&row.status).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "job {} has unknown status '{}'",
                row.id,
                row.status
            ))
        })?;
        let performance_profile = row
            .performance_profile
            .map(serde_json::from_value::<PerformanceProfile>)
            .transpose()
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(Job {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            department: row.department,
            location: row.location,
            employment_type: row.employment_type,
            requirements: Requirements {
                must_have: row.must_have_requirements,
                preferred: row.preferred_requirements,
            },
            education: row.education,
            licenses: row.licenses,
            compensation: CompensationRange {
                min: row.compensation_min,
                max: row.compensation_max,
            },
            experience: ExperienceRange {
                min_years: row.experience_min_years,
                max_years: row.experience_max_years,
            },
            status,
            performance_profile,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<Job> for JobRow {
    fn from(job: Job) -> Self {
        JobRow {
            id: job.id,
            user_id: job.user_id,
            title: job.title,
            description: job.description,
            department: job.department,
            location: job.location,
            employment_type: job.employment_type,
            must_have_requirements: job.requirements.must_have,
            preferred_requirements: job.requirements.preferred,
            education: job.education,
            licenses: job.licenses,
            compensation_min: job.compensation.min,
            compensation_max: job.compensation.max,
            experience_min_years: job.experience.min_years,
            experience_max_years: job.experience.max_years,
            status: job.status.as_str().to_string(),
            performance_profile: job
                .performance_profile
                .and_then(|p| serde_json::to_value(p).ok()),
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Request body for creating a job.
#[derive(Debug, Clone, Deserialize)]
pub struct NewJob {
    pub title: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    #[serde(default)]
    pub requirements: Requirements,
    pub education: Option<String>,
    pub licenses: Option<String>,
    #[serde(default)]
    pub compensation: CompensationRange,
    #[serde(default)]
    pub experience: ExperienceRange,
    pub status: Option<JobStatus>,
    pub performance_profile: Option<PerformanceProfile>,
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub requirements: Option<Requirements>,
    pub education: Option<String>,
    pub licenses: Option<String>,
    pub compensation: Option<CompensationRange>,
    pub experience: Option<ExperienceRange>,
    pub status: Option<JobStatus>,
    pub performance_profile: Option<PerformanceProfile>,
}

impl NewJob {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("Job title is required".to_string()));
        }
        if let (Some(min), Some(max)) = (self.compensation.min, self.compensation.max) {
            if min > max {
                return Err(AppError::Validation(
                    "Compensation minimum exceeds maximum".to_string(),
                ));
            }
        }
        if let (Some(min), Some(max)) = (self.experience.min_years, self.experience.max_years) {
            if min > max {
                return Err(AppError::Validation(
                    "Experience minimum exceeds maximum".to_string(),
                ));
            }
        }
        Ok(())
    }
}
