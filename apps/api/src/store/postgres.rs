use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{CandidateWithEvaluations, RecruitStore};
use crate::errors::AppError;
use crate::models::candidate::{
    Candidate, CandidateRow, CandidateUpdate, EvaluationStatus, NewCandidate,
};
use crate::models::evaluation::{
    Evaluation, EvaluationRecord, EvaluationRow, EvaluationStage, Recommendation,
};
use crate::models::job::{Job, JobRow, JobStatus, JobUpdate, NewJob};

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn profile_json<T: serde::Serialize>(
    profile: Option<&T>,
) -> Result<Option<serde_json::Value>, AppError> {
    profile
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| AppError::Internal(e.into()))
}

fn into_jobs(rows: Vec<JobRow>) -> Result<Vec<Job>, AppError> {
    rows.into_iter().map(Job::try_from).collect()
}

fn into_candidates(rows: Vec<CandidateRow>) -> Result<Vec<Candidate>, AppError> {
    rows.into_iter().map(Candidate::try_from).collect()
}

fn into_evaluations(rows: Vec<EvaluationRow>) -> Result<Vec<Evaluation>, AppError> {
    rows.into_iter().map(Evaluation::try_from).collect()
}

#[async_trait]
impl RecruitStore for PgStore {
    // ── Jobs ────────────────────────────────────────────────────────────────

    async fn create_job(&self, user_id: Uuid, job: &NewJob) -> Result<Job, AppError> {
        let row: JobRow = sqlx::query_as(
            r#"
            INSERT INTO jobs
                (user_id, title, description, department, location, employment_type,
                 must_have_requirements, preferred_requirements, education, licenses,
                 compensation_min, compensation_max, experience_min_years,
                 experience_max_years, status, performance_profile)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(job.title.trim())
        .bind(&job.description)
        .bind(&job.department)
        .bind(&job.location)
        .bind(&job.employment_type)
        .bind(&job.requirements.must_have)
        .bind(&job.requirements.preferred)
        .bind(&job.education)
        .bind(&job.licenses)
        .bind(job.compensation.min)
        .bind(job.compensation.max)
        .bind(job.experience.min_years)
        .bind(job.experience.max_years)
        .bind(job.status.unwrap_or(JobStatus::Open).as_str())
        .bind(profile_json(job.performance_profile.as_ref())?)
        .fetch_one(&self.pool)
        .await?;

        Job::try_from(row)
    }

    async fn list_jobs(
        &self,
        user_id: Uuid,
        status: Option<JobStatus>,
    ) -> Result<Vec<Job>, AppError> {
        let rows: Vec<JobRow> = sqlx::query_as(
            r#"
            SELECT * FROM jobs
            WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;

        into_jobs(rows)
    }

    async fn get_job(&self, user_id: Uuid, job_id: Uuid) -> Result<Option<Job>, AppError> {
        let row: Option<JobRow> =
            sqlx::query_as("SELECT * FROM jobs WHERE id = $1 AND user_id = $2")
                .bind(job_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Job::try_from).transpose()
    }

    async fn update_job(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        update: &JobUpdate,
    ) -> Result<Option<Job>, AppError> {
        let row: Option<JobRow> = sqlx::query_as(
            r#"
            UPDATE jobs SET
                title                  = COALESCE($3, title),
                description            = COALESCE($4, description),
                department             = COALESCE($5, department),
                location               = COALESCE($6, location),
                employment_type        = COALESCE($7, employment_type),
                must_have_requirements = COALESCE($8, must_have_requirements),
                preferred_requirements = COALESCE($9, preferred_requirements),
                education              = COALESCE($10, education),
                licenses               = COALESCE($11, licenses),
                compensation_min       = COALESCE($12, compensation_min),
                compensation_max       = COALESCE($13, compensation_max),
                experience_min_years   = COALESCE($14, experience_min_years),
                experience_max_years   = COALESCE($15, experience_max_years),
                status                 = COALESCE($16, status),
                performance_profile    = COALESCE($17, performance_profile),
                updated_at             = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(user_id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.department)
        .bind(&update.location)
        .bind(&update.employment_type)
        .bind(update.requirements.as_ref().map(|r| r.must_have.clone()))
        .bind(update.requirements.as_ref().map(|r| r.preferred.clone()))
        .bind(&update.education)
        .bind(&update.licenses)
        .bind(update.compensation.and_then(|c| c.min))
        .bind(update.compensation.and_then(|c| c.max))
        .bind(update.experience.and_then(|e| e.min_years))
        .bind(update.experience.and_then(|e| e.max_years))
        .bind(update.status.map(|s| s.as_str()))
        .bind(profile_json(update.performance_profile.as_ref())?)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Job::try_from).transpose()
    }

    async fn delete_job(&self, user_id: Uuid, job_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1 AND user_id = $2")
            .bind(job_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ── Candidates ──────────────────────────────────────────────────────────

    async fn create_candidate(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        candidate: &NewCandidate,
    ) -> Result<Candidate, AppError> {
        let row: CandidateRow = sqlx::query_as(
            r#"
            INSERT INTO candidates
                (job_id, user_id, name, email, phone, location, resume_text,
                 resume_file_url, resume_file_name, skills, education, additional_notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(user_id)
        .bind(candidate.name.trim())
        .bind(&candidate.email)
        .bind(&candidate.phone)
        .bind(&candidate.location)
        .bind(&candidate.resume_text)
        .bind(&candidate.resume_file_url)
        .bind(&candidate.resume_file_name)
        .bind(&candidate.skills)
        .bind(&candidate.education)
        .bind(&candidate.additional_notes)
        .fetch_one(&self.pool)
        .await?;

        Candidate::try_from(row)
    }

    async fn list_candidates(
        &self,
        user_id: Uuid,
        job_id: Uuid,
    ) -> Result<Vec<Candidate>, AppError> {
        let rows: Vec<CandidateRow> = sqlx::query_as(
            "SELECT * FROM candidates WHERE job_id = $1 AND user_id = $2 ORDER BY created_at DESC",
        )
        .bind(job_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        into_candidates(rows)
    }

    async fn get_candidate(
        &self,
        user_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<Candidate>, AppError> {
        let row: Option<CandidateRow> =
            sqlx::query_as("SELECT * FROM candidates WHERE id = $1 AND user_id = $2")
                .bind(candidate_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Candidate::try_from).transpose()
    }

    async fn get_candidates(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Candidate>, AppError> {
        let rows: Vec<CandidateRow> = sqlx::query_as(
            r#"
            SELECT * FROM candidates
            WHERE job_id = $1 AND user_id = $2 AND id = ANY($3)
            ORDER BY created_at ASC
            "#,
        )
        .bind(job_id)
        .bind(user_id)
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        into_candidates(rows)
    }

    async fn update_candidate(
        &self,
        user_id: Uuid,
        candidate_id: Uuid,
        update: &CandidateUpdate,
    ) -> Result<Option<Candidate>, AppError> {
        let row: Option<CandidateRow> = sqlx::query_as(
            r#"
            UPDATE candidates SET
                name             = COALESCE($3, name),
                email            = COALESCE($4, email),
                phone            = COALESCE($5, phone),
                location         = COALESCE($6, location),
                resume_text      = COALESCE($7, resume_text),
                resume_file_url  = COALESCE($8, resume_file_url),
                resume_file_name = COALESCE($9, resume_file_name),
                skills           = COALESCE($10, skills),
                education        = COALESCE($11, education),
                additional_notes = COALESCE($12, additional_notes),
                shortlisted      = COALESCE($13, shortlisted),
                recruiter_notes  = COALESCE($14, recruiter_notes),
                updated_at       = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(candidate_id)
        .bind(user_id)
        .bind(&update.name)
        .bind(&update.email)
        .bind(&update.phone)
        .bind(&update.location)
        .bind(&update.resume_text)
        .bind(&update.resume_file_url)
        .bind(&update.resume_file_name)
        .bind(&update.skills)
        .bind(&update.education)
        .bind(&update.additional_notes)
        .bind(update.shortlisted)
        .bind(&update.recruiter_notes)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Candidate::try_from).transpose()
    }

    async fn delete_candidate(
        &self,
        user_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = $1 AND user_id = $2")
            .bind(candidate_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_evaluation_status(
        &self,
        user_id: Uuid,
        candidate_ids: &[Uuid],
        status: EvaluationStatus,
        note: Option<&str>,
    ) -> Result<(), AppError> {
        if candidate_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            UPDATE candidates SET
                evaluation_status = $3,
                recruiter_notes   = COALESCE($4, recruiter_notes),
                updated_at        = NOW()
            WHERE user_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(candidate_ids.to_vec())
        .bind(status.as_str())
        .bind(note)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_keyword_result(
        &self,
        user_id: Uuid,
        candidate_id: Uuid,
        score: f64,
        recommendation: &Recommendation,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE candidates SET score = $3, recommendation = $4, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(candidate_id)
        .bind(user_id)
        .bind(score)
        .bind(recommendation.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ── Evaluations ─────────────────────────────────────────────────────────

    async fn latest_evaluation(
        &self,
        user_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<Evaluation>, AppError> {
        let row: Option<EvaluationRow> = sqlx::query_as(
            r#"
            SELECT * FROM evaluations
            WHERE candidate_id = $1 AND user_id = $2
            ORDER BY version DESC
            LIMIT 1
            "#,
        )
        .bind(candidate_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Evaluation::try_from).transpose()
    }

    async fn commit_evaluation(&self, record: &EvaluationRecord) -> Result<Evaluation, AppError> {
        let mut tx = self.pool.begin().await?;

        let row: EvaluationRow = sqlx::query_as(
            r#"
            INSERT INTO evaluations
                (candidate_id, job_id, user_id, version, stage, overall_score,
                 recommendation, confidence, key_strengths, concerns, interview_questions,
                 accomplishments_score, trajectory_score, qualifications_score,
                 experience_score, risk_flags_score, reasoning, model,
                 prompt_tokens, completion_tokens, cost, score_change, change_reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23)
            RETURNING *
            "#,
        )
        .bind(record.candidate_id)
        .bind(record.job_id)
        .bind(record.user_id)
        .bind(record.version)
        .bind(record.stage.as_str())
        .bind(record.overall_score)
        .bind(record.recommendation.as_str())
        .bind(record.confidence)
        .bind(&record.key_strengths)
        .bind(&record.concerns)
        .bind(&record.interview_questions)
        .bind(record.sub_scores.accomplishments)
        .bind(record.sub_scores.trajectory)
        .bind(record.sub_scores.qualifications)
        .bind(record.sub_scores.experience)
        .bind(record.sub_scores.risk_flags)
        .bind(&record.reasoning)
        .bind(&record.model)
        .bind(record.usage.input_tokens as i32)
        .bind(record.usage.output_tokens as i32)
        .bind(record.usage.cost)
        .bind(record.score_change)
        .bind(&record.change_reason)
        .fetch_one(&mut *tx)
        .await?;

        let updated = sqlx::query(
            r#"
            UPDATE candidates SET
                evaluation_status = 'evaluated',
                score             = $3,
                recommendation    = $4,
                evaluated_at      = $5,
                evaluation_count  = $6,
                updated_at        = NOW()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(record.candidate_id)
        .bind(record.user_id)
        .bind(record.overall_score)
        .bind(record.recommendation.as_str())
        .bind(row.created_at)
        .bind(record.version)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls the insert back.
            return Err(AppError::not_found("Candidate", record.candidate_id));
        }

        update_tier(&mut tx, record, &row).await?;
        tx.commit().await?;

        Evaluation::try_from(row)
    }

    async fn evaluation_history(
        &self,
        user_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Vec<Evaluation>, AppError> {
        let rows: Vec<EvaluationRow> = sqlx::query_as(
            r#"
            SELECT * FROM evaluations
            WHERE candidate_id = $1 AND user_id = $2
            ORDER BY version DESC
            "#,
        )
        .bind(candidate_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        into_evaluations(rows)
    }

    async fn evaluated_candidates(
        &self,
        user_id: Uuid,
        job_id: Uuid,
    ) -> Result<Vec<CandidateWithEvaluations>, AppError> {
        let candidates: Vec<CandidateRow> = sqlx::query_as(
            r#"
            SELECT * FROM candidates
            WHERE job_id = $1 AND user_id = $2 AND evaluation_status = 'evaluated'
            ORDER BY score DESC NULLS LAST, created_at ASC
            "#,
        )
        .bind(job_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = candidates.iter().map(|c| c.id).collect();
        let evaluations: Vec<EvaluationRow> = sqlx::query_as(
            r#"
            SELECT * FROM evaluations
            WHERE user_id = $1 AND candidate_id = ANY($2)
            ORDER BY version DESC
            "#,
        )
        .bind(user_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_candidate: HashMap<Uuid, Vec<Evaluation>> = HashMap::new();
        for evaluation in into_evaluations(evaluations)? {
            by_candidate
                .entry(evaluation.candidate_id)
                .or_default()
                .push(evaluation);
        }

        candidates
            .into_iter()
            .map(|row| {
                let evaluations = by_candidate.remove(&row.id).unwrap_or_default();
                Ok(CandidateWithEvaluations {
                    candidate: Candidate::try_from(row)?,
                    evaluations,
                })
            })
            .collect()
    }
}

/// Writes the tier columns that belong to the evaluated stage.
async fn update_tier(
    tx: &mut Transaction<'_, Postgres>,
    record: &EvaluationRecord,
    row: &EvaluationRow,
) -> Result<(), AppError> {
    match record.stage {
        EvaluationStage::Stage1 => {
            sqlx::query(
                r#"
                UPDATE candidates
                SET stage1_score = $2, stage1_a_score = $3, stage1_t_score = $4,
                    stage1_q_score = $5, stage1_evaluated_at = $6
                WHERE id = $1
                "#,
            )
            .bind(record.candidate_id)
            .bind(record.overall_score)
            .bind(record.sub_scores.accomplishments)
            .bind(record.sub_scores.trajectory)
            .bind(record.sub_scores.qualifications)
            .bind(row.created_at)
            .execute(&mut **tx)
            .await?;
        }
        EvaluationStage::Stage2 => {
            sqlx::query(
                r#"
                UPDATE candidates
                SET stage2_score = $2, stage2_evaluated_at = $3
                WHERE id = $1
                "#,
            )
            .bind(record.candidate_id)
            .bind(record.overall_score)
            .bind(row.created_at)
            .execute(&mut **tx)
            .await?;
        }
    }
    Ok(())
}
