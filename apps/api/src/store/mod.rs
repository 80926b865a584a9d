//! Persistence seam. Every call is scoped by the session's user id.
//!
//! `AppState` carries an `Arc<dyn RecruitStore>`; production uses `PgStore`,
//! unit tests use the in-memory store.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::{Candidate, CandidateUpdate, EvaluationStatus, NewCandidate};
use crate::models::evaluation::{Evaluation, EvaluationRecord, Recommendation};
use crate::models::job::{Job, JobStatus, JobUpdate, NewJob};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// A candidate together with every evaluation recorded for it, highest
/// version first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateWithEvaluations {
    pub candidate: Candidate,
    pub evaluations: Vec<Evaluation>,
}

#[async_trait]
pub trait RecruitStore: Send + Sync {
    // ── Jobs ────────────────────────────────────────────────────────────────
    async fn create_job(&self, user_id: Uuid, job: &NewJob) -> Result<Job, AppError>;
    async fn list_jobs(
        &self,
        user_id: Uuid,
        status: Option<JobStatus>,
    ) -> Result<Vec<Job>, AppError>;
    async fn get_job(&self, user_id: Uuid, job_id: Uuid) -> Result<Option<Job>, AppError>;
    async fn update_job(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        update: &JobUpdate,
    ) -> Result<Option<Job>, AppError>;
    /// Returns false when nothing was deleted.
    async fn delete_job(&self, user_id: Uuid, job_id: Uuid) -> Result<bool, AppError>;

    // ── Candidates ──────────────────────────────────────────────────────────
    async fn create_candidate(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        candidate: &NewCandidate,
    ) -> Result<Candidate, AppError>;
    /// Newest first.
    async fn list_candidates(&self, user_id: Uuid, job_id: Uuid)
        -> Result<Vec<Candidate>, AppError>;
    async fn get_candidate(
        &self,
        user_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<Candidate>, AppError>;
    /// Candidates of `job_id` whose ids are in `ids`. Unknown ids are ignored.
    async fn get_candidates(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Candidate>, AppError>;
    async fn update_candidate(
        &self,
        user_id: Uuid,
        candidate_id: Uuid,
        update: &CandidateUpdate,
    ) -> Result<Option<Candidate>, AppError>;
    async fn delete_candidate(&self, user_id: Uuid, candidate_id: Uuid)
        -> Result<bool, AppError>;

    /// Sets `evaluation_status` for every id. A `note` overwrites the
    /// recruiter notes of those candidates.
    async fn set_evaluation_status(
        &self,
        user_id: Uuid,
        candidate_ids: &[Uuid],
        status: EvaluationStatus,
        note: Option<&str>,
    ) -> Result<(), AppError>;

    /// Overwrites score and recommendation only. Status and evaluation
    /// history are left alone.
    async fn set_keyword_result(
        &self,
        user_id: Uuid,
        candidate_id: Uuid,
        score: f64,
        recommendation: &Recommendation,
    ) -> Result<(), AppError>;

    // ── Evaluations ─────────────────────────────────────────────────────────
    /// Highest-version evaluation, if any.
    async fn latest_evaluation(
        &self,
        user_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<Evaluation>, AppError>;

    /// Appends the evaluation and mirrors it onto the candidate summary in a
    /// single transaction.
    async fn commit_evaluation(&self, record: &EvaluationRecord) -> Result<Evaluation, AppError>;

    /// Version descending.
    async fn evaluation_history(
        &self,
        user_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Vec<Evaluation>, AppError>;

    /// `evaluated` candidates of a job ordered by score descending (nulls
    /// last), each with its evaluations.
    async fn evaluated_candidates(
        &self,
        user_id: Uuid,
        job_id: Uuid,
    ) -> Result<Vec<CandidateWithEvaluations>, AppError>;
}
