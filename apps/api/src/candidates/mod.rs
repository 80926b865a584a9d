//! Candidates within a job, including bulk import and recruiter annotations.

pub mod handlers;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::Session;
use crate::errors::AppError;
use crate::models::candidate::{Candidate, CandidateUpdate, NewCandidate};
use crate::store::{CandidateWithEvaluations, RecruitStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkRowError {
    /// Zero-based position in the request.
    pub index: usize,
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkCreateReport {
    pub created: Vec<Candidate>,
    pub errors: Vec<BulkRowError>,
}

async fn ensure_job(store: &dyn RecruitStore, session: &Session, job_id: Uuid) -> Result<(), AppError> {
    store
        .get_job(session.user_id, job_id)
        .await?
        .ok_or_else(|| AppError::not_found("Job", job_id))?;
    Ok(())
}

pub async fn create_candidate(
    store: &dyn RecruitStore,
    session: &Session,
    job_id: Uuid,
    new_candidate: &NewCandidate,
) -> Result<Candidate, AppError> {
    new_candidate.validate()?;
    ensure_job(store, session, job_id).await?;
    let candidate = store
        .create_candidate(session.user_id, job_id, new_candidate)
        .await?;
    info!("Added candidate {} to job {}", candidate.id, job_id);
    Ok(candidate)
}

/// Creates each row independently. Row failures are collected; the call only
/// fails when nothing could be created.
pub async fn bulk_create_candidates(
    store: &dyn RecruitStore,
    session: &Session,
    job_id: Uuid,
    rows: &[NewCandidate],
) -> Result<BulkCreateReport, AppError> {
    if rows.is_empty() {
        return Err(AppError::Validation("No candidates provided".to_string()));
    }
    ensure_job(store, session, job_id).await?;

    let mut report = BulkCreateReport::default();
    for (index, row) in rows.iter().enumerate() {
        let created = match row.validate() {
            Ok(()) => store.create_candidate(session.user_id, job_id, row).await,
            Err(e) => Err(e),
        };
        match created {
            Ok(candidate) => report.created.push(candidate),
            Err(e) => {
                warn!("Bulk import row {index} for job {job_id} failed: {e}");
                report.errors.push(BulkRowError {
                    index,
                    name: row.name.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    if report.created.is_empty() {
        let first = report
            .errors
            .first()
            .map(|e| e.message.clone())
            .unwrap_or_default();
        return Err(AppError::Validation(format!(
            "No candidates were created: {first}"
        )));
    }

    info!(
        "Bulk import for job {}: {} created, {} failed",
        job_id,
        report.created.len(),
        report.errors.len()
    );
    Ok(report)
}

pub async fn list_candidates(
    store: &dyn RecruitStore,
    session: &Session,
    job_id: Uuid,
) -> Result<Vec<Candidate>, AppError> {
    ensure_job(store, session, job_id).await?;
    store.list_candidates(session.user_id, job_id).await
}

/// The candidate with its evaluation history, highest version first.
pub async fn get_candidate(
    store: &dyn RecruitStore,
    session: &Session,
    candidate_id: Uuid,
) -> Result<CandidateWithEvaluations, AppError> {
    let candidate = store
        .get_candidate(session.user_id, candidate_id)
        .await?
        .ok_or_else(|| AppError::not_found("Candidate", candidate_id))?;
    let evaluations = store
        .evaluation_history(session.user_id, candidate_id)
        .await?;
    Ok(CandidateWithEvaluations {
        candidate,
        evaluations,
    })
}

pub async fn update_candidate(
    store: &dyn RecruitStore,
    session: &Session,
    candidate_id: Uuid,
    update: &CandidateUpdate,
) -> Result<Candidate, AppError> {
    if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::Validation("Candidate name is required".to_string()));
    }
    store
        .update_candidate(session.user_id, candidate_id, update)
        .await?
        .ok_or_else(|| AppError::not_found("Candidate", candidate_id))
}

pub async fn set_shortlisted(
    store: &dyn RecruitStore,
    session: &Session,
    candidate_id: Uuid,
    shortlisted: bool,
) -> Result<Candidate, AppError> {
    let update = CandidateUpdate {
        shortlisted: Some(shortlisted),
        ..Default::default()
    };
    update_candidate(store, session, candidate_id, &update).await
}

pub async fn set_recruiter_notes(
    store: &dyn RecruitStore,
    session: &Session,
    candidate_id: Uuid,
    notes: &str,
) -> Result<Candidate, AppError> {
    let update = CandidateUpdate {
        recruiter_notes: Some(notes.to_string()),
        ..Default::default()
    };
    update_candidate(store, session, candidate_id, &update).await
}

pub async fn delete_candidate(
    store: &dyn RecruitStore,
    session: &Session,
    candidate_id: Uuid,
) -> Result<(), AppError> {
    if !store.delete_candidate(session.user_id, candidate_id).await? {
        return Err(AppError::not_found("Candidate", candidate_id));
    }
    info!("Deleted candidate {candidate_id}");
    Ok(())
}
