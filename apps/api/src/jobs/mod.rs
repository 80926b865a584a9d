//! Job postings owned by a recruiter.

pub mod handlers;

use tracing::info;
use uuid::Uuid;

use crate::auth::Session;
use crate::errors::AppError;
use crate::models::job::{Job, JobStatus, JobUpdate, NewJob};
use crate::store::RecruitStore;

pub async fn create_job(
    store: &dyn RecruitStore,
    session: &Session,
    new_job: &NewJob,
) -> Result<Job, AppError> {
    new_job.validate()?;
    let job = store.create_job(session.user_id, new_job).await?;
    info!("Created job {} ({})", job.id, job.title);
    Ok(job)
}

pub async fn list_jobs(
    store: &dyn RecruitStore,
    session: &Session,
    status: Option<JobStatus>,
) -> Result<Vec<Job>, AppError> {
    store.list_jobs(session.user_id, status).await
}

pub async fn get_job(
    store: &dyn RecruitStore,
    session: &Session,
    job_id: Uuid,
) -> Result<Job, AppError> {
    store
        .get_job(session.user_id, job_id)
        .await?
        .ok_or_else(|| AppError::not_found("Job", job_id))
}

pub async fn update_job(
    store: &dyn RecruitStore,
    session: &Session,
    job_id: Uuid,
    update: &JobUpdate,
) -> Result<Job, AppError> {
    if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::Validation("Job title is required".to_string()));
    }
    if let Some(range) = &update.compensation {
        if let (Some(min), Some(max)) = (range.min, range.max) {
            if min > max {
                return Err(AppError::Validation(
                    "Minimum compensation cannot exceed maximum".to_string(),
                ));
            }
        }
    }
    if let Some(range) = &update.experience {
        if let (Some(min), Some(max)) = (range.min_years, range.max_years) {
            if min > max {
                return Err(AppError::Validation(
                    "Minimum experience cannot exceed maximum".to_string(),
                ));
            }
        }
    }

    store
        .update_job(session.user_id, job_id, update)
        .await?
        .ok_or_else(|| AppError::not_found("Job", job_id))
}

pub async fn delete_job(
    store: &dyn RecruitStore,
    session: &Session,
    job_id: Uuid,
) -> Result<(), AppError> {
    if !store.delete_job(session.user_id, job_id).await? {
        return Err(AppError::not_found("Job", job_id));
    }
    info!("Deleted job {job_id}");
    Ok(())
}
