use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Session;
use crate::errors::AppError;
use crate::jobs;
use crate::models::job::{Job, JobStatus, JobUpdate, NewJob};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    pub status: Option<JobStatus>,
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<NewJob>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    let job = jobs::create_job(state.store.as_ref(), &session, &req).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<JobListQuery>,
) -> Result<Json<Vec<Job>>, AppError> {
    let jobs = jobs::list_jobs(state.store.as_ref(), &session, params.status).await?;
    Ok(Json(jobs))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    session: Session,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    let job = jobs::get_job(state.store.as_ref(), &session, job_id).await?;
    Ok(Json(job))
}

/// PATCH /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    session: Session,
    Path(job_id): Path<Uuid>,
    Json(req): Json<JobUpdate>,
) -> Result<Json<Job>, AppError> {
    let job = jobs::update_job(state.store.as_ref(), &session, job_id, &req).await?;
    Ok(Json(job))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    session: Session,
    Path(job_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    jobs::delete_job(state.store.as_ref(), &session, job_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
