use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Session;
use crate::candidates::{self, BulkCreateReport};
use crate::errors::AppError;
use crate::models::candidate::{Candidate, CandidateUpdate, NewCandidate};
use crate::state::AppState;
use crate::store::CandidateWithEvaluations;

#[derive(Debug, Deserialize)]
pub struct BulkCreateRequest {
    pub candidates: Vec<NewCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct ShortlistRequest {
    pub shortlisted: bool,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    #[serde(default)]
    pub notes: String,
}

/// POST /api/v1/jobs/:id/candidates
pub async fn handle_create_candidate(
    State(state): State<AppState>,
    session: Session,
    Path(job_id): Path<Uuid>,
    Json(req): Json<NewCandidate>,
) -> Result<(StatusCode, Json<Candidate>), AppError> {
    let candidate =
        candidates::create_candidate(state.store.as_ref(), &session, job_id, &req).await?;
    Ok((StatusCode::CREATED, Json(candidate)))
}

/// POST /api/v1/jobs/:id/candidates/bulk
pub async fn handle_bulk_create(
    State(state): State<AppState>,
    session: Session,
    Path(job_id): Path<Uuid>,
    Json(req): Json<BulkCreateRequest>,
) -> Result<(StatusCode, Json<BulkCreateReport>), AppError> {
    let report =
        candidates::bulk_create_candidates(state.store.as_ref(), &session, job_id, &req.candidates)
            .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /api/v1/jobs/:id/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    session: Session,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<Candidate>>, AppError> {
    let list = candidates::list_candidates(state.store.as_ref(), &session, job_id).await?;
    Ok(Json(list))
}

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    session: Session,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<CandidateWithEvaluations>, AppError> {
    let detail = candidates::get_candidate(state.store.as_ref(), &session, candidate_id).await?;
    Ok(Json(detail))
}

/// PATCH /api/v1/candidates/:id
pub async fn handle_update_candidate(
    State(state): State<AppState>,
    session: Session,
    Path(candidate_id): Path<Uuid>,
    Json(req): Json<CandidateUpdate>,
) -> Result<Json<Candidate>, AppError> {
    let candidate =
        candidates::update_candidate(state.store.as_ref(), &session, candidate_id, &req).await?;
    Ok(Json(candidate))
}

/// PUT /api/v1/candidates/:id/shortlist
pub async fn handle_shortlist(
    State(state): State<AppState>,
    session: Session,
    Path(candidate_id): Path<Uuid>,
    Json(req): Json<ShortlistRequest>,
) -> Result<Json<Candidate>, AppError> {
    let candidate =
        candidates::set_shortlisted(state.store.as_ref(), &session, candidate_id, req.shortlisted)
            .await?;
    Ok(Json(candidate))
}

/// PUT /api/v1/candidates/:id/notes
pub async fn handle_notes(
    State(state): State<AppState>,
    session: Session,
    Path(candidate_id): Path<Uuid>,
    Json(req): Json<NotesRequest>,
) -> Result<Json<Candidate>, AppError> {
    let candidate =
        candidates::set_recruiter_notes(state.store.as_ref(), &session, candidate_id, &req.notes)
            .await?;
    Ok(Json(candidate))
}

/// DELETE /api/v1/candidates/:id
pub async fn handle_delete_candidate(
    State(state): State<AppState>,
    session: Session,
    Path(candidate_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    candidates::delete_candidate(state.store.as_ref(), &session, candidate_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
