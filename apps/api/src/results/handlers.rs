use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::auth::Session;
use crate::errors::AppError;
use crate::models::evaluation::Evaluation;
use crate::results::{fetch_results, ResultsReport};
use crate::state::AppState;

/// GET /api/v1/jobs/:id/results
pub async fn handle_job_results(
    State(state): State<AppState>,
    session: Session,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ResultsReport>, AppError> {
    let report = fetch_results(state.store.as_ref(), &session, job_id).await?;
    Ok(Json(report))
}

/// GET /api/v1/candidates/:id/evaluations
pub async fn handle_evaluation_history(
    State(state): State<AppState>,
    session: Session,
    Path(candidate_id): Path<Uuid>,
) -> Result<Json<Vec<Evaluation>>, AppError> {
    state
        .store
        .get_candidate(session.user_id, candidate_id)
        .await?
        .ok_or_else(|| AppError::not_found("Candidate", candidate_id))?;
    let history = state
        .store
        .evaluation_history(session.user_id, candidate_id)
        .await?;
    Ok(Json(history))
}
