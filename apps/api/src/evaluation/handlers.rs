use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Session;
use crate::errors::AppError;
use crate::evaluation::batch::{batch_evaluate, BatchReport, LoggingProgress};
use crate::evaluation::keyword::KeywordReport;
use crate::evaluation::orchestrator::{evaluate_candidate, regex_evaluate, retry_evaluation};
use crate::evaluator::{EvaluateOptions, DEFAULT_MAX_RETRIES};
use crate::models::evaluation::Evaluation;
use crate::state::AppState;

/// Evaluator options as sent by clients. Absent fields fall back to the
/// server configuration.
#[derive(Debug, Default, Deserialize)]
pub struct OptionsRequest {
    pub stage: Option<u8>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub additional_instructions: Option<String>,
}

impl OptionsRequest {
    fn resolve(self, state: &AppState) -> EvaluateOptions {
        EvaluateOptions {
            stage: self.stage.unwrap_or(1),
            provider: self
                .provider
                .unwrap_or_else(|| state.config.default_provider.clone()),
            model: self.model.or_else(|| state.config.default_model.clone()),
            additional_instructions: self.additional_instructions,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    #[serde(flatten)]
    pub options: OptionsRequest,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub job_id: Uuid,
    #[serde(default)]
    pub candidate_ids: Vec<Uuid>,
    pub concurrency: Option<usize>,
    #[serde(flatten)]
    pub options: OptionsRequest,
}

#[derive(Debug, Deserialize)]
pub struct RegexRequest {
    pub job_id: Uuid,
    #[serde(default)]
    pub candidate_ids: Vec<Uuid>,
}

/// POST /api/v1/evaluations
pub async fn handle_evaluate(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<Evaluation>, AppError> {
    let options = req.options.resolve(&state);
    let evaluation = evaluate_candidate(
        state.store.as_ref(),
        state.evaluator.as_ref(),
        &session,
        req.candidate_id,
        req.job_id,
        &options,
    )
    .await?;
    Ok(Json(evaluation))
}

/// POST /api/v1/evaluations/batch
pub async fn handle_batch(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchReport>, AppError> {
    let concurrency = req
        .concurrency
        .unwrap_or(state.config.evaluation_concurrency);
    let options = req.options.resolve(&state);
    let report = batch_evaluate(
        state.store.as_ref(),
        state.evaluator.as_ref(),
        &session,
        req.job_id,
        &req.candidate_ids,
        &options,
        concurrency,
        &LoggingProgress,
    )
    .await?;
    Ok(Json(report))
}

/// POST /api/v1/evaluations/regex
pub async fn handle_regex(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<RegexRequest>,
) -> Result<Json<KeywordReport>, AppError> {
    let report = regex_evaluate(state.store.as_ref(), &session, req.job_id, &req.candidate_ids).await?;
    Ok(Json(report))
}

/// POST /api/v1/evaluations/retry
pub async fn handle_retry(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<Evaluation>, AppError> {
    let options = req.options.resolve(&state);
    let evaluation = retry_evaluation(
        state.store.as_ref(),
        state.evaluator.as_ref(),
        &session,
        req.candidate_id,
        req.job_id,
        &options,
    )
    .await?;
    Ok(Json(evaluation))
}
