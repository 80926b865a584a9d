use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::Session;
use crate::errors::AppError;
use crate::evaluation::keyword::screen_all;
use crate::export::{export_filename, render, ExportDocument, ExportFormat, ExportMode};
use crate::results::fetch_results;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default)]
    pub mode: ExportMode,
}

/// GET /api/v1/jobs/:id/export?format=xlsx|pdf&mode=ai|regex
pub async fn handle_export(
    State(state): State<AppState>,
    session: Session,
    Path(job_id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let today = Utc::now().date_naive();

    let document = match query.mode {
        ExportMode::Ai => {
            let report = fetch_results(state.store.as_ref(), &session, job_id).await?;
            ExportDocument::from_results(&report, today)
        }
        ExportMode::Regex => {
            let job = state
                .store
                .get_job(session.user_id, job_id)
                .await?
                .ok_or_else(|| AppError::not_found("Job", job_id))?;
            let candidates = state.store.list_candidates(session.user_id, job_id).await?;
            let report = screen_all(&job, &candidates, today.year());
            ExportDocument::from_keywords(&job.title, &report, today)
        }
    };

    let bytes = render(&document, query.format)?;
    let filename = export_filename(&document.job_title, today, query.format);
    info!(
        "Exported {} candidate(s) for job {} as {}",
        document.rows.len(),
        job_id,
        filename
    );

    Ok((
        [
            (header::CONTENT_TYPE, query.format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
