//! Batch evaluation with bounded fan-out.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::Session;
use crate::errors::AppError;
use crate::evaluation::orchestrator::{run_and_commit, validate_options, NO_CANDIDATES_MESSAGE};
use crate::evaluation::versioning::EvaluationTrigger;
use crate::evaluator::{CandidateEvaluator, EvaluateOptions, EvaluationJob};
use crate::models::candidate::{Candidate, EvaluationStatus};
use crate::models::evaluation::{Evaluation, Recommendation, TokenUsage, UsageTotals};
use crate::store::RecruitStore;

pub const DEFAULT_CONCURRENCY: usize = 3;
pub const SKIPPED_NOTE: &str = "Skipped: no resume text available for evaluation";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateOutcome {
    pub candidate_id: Uuid,
    pub name: String,
    pub success: bool,
    pub score: f64,
    pub recommendation: Recommendation,
    pub error: Option<String>,
    pub usage: TokenUsage,
    pub evaluation: Option<Evaluation>,
}

impl CandidateOutcome {
    fn from_result(candidate: &Candidate, result: Result<Evaluation, AppError>) -> Self {
        match result {
            Ok(evaluation) => CandidateOutcome {
                candidate_id: candidate.id,
                name: candidate.name.clone(),
                success: true,
                score: evaluation.overall_score,
                recommendation: evaluation.recommendation.clone(),
                error: None,
                usage: evaluation.usage,
                evaluation: Some(evaluation),
            },
            Err(e) => CandidateOutcome {
                candidate_id: candidate.id,
                name: candidate.name.clone(),
                success: false,
                score: 0.0,
                recommendation: Recommendation::Error,
                error: Some(e.to_string()),
                usage: TokenUsage::default(),
                evaluation: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedCandidate {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total_candidates: usize,
    pub advance_to_interview: usize,
    pub phone_screen: usize,
    pub declined: usize,
    pub errors: usize,
    pub top_candidate: Option<String>,
    pub top_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    /// Score descending.
    pub outcomes: Vec<CandidateOutcome>,
    pub summary: BatchSummary,
    pub usage: UsageTotals,
    pub skipped: Vec<SkippedCandidate>,
}

/// One completed candidate, reported as soon as it finishes.
pub struct BatchProgress<'a> {
    pub current: usize,
    pub total: usize,
    pub candidate_name: &'a str,
    pub outcome: &'a CandidateOutcome,
}

/// Receives per-candidate completions during a batch.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: &BatchProgress<'_>);
}

/// Logs each completion.
pub struct LoggingProgress;

impl ProgressObserver for LoggingProgress {
    fn on_progress(&self, progress: &BatchProgress<'_>) {
        if progress.outcome.success {
            info!(
                "[{}/{}] {}: score {}",
                progress.current, progress.total, progress.candidate_name, progress.outcome.score
            );
        } else {
            warn!(
                "[{}/{}] {} failed: {}",
                progress.current,
                progress.total,
                progress.candidate_name,
                progress.outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

/// Evaluates the selected candidates with at most `concurrency` evaluator
/// calls in flight. A failure only affects its own candidate.
#[allow(clippy::too_many_arguments)]
pub async fn batch_evaluate(
    store: &dyn RecruitStore,
    evaluator: &dyn CandidateEvaluator,
    session: &Session,
    job_id: Uuid,
    candidate_ids: &[Uuid],
    options: &EvaluateOptions,
    concurrency: usize,
    observer: &dyn ProgressObserver,
) -> Result<BatchReport, AppError> {
    if candidate_ids.is_empty() {
        return Err(AppError::Validation(NO_CANDIDATES_MESSAGE.to_string()));
    }
    validate_options(options)?;

    let job = store
        .get_job(session.user_id, job_id)
        .await?
        .ok_or_else(|| AppError::not_found("Job", job_id))?;
    let candidates = store
        .get_candidates(session.user_id, job_id, candidate_ids)
        .await?;

    let (valid, invalid): (Vec<Candidate>, Vec<Candidate>) =
        candidates.into_iter().partition(Candidate::has_resume_text);

    let skipped: Vec<SkippedCandidate> = invalid
        .iter()
        .map(|c| SkippedCandidate {
            id: c.id,
            name: c.name.clone(),
        })
        .collect();
    if !skipped.is_empty() {
        warn!(
            "Skipping {} candidate(s) without resume text for job {}",
            skipped.len(),
            job_id
        );
        let ids: Vec<Uuid> = skipped.iter().map(|s| s.id).collect();
        store
            .set_evaluation_status(
                session.user_id,
                &ids,
                EvaluationStatus::Failed,
                Some(SKIPPED_NOTE),
            )
            .await?;
    }

    if valid.is_empty() {
        return Ok(BatchReport {
            skipped,
            ..Default::default()
        });
    }

    let valid_ids: Vec<Uuid> = valid.iter().map(|c| c.id).collect();
    store
        .set_evaluation_status(
            session.user_id,
            &valid_ids,
            EvaluationStatus::Evaluating,
            None,
        )
        .await?;

    info!(
        "Batch evaluation of {} candidate(s) for job {} (concurrency {})",
        valid.len(),
        job_id,
        concurrency
    );

    let evaluation_job = EvaluationJob::from(&job);
    let total = valid.len();
    let job = &job;
    let evaluation_job = &evaluation_job;
    let mut completions = stream::iter(valid)
        .map(move |candidate: Candidate| async move {
            let result = run_and_commit(
                store,
                evaluator,
                session,
                job,
                evaluation_job,
                &candidate,
                options,
                EvaluationTrigger::Evaluate,
            )
            .await;
            CandidateOutcome::from_result(&candidate, result)
        })
        .buffer_unordered(concurrency.max(1));

    let mut outcomes = Vec::with_capacity(total);
    while let Some(outcome) = completions.next().await {
        outcomes.push(outcome);
        if let Some(latest) = outcomes.last() {
            observer.on_progress(&BatchProgress {
                current: outcomes.len(),
                total,
                candidate_name: &latest.name,
                outcome: latest,
            });
        }
    }

    outcomes.sort_by(|a, b| b.score.total_cmp(&a.score));
    let summary = summarize(&outcomes);
    let usage = UsageTotals::sum(outcomes.iter().map(|o| &o.usage));

    info!(
        "Batch complete: {} evaluated, {} errors, {} skipped, cost ${:.4}",
        summary.total_candidates, summary.errors, skipped.len(), usage.cost
    );

    Ok(BatchReport {
        outcomes,
        summary,
        usage,
        skipped,
    })
}

/// Counts by recommendation; top candidate is the first of the sorted list.
pub fn summarize(outcomes: &[CandidateOutcome]) -> BatchSummary {
    let count = |r: Recommendation| outcomes.iter().filter(|o| o.recommendation == r).count();
    BatchSummary {
        total_candidates: outcomes.len(),
        advance_to_interview: count(Recommendation::Interview),
        phone_screen: count(Recommendation::PhoneScreen),
        declined: count(Recommendation::Decline),
        errors: count(Recommendation::Error),
        top_candidate: outcomes.first().map(|o| o.name.clone()),
        top_score: outcomes.first().map_or(0.0, |o| o.score),
    }
}
