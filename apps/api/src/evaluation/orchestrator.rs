//! Single-candidate, retry and keyword evaluation pipelines.

use chrono::{Datelike, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::Session;
use crate::errors::AppError;
use crate::evaluation::keyword::{screen_all, KeywordReport};
use crate::evaluation::recommendation::parse_recommendation;
use crate::evaluation::scoring::{compute_atq_score, AtqWeights};
use crate::evaluation::versioning::{change_reason, next_version, score_change, EvaluationTrigger};
use crate::evaluator::{
    CandidateEvaluator, EvaluateOptions, EvaluationCandidate, EvaluationJob, EvaluatorOutcome,
    MANUAL_RETRY_MAX_RETRIES,
};
use crate::models::candidate::{Candidate, EvaluationStatus};
use crate::models::evaluation::{Evaluation, EvaluationRecord, EvaluationStage};
use crate::models::job::Job;
use crate::store::RecruitStore;

pub const NO_RESUME_MESSAGE: &str = "Candidate has no resume text to evaluate";
pub const EVALUATION_FAILED_MESSAGE: &str = "AI evaluation failed";
pub const NO_CANDIDATES_MESSAGE: &str = "No candidates selected for evaluation";

/// Evaluates one candidate against a job and records the result as a new
/// evaluation version.
pub async fn evaluate_candidate(
    store: &dyn RecruitStore,
    evaluator: &dyn CandidateEvaluator,
    session: &Session,
    candidate_id: Uuid,
    job_id: Uuid,
    options: &EvaluateOptions,
) -> Result<Evaluation, AppError> {
    let (candidate, job) = load_evaluable(store, session, candidate_id, job_id, options).await?;

    store
        .set_evaluation_status(
            session.user_id,
            &[candidate.id],
            EvaluationStatus::Evaluating,
            None,
        )
        .await?;

    run_and_commit(
        store,
        evaluator,
        session,
        &job,
        &EvaluationJob::from(&job),
        &candidate,
        options,
        EvaluationTrigger::Evaluate,
    )
    .await
}

/// Re-runs a candidate's evaluation with the manual-retry budget.
pub async fn retry_evaluation(
    store: &dyn RecruitStore,
    evaluator: &dyn CandidateEvaluator,
    session: &Session,
    candidate_id: Uuid,
    job_id: Uuid,
    options: &EvaluateOptions,
) -> Result<Evaluation, AppError> {
    let (candidate, job) = load_evaluable(store, session, candidate_id, job_id, options).await?;

    info!("Manual retry requested for candidate {}", candidate.id);
    store
        .set_evaluation_status(session.user_id, &[candidate.id], EvaluationStatus::Pending, None)
        .await?;
    store
        .set_evaluation_status(
            session.user_id,
            &[candidate.id],
            EvaluationStatus::Evaluating,
            None,
        )
        .await?;

    let options = EvaluateOptions {
        max_retries: MANUAL_RETRY_MAX_RETRIES,
        ..options.clone()
    };

    run_and_commit(
        store,
        evaluator,
        session,
        &job,
        &EvaluationJob::from(&job),
        &candidate,
        &options,
        EvaluationTrigger::ManualRetry,
    )
    .await
}

/// Keyword-screens the selected candidates and overwrites their score and
/// recommendation. Records no evaluation and leaves statuses untouched.
pub async fn regex_evaluate(
    store: &dyn RecruitStore,
    session: &Session,
    job_id: Uuid,
    candidate_ids: &[Uuid],
) -> Result<KeywordReport, AppError> {
    if candidate_ids.is_empty() {
        return Err(AppError::Validation(NO_CANDIDATES_MESSAGE.to_string()));
    }

    let job = store
        .get_job(session.user_id, job_id)
        .await?
        .ok_or_else(|| AppError::not_found("Job", job_id))?;
    let candidates = store
        .get_candidates(session.user_id, job_id, candidate_ids)
        .await?;

    let report = screen_all(&job, &candidates, Utc::now().year());
    for result in &report.results {
        store
            .set_keyword_result(
                session.user_id,
                result.candidate_id,
                result.score,
                &result.recommendation,
            )
            .await?;
    }

    info!(
        "Keyword screen for job {}: {} candidates, top score {}",
        job_id, report.summary.total_candidates, report.summary.top_score
    );
    Ok(report)
}

pub(crate) fn validate_options(options: &EvaluateOptions) -> Result<EvaluationStage, AppError> {
    EvaluationStage::from_number(options.stage)
        .ok_or_else(|| AppError::Validation("Evaluation stage must be 1 or 2".to_string()))
}

async fn load_evaluable(
    store: &dyn RecruitStore,
    session: &Session,
    candidate_id: Uuid,
    job_id: Uuid,
    options: &EvaluateOptions,
) -> Result<(Candidate, Job), AppError> {
    validate_options(options)?;

    let candidate = store
        .get_candidate(session.user_id, candidate_id)
        .await?
        .filter(|c| c.job_id == job_id)
        .ok_or_else(|| AppError::not_found("Candidate", candidate_id))?;
    let job = store
        .get_job(session.user_id, job_id)
        .await?
        .ok_or_else(|| AppError::not_found("Job", job_id))?;

    if !candidate.has_resume_text() {
        return Err(AppError::Validation(NO_RESUME_MESSAGE.to_string()));
    }

    Ok((candidate, job))
}

/// Calls the evaluator and commits the outcome. Shared by the single, retry
/// and batch pipelines; the candidate must already be `evaluating`.
///
/// On any failure the candidate is marked `failed`.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn run_and_commit(
    store: &dyn RecruitStore,
    evaluator: &dyn CandidateEvaluator,
    session: &Session,
    job: &Job,
    evaluation_job: &EvaluationJob,
    candidate: &Candidate,
    options: &EvaluateOptions,
    trigger: EvaluationTrigger,
) -> Result<Evaluation, AppError> {
    let stage = validate_options(options)?;

    let outcome = match evaluator
        .evaluate(evaluation_job, &EvaluationCandidate::from(candidate), options)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Evaluator failed for candidate {}: {e}", candidate.id);
            mark_failed(store, session, candidate.id).await;
            return Err(AppError::Evaluator(EVALUATION_FAILED_MESSAGE.to_string()));
        }
    };

    let committed = commit_outcome(store, session, job, candidate, stage, outcome, trigger).await;
    if let Err(e) = &committed {
        warn!("Could not record evaluation for candidate {}: {e}", candidate.id);
        mark_failed(store, session, candidate.id).await;
    }
    committed
}

async fn commit_outcome(
    store: &dyn RecruitStore,
    session: &Session,
    job: &Job,
    candidate: &Candidate,
    stage: EvaluationStage,
    outcome: EvaluatorOutcome,
    trigger: EvaluationTrigger,
) -> Result<Evaluation, AppError> {
    let previous = store.latest_evaluation(session.user_id, candidate.id).await?;
    let version = next_version(previous.as_ref().map(|e| e.version));

    let assessment = outcome.assessment;
    let sub_scores = assessment.sub_scores();
    let overall_score = assessment
        .score
        .or_else(|| {
            sub_scores
                .atq()
                .map(|atq| compute_atq_score(&atq, &AtqWeights::default()))
        })
        .unwrap_or(0.0);

    let record = EvaluationRecord {
        candidate_id: candidate.id,
        job_id: job.id,
        user_id: session.user_id,
        version,
        stage,
        overall_score,
        recommendation: parse_recommendation(&assessment.recommendation),
        confidence: assessment.confidence,
        key_strengths: assessment.key_strengths,
        concerns: assessment.key_concerns,
        interview_questions: assessment.interview_questions,
        sub_scores,
        reasoning: assessment.reasoning,
        model: outcome.model,
        usage: outcome.usage,
        score_change: score_change(
            version,
            previous.as_ref().map(|e| e.overall_score),
            overall_score,
        ),
        change_reason: change_reason(trigger, version),
    };

    let evaluation = store.commit_evaluation(&record).await?;
    info!(
        "Recorded evaluation v{} for {}: score {} ({})",
        evaluation.version, candidate.name, evaluation.overall_score, evaluation.recommendation
    );
    Ok(evaluation)
}

async fn mark_failed(store: &dyn RecruitStore, session: &Session, candidate_id: Uuid) {
    if let Err(e) = store
        .set_evaluation_status(session.user_id, &[candidate_id], EvaluationStatus::Failed, None)
        .await
    {
        warn!("Could not mark candidate {candidate_id} as failed: {e}");
    }
}
