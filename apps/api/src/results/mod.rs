//! Read path for a job's evaluated candidates.

pub mod handlers;

use serde::Serialize;
use uuid::Uuid;

use crate::auth::Session;
use crate::errors::AppError;
use crate::evaluation::scoring::{display_score, TieredScore};
use crate::models::candidate::Candidate;
use crate::models::evaluation::{Evaluation, Recommendation, UsageTotals};
use crate::models::job::Job;
use crate::store::{CandidateWithEvaluations, RecruitStore};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub advance_to_interview: usize,
    pub phone_screen: usize,
    pub declined: usize,
    pub top_candidate: Option<String>,
    pub top_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub candidate: Candidate,
    /// Highest-version evaluation, if any was recorded.
    pub evaluation: Option<Evaluation>,
    pub display_score: Option<TieredScore>,
}

impl RankedCandidate {
    /// Recommendation from the authoritative evaluation, else the candidate summary.
    pub fn recommendation(&self) -> Option<&Recommendation> {
        self.evaluation
            .as_ref()
            .map(|e| &e.recommendation)
            .or(self.candidate.summary.recommendation.as_ref())
    }

    pub fn score(&self) -> Option<f64> {
        self.evaluation
            .as_ref()
            .map(|e| e.overall_score)
            .or(self.candidate.summary.score)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsReport {
    pub job: Job,
    /// Score descending, as ordered by the store.
    pub candidates: Vec<RankedCandidate>,
    pub summary: ReportSummary,
    pub usage: UsageTotals,
}

pub fn latest_evaluation(evaluations: Vec<Evaluation>) -> Option<Evaluation> {
    evaluations.into_iter().max_by_key(|e| e.version)
}

/// Assembles the report without reordering the candidates.
pub fn build_results(job: Job, evaluated: Vec<CandidateWithEvaluations>) -> ResultsReport {
    let candidates: Vec<RankedCandidate> = evaluated
        .into_iter()
        .map(|entry| {
            let display_score = display_score(&entry.candidate.tiers);
            RankedCandidate {
                evaluation: latest_evaluation(entry.evaluations),
                display_score,
                candidate: entry.candidate,
            }
        })
        .collect();

    let count = |wanted: Recommendation| {
        candidates
            .iter()
            .filter(|c| c.recommendation() == Some(&wanted))
            .count()
    };
    let summary = ReportSummary {
        total: candidates.len(),
        advance_to_interview: count(Recommendation::Interview),
        phone_screen: count(Recommendation::PhoneScreen),
        declined: count(Recommendation::Decline),
        top_candidate: candidates.first().map(|c| c.candidate.name.clone()),
        top_score: candidates.first().and_then(RankedCandidate::score).unwrap_or(0.0),
    };
    let usage = UsageTotals::sum(
        candidates
            .iter()
            .filter_map(|c| c.evaluation.as_ref())
            .map(|e| &e.usage),
    );

    ResultsReport {
        job,
        candidates,
        summary,
        usage,
    }
}

pub async fn fetch_results(
    store: &dyn RecruitStore,
    session: &Session,
    job_id: Uuid,
) -> Result<ResultsReport, AppError> {
    let job = store
        .get_job(session.user_id, job_id)
        .await?
        .ok_or_else(|| AppError::not_found("Job", job_id))?;
    let evaluated = store.evaluated_candidates(session.user_id, job_id).await?;
    Ok(build_results(job, evaluated))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::evaluation::orchestrator::evaluate_candidate;
    use crate::evaluator::EvaluateOptions;
    use crate::models::evaluation::{EvaluationStage, SubScores, TokenUsage};
    use crate::store::memory::MemoryStore;
    use crate::testing::{
        candidate_fixture, job_fixture, outcome, seed_candidate, seed_job, test_session,
        ScriptedEvaluator,
    };

    fn evaluation(candidate: &Candidate, version: i32, score: f64, rec: Recommendation) -> Evaluation {
        Evaluation {
            id: Uuid::new_v4(),
            candidate_id: candidate.id,
            job_id: candidate.job_id,
            user_id: candidate.user_id,
            version,
            stage: EvaluationStage::Stage1,
            overall_score: score,
            recommendation: rec,
            confidence: None,
            key_strengths: vec![],
            concerns: vec![],
            interview_questions: vec![],
            sub_scores: SubScores::default(),
            reasoning: None,
            model: None,
            usage: TokenUsage {
                input_tokens: 100,
                output_tokens: 50,
                cost: 0.01,
            },
            score_change: None,
            change_reason: None,
            created_at: Utc::now(),
        }
    }

    fn entry(name: &str, evaluations: Vec<(i32, f64, Recommendation)>) -> CandidateWithEvaluations {
        let candidate = candidate_fixture(name, Some("resume"));
        let evaluations = evaluations
            .into_iter()
            .map(|(v, s, r)| evaluation(&candidate, v, s, r))
            .collect();
        CandidateWithEvaluations {
            candidate,
            evaluations,
        }
    }

    #[test]
    fn test_summary_counts_by_recommendation() {
        let report = build_results(
            job_fixture(),
            vec![
                entry("A", vec![(1, 91.0, Recommendation::Interview)]),
                entry("B", vec![(1, 87.0, Recommendation::Interview)]),
                entry("C", vec![(1, 72.0, Recommendation::PhoneScreen)]),
                entry("D", vec![(1, 40.0, Recommendation::Decline)]),
            ],
        );
        assert_eq!(report.summary.advance_to_interview, 2);
        assert_eq!(report.summary.phone_screen, 1);
        assert_eq!(report.summary.declined, 1);
        assert_eq!(report.summary.total, 4);
        assert!((report.usage.cost - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_highest_version_is_authoritative() {
        let report = build_results(
            job_fixture(),
            vec![entry(
                "A",
                vec![
                    (3, 60.0, Recommendation::Decline),
                    (1, 90.0, Recommendation::Interview),
                    (2, 80.0, Recommendation::PhoneScreen),
                ],
            )],
        );
        let authoritative = report.candidates[0].evaluation.as_ref().unwrap();
        assert_eq!(authoritative.version, 3);
        assert_eq!(report.summary.declined, 1);
        assert_eq!(report.summary.advance_to_interview, 0);
    }

    #[test]
    fn test_top_candidate_is_first_without_resort() {
        let report = build_results(
            job_fixture(),
            vec![
                entry("Low", vec![(1, 50.0, Recommendation::Decline)]),
                entry("High", vec![(1, 95.0, Recommendation::Interview)]),
            ],
        );
        assert_eq!(report.summary.top_candidate.as_deref(), Some("Low"));
        assert_eq!(report.summary.top_score, 50.0);
    }

    #[test]
    fn test_empty_results() {
        let report = build_results(job_fixture(), vec![]);
        assert_eq!(report.summary, ReportSummary::default());
        assert_eq!(report.usage.cost, 0.0);
    }

    #[tokio::test]
    async fn test_fetch_results_orders_by_score() {
        let store = MemoryStore::new();
        let session = test_session();
        let job = seed_job(&store, &session).await;
        let a = seed_candidate(&store, &session, &job, "Ada", Some("resume")).await;
        let b = seed_candidate(&store, &session, &job, "Bo", Some("resume")).await;
        seed_candidate(&store, &session, &job, "Unevaluated", Some("resume")).await;
        let evaluator = ScriptedEvaluator::new(vec![
            Ok(outcome(62.0, "DECLINE")),
            Ok(outcome(88.0, "ADVANCE TO INTERVIEW")),
        ]);
        let options = EvaluateOptions::default();
        evaluate_candidate(&store, &evaluator, &session, a.id, job.id, &options)
            .await
            .unwrap();
        evaluate_candidate(&store, &evaluator, &session, b.id, job.id, &options)
            .await
            .unwrap();

        let report = fetch_results(&store, &session, job.id).await.unwrap();
        let names: Vec<&str> = report
            .candidates
            .iter()
            .map(|c| c.candidate.name.as_str())
            .collect();
        assert_eq!(names, vec!["Bo", "Ada"]);
        assert_eq!(report.summary.top_score, 88.0);
        assert_eq!(
            report.candidates[0].display_score.map(|d| d.score),
            Some(88.0)
        );
    }

    #[tokio::test]
    async fn test_fetch_results_unknown_job() {
        let store = MemoryStore::new();
        let err = fetch_results(&store, &test_session(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
