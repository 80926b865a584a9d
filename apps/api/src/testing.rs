//! Shared fixtures for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::auth::Session;
use crate::evaluator::{
    Assessment, CandidateEvaluator, EvaluateOptions, EvaluationCandidate, EvaluationJob,
    EvaluatorError, EvaluatorOutcome,
};
use crate::models::candidate::{
    Candidate, ContactInfo, EvaluationStatus, EvaluationSummary, NewCandidate, ResumeFile,
    ScoreTiers,
};
use crate::models::evaluation::TokenUsage;
use crate::models::job::{
    CompensationRange, ExperienceRange, Job, JobStatus, NewJob, Requirements,
};
use crate::store::RecruitStore;

pub fn job_fixture() -> Job {
    let now = Utc::now();
    Job {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        title: "Senior Backend Engineer".to_string(),
        description: None,
        department: Some("Engineering".to_string()),
        location: Some("Remote".to_string()),
        employment_type: Some("Full-time".to_string()),
        requirements: Requirements::default(),
        education: None,
        licenses: None,
        compensation: CompensationRange::default(),
        experience: ExperienceRange::default(),
        status: JobStatus::Open,
        performance_profile: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn candidate_fixture(name: &str, resume_text: Option<&str>) -> Candidate {
    let now = Utc::now();
    Candidate {
        id: Uuid::new_v4(),
        job_id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        name: name.to_string(),
        contact: ContactInfo::default(),
        resume_text: resume_text.map(str::to_string),
        resume_file: ResumeFile::default(),
        skills: vec![],
        education: vec![],
        additional_notes: None,
        evaluation_status: EvaluationStatus::Pending,
        shortlisted: false,
        recruiter_notes: None,
        summary: EvaluationSummary::default(),
        tiers: ScoreTiers::default(),
        created_at: now,
        updated_at: now,
    }
}

pub fn test_session() -> Session {
    Session {
        user_id: Uuid::new_v4(),
    }
}

pub async fn seed_job(store: &dyn RecruitStore, session: &Session) -> Job {
    let new_job: NewJob = serde_json::from_value(serde_json::json!({
        "title": "Senior Backend Engineer",
        "department": "Engineering"
    }))
    .expect("valid job json");
    store
        .create_job(session.user_id, &new_job)
        .await
        .expect("create job")
}

pub async fn seed_candidate(
    store: &dyn RecruitStore,
    session: &Session,
    job: &Job,
    name: &str,
    resume_text: Option<&str>,
) -> Candidate {
    let new_candidate = NewCandidate {
        name: name.to_string(),
        email: Some(format!("{}@example.com", name.to_lowercase())),
        phone: None,
        location: None,
        resume_text: resume_text.map(str::to_string),
        resume_file_url: None,
        resume_file_name: None,
        skills: vec![],
        education: vec![],
        additional_notes: None,
    };
    store
        .create_candidate(session.user_id, job.id, &new_candidate)
        .await
        .expect("create candidate")
}

/// A successful evaluator outcome with the given score and wire recommendation.
pub fn outcome(score: f64, recommendation: &str) -> EvaluatorOutcome {
    EvaluatorOutcome {
        assessment: Assessment {
            score: Some(score),
            recommendation: recommendation.to_string(),
            key_strengths: vec!["Relevant experience".to_string()],
            key_concerns: vec![],
            interview_questions: vec!["Tell us about a hard bug".to_string()],
            reasoning: Some("Scripted".to_string()),
            confidence: Some(0.8),
            ..Default::default()
        },
        usage: TokenUsage {
            input_tokens: 1000,
            output_tokens: 200,
            cost: 0.001,
        },
        model: Some("scripted-model".to_string()),
    }
}

type Scripted = Result<EvaluatorOutcome, EvaluatorError>;

/// Evaluator fake. Responses scripted for a candidate name take priority over
/// the shared queue; an exhausted script fails with `Rejected`.
#[derive(Default)]
pub struct ScriptedEvaluator {
    queue: Mutex<VecDeque<Scripted>>,
    by_name: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<(String, EvaluateOptions)>>,
}

impl ScriptedEvaluator {
    pub fn new(responses: Vec<Scripted>) -> Self {
        Self {
            queue: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    pub fn with_response(self, name: &str, response: Scripted) -> Self {
        self.by_name
            .lock()
            .expect("script lock")
            .entry(name.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<EvaluateOptions> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(_, options)| options.clone())
            .collect()
    }

    pub fn called_names(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl CandidateEvaluator for ScriptedEvaluator {
    async fn evaluate(
        &self,
        _job: &EvaluationJob,
        candidate: &EvaluationCandidate,
        options: &EvaluateOptions,
    ) -> Result<EvaluatorOutcome, EvaluatorError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((candidate.name.clone(), options.clone()));

        let named = self
            .by_name
            .lock()
            .expect("script lock")
            .get_mut(&candidate.name)
            .and_then(VecDeque::pop_front);
        let next = named.or_else(|| self.queue.lock().expect("script lock").pop_front());
        next.unwrap_or_else(|| Err(EvaluatorError::Rejected("script exhausted".to_string())))
    }
}
