//! In-memory store for unit tests. Keeps DB-shaped rows so the boundary
//! mapping is exercised the same way as with Postgres.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use super::{CandidateWithEvaluations, RecruitStore};
use crate::errors::AppError;
use crate::models::candidate::{
    Candidate, CandidateRow, CandidateUpdate, EvaluationStatus, NewCandidate,
};
use crate::models::evaluation::{
    Evaluation, EvaluationRecord, EvaluationRow, EvaluationStage, Recommendation,
};
use crate::models::job::{Job, JobRow, JobStatus, JobUpdate, NewJob};

#[derive(Default)]
struct MemoryState {
    jobs: HashMap<Uuid, JobRow>,
    candidates: HashMap<Uuid, CandidateRow>,
    evaluations: Vec<EvaluationRow>,
    /// Candidates whose commit fails after the insert, exercising rollback.
    fail_commits_for: HashSet<Uuid>,
    /// Monotonic tick so creation order is stable within one test.
    clock: i64,
}

impl MemoryState {
    fn tick(&mut self) -> chrono::DateTime<Utc> {
        self.clock += 1;
        Utc::now() + Duration::milliseconds(self.clock)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn fail_commits_for(&self, candidate_id: Uuid) {
        self.lock().fail_commits_for.insert(candidate_id);
    }

    pub fn evaluation_count(&self) -> usize {
        self.lock().evaluations.len()
    }
}

#[async_trait]
impl RecruitStore for MemoryStore {
    async fn create_job(&self, user_id: Uuid, job: &NewJob) -> Result<Job, AppError> {
        let mut state = self.lock();
        let now = state.tick();
        let row = JobRow {
            id: Uuid::new_v4(),
            user_id,
            title: job.title.trim().to_string(),
            description: job.description.clone(),
            department: job.department.clone(),
            location: job.location.clone(),
            employment_type: job.employment_type.clone(),
            must_have_requirements: job.requirements.must_have.clone(),
            preferred_requirements: job.requirements.preferred.clone(),
            education: job.education.clone(),
            licenses: job.licenses.clone(),
            compensation_min: job.compensation.min,
            compensation_max: job.compensation.max,
            experience_min_years: job.experience.min_years,
            experience_max_years: job.experience.max_years,
            status: job.status.unwrap_or(JobStatus::Open).as_str().to_string(),
            performance_profile: job
                .performance_profile
                .as_ref()
                .and_then(|p| serde_json::to_value(p).ok()),
            created_at: now,
            updated_at: now,
        };
        state.jobs.insert(row.id, row.clone());
        Job::try_from(row)
    }

    async fn list_jobs(
        &self,
        user_id: Uuid,
        status: Option<JobStatus>,
    ) -> Result<Vec<Job>, AppError> {
        let state = self.lock();
        let mut rows: Vec<JobRow> = state
            .jobs
            .values()
            .filter(|j| j.user_id == user_id)
            .filter(|j| status.map_or(true, |s| j.status == s.as_str()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.into_iter().map(Job::try_from).collect()
    }

    async fn get_job(&self, user_id: Uuid, job_id: Uuid) -> Result<Option<Job>, AppError> {
        let state = self.lock();
        state
            .jobs
            .get(&job_id)
            .filter(|j| j.user_id == user_id)
            .cloned()
            .map(Job::try_from)
            .transpose()
    }

    async fn update_job(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        update: &JobUpdate,
    ) -> Result<Option<Job>, AppError> {
        let mut state = self.lock();
        let now = state.tick();
        let Some(row) = state.jobs.get_mut(&job_id).filter(|j| j.user_id == user_id) else {
            return Ok(None);
        };

        if let Some(title) = &update.title {
            row.title = title.clone();
        }
        if update.description.is_some() {
            row.description = update.description.clone();
        }
        if update.department.is_some() {
            row.department = update.department.clone();
        }
        if update.location.is_some() {
            row.location = update.location.clone();
        }
        if update.employment_type.is_some() {
            row.employment_type = update.employment_type.clone();
        }
        if let Some(requirements) = &update.requirements {
            row.must_have_requirements = requirements.must_have.clone();
            row.preferred_requirements = requirements.preferred.clone();
        }
        if update.education.is_some() {
            row.education = update.education.clone();
        }
        if update.licenses.is_some() {
            row.licenses = update.licenses.clone();
        }
        if let Some(compensation) = update.compensation {
            row.compensation_min = compensation.min.or(row.compensation_min);
            row.compensation_max = compensation.max.or(row.compensation_max);
        }
        if let Some(experience) = update.experience {
            row.experience_min_years = experience.min_years.or(row.experience_min_years);
            row.experience_max_years = experience.max_years.or(row.experience_max_years);
        }
        if let Some(status) = update.status {
            row.status = status.as_str().to_string();
        }
        if let Some(profile) = &update.performance_profile {
            row.performance_profile = serde_json::to_value(profile).ok();
        }
        row.updated_at = now;

        Job::try_from(row.clone()).map(Some)
    }

    async fn delete_job(&self, user_id: Uuid, job_id: Uuid) -> Result<bool, AppError> {
        let mut state = self.lock();
        let owned = state.jobs.get(&job_id).is_some_and(|j| j.user_id == user_id);
        if !owned {
            return Ok(false);
        }
        state.jobs.remove(&job_id);
        state.candidates.retain(|_, c| c.job_id != job_id);
        state.evaluations.retain(|e| e.job_id != job_id);
        Ok(true)
    }

    async fn create_candidate(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        candidate: &NewCandidate,
    ) -> Result<Candidate, AppError> {
        let mut state = self.lock();
        let now = state.tick();
        let row = CandidateRow {
            id: Uuid::new_v4(),
            job_id,
            user_id,
            name: candidate.name.trim().to_string(),
            email: candidate.email.clone(),
            phone: candidate.phone.clone(),
            location: candidate.location.clone(),
            resume_text: candidate.resume_text.clone(),
            resume_file_url: candidate.resume_file_url.clone(),
            resume_file_name: candidate.resume_file_name.clone(),
            skills: candidate.skills.clone(),
            education: candidate.education.clone(),
            additional_notes: candidate.additional_notes.clone(),
            evaluation_status: EvaluationStatus::Pending.as_str().to_string(),
            shortlisted: false,
            recruiter_notes: None,
            score: None,
            recommendation: None,
            evaluated_at: None,
            evaluation_count: 0,
            quick_score: None,
            quick_score_model: None,
            quick_score_at: None,
            stage1_score: None,
            stage1_a_score: None,
            stage1_t_score: None,
            stage1_q_score: None,
            stage1_evaluated_at: None,
            stage2_score: None,
            stage2_evaluated_at: None,
            created_at: now,
            updated_at: now,
        };
        state.candidates.insert(row.id, row.clone());
        Candidate::try_from(row)
    }

    async fn list_candidates(
        &self,
        user_id: Uuid,
        job_id: Uuid,
    ) -> Result<Vec<Candidate>, AppError> {
        let state = self.lock();
        let mut rows: Vec<CandidateRow> = state
            .candidates
            .values()
            .filter(|c| c.user_id == user_id && c.job_id == job_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.into_iter().map(Candidate::try_from).collect()
    }

    async fn get_candidate(
        &self,
        user_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<Candidate>, AppError> {
        let state = self.lock();
        state
            .candidates
            .get(&candidate_id)
            .filter(|c| c.user_id == user_id)
            .cloned()
            .map(Candidate::try_from)
            .transpose()
    }

    async fn get_candidates(
        &self,
        user_id: Uuid,
        job_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Candidate>, AppError> {
        let state = self.lock();
        let mut rows: Vec<CandidateRow> = state
            .candidates
            .values()
            .filter(|c| c.user_id == user_id && c.job_id == job_id && ids.contains(&c.id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        rows.into_iter().map(Candidate::try_from).collect()
    }

    async fn update_candidate(
        &self,
        user_id: Uuid,
        candidate_id: Uuid,
        update: &CandidateUpdate,
    ) -> Result<Option<Candidate>, AppError> {
        let mut state = self.lock();
        let now = state.tick();
        let Some(row) = state
            .candidates
            .get_mut(&candidate_id)
            .filter(|c| c.user_id == user_id)
        else {
            return Ok(None);
        };

        if let Some(name) = &update.name {
            row.name = name.clone();
        }
        if update.email.is_some() {
            row.email = update.email.clone();
        }
        if update.phone.is_some() {
            row.phone = update.phone.clone();
        }
        if update.location.is_some() {
            row.location = update.location.clone();
        }
        if update.resume_text.is_some() {
            row.resume_text = update.resume_text.clone();
        }
        if update.resume_file_url.is_some() {
            row.resume_file_url = update.resume_file_url.clone();
        }
        if update.resume_file_name.is_some() {
            row.resume_file_name = update.resume_file_name.clone();
        }
        if let Some(skills) = &update.skills {
            row.skills = skills.clone();
        }
        if let Some(education) = &update.education {
            row.education = education.clone();
        }
        if update.additional_notes.is_some() {
            row.additional_notes = update.additional_notes.clone();
        }
        if let Some(shortlisted) = update.shortlisted {
            row.shortlisted = shortlisted;
        }
        if update.recruiter_notes.is_some() {
            row.recruiter_notes = update.recruiter_notes.clone();
        }
        row.updated_at = now;

        Candidate::try_from(row.clone()).map(Some)
    }

    async fn delete_candidate(
        &self,
        user_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<bool, AppError> {
        let mut state = self.lock();
        let owned = state
            .candidates
            .get(&candidate_id)
            .is_some_and(|c| c.user_id == user_id);
        if !owned {
            return Ok(false);
        }
        state.candidates.remove(&candidate_id);
        state.evaluations.retain(|e| e.candidate_id != candidate_id);
        Ok(true)
    }

    async fn set_evaluation_status(
        &self,
        user_id: Uuid,
        candidate_ids: &[Uuid],
        status: EvaluationStatus,
        note: Option<&str>,
    ) -> Result<(), AppError> {
        let mut state = self.lock();
        let now = state.tick();
        for row in state.candidates.values_mut() {
            if row.user_id == user_id && candidate_ids.contains(&row.id) {
                row.evaluation_status = status.as_str().to_string();
                if let Some(note) = note {
                    row.recruiter_notes = Some(note.to_string());
                }
                row.updated_at = now;
            }
        }
        Ok(())
    }

    async fn set_keyword_result(
        &self,
        user_id: Uuid,
        candidate_id: Uuid,
        score: f64,
        recommendation: &Recommendation,
    ) -> Result<(), AppError> {
        let mut state = self.lock();
        let now = state.tick();
        if let Some(row) = state
            .candidates
            .get_mut(&candidate_id)
            .filter(|c| c.user_id == user_id)
        {
            row.score = Some(score);
            row.recommendation = Some(recommendation.as_str().to_string());
            row.updated_at = now;
        }
        Ok(())
    }

    async fn latest_evaluation(
        &self,
        user_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Option<Evaluation>, AppError> {
        let state = self.lock();
        state
            .evaluations
            .iter()
            .filter(|e| e.candidate_id == candidate_id && e.user_id == user_id)
            .max_by_key(|e| e.version)
            .cloned()
            .map(Evaluation::try_from)
            .transpose()
    }

    async fn commit_evaluation(&self, record: &EvaluationRecord) -> Result<Evaluation, AppError> {
        let mut state = self.lock();
        let now = state.tick();

        let duplicate = state
            .evaluations
            .iter()
            .any(|e| e.candidate_id == record.candidate_id && e.version == record.version);
        if duplicate {
            return Err(AppError::Internal(anyhow::anyhow!(
                "duplicate evaluation version {} for candidate {}",
                record.version,
                record.candidate_id
            )));
        }

        let row = EvaluationRow {
            id: Uuid::new_v4(),
            candidate_id: record.candidate_id,
            job_id: record.job_id,
            user_id: record.user_id,
            version: record.version,
            stage: record.stage.as_str().to_string(),
            overall_score: record.overall_score,
            recommendation: record.recommendation.as_str().to_string(),
            confidence: record.confidence,
            key_strengths: record.key_strengths.clone(),
            concerns: record.concerns.clone(),
            interview_questions: record.interview_questions.clone(),
            accomplishments_score: record.sub_scores.accomplishments,
            trajectory_score: record.sub_scores.trajectory,
            qualifications_score: record.sub_scores.qualifications,
            experience_score: record.sub_scores.experience,
            risk_flags_score: record.sub_scores.risk_flags,
            reasoning: record.reasoning.clone(),
            model: record.model.clone(),
            prompt_tokens: record.usage.input_tokens as i32,
            completion_tokens: record.usage.output_tokens as i32,
            cost: record.usage.cost,
            score_change: record.score_change,
            change_reason: record.change_reason.clone(),
            created_at: now,
        };

        // Both writes land or neither does.
        if state.fail_commits_for.contains(&record.candidate_id) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "candidate summary update failed for {}",
                record.candidate_id
            )));
        }
        let Some(candidate) = state
            .candidates
            .get_mut(&record.candidate_id)
            .filter(|c| c.user_id == record.user_id)
        else {
            return Err(AppError::not_found("Candidate", record.candidate_id));
        };

        candidate.evaluation_status = EvaluationStatus::Evaluated.as_str().to_string();
        candidate.score = Some(record.overall_score);
        candidate.recommendation = Some(record.recommendation.as_str().to_string());
        candidate.evaluated_at = Some(now);
        candidate.evaluation_count = record.version;
        candidate.updated_at = now;
        match record.stage {
            EvaluationStage::Stage1 => {
                candidate.stage1_score = Some(record.overall_score);
                candidate.stage1_a_score = record.sub_scores.accomplishments;
                candidate.stage1_t_score = record.sub_scores.trajectory;
                candidate.stage1_q_score = record.sub_scores.qualifications;
                candidate.stage1_evaluated_at = Some(now);
            }
            EvaluationStage::Stage2 => {
                candidate.stage2_score = Some(record.overall_score);
                candidate.stage2_evaluated_at = Some(now);
            }
        }

        state.evaluations.push(row.clone());
        Evaluation::try_from(row)
    }

    async fn evaluation_history(
        &self,
        user_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<Vec<Evaluation>, AppError> {
        let state = self.lock();
        let mut rows: Vec<EvaluationRow> = state
            .evaluations
            .iter()
            .filter(|e| e.candidate_id == candidate_id && e.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.version.cmp(&a.version));
        rows.into_iter().map(Evaluation::try_from).collect()
    }

    async fn evaluated_candidates(
        &self,
        user_id: Uuid,
        job_id: Uuid,
    ) -> Result<Vec<CandidateWithEvaluations>, AppError> {
        let state = self.lock();
        let mut rows: Vec<CandidateRow> = state
            .candidates
            .values()
            .filter(|c| {
                c.user_id == user_id
                    && c.job_id == job_id
                    && c.evaluation_status == EvaluationStatus::Evaluated.as_str()
            })
            .cloned()
            .collect();
        // score DESC NULLS LAST, then creation order
        rows.sort_by(|a, b| match (a.score, b.score) {
            (Some(x), Some(y)) => y
                .total_cmp(&x)
                .then_with(|| a.created_at.cmp(&b.created_at)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.created_at.cmp(&b.created_at),
        });

        rows.into_iter()
            .map(|row| {
                let mut evaluations: Vec<EvaluationRow> = state
                    .evaluations
                    .iter()
                    .filter(|e| e.candidate_id == row.id)
                    .cloned()
                    .collect();
                evaluations.sort_by(|a, b| b.version.cmp(&a.version));
                Ok(CandidateWithEvaluations {
                    candidate: Candidate::try_from(row)?,
                    evaluations: evaluations
                        .into_iter()
                        .map(Evaluation::try_from)
                        .collect::<Result<_, _>>()?,
                })
            })
            .collect()
    }
}
