use std::sync::Arc;

use crate::config::Config;
use crate::evaluator::CandidateEvaluator;
use crate::store::RecruitStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecruitStore>,
    /// Remote AI evaluator. Tests swap in a scripted fake.
    pub evaluator: Arc<dyn CandidateEvaluator>,
    pub config: Config,
}
