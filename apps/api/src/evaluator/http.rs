use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use super::{
    CandidateEvaluator, EvaluateOptions, EvaluationCandidate, EvaluationJob, EvaluatorError,
    EvaluatorOutcome, EvaluatorResponse,
};

const EVALUATE_PATH: &str = "/api/evaluate_candidate";
const RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
struct EvaluateRequest<'a> {
    job: &'a EvaluationJob,
    candidate: &'a EvaluationCandidate,
    stage: u8,
    provider: &'a str,
    model: Option<&'a str>,
    additional_instructions: Option<&'a str>,
}

/// Calls `POST {base_url}/api/evaluate_candidate` with a per-call timeout.
/// Retries transport errors, 429 and 5xx after a fixed delay.
#[derive(Clone)]
pub struct HttpEvaluator {
    client: Client,
    endpoint: String,
    retry_delay: Duration,
}

impl HttpEvaluator {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), EVALUATE_PATH),
            retry_delay: RETRY_DELAY,
        })
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    async fn attempt(&self, body: &EvaluateRequest<'_>) -> Result<EvaluatorOutcome, EvaluatorError> {
        let response = self.client.post(&self.endpoint).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            // The backend reports failures as {"success": false, "error": "..."}
            let message = serde_json::from_str::<EvaluatorResponse>(&text)
                .ok()
                .and_then(|r| r.error)
                .unwrap_or(text);
            return Err(EvaluatorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: EvaluatorResponse = response.json().await?;
        EvaluatorOutcome::try_from(parsed)
    }
}

#[async_trait]
impl CandidateEvaluator for HttpEvaluator {
    async fn evaluate(
        &self,
        job: &EvaluationJob,
        candidate: &EvaluationCandidate,
        options: &EvaluateOptions,
    ) -> Result<EvaluatorOutcome, EvaluatorError> {
        let body = EvaluateRequest {
            job,
            candidate,
            stage: options.stage,
            provider: &options.provider,
            model: options.model.as_deref(),
            additional_instructions: options.additional_instructions.as_deref(),
        };

        let attempts = options.max_retries + 1;
        let mut attempt = 1;
        loop {
            match self.attempt(&body).await {
                Ok(outcome) => {
                    debug!(
                        "Evaluated {}: input_tokens={}, output_tokens={}",
                        candidate.name, outcome.usage.input_tokens, outcome.usage.output_tokens
                    );
                    return Ok(outcome);
                }
                Err(e) if e.is_retryable() && attempt < attempts => {
                    warn!(
                        "Evaluation of {} failed ({e}), retrying (attempt {}/{})...",
                        candidate.name,
                        attempt,
                        attempts
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        "Evaluation of {} failed after {attempt} attempt(s): {e}",
                        candidate.name
                    );
                    return Err(e);
                }
            }
        }
    }
}
