pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::candidates::handlers as candidates;
use crate::evaluation::handlers as evaluations;
use crate::export::handlers as export;
use crate::jobs::handlers as jobs;
use crate::results::handlers as results;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/health", get(health::health_handler))
        // Jobs
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job)
                .patch(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        .route("/api/v1/jobs/:id/results", get(results::handle_job_results))
        .route("/api/v1/jobs/:id/export", get(export::handle_export))
        // Candidates
        .route(
            "/api/v1/jobs/:id/candidates",
            get(candidates::handle_list_candidates).post(candidates::handle_create_candidate),
        )
        .route(
            "/api/v1/jobs/:id/candidates/bulk",
            post(candidates::handle_bulk_create),
        )
        .route(
            "/api/v1/candidates/:id",
            get(candidates::handle_get_candidate)
                .patch(candidates::handle_update_candidate)
                .delete(candidates::handle_delete_candidate),
        )
        .route(
            "/api/v1/candidates/:id/shortlist",
            put(candidates::handle_shortlist),
        )
        .route("/api/v1/candidates/:id/notes", put(candidates::handle_notes))
        .route(
            "/api/v1/candidates/:id/evaluations",
            get(results::handle_evaluation_history),
        )
        // Evaluations
        .route("/api/v1/evaluations", post(evaluations::handle_evaluate))
        .route("/api/v1/evaluations/batch", post(evaluations::handle_batch))
        .route("/api/v1/evaluations/regex", post(evaluations::handle_regex))
        .route("/api/v1/evaluations/retry", post(evaluations::handle_retry))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::auth::issue_test_token;
    use crate::config::Config;
    use crate::store::memory::MemoryStore;
    use crate::testing::{outcome, ScriptedEvaluator};

    fn test_state(evaluator: ScriptedEvaluator) -> AppState {
        AppState {
            store: Arc::new(MemoryStore::new()),
            evaluator: Arc::new(evaluator),
            config: Config::for_tests(),
        }
    }

    fn bearer(user_id: Uuid) -> String {
        format!("Bearer {}", issue_test_token(user_id, "test-secret"))
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, user_id: Uuid, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::AUTHORIZATION, bearer(user_id))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn create_job(router: &Router, user: Uuid, title: &str) -> String {
        let (status, job) = send(router, post_json("/api/v1/jobs", user, json!({ "title": title }))).await;
        assert_eq!(status, StatusCode::CREATED);
        job["id"].as_str().unwrap().to_string()
    }

    async fn create_candidate(
        router: &Router,
        user: Uuid,
        job_id: &str,
        name: &str,
        resume_text: Option<&str>,
    ) -> String {
        let (status, candidate) = send(
            router,
            post_json(
                &format!("/api/v1/jobs/{job_id}/candidates"),
                user,
                json!({ "name": name, "resume_text": resume_text }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        candidate["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let router = build_router(test_state(ScriptedEvaluator::default()));
        let (status, body) = send(
            &router,
            Request::get("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "recruit-api");
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected() {
        let router = build_router(test_state(ScriptedEvaluator::default()));
        let (status, body) = send(
            &router,
            Request::get("/api/v1/jobs").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], "Not authenticated");
    }

    #[tokio::test]
    async fn test_evaluation_flow_over_http() {
        let router = build_router(test_state(ScriptedEvaluator::new(vec![Ok(outcome(
            89.0,
            "ADVANCE TO INTERVIEW",
        ))])));
        let user = Uuid::new_v4();

        let (status, job) = send(
            &router,
            post_json("/api/v1/jobs", user, json!({ "title": "Platform Engineer" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let job_id = job["id"].as_str().unwrap().to_string();

        let (status, candidate) = send(
            &router,
            post_json(
                &format!("/api/v1/jobs/{job_id}/candidates"),
                user,
                json!({ "name": "Ada", "resume_text": "Ten years of Rust" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let candidate_id = candidate["id"].as_str().unwrap().to_string();

        let (status, evaluation) = send(
            &router,
            post_json(
                "/api/v1/evaluations",
                user,
                json!({ "candidate_id": candidate_id, "job_id": job_id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(evaluation["version"], 1);
        assert_eq!(evaluation["recommendation"], "INTERVIEW");

        let (status, results) = send(
            &router,
            Request::get(format!("/api/v1/jobs/{job_id}/results"))
                .header(header::AUTHORIZATION, bearer(user))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(results["summary"]["advance_to_interview"], 1);
        assert_eq!(results["summary"]["top_candidate"], "Ada");
    }

    #[tokio::test]
    async fn test_empty_batch_is_bad_request() {
        let router = build_router(test_state(ScriptedEvaluator::default()));
        let (status, body) = send(
            &router,
            post_json(
                "/api/v1/evaluations/batch",
                Uuid::new_v4(),
                json!({ "job_id": Uuid::new_v4(), "candidate_ids": [] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "No candidates selected for evaluation"
        );
    }

    #[tokio::test]
    async fn test_export_sets_attachment_headers() {
        let state = test_state(ScriptedEvaluator::default());
        let router = build_router(state);
        let user = Uuid::new_v4();
        let (_, job) = send(
            &router,
            post_json("/api/v1/jobs", user, json!({ "title": "QA Lead" })),
        )
        .await;
        let job_id = job["id"].as_str().unwrap().to_string();

        let response = router
            .clone()
            .oneshot(
                Request::get(format!("/api/v1/jobs/{job_id}/export?format=pdf&mode=regex"))
                    .header(header::AUTHORIZATION, bearer(user))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"evaluation_qa_lead_"));
        assert!(disposition.ends_with(".pdf\""));
    }

    #[tokio::test]
    async fn test_batch_over_http_evaluates_and_skips() {
        let evaluator = ScriptedEvaluator::default()
            .with_response("Ada", Ok(outcome(89.0, "ADVANCE TO INTERVIEW")))
            .with_response("Bo", Ok(outcome(55.0, "DECLINE")));
        let router = build_router(test_state(evaluator));
        let user = Uuid::new_v4();
        let job_id = create_job(&router, user, "Data Engineer").await;
        let ada = create_candidate(&router, user, &job_id, "Ada", Some("Rust and SQL")).await;
        let bo = create_candidate(&router, user, &job_id, "Bo", Some("Python")).await;
        let cy = create_candidate(&router, user, &job_id, "Cy", None).await;

        let (status, report) = send(
            &router,
            post_json(
                "/api/v1/evaluations/batch",
                user,
                json!({ "job_id": job_id, "candidate_ids": [ada, bo, cy], "concurrency": 2 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let outcomes = report["outcomes"].as_array().unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0]["name"], "Ada");
        assert_eq!(outcomes[0]["recommendation"], "INTERVIEW");
        assert_eq!(outcomes[1]["name"], "Bo");
        assert_eq!(outcomes[1]["recommendation"], "DECLINE");
        assert_eq!(report["summary"]["total_candidates"], 2);
        assert_eq!(report["summary"]["advance_to_interview"], 1);
        assert_eq!(report["summary"]["declined"], 1);
        assert_eq!(report["summary"]["top_candidate"], "Ada");
        assert_eq!(report["skipped"][0]["id"], cy);
        assert_eq!(report["skipped"][0]["name"], "Cy");
    }

    #[tokio::test]
    async fn test_regex_screen_over_http() {
        let router = build_router(test_state(ScriptedEvaluator::default()));
        let user = Uuid::new_v4();
        let job_id = create_job(&router, user, "Support Lead").await;
        let ada = create_candidate(&router, user, &job_id, "Ada", Some("Support lead")).await;

        let (status, report) = send(
            &router,
            post_json(
                "/api/v1/evaluations/regex",
                user,
                json!({ "job_id": job_id, "candidate_ids": [ada] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["summary"]["total_candidates"], 1);
        assert_eq!(report["results"][0]["name"], "Ada");
        assert_eq!(report["results"][0]["score"], 100.0);
        assert_eq!(report["results"][0]["recommendation"], "INTERVIEW");

        let (status, candidate) = send(
            &router,
            Request::get(format!("/api/v1/candidates/{ada}"))
                .header(header::AUTHORIZATION, bearer(user))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(candidate["candidate"]["evaluation_status"], "pending");
    }

    #[tokio::test]
    async fn test_retry_over_http_appends_version() {
        let router = build_router(test_state(ScriptedEvaluator::new(vec![
            Ok(outcome(60.0, "PHONE SCREEN FIRST")),
            Ok(outcome(72.0, "PHONE SCREEN FIRST")),
        ])));
        let user = Uuid::new_v4();
        let job_id = create_job(&router, user, "Designer").await;
        let ada = create_candidate(&router, user, &job_id, "Ada", Some("Portfolio")).await;
        let body = json!({ "candidate_id": ada, "job_id": job_id });

        let (status, first) = send(&router, post_json("/api/v1/evaluations", user, body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["version"], 1);

        let (status, retried) = send(&router, post_json("/api/v1/evaluations/retry", user, body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(retried["version"], 2);
        assert_eq!(retried["recommendation"], "PHONE_SCREEN");
        assert_eq!(retried["change_reason"], "Manual retry");
        assert_eq!(retried["score_change"], 12.0);
    }
}
