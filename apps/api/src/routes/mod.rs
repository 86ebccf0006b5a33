pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};

use crate::comparison::handlers as compare;
use crate::resumes::handlers as resumes;
use crate::session::handlers as auth;
use crate::state::AppState;

/// Resume PDFs plus a preview image.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions
        .route("/api/v1/auth/sign-in", post(auth::handle_sign_in))
        .route("/api/v1/auth/sign-out", post(auth::handle_sign_out))
        .route("/api/v1/auth/me", get(auth::handle_me))
        // Resumes
        .route(
            "/api/v1/resumes",
            get(resumes::handle_list)
                .post(resumes::handle_upload)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get).delete(resumes::handle_delete),
        )
        .route("/api/v1/resumes/:id/document", get(resumes::handle_document))
        .route("/api/v1/resumes/:id/preview", get(resumes::handle_preview))
        .route("/api/v1/resumes/:id/report", get(resumes::handle_report))
        .route("/api/v1/resumes/:id/stage", put(resumes::handle_set_stage))
        .route(
            "/api/v1/resumes/:id/comments",
            post(resumes::handle_add_comment),
        )
        .route(
            "/api/v1/resumes/:id/comments/:index",
            patch(resumes::handle_edit_comment).delete(resumes::handle_delete_comment),
        )
        .route("/api/v1/resumes/:id/notes", put(resumes::handle_set_notes))
        // Comparison
        .route(
            "/api/v1/compare",
            get(compare::handle_view).delete(compare::handle_clear),
        )
        .route("/api/v1/compare/toggle", post(compare::handle_toggle))
        .route("/api/v1/compare/export", get(compare::handle_export))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::blobs::MemoryBlobStore;
    use crate::config::{Config, StorageBackend};
    use crate::llm_client::scorer::{FeedbackScorer, JobPosting};
    use crate::llm_client::LlmError;
    use crate::models::resume::{Comment, Feedback, ResumeRecord, Stage};
    use crate::pipeline::policy::Policy;
    use crate::session::SessionRegistry;
    use crate::store::{MemoryStore, RecordStore};

    struct FixedScorer;

    #[async_trait]
    impl FeedbackScorer for FixedScorer {
        async fn score(&self, _document: &[u8], _job: &JobPosting) -> Result<String, LlmError> {
            Ok(r#"```json
{"overallScore": 77, "skills": {"score": 64, "tips": [{"type": "good", "tip": "Rust"}]}}
```"#
                .to_string())
        }
    }

    struct TestApp {
        state: AppState,
        store: MemoryStore,
        blobs: MemoryBlobStore,
    }

    impl TestApp {
        fn new() -> Self {
            let store = MemoryStore::new();
            let blobs = MemoryBlobStore::new();
            let state = AppState {
                store: Arc::new(store.clone()),
                blobs: Arc::new(blobs.clone()),
                scorer: Arc::new(FixedScorer),
                sessions: SessionRegistry::new(),
                config: Config {
                    storage: StorageBackend::Memory,
                    anthropic_api_key: String::new(),
                    port: 0,
                    rust_log: "info".to_string(),
                    page_size: 3,
                    policy: Policy::default(),
                },
            };
            Self {
                state,
                store,
                blobs,
            }
        }

        async fn seed(&self, id: &str, job: &str, score: f64, age_days: i64) -> ResumeRecord {
            let record = ResumeRecord {
                id: id.to_string(),
                candidate_name: Some(format!("Candidate {id}")),
                company_name: Some("Acme".to_string()),
                job_title: Some(job.to_string()),
                resume_path: None,
                image_path: None,
                feedback: Feedback {
                    overall_score: score,
                    ..Feedback::default()
                },
                issued_at: Utc::now() - Duration::days(age_days),
                stage: Stage::Received,
                comments: vec![],
                internal_notes: Some("strong referral".to_string()),
            };
            self.store
                .set(&record.key(), &serde_json::to_string(&record).unwrap())
                .await
                .unwrap();
            record
        }

        async fn sign_in(&self, role: &str) -> String {
            let (status, body) = self
                .send(
                    Method::POST,
                    "/api/v1/auth/sign-in",
                    None,
                    Some(json!({"username": "tester", "role": role})),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            body["token"].as_str().unwrap().to_string()
        }

        async fn send(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let request = match body {
                Some(body) => builder
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };
            let (status, bytes) = self.raw(request).await;
            let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, json)
        }

        async fn raw(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
            let response = build_router(self.state.clone())
                .oneshot(request)
                .await
                .unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, bytes.to_vec())
        }
    }

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new();
        let (status, body) = app.send(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "vibehire-api");
    }

    #[tokio::test]
    async fn test_requires_session() {
        let app = TestApp::new();
        let (status, body) = app.send(Method::GET, "/api/v1/resumes", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let token = app.sign_in("RH").await;
        app.send(Method::POST, "/api/v1/auth/sign-out", Some(&token), None)
            .await;
        let (status, _) = app
            .send(Method::GET, "/api/v1/auth/me", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_list_paginates_newest_first() {
        let app = TestApp::new();
        for i in 0..7 {
            app.seed(&format!("r{i}"), "Engineer", 50.0, i).await;
        }
        let token = app.sign_in("RH").await;

        let (status, body) = app
            .send(Method::GET, "/api/v1/resumes?page=1", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 7);
        assert_eq!(body["totalPages"], 3);
        assert_eq!(body["resumes"][0]["id"], "r0");
        assert_eq!(body["resumes"].as_array().unwrap().len(), 3);

        let (_, body) = app
            .send(Method::GET, "/api/v1/resumes?page=3", Some(&token), None)
            .await;
        assert_eq!(body["resumes"].as_array().unwrap().len(), 1);

        let (_, body) = app
            .send(Method::GET, "/api/v1/resumes?page=10", Some(&token), None)
            .await;
        assert!(body["resumes"].as_array().unwrap().is_empty());

        let (status, _) = app
            .send(Method::GET, "/api/v1/resumes?stage=hired", Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_notes_hidden_from_viewer() {
        let app = TestApp::new();
        app.seed("a", "Engineer", 60.0, 0).await;

        let rh = app.sign_in("RH").await;
        let (_, body) = app
            .send(Method::GET, "/api/v1/resumes/a", Some(&rh), None)
            .await;
        assert_eq!(body["internalNotes"], "strong referral");

        let viewer = app.sign_in("Viewer").await;
        let (_, body) = app
            .send(Method::GET, "/api/v1/resumes/a", Some(&viewer), None)
            .await;
        assert!(body.get("internalNotes").is_none());
    }

    #[tokio::test]
    async fn test_stage_change_is_role_gated() {
        let app = TestApp::new();
        app.seed("a", "Engineer", 60.0, 0).await;

        let viewer = app.sign_in("Viewer").await;
        let (status, body) = app
            .send(
                Method::PUT,
                "/api/v1/resumes/a/stage",
                Some(&viewer),
                Some(json!({"stage": "interview"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "PERMISSION_DENIED");

        let manager = app.sign_in("Manager").await;
        let (status, body) = app
            .send(
                Method::PUT,
                "/api/v1/resumes/a/stage",
                Some(&manager),
                Some(json!({"stage": "interview"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stage"], "interview");

        let stored = app.store.get("resume:a").await.unwrap().unwrap();
        let stored: ResumeRecord = serde_json::from_str(&stored).unwrap();
        assert_eq!(stored.stage, Stage::Interview);
    }

    #[tokio::test]
    async fn test_comment_lifecycle() {
        let app = TestApp::new();
        app.seed("a", "Engineer", 60.0, 0).await;
        let rh = app.sign_in("RH").await;

        let (status, body) = app
            .send(
                Method::POST,
                "/api/v1/resumes/a/comments",
                Some(&rh),
                Some(json!({"text": "  Good fit  "})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["comments"][0]["text"], "Good fit");
        assert_eq!(body["comments"][0]["username"], "tester");

        let (_, body) = app
            .send(
                Method::PATCH,
                "/api/v1/resumes/a/comments/0",
                Some(&rh),
                Some(json!({"text": "Great fit"})),
            )
            .await;
        assert_eq!(body["comments"][0]["text"], "Great fit");

        let (status, _) = app
            .send(Method::DELETE, "/api/v1/resumes/a/comments/0", Some(&rh), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .send(
                Method::DELETE,
                "/api/v1/resumes/a/comments/5?confirm=true",
                Some(&rh),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app
            .send(
                Method::DELETE,
                "/api/v1/resumes/a/comments/0?confirm=true",
                Some(&rh),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["comments"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unchanged_mutation_is_not_persisted() {
        let app = TestApp::new();
        app.seed("a", "Engineer", 60.0, 0).await;
        let before = app.store.get("resume:a").await.unwrap();
        let rh = app.sign_in("RH").await;

        let (status, _) = app
            .send(
                Method::POST,
                "/api/v1/resumes/a/comments",
                Some(&rh),
                Some(json!({"text": "   "})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(app.store.get("resume:a").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_notes_update() {
        let app = TestApp::new();
        app.seed("a", "Engineer", 60.0, 0).await;

        let viewer = app.sign_in("Viewer").await;
        let (status, _) = app
            .send(
                Method::PUT,
                "/api/v1/resumes/a/notes",
                Some(&viewer),
                Some(json!({"notes": "nope"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let manager = app.sign_in("Manager").await;
        let (_, body) = app
            .send(
                Method::PUT,
                "/api/v1/resumes/a/notes",
                Some(&manager),
                Some(json!({"notes": "call back Monday"})),
            )
            .await;
        assert_eq!(body["internalNotes"], "call back Monday");
    }

    #[tokio::test]
    async fn test_compare_flow() {
        let app = TestApp::new();
        app.seed("a", "Engineer", 70.0, 1).await;
        app.seed("b", "Engineer", 85.0, 0).await;
        app.seed("c", "Designer", 90.0, 0).await;
        let rh = app.sign_in("RH").await;

        let toggle = |id: &str| json!({"resumeId": id});

        let (status, body) = app
            .send(Method::POST, "/api/v1/compare/toggle", Some(&rh), Some(toggle("a")))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["toggle"], "selected");
        assert!(body["report"].is_null());

        let (status, body) = app
            .send(Method::POST, "/api/v1/compare/toggle", Some(&rh), Some(toggle("c")))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "INCOMPATIBLE_PAIR");

        let (_, body) = app
            .send(Method::POST, "/api/v1/compare/toggle", Some(&rh), Some(toggle("b")))
            .await;
        assert_eq!(body["report"]["recommendedId"], "b");
        assert_eq!(body["selected"].as_array().unwrap().len(), 2);

        let request = Request::builder()
            .uri("/api/v1/compare/export")
            .header(header::AUTHORIZATION, format!("Bearer {rh}"))
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = app.raw(request).await;
        assert_eq!(status, StatusCode::OK);
        let md = String::from_utf8(bytes).unwrap();
        assert!(md.contains("| Category | Candidate a | Candidate b |"));

        let (status, _) = app
            .send(Method::DELETE, "/api/v1/compare", Some(&rh), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = app.send(Method::GET, "/api/v1/compare", Some(&rh), None).await;
        assert!(body["selected"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_compare_reflects_stored_records() {
        let app = TestApp::new();
        app.seed("a", "Engineer", 90.0, 1).await;
        app.seed("b", "Engineer", 10.0, 0).await;
        let rh = app.sign_in("RH").await;
        let manager = app.sign_in("Manager").await;

        for id in ["a", "b"] {
            let (status, _) = app
                .send(
                    Method::POST,
                    "/api/v1/compare/toggle",
                    Some(&rh),
                    Some(json!({"resumeId": id})),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, _) = app
            .send(
                Method::PUT,
                "/api/v1/resumes/b/stage",
                Some(&manager),
                Some(json!({"stage": "interview"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = app.send(Method::GET, "/api/v1/compare", Some(&rh), None).await;
        assert_eq!(body["selected"][1]["stage"], "interview");

        let (status, _) = app
            .send(Method::DELETE, "/api/v1/resumes/a", Some(&rh), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let request = Request::builder()
            .uri("/api/v1/compare/export")
            .header(header::AUTHORIZATION, format!("Bearer {rh}"))
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = app.raw(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!String::from_utf8(bytes).unwrap().contains("Candidate a"));

        let (_, body) = app.send(Method::GET, "/api/v1/compare", Some(&rh), None).await;
        let selected = body["selected"].as_array().unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0]["id"], "b");
        assert!(body["report"].is_null());
        assert_eq!(
            app.state.sessions.selection(rh.parse().unwrap()).await.unwrap().ids(),
            vec!["b"]
        );
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_blobs() {
        let app = TestApp::new();
        let mut record = app.seed("a", "Engineer", 60.0, 0).await;
        let doc = "uploads/a/cv.pdf".to_string();
        crate::blobs::BlobStore::write(&app.blobs, &doc, bytes::Bytes::from_static(b"%PDF"), None)
            .await
            .unwrap();
        record.resume_path = Some(doc.clone());
        app.store
            .set(&record.key(), &serde_json::to_string(&record).unwrap())
            .await
            .unwrap();

        let viewer = app.sign_in("Viewer").await;
        let (status, _) = app
            .send(Method::DELETE, "/api/v1/resumes/a", Some(&viewer), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let rh = app.sign_in("RH").await;
        let (status, _) = app
            .send(Method::DELETE, "/api/v1/resumes/a", Some(&rh), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(!app.blobs.contains(&doc).await);

        let (status, _) = app
            .send(Method::GET, "/api/v1/resumes/a", Some(&rh), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, body) = app.send(Method::GET, "/api/v1/resumes", Some(&rh), None).await;
        assert_eq!(body["total"], 0);
    }

    #[tokio::test]
    async fn test_multipart_upload() {
        let app = TestApp::new();
        let rh = app.sign_in("RH").await;

        let boundary = "X-VIBEHIRE-BOUNDARY";
        let mut body = String::new();
        for (name, value) in [
            ("company-name", "Acme"),
            ("candidate-name", "Ada"),
            ("job-title", "Engineer"),
            ("job-description", "Rust and Redis"),
        ] {
            body.push_str(&format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"ada.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n%PDF-1.7 test\r\n--{boundary}--\r\n"
        ));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/resumes")
            .header(header::AUTHORIZATION, format!("Bearer {rh}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, bytes) = app.raw(request).await;
        assert_eq!(status, StatusCode::CREATED);

        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "complete");
        assert_eq!(body["resume"]["candidateName"], "Ada");
        assert_eq!(body["resume"]["feedback"]["overallScore"], 77);
        assert_eq!(body["resume"]["feedback"]["skills"]["tips"][0]["tip"], "Rust");

        let id = body["resume"]["id"].as_str().unwrap();
        let request = Request::builder()
            .uri(format!("/api/v1/resumes/{id}/document"))
            .header(header::AUTHORIZATION, format!("Bearer {rh}"))
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = app.raw(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, b"%PDF-1.7 test");
    }

    #[tokio::test]
    async fn test_report_markdown() {
        let app = TestApp::new();
        let mut record = app.seed("a", "Engineer", 82.0, 0).await;
        record.comments.push(Comment {
            user_id: "1".to_string(),
            username: "sam".to_string(),
            text: "Call".to_string(),
            created_at: Utc::now(),
        });
        app.store
            .set(&record.key(), &serde_json::to_string(&record).unwrap())
            .await
            .unwrap();
        let rh = app.sign_in("RH").await;

        let request = Request::builder()
            .uri("/api/v1/resumes/a/report")
            .header(header::AUTHORIZATION, format!("Bearer {rh}"))
            .body(Body::empty())
            .unwrap();
        let (status, bytes) = app.raw(request).await;
        assert_eq!(status, StatusCode::OK);
        let md = String::from_utf8(bytes).unwrap();
        assert!(md.starts_with("# Resume Review — Candidate a"));
        assert!(md.contains("**sam**"));
    }
}
