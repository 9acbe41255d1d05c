pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::categories::handlers as categories;
use crate::config::StorageBackend;
use crate::jobs::handlers as jobs;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health_handler))
        // Jobs
        .route(
            "/api/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route("/api/jobs/draft", post(jobs::handle_create_draft))
        .route("/api/jobs/save-section", post(jobs::handle_save_section))
        .route("/api/jobs/files", post(jobs::handle_upload_files))
        .route(
            "/api/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        .route("/api/jobs/:id/completion", get(jobs::handle_job_completion))
        .route(
            "/api/jobs/:id/section/:section/:index",
            delete(jobs::handle_delete_array_item),
        )
        // Categories
        .route(
            "/api/categories",
            get(categories::handle_list_categories).post(categories::handle_create_category),
        )
        .route(
            "/api/categories/:id",
            get(categories::handle_get_category)
                .put(categories::handle_update_category)
                .delete(categories::handle_delete_category),
        )
        .route(
            "/api/subcategories",
            get(categories::handle_list_subcategories)
                .post(categories::handle_create_subcategory),
        )
        .route(
            "/api/subcategories/:id",
            get(categories::handle_get_subcategory)
                .put(categories::handle_update_subcategory)
                .delete(categories::handle_delete_subcategory),
        );

    if state.config.storage == StorageBackend::Local {
        router = router.nest_service("/uploads", ServeDir::new(&state.config.upload_dir));
    }

    router
        .layer(DefaultBodyLimit::max(state.config.body_limit()))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::test_support::{MemoryJobStore, MemoryStorage};

    const BOUNDARY: &str = "jobboard-test-boundary";

    fn app() -> (Router, Arc<MemoryJobStore>, Arc<MemoryStorage>) {
        let jobs = Arc::new(MemoryJobStore::default());
        let storage = Arc::new(MemoryStorage::default());
        let state = AppState {
            db: PgPoolOptions::new()
                .connect_lazy("postgres://localhost/jobboard_test")
                .unwrap(),
            jobs: jobs.clone(),
            storage: storage.clone(),
            config: Config::for_tests(PathBuf::from("uploads")),
        };
        (build_router(state), jobs, storage)
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn multipart_request(
        method: &str,
        uri: &str,
        fields: &[(&str, &str)],
        files: &[(&str, &str, Vec<u8>)],
    ) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        for (name, file_name, data) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(method)
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn create_draft(app: &Router) -> String {
        let (status, body) = send(app, json_request("POST", "/api/jobs/draft", json!({"postName": "Clerk"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _, _) = app();
        let (status, body) = send(&app, empty_request("GET", "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "jobboard-api");
    }

    #[tokio::test]
    async fn test_draft_without_body() {
        let (app, jobs, _) = app();
        let (status, body) = send(&app, empty_request("POST", "/api/jobs/draft")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["job"]["postName"], "Untitled Job");
        assert_eq!(body["job"]["status"], "draft");
        assert_eq!(body["id"], body["job"]["id"]);
        assert_eq!(jobs.len(), 1);
    }

    #[tokio::test]
    async fn test_save_section_then_get() {
        let (app, _, _) = app();
        let id = create_draft(&app).await;
        let fees = json!([{"category": "General", "amount": 100.0}, {"category": "SC", "amount": 0.0}]);

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/jobs/save-section",
                json!({"jobId": id, "section": "fees", "data": fees.clone()}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["job"]["fees"], fees);
        assert_eq!(body["job"]["version"], 2);

        let (status, body) = send(&app, empty_request("GET", &format!("/api/jobs/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fees"], fees);
        assert_eq!(body["postName"], "Clerk");
    }

    #[tokio::test]
    async fn test_save_section_errors() {
        let (app, _, _) = app();
        let id = create_draft(&app).await;

        let cases = [
            (json!({"section": "fees", "data": []}), StatusCode::BAD_REQUEST),
            (json!({"jobId": id, "data": []}), StatusCode::BAD_REQUEST),
            (json!({"jobId": id, "section": "fees"}), StatusCode::BAD_REQUEST),
            (
                json!({"jobId": id, "section": "salary", "data": {"salary": {"payScale": "L1"}}}),
                StatusCode::BAD_REQUEST,
            ),
            (
                json!({"jobId": uuid::Uuid::new_v4(), "section": "salary", "data": {"payScale": "L1"}}),
                StatusCode::NOT_FOUND,
            ),
            (
                json!({"jobId": id, "section": "howToApply", "data": "x", "expectedVersion": 9}),
                StatusCode::CONFLICT,
            ),
            (json!({"jobId": 42, "section": "fees", "data": []}), StatusCode::BAD_REQUEST),
            (json!({"jobId": id, "section": 5, "data": []}), StatusCode::BAD_REQUEST),
            (
                json!({"jobId": id, "section": "fees", "data": [], "expectedVersion": "one"}),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (body, expected) in cases {
            let (status, resp) =
                send(&app, json_request("POST", "/api/jobs/save-section", body.clone())).await;
            assert_eq!(status, expected, "{body}");
            assert!(resp["error"]["message"].is_string(), "{resp}");
        }
    }

    #[tokio::test]
    async fn test_save_section_body_errors_are_json() {
        let (app, _, _) = app();
        let req = Request::builder()
            .method("POST")
            .uri("/api/jobs/save-section")
            .header("content-type", "application/json")
            .body(Body::from("{\"jobId\":"))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_save_section_null_clears_logo() {
        let (app, _, _) = app();
        let id = create_draft(&app).await;
        let save = |data: Value| {
            json_request(
                "POST",
                "/api/jobs/save-section",
                json!({"jobId": id, "section": "logo", "data": data}),
            )
        };

        let (status, body) = send(&app, save(json!("uploads/jobs/logo.png"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["job"]["logo"], "uploads/jobs/logo.png");

        let (status, body) = send(&app, save(Value::Null)).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert!(body["job"]["logo"].is_null());
    }

    #[tokio::test]
    async fn test_save_dashboard_eligibility() {
        let (app, _, _) = app();
        let id = create_draft(&app).await;
        let eligibility = json!({
            "qualification": "Graduate",
            "finalYearEligible": "Yes",
            "ageMin": 0,
            "ageMax": 0,
            "ageRelaxation": "",
            "gateRequired": "Yes",
            "gateCodes": "",
            "extraRequirements": ""
        });

        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/api/jobs/save-section",
                json!({"jobId": id, "section": "eligibility", "data": eligibility.clone()}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["job"]["eligibility"], eligibility);
    }

    #[tokio::test]
    async fn test_draft_rejects_malformed_body() {
        let (app, jobs, _) = app();
        let (status, body) = send(
            &app,
            json_request("POST", "/api/jobs/draft", json!({"postName": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(jobs.len(), 0);
    }

    #[tokio::test]
    async fn test_delete_array_item_route() {
        let (app, _, _) = app();
        let id = create_draft(&app).await;
        send(
            &app,
            json_request(
                "POST",
                "/api/jobs/save-section",
                json!({"jobId": id, "section": "selection", "data": ["a", "b", "c"]}),
            ),
        )
        .await;

        let (status, body) = send(
            &app,
            empty_request("DELETE", &format!("/api/jobs/{id}/section/selection/0")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["job"]["selection"], json!(["b", "c"]));

        let (status, body) = send(
            &app,
            empty_request("DELETE", &format!("/api/jobs/{id}/section/selection/7")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _) = send(
            &app,
            empty_request("DELETE", &format!("/api/jobs/{id}/section/salary/0")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_job_id_is_bad_request() {
        let (app, _, _) = app();
        let (status, _) = send(&app, empty_request("GET", "/api/jobs/not-a-uuid")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(
            &app,
            empty_request("GET", &format!("/api/jobs/{}", uuid::Uuid::new_v4())),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_files_route() {
        let (app, _, storage) = app();
        let id = create_draft(&app).await;

        let (status, body) = send(
            &app,
            multipart_request(
                "POST",
                "/api/jobs/files",
                &[("jobId", id.as_str())],
                &[("files", "notice.pdf", b"%PDF-1.4".to_vec())],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["files"].as_array().unwrap().len(), 1);
        assert_eq!(body["job"]["files"], body["files"]);
        assert_eq!(storage.paths().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_too_large() {
        let (app, _, storage) = app();
        let id = create_draft(&app).await;
        let (status, body) = send(
            &app,
            multipart_request(
                "POST",
                "/api/jobs/files",
                &[("jobId", id.as_str())],
                &[("files", "big.pdf", vec![0u8; 2048])],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
        assert!(storage.paths().is_empty());
    }

    #[tokio::test]
    async fn test_create_and_update_job_multipart() {
        let (app, _, _) = app();
        let job_data = json!({
            "postName": "Junior Engineer",
            "organization": "RRB",
            "vacancies": [{"postName": "JE", "total": 12, "UR": 6}]
        })
        .to_string();

        let (status, body) = send(
            &app,
            multipart_request(
                "POST",
                "/api/jobs",
                &[("jobData", job_data.as_str())],
                &[("logo", "logo.png", b"\x89PNG".to_vec())],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["job"]["vacancies"][0]["UR"], 6);
        assert_eq!(body["job"]["salary"]["payScale"], "");
        let id = body["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            multipart_request(
                "PUT",
                &format!("/api/jobs/{id}"),
                &[("jobData", r#"{"howToApply": "Apply online"}"#)],
                &[("files", "notice.pdf", b"%PDF".to_vec())],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["job"]["howToApply"], "Apply online");
        assert_eq!(body["job"]["organization"], "RRB");
        assert_eq!(body["job"]["files"].as_array().unwrap().len(), 1);

        let (status, body) = send(&app, empty_request("GET", &format!("/api/jobs/{id}/completion"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "in_progress");
    }

    #[tokio::test]
    async fn test_create_job_requires_post_name() {
        let (app, jobs, _) = app();
        let (status, _) = send(
            &app,
            multipart_request("POST", "/api/jobs", &[("jobData", r#"{"organization": "RRB"}"#)], &[]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(jobs.len(), 0);
    }

    #[tokio::test]
    async fn test_delete_job_route() {
        let (app, jobs, _) = app();
        let id = create_draft(&app).await;
        let (status, body) = send(&app, empty_request("DELETE", &format!("/api/jobs/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Job deleted");
        assert_eq!(jobs.len(), 0);
        let (status, _) = send(&app, empty_request("DELETE", &format!("/api/jobs/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_jobs_route() {
        let (app, _, _) = app();
        create_draft(&app).await;
        create_draft(&app).await;
        let (status, body) = send(&app, empty_request("GET", "/api/jobs?limit=1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = send(&app, empty_request("GET", "/api/jobs?status=bogus")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_category_validation_before_database() {
        let (app, _, storage) = app();
        let (status, body) = send(&app, empty_request("GET", "/api/categories/123")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid category ID");

        let (status, _) = send(
            &app,
            multipart_request(
                "POST",
                "/api/categories",
                &[("categorySKU", "SKU-1")],
                &[("categoryImage", "c.png", b"\x89PNG".to_vec())],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(storage.paths().is_empty());

        let (status, _) = send(&app, empty_request("GET", "/api/categories?sort=password")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            multipart_request("POST", "/api/subcategories", &[("subCategoryName", "Banking")], &[]),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
