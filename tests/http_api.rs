//! Router tests: requests go through the full axum stack via `oneshot`.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{PROJECT_REPLY, ScriptedProvider, TRUNCATED_REVIEW_REPLY, services};
use devforge::providers::ProviderError;
use devforge::server::router;
use devforge::services::RATE_LIMIT_MESSAGE;

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn canvas_json() -> Value {
    json!([
        {"id": "react-1", "position": {"x": 250, "y": 100},
         "data": {"label": "React", "category": "frontend", "nodeId": "react"}},
        {"id": "express-1", "position": {"x": 250, "y": 300},
         "data": {"label": "Node.js + Express", "category": "backend", "nodeId": "node-express"}},
        {"id": "pg-1", "position": {"x": 250, "y": 200},
         "data": {"label": "PostgreSQL", "category": "database", "nodeId": "postgresql"}}
    ])
}

#[tokio::test]
async fn health_reports_ok() {
    let app = router(services(ScriptedProvider::text("{}")));
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn generate_code_wraps_project_in_data() {
    let app = router(services(ScriptedProvider::text(PROJECT_REPLY)));
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/generate-code",
            json!({"nodes": canvas_json(), "customizations": {"projectName": "Shop"}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["files"][0]["path"], "frontend/src/App.jsx");
    assert_eq!(body["data"]["setup_instructions"], "npm install");
    assert!(body["data"]["dependencies"]["frontend"]["react"].is_string());
}

#[tokio::test]
async fn generate_code_rejects_invalid_architecture() {
    let app = router(services(ScriptedProvider::text(PROJECT_REPLY)));
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/generate-code",
            json!({"nodes": [], "customizations": {}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Invalid architecture. Need 1 frontend + 1 backend + 1+ database"
    );
}

#[tokio::test]
async fn malformed_json_is_bad_request_with_error_body() {
    let app = router(services(ScriptedProvider::text("{}")));
    let request = Request::post("/api/generate-docs")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn unrecoverable_reply_is_500_with_sample() {
    let app = router(services(ScriptedProvider::text("Sorry, I cannot help with that.")));
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/generate-code",
            json!({"nodes": canvas_json()}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Failed to parse AI response");
    assert_eq!(body["sample"], "Sorry, I cannot help with that.");
    assert!(body["hint"].is_string());
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn persistent_rate_limit_is_429_with_hint() {
    let provider = ScriptedProvider::new(vec![
        Err(ProviderError::RateLimited),
        Err(ProviderError::RateLimited),
        Err(ProviderError::RateLimited),
    ]);
    let app = router(services(provider));
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/generate-docs",
            json!({"files": [{"name": "a.js"}], "docTypes": ["readme"]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("Rate limit exceeded"));
    assert!(body["hint"].is_string());
}

#[tokio::test]
async fn generate_docs_returns_docs_object() {
    let app = router(services(ScriptedProvider::text(
        r##"{"readme": "# Demo", "deployment": "# Deploy"}"##,
    )));
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/generate-docs",
            json!({"files": [{"path": "src/index.js"}], "docTypes": ["readme", "deployment"]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["docs"], json!({"readme": "# Demo", "deployment": "# Deploy"}));
}

#[tokio::test]
async fn review_code_requires_github_url() {
    let app = router(services(ScriptedProvider::text("{}")));
    let response = app
        .oneshot(json_request(Method::POST, "/api/review-code", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "GitHub URL is required");
}

fn multipart_body(boundary: &str, parts: &[(&str, Option<&str>, &str)]) -> String {
    let mut body = String::new();
    for (name, filename, content) in parts {
        body.push_str(&format!("--{boundary}\r\n"));
        match filename {
            Some(f) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )),
            None => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
            )),
        }
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{boundary}--\r\n"));
    body
}

#[tokio::test]
async fn review_code_accepts_multipart_uploads() {
    let services = services(ScriptedProvider::text(TRUNCATED_REVIEW_REPLY));
    let app = router(services.clone());
    let boundary = "devforge-test-boundary";
    let body = multipart_body(
        boundary,
        &[
            ("files", Some("db.js"), "db.query('SELECT ' + id)"),
            ("files", Some("app.js"), "let x = 1;"),
            ("sessionId", None, "upload-session"),
        ],
    );
    let request = Request::post("/api/review-code")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["files"][0]["path"], "db.js");
    assert_eq!(body["issues"].as_array().unwrap().len(), 2);
    assert_eq!(body["summary"], json!({"critical": 1, "medium": 0, "low": 1}));

    let state = services.sessions().get("upload-session").await;
    assert_eq!(state.issues.len(), 2);
}

#[tokio::test]
async fn oversized_upload_is_413() {
    let provider = ScriptedProvider::text(TRUNCATED_REVIEW_REPLY);
    let mut config = common::test_config();
    config.limits.max_total_bytes = 16;
    let app = router(devforge::services::Services::new(provider.clone(), config).unwrap());
    let boundary = "b";
    let body = multipart_body(
        boundary,
        &[
            ("files", Some("a.js"), "0123456789"),
            ("files", Some("b.js"), "0123456789"),
        ],
    );
    let request = Request::post("/api/review-code")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn multipart_body_over_request_limit_is_413() {
    let provider = ScriptedProvider::text(TRUNCATED_REVIEW_REPLY);
    let mut config = common::test_config();
    config.server.max_body_bytes = 64;
    let app = router(devforge::services::Services::new(provider.clone(), config).unwrap());
    let boundary = "b";
    let content = "x".repeat(512);
    let body = multipart_body(boundary, &[("files", Some("a.js"), content.as_str())]);
    let request = Request::post("/api/review-code")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn chat_rate_limit_is_still_200() {
    let provider = ScriptedProvider::new(vec![
        Err(ProviderError::RateLimited),
        Err(ProviderError::RateLimited),
        Err(ProviderError::RateLimited),
    ]);
    let app = router(services(provider));
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/chat",
            json!({"message": "hi", "toolContext": {"tool": "docs-generator"}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], RATE_LIMIT_MESSAGE);
    assert_eq!(body["functionCalls"], json!([]));
}

#[tokio::test]
async fn chat_without_context_is_400() {
    let app = router(services(ScriptedProvider::text("hi")));
    let response = app
        .oneshot(json_request(Method::POST, "/api/chat", json!({"message": "hi"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Message and toolContext required"
    );
}

#[tokio::test]
async fn create_sandbox_requires_files() {
    let app = router(services(ScriptedProvider::text("{}")));
    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/create-sandbox",
            json!({"files": []}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No files provided");
}

#[tokio::test]
async fn session_canvas_lifecycle() {
    let services = services(ScriptedProvider::text("{}"));
    let app = router(services.clone());

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/api/sessions/abc/nodes",
            json!({"nodes": canvas_json()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let edges: Vec<(&str, &str)> = body["edges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| (e["source"].as_str().unwrap(), e["target"].as_str().unwrap()))
        .collect();
    assert_eq!(edges, vec![("react-1", "pg-1"), ("pg-1", "express-1")]);
    assert_eq!(body["edges"][0]["type"], "smoothstep");
    assert_eq!(body["validation"]["valid"], true);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PATCH,
            "/api/sessions/abc/customizations",
            json!({"projectName": "Shop", "design": {"theme": "dark"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["customizations"]["projectName"], "Shop");
    assert_eq!(body["nodes"].as_array().unwrap().len(), 3);

    let response = app
        .clone()
        .oneshot(Request::get("/api/sessions/abc").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["edges"].as_array().unwrap().len(), 2);

    let response = app
        .oneshot(
            Request::delete("/api/sessions/abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(services.sessions().is_empty().await);
}
