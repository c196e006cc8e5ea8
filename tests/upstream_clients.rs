//! HTTP clients against wiremock stand-ins for the Gemini, GitHub and
//! CodeSandbox APIs.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use devforge::config::{GithubConfig, ProviderConfig, SandboxConfig};
use devforge::models::GeneratedFile;
use devforge::prompts::{CHAT_CONFIG, REVIEW_CONFIG, architecture_functions};
use devforge::providers::gemini::GeminiProvider;
use devforge::providers::{
    GenerationRequest, ModelProvider, ProviderError, RetryPolicy, Turn, generate_with_retry,
};
use devforge::sandbox::{SandboxClient, SandboxError};
use devforge::sources::{GithubClient, SourceError};

const GENERATE_PATH: &str = "/models/test-model:generateContent";

fn provider_config(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        model: "test-model".into(),
        api_key: Some("secret".into()),
        base_url: server.uri(),
        timeout_secs: 5,
        ..ProviderConfig::default()
    }
}

fn candidate(parts: serde_json::Value) -> serde_json::Value {
    json!({"candidates": [{"content": {"role": "model", "parts": parts}}]})
}

// ── Gemini ──────────────────────────────────────────────────────────

#[tokio::test]
async fn gemini_sends_key_and_config_and_joins_text_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "secret"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "review this"}]}],
            "generationConfig": {"maxOutputTokens": 4096}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(candidate(json!([{"text": "{\"issues\":"}, {"text": " []}"}]))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(&provider_config(&server)).unwrap();
    let reply = provider
        .generate(&GenerationRequest::prompt("review this", REVIEW_CONFIG))
        .await
        .unwrap();

    assert_eq!(reply.text, "{\"issues\": []}");
    assert!(reply.function_calls.is_empty());
}

#[tokio::test]
async fn gemini_declares_tools_and_returns_function_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "contents": [
                {"role": "user", "parts": [{"text": "system"}]},
                {"role": "model", "parts": [{"text": "ok"}]},
                {"role": "user", "parts": [{"text": "add redis"}]}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(json!([
            {"functionCall": {"name": "add_node", "args": {"label": "Redis", "category": "database"}}}
        ]))))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(&provider_config(&server)).unwrap();
    let request = GenerationRequest {
        turns: vec![Turn::user("system"), Turn::model("ok"), Turn::user("add redis")],
        tools: architecture_functions(),
        config: CHAT_CONFIG,
    };
    let reply = provider.generate(&request).await.unwrap();

    assert!(reply.text.is_empty());
    assert_eq!(reply.function_calls.len(), 1);
    assert_eq!(reply.function_calls[0].name, "add_node");
    assert_eq!(reply.function_calls[0].args["label"], "Redis");

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let declared = body["tools"][0]["functionDeclarations"].as_array().unwrap();
    assert_eq!(declared.len(), 3);
}

#[tokio::test]
async fn gemini_retries_429_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(json!([{"text": "{}"}]))))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(&provider_config(&server)).unwrap();
    let policy = RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(5),
    };
    let reply = generate_with_retry(
        &provider,
        &GenerationRequest::prompt("x", REVIEW_CONFIG),
        policy,
    )
    .await
    .unwrap();

    assert_eq!(reply.text, "{}");
}

#[tokio::test]
async fn gemini_persistent_429_is_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(&provider_config(&server)).unwrap();
    let policy = RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
    };
    let err = generate_with_retry(
        &provider,
        &GenerationRequest::prompt("x", REVIEW_CONFIG),
        policy,
    )
    .await
    .unwrap_err();

    assert_eq!(err, ProviderError::RateLimited);
}

#[tokio::test]
async fn gemini_server_error_is_not_retried_and_body_is_truncated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("e".repeat(1_000)))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(&provider_config(&server)).unwrap();
    let err = generate_with_retry(
        &provider,
        &GenerationRequest::prompt("x", REVIEW_CONFIG),
        RetryPolicy::default(),
    )
    .await
    .unwrap_err();

    match err {
        ProviderError::Http { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body.chars().count(), 200);
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
}

#[tokio::test]
async fn gemini_without_candidates_is_empty_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(&provider_config(&server)).unwrap();
    let err = provider
        .generate(&GenerationRequest::prompt("x", REVIEW_CONFIG))
        .await
        .unwrap_err();
    assert_eq!(err, ProviderError::EmptyReply);
}

#[test]
fn gemini_requires_api_key() {
    let config = ProviderConfig {
        api_key: None,
        ..ProviderConfig::default()
    };
    assert!(matches!(
        GeminiProvider::new(&config),
        Err(ProviderError::NotConfigured(_))
    ));
}

#[tokio::test]
async fn gemini_times_out_slow_reply_without_retrying() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(candidate(json!([{"text": "{}"}])))
                .set_delay(Duration::from_secs(3)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig {
        timeout_secs: 1,
        ..provider_config(&server)
    };
    let provider = GeminiProvider::new(&config).unwrap();
    let policy = RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
    };
    let err = generate_with_retry(
        &provider,
        &GenerationRequest::prompt("x", REVIEW_CONFIG),
        policy,
    )
    .await
    .unwrap_err();

    assert_eq!(err, ProviderError::Timeout(1));
}

// ── GitHub ──────────────────────────────────────────────────────────

fn github_config(server: &MockServer) -> GithubConfig {
    GithubConfig {
        api_base: server.uri(),
        raw_base: format!("{}/raw", server.uri()),
        ..GithubConfig::default()
    }
}

#[tokio::test]
async fn github_falls_back_to_master_and_filters_tree() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/git/trees/main"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/git/trees/master"))
        .and(query_param("recursive", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tree": [
                {"path": "src", "type": "tree"},
                {"path": "src/app.js", "type": "blob", "size": 12},
                {"path": "src/gone.py", "type": "blob", "size": 3},
                {"path": "node_modules/lib/index.js", "type": "blob", "size": 5},
                {"path": "README.md", "type": "blob", "size": 9}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/raw/octo/hello/master/src/app.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string("console.log(1)"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/raw/octo/hello/master/src/gone.py"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = GithubClient::new(github_config(&server)).unwrap();
    let files = client
        .fetch_repository("https://github.com/octo/hello.git")
        .await
        .unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "src/app.js");
    assert_eq!(files[0].content, "console.log(1)");
}

#[tokio::test]
async fn github_missing_repository_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = GithubClient::new(github_config(&server)).unwrap();
    let err = client
        .fetch_repository("https://github.com/octo/missing")
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::RepositoryNotFound));
}

#[tokio::test]
async fn github_repository_without_code_is_no_files() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/docs/git/trees/main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tree": [{"path": "README.md", "type": "blob", "size": 9}]
        })))
        .mount(&server)
        .await;

    let client = GithubClient::new(github_config(&server)).unwrap();
    let err = client
        .fetch_repository("https://github.com/octo/docs")
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::NoFiles));
}

#[tokio::test]
async fn github_lists_doc_files_on_default_branch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"default_branch": "develop"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/git/trees/develop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tree": [
                {"path": "README.md", "type": "blob", "size": 9},
                {"path": "src/main.go", "type": "blob", "size": 40},
                {"path": "logo.png", "type": "blob", "size": 400}
            ]
        })))
        .mount(&server)
        .await;

    let client = GithubClient::new(github_config(&server)).unwrap();
    let files = client
        .list_doc_files("https://github.com/octo/hello")
        .await
        .unwrap();

    let names: Vec<&str> = files.iter().filter_map(|f| f.name.as_deref()).collect();
    assert_eq!(names, vec!["README.md", "src/main.go"]);
    assert_eq!(files[1].size, Some(40));
}

// ── Sandbox ─────────────────────────────────────────────────────────

fn sandbox_config(server: &MockServer) -> SandboxConfig {
    SandboxConfig {
        api_base: server.uri(),
        site_url: "https://sandbox.test".into(),
    }
}

#[tokio::test]
async fn sandbox_posts_frontend_files_and_builds_links() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sandboxes/define"))
        .and(query_param("json", "1"))
        .and(body_partial_json(json!({
            "files": {"src/App.jsx": {"content": "export default () => null"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sandbox_id": "abc123"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = SandboxClient::new(sandbox_config(&server)).unwrap();
    let links = client
        .create(&[
            GeneratedFile {
                path: "frontend/src/App.jsx".into(),
                content: "export default () => null".into(),
            },
            GeneratedFile {
                path: "backend/server.js".into(),
                content: "ignored".into(),
            },
        ])
        .await
        .unwrap();

    assert_eq!(links.sandbox_id, "abc123");
    assert_eq!(links.edit_url, "https://sandbox.test/s/abc123");
    assert!(links.embed_url.starts_with("https://sandbox.test/embed/abc123?"));

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let files = body["files"].as_object().unwrap();
    assert!(!files.contains_key("backend/server.js"));
    assert!(files.contains_key("package.json"));
}

#[tokio::test]
async fn sandbox_api_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sandboxes/define"))
        .respond_with(ResponseTemplate::new(422).set_body_string("bad files"))
        .mount(&server)
        .await;

    let client = SandboxClient::new(sandbox_config(&server)).unwrap();
    let err = client
        .create(&[GeneratedFile {
            path: "frontend/src/App.jsx".into(),
            content: "x".into(),
        }])
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SandboxError::Api {
            status: 422,
            body: "bad files".into()
        }
    );
}
