use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::{StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::constants;
use crate::models::architecture::ArchitectureCheck;
use crate::models::{CanvasNode, Customizations, Edge};
use crate::sandbox::SandboxLinks;
use crate::services::{
    ChatRequest, ChatResponse, DocsRequest, GenerateCodeRequest, ReviewInput, ReviewOutcome,
    SandboxRequest, Services,
};
use crate::sources::Upload;
use crate::state::ProjectState;

use super::ApiError;

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        multipart_error(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        multipart_error(err.status(), err.body_text())
    }
}

/// A body cut off by the request size limit surfaces as 413.
fn multipart_error(status: StatusCode, message: String) -> ApiError {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::payload_too_large(message),
        s if s.is_server_error() => ApiError::internal(message),
        _ => ApiError::bad_request(message),
    }
}

/// `{success: true, ...body}`
#[derive(Serialize)]
pub struct Success<T> {
    success: bool,
    #[serde(flatten)]
    body: T,
}

fn success<T: Serialize>(body: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        body,
    })
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": constants::VERSION }))
}

#[tracing::instrument(name = "POST /api/generate-code", skip_all)]
pub async fn generate_code(
    State(services): State<Services>,
    payload: Result<Json<GenerateCodeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let project = services.generate_code(request).await?;
    Ok(Json(json!({ "success": true, "data": project })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RepositoryReview {
    github_url: String,
    session_id: Option<String>,
}

/// Accepts either a JSON `{githubUrl}` body or multipart `files` parts.
#[tracing::instrument(name = "POST /api/review-code", skip_all)]
pub async fn review_code(
    State(services): State<Services>,
    request: Request,
) -> Result<Json<Success<ReviewOutcome>>, ApiError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let (input, session_id) = if is_multipart {
        let multipart = Multipart::from_request(request, &()).await?;
        read_uploads(multipart).await?
    } else {
        let Json(body) = Json::<RepositoryReview>::from_request(request, &()).await?;
        (ReviewInput::Repository(body.github_url), body.session_id)
    };

    let outcome = services.review_code(input, session_id.as_deref()).await?;
    Ok(success(outcome))
}

async fn read_uploads(mut multipart: Multipart) -> Result<(ReviewInput, Option<String>), ApiError> {
    let mut uploads = Vec::new();
    let mut session_id = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("files") => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("upload-{}", uploads.len() + 1));
                let bytes = field.bytes().await?;
                uploads.push(Upload {
                    name: file_name,
                    bytes: bytes.to_vec(),
                });
            }
            Some("sessionId") => {
                let id = field.text().await?;
                session_id = Some(id).filter(|id| !id.trim().is_empty());
            }
            other => tracing::debug!(field = ?other, "ignoring multipart field"),
        }
    }

    if uploads.is_empty() {
        return Err(ApiError::bad_request("No files uploaded"));
    }
    Ok((ReviewInput::Uploads(uploads), session_id))
}

#[tracing::instrument(name = "POST /api/generate-docs", skip_all)]
pub async fn generate_docs(
    State(services): State<Services>,
    payload: Result<Json<DocsRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let docs = services.generate_docs(request).await?;
    Ok(Json(json!({ "success": true, "docs": docs })))
}

#[tracing::instrument(name = "POST /api/chat", skip_all)]
pub async fn chat(
    State(services): State<Services>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(services.chat(request).await?))
}

#[tracing::instrument(name = "POST /api/create-sandbox", skip_all)]
pub async fn create_sandbox(
    State(services): State<Services>,
    payload: Result<Json<SandboxRequest>, JsonRejection>,
) -> Result<Json<Success<SandboxLinks>>, ApiError> {
    let Json(request) = payload?;
    let links = services.create_sandbox(request).await?;
    Ok(success(links))
}

pub async fn get_session(
    State(services): State<Services>,
    Path(id): Path<String>,
) -> Json<ProjectState> {
    Json(services.sessions().get(&id).await)
}

#[derive(Debug, Deserialize)]
pub struct NodesBody {
    nodes: Vec<CanvasNode>,
}

#[derive(Debug, Serialize)]
pub struct CanvasView {
    nodes: Vec<CanvasNode>,
    edges: Vec<Edge>,
    validation: ArchitectureCheck,
}

pub async fn put_nodes(
    State(services): State<Services>,
    Path(id): Path<String>,
    payload: Result<Json<NodesBody>, JsonRejection>,
) -> Result<Json<CanvasView>, ApiError> {
    let Json(body) = payload?;
    let view = services
        .sessions()
        .update(&id, |state| {
            state.set_nodes(body.nodes);
            CanvasView {
                nodes: state.nodes.clone(),
                edges: state.edges.clone(),
                validation: state.validation(),
            }
        })
        .await;
    Ok(Json(view))
}

pub async fn patch_customizations(
    State(services): State<Services>,
    Path(id): Path<String>,
    payload: Result<Json<Customizations>, JsonRejection>,
) -> Result<Json<ProjectState>, ApiError> {
    let Json(updates) = payload?;
    let state = services
        .sessions()
        .update(&id, |state| {
            state.update_customizations(updates);
            state.clone()
        })
        .await;
    Ok(Json(state))
}

pub async fn delete_session(
    State(services): State<Services>,
    Path(id): Path<String>,
) -> StatusCode {
    if !services.sessions().remove(&id).await {
        tracing::debug!(session = %id, "deleting unknown session");
    }
    StatusCode::NO_CONTENT
}
