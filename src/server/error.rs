use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::providers::ProviderError;
use crate::recovery::RecoveryError;
use crate::services::ServiceError;
use crate::sources::SourceError;

const RATE_LIMIT_ERROR: &str = "Rate limit exceeded. Please wait 60 seconds and try again.";
const RATE_LIMIT_HINT: &str = "Too many requests to Gemini API. Try again in 1 minute.";
const PARSE_ERROR: &str = "Failed to parse AI response";

/// Uniform error response: a status plus `{error, hint?, details?, sample?}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub hint: Option<String>,
    pub details: Option<String>,
    pub sample: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            hint: None,
            details: None,
            sample: None,
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        let error = error.into();
        tracing::debug!(error = %error, "rejecting request");
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn payload_too_large(error: impl Into<String>) -> Self {
        let error = error.into();
        tracing::warn!(error = %error, "upload over size limit");
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, error)
    }

    pub fn too_many_requests() -> Self {
        tracing::warn!("upstream rate limit persisted after retries");
        Self::new(StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_ERROR).with_hint(RATE_LIMIT_HINT)
    }

    pub fn internal(error: impl Into<String>) -> Self {
        let error = error.into();
        tracing::error!(error = %error, "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_sample(mut self, sample: impl Into<String>) -> Self {
        self.sample = Some(sample.into());
        self
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => Self::bad_request(message),
            ServiceError::Source(e) if e.is_size_limit() => Self::payload_too_large(e.to_string()),
            ServiceError::Source(e @ SourceError::InvalidUrl(_)) => Self::bad_request(e.to_string()),
            ServiceError::Source(e) => Self::internal(e.to_string()),
            ServiceError::Provider(ProviderError::RateLimited) => Self::too_many_requests(),
            ServiceError::Provider(e) => Self::internal(e.to_string()),
            ServiceError::Recovery(e) => {
                tracing::error!(error = %e, "model response could not be recovered");
                let error = match &e {
                    RecoveryError::Unsalvageable { .. } => PARSE_ERROR.to_string(),
                    RecoveryError::Empty { message, .. } => message.clone(),
                };
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
                    .with_hint(e.hint())
                    .with_details(e.to_string())
                    .with_sample(e.preview())
            }
            ServiceError::Sandbox(e) => Self::internal(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sample: Option<&'a str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.error,
            hint: self.hint.as_deref(),
            details: self.details.as_deref(),
            sample: self.sample.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}
