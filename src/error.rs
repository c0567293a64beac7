//! Request-boundary error type
//!
//! Almost everything propagates to the outermost handler and renders as a
//! plain-text page; the one exception is a missing drive credential, which
//! redirects to the login route. No retries, no structured error bodies.

use crate::source::SourceError;
use crate::tagging::WorkflowError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid drive credential; the user is sent to the login route.
    #[error("authorization required")]
    AuthRequired,

    /// Remote provider unreachable or rejected the request.
    #[error("remote fetch failed: {0}")]
    RemoteFetch(String),

    /// The fetched bytes are not a supported image format.
    #[error("image could not be decoded: {0}")]
    Decode(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    BadRequest(String),

    /// Scratch or permanent storage unwritable.
    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<SourceError> for ApiError {
    fn from(e: SourceError) -> Self {
        ApiError::RemoteFetch(e.to_string())
    }
}

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        match e {
            WorkflowError::Source(inner) => ApiError::RemoteFetch(inner.to_string()),
            WorkflowError::Decode(msg) => ApiError::Decode(msg),
            WorkflowError::Detect(inner) => ApiError::Internal(inner.to_string()),
            WorkflowError::Storage(inner) => ApiError::Filesystem(inner),
            WorkflowError::CropWrite(msg) => {
                ApiError::Internal(format!("crop write failed: {msg}"))
            }
            WorkflowError::UnknownSession(token) => {
                ApiError::NotFound(format!("no analysis in progress for token {token}"))
            }
            WorkflowError::PersonNotFound(id) => ApiError::NotFound(format!("person {id}")),
            WorkflowError::TagNotFound(id) => ApiError::NotFound(format!("face tag {id}")),
            WorkflowError::Database(inner) => ApiError::Other(inner),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::AuthRequired => return Redirect::to("/auth/login").into_response(),
            ApiError::RemoteFetch(_) => StatusCode::BAD_GATEWAY,
            ApiError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Filesystem(_) | ApiError::Internal(_) | ApiError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (status, format!("Error: {self}")).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
