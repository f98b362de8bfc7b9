use std::error::Error as StdError;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    application::{content::ContentError, repos::RepoError, timeline::TimelineError},
    infra::error::InfraError,
};

/// Diagnostic detail attached to error responses for the response logger.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: &'static str,
}

fn error_response(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail { code, message },
    };
    (status, Json(body)).into_response()
}

/// Handler-facing error carrying a stable code and a public message.
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    code: &'static str,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        code: &'static str,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status,
            code,
            public_message,
            report: ErrorReport::from_message(source, status, detail),
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        code: &'static str,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        Self {
            status,
            code,
            public_message,
            report: ErrorReport::from_error(source, status, error),
        }
    }

    pub fn not_found(source: &'static str, detail: impl Into<String>) -> Self {
        Self::new(
            source,
            StatusCode::NOT_FOUND,
            "not_found",
            "Resource not found",
            detail,
        )
    }

    pub fn bad_request(source: &'static str, detail: impl Into<String>) -> Self {
        Self::new(
            source,
            StatusCode::BAD_REQUEST,
            "validation_failed",
            "Request could not be processed",
            detail,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = error_response(self.status, self.code, self.public_message);
        self.report.attach(&mut response);
        response
    }
}

impl From<RepoError> for HttpError {
    fn from(error: RepoError) -> Self {
        const SOURCE: &str = "application::error::repo_error_to_http_error";
        let (status, code, message) = match &error {
            RepoError::NotFound => (StatusCode::NOT_FOUND, "not_found", "Resource not found"),
            RepoError::Duplicate { .. } => {
                (StatusCode::CONFLICT, "conflict", "Resource already exists")
            }
            RepoError::InvalidInput { .. } | RepoError::Integrity { .. } => (
                StatusCode::BAD_REQUEST,
                "validation_failed",
                "Request could not be processed",
            ),
            RepoError::Timeout => (
                StatusCode::SERVICE_UNAVAILABLE,
                "store_timeout",
                "Service temporarily unavailable",
            ),
            RepoError::Persistence(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_query_failed",
                "Internal server error",
            ),
        };
        HttpError::from_error(SOURCE, status, code, message, &error)
    }
}

impl From<TimelineError> for HttpError {
    fn from(error: TimelineError) -> Self {
        match error {
            TimelineError::InvalidTimestamp(raw) => HttpError::bad_request(
                "application::error::timeline_error_to_http_error",
                format!("Timestamp `{raw}` is not RFC 3339"),
            ),
            TimelineError::Repo(err) => err.into(),
        }
    }
}

impl From<ContentError> for HttpError {
    fn from(error: ContentError) -> Self {
        const SOURCE: &str = "application::error::content_error_to_http_error";
        match error {
            ContentError::Unauthenticated => HttpError::new(
                SOURCE,
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "Sign in required",
                "Request carried no active user",
            ),
            ContentError::Forbidden => HttpError::new(
                SOURCE,
                StatusCode::FORBIDDEN,
                "forbidden",
                "Moderator authority required",
                "Actor is not a moderator",
            ),
            ContentError::UnknownPost(post_id) => {
                HttpError::not_found(SOURCE, format!("Post {post_id} does not exist"))
            }
            ContentError::Domain(err) => HttpError::from_error(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "validation_failed",
                "Request could not be processed",
                &err,
            ),
            ContentError::Repo(err) => err.into(),
        }
    }
}

/// Failure that stops the process before or while serving.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
