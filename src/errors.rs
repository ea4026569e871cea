use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures of grid, store and session operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("user not authenticated")]
    Authentication,

    #[error("not allowed: {0}")]
    Forbidden(String),

    #[error("failed to load data: {0}")]
    Retrieval(String),

    #[error("failed to save data: {0}")]
    Submission(String),

    #[error("{0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),
}

/// User-facing message box contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            title: "Success".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            message: message.into(),
        }
    }
}

impl GridError {
    pub fn notification(&self) -> Notification {
        match self {
            GridError::Authentication => Notification::error("Please log in to continue."),
            GridError::Submission(_) => Notification::error("Error saving data. Please try again."),
            GridError::Retrieval(_) => Notification::error("Error loading data. Please try again."),
            other => Notification::error(other.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GridError::Authentication => StatusCode::UNAUTHORIZED,
            GridError::Forbidden(_) => StatusCode::FORBIDDEN,
            GridError::NotFound(_) => StatusCode::NOT_FOUND,
            GridError::Validation(_) => StatusCode::BAD_REQUEST,
            GridError::Conflict(_) => StatusCode::CONFLICT,
            GridError::Retrieval(_) | GridError::Submission(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }

    fn title(&self) -> &'static str {
        if self.status.is_success() { "Success" } else { "Error" }
    }
}

impl From<GridError> for AppError {
    fn from(err: GridError) -> Self {
        Self {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, "{}", self.message);
        }
        let body = Notification {
            title: self.title().to_string(),
            message: self.message,
        };
        (self.status, axum::Json(body)).into_response()
    }
}
