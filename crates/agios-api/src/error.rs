use agios_persist::PersistError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors returned before a stream is opened, rendered as
/// `{"error": {"message", "code"}}`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { message: String, code: &'static str },

    #[error("{message}")]
    NotFound { message: String, code: &'static str },

    #[error("{message}")]
    Conflict { message: String, code: &'static str },

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    pub message: String,
    pub code: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>, code: &'static str) -> Self {
        Self::BadRequest {
            message: message.into(),
            code,
        }
    }

    pub fn not_found(message: impl Into<String>, code: &'static str) -> Self {
        Self::NotFound {
            message: message.into(),
            code,
        }
    }

    pub fn conflict(message: impl Into<String>, code: &'static str) -> Self {
        Self::Conflict {
            message: message.into(),
            code,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Persist(e) => match e {
                e if e.is_not_found() => StatusCode::NOT_FOUND,
                PersistError::SlugConflict(_) | PersistError::MessageIndexConflict { .. } => {
                    StatusCode::CONFLICT
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { code, .. } | Self::NotFound { code, .. } | Self::Conflict { code, .. } => code,
            Self::Persist(e) => match e {
                PersistError::ThreadNotFound(_) => "THREAD_NOT_FOUND",
                PersistError::MessageNotFound(_) => "MESSAGE_NOT_FOUND",
                PersistError::FileNotFound(_) => "FILE_NOT_FOUND",
                PersistError::SlugConflict(_) => "SLUG_ALREADY_EXISTS",
                PersistError::MessageIndexConflict { .. } => "MESSAGE_INDEX_CONFLICT",
                _ => "DATABASE_ERROR",
            },
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Client-facing message; server-side failures stay generic
    fn public_message(&self) -> String {
        match self.status() {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "request failed");
        } else {
            tracing::debug!(error = %self, code = self.code(), "request rejected");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                message: self.public_message(),
                code: self.code().to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}
