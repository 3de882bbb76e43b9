use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use thiserror::Error;

use crate::response::{ApiResponse, Empty};

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("{0}")]
    Validation(String),

    #[error("You are not assigned to this course and class")]
    NotAuthorized,

    #[error("{0}")]
    InvalidDate(String),

    #[error("An attendance session is already active for this course, class and date")]
    SessionAlreadyActive { session_id: i64 },

    #[error("Attendance session not found")]
    SessionNotFound,

    #[error("Invalid attendance token")]
    TokenInvalid,

    #[error("Attendance token has expired")]
    TokenExpired,

    #[error("Request names a different user than the authenticated caller")]
    IdentityMismatch,

    #[error("Student is not enrolled in this course and class")]
    NotEnrolled,

    #[error("Notification not found")]
    NotificationNotFound,

    #[error(transparent)]
    Storage(#[from] DbErr),

    #[error("Failed to build export: {0}")]
    Export(String),
}

impl AttendanceError {
    pub fn status(&self) -> StatusCode {
        match self {
            AttendanceError::Validation(_) | AttendanceError::InvalidDate(_) | AttendanceError::TokenInvalid => {
                StatusCode::BAD_REQUEST
            }
            AttendanceError::NotAuthorized | AttendanceError::IdentityMismatch | AttendanceError::NotEnrolled => {
                StatusCode::FORBIDDEN
            }
            AttendanceError::SessionAlreadyActive { .. } => StatusCode::CONFLICT,
            AttendanceError::SessionNotFound | AttendanceError::NotificationNotFound => StatusCode::NOT_FOUND,
            AttendanceError::TokenExpired => StatusCode::GONE,
            AttendanceError::Storage(_) | AttendanceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AttendanceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AttendanceError::Storage(e) => {
                tracing::error!(error = %e, "Storage failure");
                "Internal storage error".to_owned()
            }
            AttendanceError::Export(e) => {
                tracing::error!(error = %e, "Export failure");
                "Failed to build export".to_owned()
            }
            other => other.to_string(),
        };
        (status, Json(ApiResponse::<Empty>::error(message))).into_response()
    }
}
