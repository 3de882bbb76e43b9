use axum::http::{HeaderMap, HeaderValue, header};
use serde::Deserialize;
use util::state::AppState;
use validator::{Validate, ValidationErrors};

use crate::services::error::AttendanceError;
use crate::services::export::ExportFormat;
use crate::services::notification_dispatcher::NotificationDispatcher;

/// Joins every field message into one `;`-separated string.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter().filter_map(|e| e.message.as_ref().map(|m| m.to_string())))
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn validate_body<T: Validate>(body: &T) -> Result<(), AttendanceError> {
    body.validate()
        .map_err(|e| AttendanceError::Validation(format_validation_errors(&e)))
}

pub fn dispatcher(state: &AppState) -> NotificationDispatcher {
    NotificationDispatcher::new(state.db_clone(), state.ws_clone())
}

/// `?format=xlsx|csv`, defaulting to xlsx.
pub fn parse_format(format: Option<&str>) -> Result<ExportFormat, AttendanceError> {
    match format {
        Some(f) => f.parse(),
        None => Ok(ExportFormat::default()),
    }
}

/// Content type and attachment disposition for a spreadsheet download.
pub fn download_headers(format: ExportFormat, stem: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(format.content_type()));
    let disposition = format!("attachment; filename=\"{stem}.{}\"", format.extension());
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition).unwrap_or(HeaderValue::from_static("attachment")),
    );
    headers
}

/// `?classId=..&courseId=..`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairQuery {
    pub class_id: i64,
    pub course_id: i64,
}
