use chrono::{DateTime, NaiveDate, Utc};
use db::models::attendance_record::{AttendanceStatus, RecordSource};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: i64,
    pub course_id: i64,
    pub class_id: i64,
    pub date: NaiveDate,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceMarked {
    pub session_id: i64,
    pub student_id: i64,
    pub status: AttendanceStatus,
    pub source: RecordSource,
    pub recorded_at: DateTime<Utc>,
    /// Records on the session after this mark.
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClosed {
    pub session_id: i64,
    pub closed_at: DateTime<Utc>,
}
