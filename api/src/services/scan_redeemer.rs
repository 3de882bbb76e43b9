//! Scan Redeemer.
//!
//! Exchanges a scanned session token for an attendance record. At most one
//! record per (session, student) is guaranteed by the storage layer, not by
//! a read-then-write check here.

use chrono::{DateTime, Utc};
use db::models::attendance_record::{self, AttendanceStatus, RecordSource};
use db::models::{attendance_session, course, enrollment};
use sea_orm::{DatabaseConnection, EntityTrait};

use super::error::AttendanceError;
use super::notification_dispatcher::NotificationDispatcher;
use super::retry_storage;
use crate::ws::attendance::{emit, payload};

const TOKEN_LEN: usize = 64;

/// Outcome of a successful redemption.
#[derive(Debug, Clone)]
pub enum Redemption {
    /// This call wrote the record.
    Marked(attendance_record::Model),
    /// The student was already marked; carries the stored record.
    AlreadyMarked(attendance_record::Model),
}

impl Redemption {
    pub fn record(&self) -> &attendance_record::Model {
        match self {
            Redemption::Marked(r) | Redemption::AlreadyMarked(r) => r,
        }
    }
}

/// Accepts either the bare token or the whole QR payload JSON.
pub fn extract_token(scanned: &str) -> Result<String, AttendanceError> {
    let scanned = scanned.trim();
    let token = if scanned.starts_with('{') {
        serde_json::from_str::<serde_json::Value>(scanned)
            .ok()
            .and_then(|v| v.get("token").and_then(|t| t.as_str()).map(str::to_owned))
            .ok_or(AttendanceError::TokenInvalid)?
    } else {
        scanned.to_owned()
    };

    if token.len() != TOKEN_LEN || !token.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AttendanceError::TokenInvalid);
    }
    Ok(token.to_ascii_lowercase())
}

pub async fn redeem(
    db: &DatabaseConnection,
    dispatcher: &NotificationDispatcher,
    scanned: &str,
    student_id: i64,
    now: DateTime<Utc>,
) -> Result<Redemption, AttendanceError> {
    let token = extract_token(scanned)?;
    let session = attendance_session::Model::find_by_token(db, &token)
        .await?
        .ok_or(AttendanceError::TokenInvalid)?;

    if session.is_expired(now) {
        // Lazy expiry: the first late scan records what the clock already says.
        if let Err(e) = session.mark_expired(db, now).await {
            tracing::warn!(session_id = session.id, error = %e, "Failed to persist session expiry");
        }
        tracing::info!(session_id = session.id, student_id, "Rejected scan of expired token");
        return Err(AttendanceError::TokenExpired);
    }

    if !enrollment::Model::is_enrolled(db, student_id, session.class_id, session.course_id).await? {
        tracing::warn!(session_id = session.id, student_id, "Scan by student not enrolled in session");
        return Err(AttendanceError::NotEnrolled);
    }

    let session_id = session.id;
    let inserted = retry_storage("attendance.redeem", || {
        attendance_record::Model::insert_if_absent(
            db,
            session_id,
            student_id,
            AttendanceStatus::Present,
            RecordSource::Qr,
            now,
        )
    })
    .await?;

    let record = attendance_record::Model::find(db, session.id, student_id)
        .await?
        .ok_or_else(|| {
            AttendanceError::Storage(sea_orm::DbErr::RecordNotFound(format!(
                "attendance record ({}, {student_id}) vanished after insert",
                session.id
            )))
        })?;

    if !inserted {
        tracing::debug!(session_id = session.id, student_id, "Repeat scan");
        return Ok(Redemption::AlreadyMarked(record));
    }

    tracing::info!(session_id = session.id, student_id, "Student marked present");

    let course_code = course::Entity::find_by_id(session.course_id)
        .one(db)
        .await?
        .map(|c| c.code)
        .unwrap_or_else(|| format!("course {}", session.course_id));
    dispatcher
        .publish_logged(
            student_id,
            &format!("You have been marked present for {course_code} on {}", session.date),
        )
        .await;

    let count = attendance_record::Model::for_session(db, session.id).await?.len();
    emit::attendance_marked(
        dispatcher.ws(),
        payload::AttendanceMarked {
            session_id: session.id,
            student_id,
            status: record.status,
            source: record.source,
            recorded_at: record.recorded_at,
            count,
        },
    )
    .await;

    Ok(Redemption::Marked(record))
}
