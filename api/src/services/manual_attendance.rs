//! Teacher-submitted attendance.
//!
//! The teacher is authoritative: a manual mark replaces whatever the QR path
//! wrote for the same student and session.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use db::models::attendance_record::{self, AttendanceStatus, RecordSource};
use db::models::{course, enrollment};
use sea_orm::{DatabaseConnection, EntityTrait, TransactionTrait};
use serde::{Deserialize, Serialize};

use super::error::AttendanceError;
use super::notification_dispatcher::NotificationDispatcher;
use super::session_issuer::ensure_session_for_date;
use super::{Actor, authorize_teacher, retry_storage};
use crate::ws::attendance::{emit, payload};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntry {
    pub student_id: i64,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone)]
pub struct ManualSubmission {
    pub class_id: i64,
    pub course_id: i64,
    pub teacher_id: i64,
    pub date: NaiveDate,
    pub records: Vec<ManualEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualOutcome {
    pub session_id: i64,
    pub written: usize,
}

async fn validate(db: &DatabaseConnection, sub: &ManualSubmission, now: DateTime<Utc>) -> Result<(), AttendanceError> {
    if sub.records.is_empty() {
        return Err(AttendanceError::Validation("At least one record is required".into()));
    }
    if sub.date > now.date_naive() {
        return Err(AttendanceError::Validation(format!(
            "Cannot record attendance for future date {}",
            sub.date
        )));
    }

    let mut seen = HashSet::new();
    for entry in &sub.records {
        if !seen.insert(entry.student_id) {
            return Err(AttendanceError::Validation(format!(
                "Duplicate record for student {}",
                entry.student_id
            )));
        }
    }

    let enrolled: HashSet<i64> = enrollment::Model::student_ids(db, sub.class_id, sub.course_id)
        .await?
        .into_iter()
        .collect();
    let mut missing: Vec<i64> = seen.difference(&enrolled).copied().collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        let ids: Vec<String> = missing.iter().map(i64::to_string).collect();
        return Err(AttendanceError::Validation(format!(
            "Students not enrolled in this class and course: {}",
            ids.join(", ")
        )));
    }
    Ok(())
}

/// Writes every entry in one transaction, then notifies each student.
pub async fn submit(
    db: &DatabaseConnection,
    dispatcher: &NotificationDispatcher,
    actor: Actor,
    sub: ManualSubmission,
    now: DateTime<Utc>,
) -> Result<ManualOutcome, AttendanceError> {
    authorize_teacher(db, actor, sub.course_id, sub.class_id, sub.teacher_id).await?;
    validate(db, &sub, now).await?;

    let session = ensure_session_for_date(db, sub.course_id, sub.class_id, sub.teacher_id, sub.date, now).await?;

    let records = &sub.records;
    let session_id = session.id;
    retry_storage("attendance.manual", || async move {
        let txn = db.begin().await?;
        for entry in records {
            attendance_record::Model::upsert_manual(&txn, session_id, entry.student_id, entry.status, now).await?;
        }
        txn.commit().await
    })
    .await?;

    tracing::info!(
        session_id = session.id,
        written = sub.records.len(),
        teacher_id = sub.teacher_id,
        "Manual attendance recorded"
    );

    let course_code = course::Entity::find_by_id(sub.course_id)
        .one(db)
        .await?
        .map(|c| c.code)
        .unwrap_or_else(|| format!("course {}", sub.course_id));

    let count = attendance_record::Model::for_session(db, session.id).await?.len();
    for entry in &sub.records {
        let word = match entry.status {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        };
        dispatcher
            .publish_logged(
                entry.student_id,
                &format!("You have been marked {word} for {course_code} on {}", sub.date),
            )
            .await;
        emit::attendance_marked(
            dispatcher.ws(),
            payload::AttendanceMarked {
                session_id: session.id,
                student_id: entry.student_id,
                status: entry.status,
                source: RecordSource::Manual,
                recorded_at: now,
                count,
            },
        )
        .await;
    }

    Ok(ManualOutcome {
        session_id: session.id,
        written: sub.records.len(),
    })
}
