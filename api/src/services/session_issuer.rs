//! Session Issuer.
//!
//! Creates time-boxed attendance sessions for a course, class and date and
//! owns their lifecycle. Expiry is lazy: a session is expired as soon as the
//! clock passes `expires_at`, whether or not anyone has written that down.

use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use db::is_unique_violation;
use db::models::attendance_session::{self, SessionStatus};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::json;
use util::config;
use util::ws::WebSocketManager;

use super::error::AttendanceError;
use super::{Actor, authorize_teacher, retry_storage};
use crate::ws::attendance::{emit, payload};

#[derive(Debug, Clone)]
pub struct CreateSession {
    pub course_id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
    pub date: NaiveDate,
}

/// A session as shown to its teacher, with the QR payload to render.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: i64,
    pub course_id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
    pub date: NaiveDate,
    pub token: String,
    pub qr_payload: String,
    pub status: SessionStatus,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionView {
    pub fn new(session: &attendance_session::Model, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session.id,
            course_id: session.course_id,
            class_id: session.class_id,
            teacher_id: session.teacher_id,
            date: session.date,
            token: session.token.clone(),
            qr_payload: qr_payload(session),
            status: session.effective_status(now),
            issued_at: session.issued_at,
            expires_at: session.expires_at,
        }
    }
}

/// JSON string encoded into the QR code. Scanners read its `token` field.
pub fn qr_payload(session: &attendance_session::Model) -> String {
    json!({
        "token": session.token,
        "sessionId": session.id,
        "expiresAt": session.expires_at.to_rfc3339(),
    })
    .to_string()
}

/// `date` must lie in `[today, today + horizon_days]`.
pub fn validate_session_date(date: NaiveDate, now: DateTime<Utc>, horizon_days: u64) -> Result<(), AttendanceError> {
    let today = now.date_naive();
    if date < today {
        return Err(AttendanceError::InvalidDate(format!(
            "Session date {date} is in the past"
        )));
    }
    let beyond = match today.checked_add_days(Days::new(horizon_days)) {
        Some(horizon) => date > horizon,
        None => true,
    };
    if beyond {
        return Err(AttendanceError::InvalidDate(format!(
            "Session date {date} is more than {horizon_days} days ahead"
        )));
    }
    Ok(())
}

/// Attempts made when the live slot keeps changing hands under us.
const ISSUE_ATTEMPTS: usize = 3;

/// Issues a new session.
///
/// Re-issuing while a session for the same sitting is still live fails with
/// `SessionAlreadyActive`. An expired earlier session does not block. The
/// live-sitting unique index decides between concurrent issuers.
pub async fn create_session(
    db: &DatabaseConnection,
    ws: &WebSocketManager,
    actor: Actor,
    req: CreateSession,
    now: DateTime<Utc>,
) -> Result<SessionView, AttendanceError> {
    authorize_teacher(db, actor, req.course_id, req.class_id, req.teacher_id).await?;
    validate_session_date(req.date, now, config::session_horizon_days())?;

    let session = issue_exclusive(db, &req, now).await?;

    tracing::info!(
        session_id = session.id,
        course_id = session.course_id,
        class_id = session.class_id,
        date = %session.date,
        expires_at = %session.expires_at,
        "Attendance session issued"
    );

    emit::session_created(
        ws,
        payload::SessionCreated {
            session_id: session.id,
            course_id: session.course_id,
            class_id: session.class_id,
            date: session.date,
            expires_at: session.expires_at,
        },
    )
    .await;

    Ok(SessionView::new(&session, now))
}

/// Frees the slot held by windows that have already lapsed, then inserts.
/// A unique violation means another live session holds the sitting.
async fn issue_exclusive(
    db: &DatabaseConnection,
    req: &CreateSession,
    now: DateTime<Utc>,
) -> Result<attendance_session::Model, AttendanceError> {
    let validity = Duration::minutes(config::session_validity_minutes() as i64);

    for _ in 0..ISSUE_ATTEMPTS {
        retry_storage("attendance_session.expire_stale", || {
            attendance_session::Model::expire_stale(db, req.course_id, req.class_id, req.date, now)
        })
        .await?;

        let inserted = retry_storage("attendance_session.create", || {
            attendance_session::Model::create(db, req.course_id, req.class_id, req.teacher_id, req.date, now, validity)
        })
        .await;

        match inserted {
            Ok(session) => return Ok(session),
            Err(AttendanceError::Storage(e)) if is_unique_violation(&e) => {
                let holder =
                    attendance_session::Model::find_stored_active(db, req.course_id, req.class_id, req.date).await?;
                if let Some(live) = holder.filter(|s| !s.is_expired(now)) {
                    return Err(AttendanceError::SessionAlreadyActive { session_id: live.id });
                }
                tracing::debug!(course_id = req.course_id, class_id = req.class_id, "Live slot changed hands, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    Err(AttendanceError::Storage(sea_orm::DbErr::Custom(format!(
        "Could not claim the live slot for course {} class {} on {}",
        req.course_id, req.class_id, req.date
    ))))
}

async fn load_owned(
    db: &DatabaseConnection,
    actor: Actor,
    session_id: i64,
) -> Result<attendance_session::Model, AttendanceError> {
    let session = attendance_session::Model::find_by_id(db, session_id)
        .await?
        .ok_or(AttendanceError::SessionNotFound)?;
    if !actor.is_admin() && session.teacher_id != actor.id {
        return Err(AttendanceError::NotAuthorized);
    }
    Ok(session)
}

/// Closes the redemption window early. Closing an already expired session
/// returns it unchanged.
pub async fn close_session(
    db: &DatabaseConnection,
    ws: &WebSocketManager,
    actor: Actor,
    session_id: i64,
    now: DateTime<Utc>,
) -> Result<SessionView, AttendanceError> {
    let session = load_owned(db, actor, session_id).await?;
    if session.status == SessionStatus::Expired {
        return Ok(SessionView::new(&session, now));
    }

    let closed = session.mark_expired(db, now).await?;
    tracing::info!(session_id, "Attendance session closed");
    emit::session_closed(
        ws,
        payload::SessionClosed {
            session_id,
            closed_at: now,
        },
    )
    .await;

    Ok(SessionView::new(&closed, now))
}

pub async fn get_session(
    db: &DatabaseConnection,
    actor: Actor,
    session_id: i64,
    now: DateTime<Utc>,
) -> Result<SessionView, AttendanceError> {
    let session = load_owned(db, actor, session_id).await?;
    Ok(SessionView::new(&session, now))
}

/// Sessions held for the pair, oldest first.
pub async fn list_sessions(
    db: &DatabaseConnection,
    actor: Actor,
    course_id: i64,
    class_id: i64,
    now: DateTime<Utc>,
) -> Result<Vec<SessionView>, AttendanceError> {
    authorize_teacher(db, actor, course_id, class_id, actor.id).await?;
    let sessions = attendance_session::Model::list_for(db, course_id, class_id).await?;
    Ok(sessions.iter().map(|s| SessionView::new(s, now)).collect())
}

/// Session that manual marks for a sitting are attached to: the latest one
/// issued for the date, or a new closed session when none exists.
pub async fn ensure_session_for_date(
    db: &DatabaseConnection,
    course_id: i64,
    class_id: i64,
    teacher_id: i64,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<attendance_session::Model, AttendanceError> {
    if let Some(existing) = attendance_session::Model::latest_for_date(db, course_id, class_id, date).await? {
        return Ok(existing);
    }

    let created = retry_storage("attendance_session.create_closed", || {
        attendance_session::Model::create_closed(db, course_id, class_id, teacher_id, date, now)
    })
    .await;

    match created {
        Ok(created) => {
            tracing::info!(session_id = created.id, date = %date, "Created closed session for manual attendance");
            Ok(created)
        }
        // A concurrent submission created the manual sitting first.
        Err(AttendanceError::Storage(e)) if is_unique_violation(&e) => {
            attendance_session::Model::latest_for_date(db, course_id, class_id, date)
                .await?
                .ok_or(AttendanceError::Storage(e))
        }
        Err(e) => Err(e),
    }
}
