//! The attendance core: session issuance, scan redemption, manual marking,
//! notification dispatch and the read-side query layer.
//!
//! Route handlers stay thin and call into these modules; every failure
//! surfaces as an [`error::AttendanceError`].

pub mod attendance_query;
pub mod error;
pub mod export;
pub mod manual_attendance;
pub mod notification_dispatcher;
pub mod scan_redeemer;
pub mod session_issuer;

use std::future::Future;

use db::models::{course_assignment, user::Role};
use sea_orm::{DatabaseConnection, DbErr};
use util::retry::{RetryPolicy, retry_transient};

use crate::auth::AuthUser;
use error::AttendanceError;

/// Who is performing an operation.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&AuthUser> for Actor {
    fn from(user: &AuthUser) -> Self {
        Self {
            id: user.id(),
            role: user.role(),
        }
    }
}

/// Fails with `NotAuthorized` unless `actor` may act as `teacher_id` on the
/// course/class pair.
///
/// Admins may act on behalf of any teacher. Everyone else must be the named
/// teacher and hold an assignment row for the pair.
pub async fn authorize_teacher(
    db: &DatabaseConnection,
    actor: Actor,
    course_id: i64,
    class_id: i64,
    teacher_id: i64,
) -> Result<(), AttendanceError> {
    if actor.is_admin() {
        return Ok(());
    }
    if actor.role != Role::Teacher || actor.id != teacher_id {
        return Err(AttendanceError::NotAuthorized);
    }
    if !course_assignment::Model::is_assigned(db, course_id, class_id, teacher_id).await? {
        return Err(AttendanceError::NotAuthorized);
    }
    Ok(())
}

/// Ids named in a request body must be the caller's own, unless the caller
/// is an admin.
pub fn ensure_self(actor: Actor, claimed_id: i64) -> Result<(), AttendanceError> {
    if actor.is_admin() || actor.id == claimed_id {
        Ok(())
    } else {
        Err(AttendanceError::IdentityMismatch)
    }
}

/// Runs a storage write under the configured transient-error policy.
/// Only the error left after the last attempt reaches the caller.
pub async fn retry_storage<F, Fut, T>(operation: &str, op: F) -> Result<T, AttendanceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    Ok(retry_transient(&RetryPolicy::from_config(), operation, op).await?)
}
