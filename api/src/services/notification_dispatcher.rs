use chrono::Utc;
use db::models::notification;
use sea_orm::DatabaseConnection;
use util::ws::{WebSocketManager, push_json};

use super::error::AttendanceError;
use super::retry_storage;
use crate::ws::notifications::topics::student_notifications_topic;

/// Persists notifications and pushes them to a student's open channels.
///
/// The stored row is the source of truth. The push is best effort: a
/// student with no open channel simply finds the message in the backlog.
#[derive(Clone)]
pub struct NotificationDispatcher {
    db: DatabaseConnection,
    ws: WebSocketManager,
}

impl NotificationDispatcher {
    pub fn new(db: DatabaseConnection, ws: WebSocketManager) -> Self {
        Self { db, ws }
    }

    pub fn ws(&self) -> &WebSocketManager {
        &self.ws
    }

    /// Stores the notification, then pushes it to every live channel of the
    /// student. Zero channels is not an error.
    pub async fn publish(&self, student_id: i64, message: &str) -> Result<notification::Model, AttendanceError> {
        let created_at = Utc::now();
        let db = &self.db;
        let stored = retry_storage("notification.create", move || {
            notification::Model::create(db, student_id, message, created_at)
        })
        .await?;

        let topic = student_notifications_topic(student_id);
        let online = self.ws.is_user_present_on(&topic, student_id).await;
        let delivered = push_json(&self.ws, &topic, &stored).await;
        tracing::info!(
            student_id,
            notification_id = stored.id,
            online,
            delivered,
            "Notification published"
        );

        Ok(stored)
    }

    /// Like [`publish`](Self::publish) but only logs failures. Used on the
    /// write paths where the triggering action has already succeeded.
    pub async fn publish_logged(&self, student_id: i64, message: &str) {
        if let Err(e) = self.publish(student_id, message).await {
            tracing::error!(student_id, error = %e, "Failed to publish notification");
        }
    }

    /// Every notification for the student, newest first.
    pub async fn deliver_backlog(&self, student_id: i64) -> Result<Vec<notification::Model>, AttendanceError> {
        Ok(notification::Model::list_for_student(&self.db, student_id).await?)
    }

    /// Marks one of the student's own notifications as read.
    ///
    /// Someone else's notification is reported as not found.
    pub async fn mark_read(
        &self,
        student_id: i64,
        notification_id: i64,
    ) -> Result<notification::Model, AttendanceError> {
        let found = notification::Model::find_owned(&self.db, notification_id, student_id)
            .await?
            .ok_or(AttendanceError::NotificationNotFound)?;
        Ok(found.mark_read(&self.db).await?)
    }
}
