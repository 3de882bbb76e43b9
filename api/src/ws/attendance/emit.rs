use serde::Serialize;
use util::ws::WebSocketManager;

use super::payload;
use super::topics::attendance_session_topic;
use crate::ws::core::{envelope, event::Event};

#[derive(Debug, Serialize)]
pub struct SessionCreatedEvent {
    #[serde(flatten)]
    pub payload: payload::SessionCreated,
}
impl Event for SessionCreatedEvent {
    const NAME: &'static str = "attendance.session_created";
    fn topic_path(&self) -> String {
        attendance_session_topic(self.payload.session_id)
    }
}

#[derive(Debug, Serialize)]
pub struct AttendanceMarkedEvent {
    #[serde(flatten)]
    pub payload: payload::AttendanceMarked,
}
impl Event for AttendanceMarkedEvent {
    const NAME: &'static str = "attendance.marked";
    fn topic_path(&self) -> String {
        attendance_session_topic(self.payload.session_id)
    }
}

#[derive(Debug, Serialize)]
pub struct SessionClosedEvent {
    #[serde(flatten)]
    pub payload: payload::SessionClosed,
}
impl Event for SessionClosedEvent {
    const NAME: &'static str = "attendance.session_closed";
    fn topic_path(&self) -> String {
        attendance_session_topic(self.payload.session_id)
    }
}

/* ---------- one-liner helpers ---------- */

pub async fn session_created(ws: &WebSocketManager, p: payload::SessionCreated) {
    envelope::emit(ws, &SessionCreatedEvent { payload: p }).await;
}

pub async fn attendance_marked(ws: &WebSocketManager, p: payload::AttendanceMarked) {
    envelope::emit(ws, &AttendanceMarkedEvent { payload: p }).await;
}

pub async fn session_closed(ws: &WebSocketManager, p: payload::SessionClosed) {
    envelope::emit(ws, &SessionClosedEvent { payload: p }).await;
}
