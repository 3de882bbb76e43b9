/// Live view of one session for its issuing teacher.
pub fn attendance_session_topic(session_id: i64) -> String {
    format!("attendance:session:{session_id}")
}
