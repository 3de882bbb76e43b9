pub fn student_notifications_topic(student_id: i64) -> String {
    format!("notifications:student:{student_id}")
}
