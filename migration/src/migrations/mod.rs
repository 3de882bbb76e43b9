pub mod m202501100001_create_users;
pub mod m202501100002_create_courses;
pub mod m202501100003_create_classes;
pub mod m202501100004_create_course_assignments;
pub mod m202501100005_create_enrollments;
pub mod m202501100006_create_attendance;
pub mod m202501100007_create_notifications;
