pub mod attendance_record;
pub mod attendance_session;
pub mod class;
pub mod course;
pub mod course_assignment;
pub mod enrollment;
pub mod notification;
pub mod user;

pub use attendance_record::Entity as AttendanceRecord;
pub use attendance_session::Entity as AttendanceSession;
pub use class::Entity as Class;
pub use course::Entity as Course;
pub use course_assignment::Entity as CourseAssignment;
pub use enrollment::Entity as Enrollment;
pub use notification::Entity as Notification;
pub use user::Entity as User;
