mod attendance_test;
mod health_test;
mod me_test;
mod notifications_test;
