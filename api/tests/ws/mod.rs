mod attendance_ws_test;
mod notifications_ws_test;
