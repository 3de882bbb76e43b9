//! Read-side aggregation over sessions and records.
//!
//! A student's percentage is `present / sessions held × 100` over the whole
//! history of the course/class pair, rounded half-up to two decimals.

use std::collections::HashMap;

use chrono::NaiveDate;
use db::models::attendance_record::{self, AttendanceStatus};
use db::models::{attendance_session, course, enrollment, user};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::Serialize;

use super::error::AttendanceError;
use super::notification_dispatcher::NotificationDispatcher;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAttendanceRow {
    pub student_id: i64,
    pub name: String,
    pub reg_no: Option<String>,
    /// Mark on the requested date. `None` when no session was held that day
    /// or the row is not tied to a date.
    pub status: Option<AttendanceStatus>,
    pub present_count: u64,
    pub total_sessions: u64,
    pub attendance_percentage: f64,
}

/// Percentage rounded half-up to two decimals. Zero sessions yields `0.0`.
pub fn attendance_percentage(present: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let present = present.min(total);
    let basis_points = (present * 10_000 + total / 2) / total;
    basis_points as f64 / 100.0
}

/// Everything recorded for one course/class pair.
#[derive(Debug, Clone)]
pub struct AttendanceSheet {
    pub course_id: i64,
    pub class_id: i64,
    /// Oldest first.
    pub sessions: Vec<attendance_session::Model>,
    /// Enrolled students ordered by registration number.
    pub students: Vec<user::Model>,
    marks: HashMap<(i64, i64), AttendanceStatus>,
}

impl AttendanceSheet {
    pub async fn load(db: &DatabaseConnection, class_id: i64, course_id: i64) -> Result<Self, AttendanceError> {
        let sessions = attendance_session::Model::list_for(db, course_id, class_id).await?;
        let students = enrollment::Model::students_in(db, class_id, course_id).await?;
        let ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
        let marks = attendance_record::Model::for_sessions(db, &ids)
            .await?
            .into_iter()
            .map(|r| ((r.session_id, r.student_id), r.status))
            .collect();
        Ok(Self {
            course_id,
            class_id,
            sessions,
            students,
            marks,
        })
    }

    pub fn mark(&self, session_id: i64, student_id: i64) -> Option<AttendanceStatus> {
        self.marks.get(&(session_id, student_id)).copied()
    }

    pub fn present_count(&self, student_id: i64) -> u64 {
        self.sessions
            .iter()
            .filter(|s| self.mark(s.id, student_id) == Some(AttendanceStatus::Present))
            .count() as u64
    }

    pub fn total_sessions(&self) -> u64 {
        self.sessions.len() as u64
    }

    fn row(&self, student: &user::Model, status: Option<AttendanceStatus>) -> StudentAttendanceRow {
        let present = self.present_count(student.id);
        let total = self.total_sessions();
        StudentAttendanceRow {
            student_id: student.id,
            name: student.name.clone(),
            reg_no: student.reg_no.clone(),
            status,
            present_count: present,
            total_sessions: total,
            attendance_percentage: attendance_percentage(present, total),
        }
    }

    pub fn rows(&self) -> Vec<StudentAttendanceRow> {
        self.students.iter().map(|s| self.row(s, None)).collect()
    }
}

/// Every enrolled student with their mark on `date`.
///
/// The mark comes from the most recent session held that day. A student
/// without a record on that session is `Absent`.
pub async fn get_attendance(
    db: &DatabaseConnection,
    class_id: i64,
    course_id: i64,
    date: NaiveDate,
) -> Result<Vec<StudentAttendanceRow>, AttendanceError> {
    let sheet = AttendanceSheet::load(db, class_id, course_id).await?;
    let on_date = sheet.sessions.iter().rev().find(|s| s.date == date).map(|s| s.id);

    Ok(sheet
        .students
        .iter()
        .map(|student| {
            let status =
                on_date.map(|session_id| sheet.mark(session_id, student.id).unwrap_or(AttendanceStatus::Absent));
            sheet.row(student, status)
        })
        .collect())
}

/// Students strictly below `threshold` percent.
pub async fn get_low_attendance(
    db: &DatabaseConnection,
    class_id: i64,
    course_id: i64,
    threshold: f64,
) -> Result<Vec<StudentAttendanceRow>, AttendanceError> {
    if !(0.0..=100.0).contains(&threshold) {
        return Err(AttendanceError::Validation(format!(
            "Threshold must be between 0 and 100, got {threshold}"
        )));
    }
    let sheet = AttendanceSheet::load(db, class_id, course_id).await?;
    Ok(sheet
        .rows()
        .into_iter()
        .filter(|row| row.attendance_percentage < threshold)
        .collect())
}

/// Sends a low-attendance alert to every student below `threshold`.
/// Returns how many students were notified.
pub async fn notify_low_attendance(
    db: &DatabaseConnection,
    dispatcher: &NotificationDispatcher,
    class_id: i64,
    course_id: i64,
    threshold: f64,
) -> Result<usize, AttendanceError> {
    let low = get_low_attendance(db, class_id, course_id, threshold).await?;
    let code = course::Entity::find_by_id(course_id)
        .one(db)
        .await?
        .map(|c| c.code)
        .unwrap_or_else(|| format!("course {course_id}"));

    for row in &low {
        dispatcher
            .publish(
                row.student_id,
                &format!(
                    "Your attendance in {code} is {:.2}%, below the required {threshold}%",
                    row.attendance_percentage
                ),
            )
            .await?;
    }

    tracing::info!(class_id, course_id, threshold, notified = low.len(), "Low attendance alerts sent");
    Ok(low.len())
}

/// One course in a student's own attendance report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAttendanceSummary {
    pub course_id: i64,
    pub course_code: String,
    pub course_name: String,
    pub class_id: i64,
    pub present_count: u64,
    pub total_sessions: u64,
    pub attendance_percentage: f64,
}

fn summarize(course: &course::Model, sheet: &AttendanceSheet, student_id: i64) -> CourseAttendanceSummary {
    let present = sheet.present_count(student_id);
    let total = sheet.total_sessions();
    CourseAttendanceSummary {
        course_id: course.id,
        course_code: course.code.clone(),
        course_name: course.name.clone(),
        class_id: sheet.class_id,
        present_count: present,
        total_sessions: total,
        attendance_percentage: attendance_percentage(present, total),
    }
}

pub async fn student_summary(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<CourseAttendanceSummary>, AttendanceError> {
    let mut out = Vec::new();
    for e in enrollment::Model::for_student(db, student_id).await? {
        let Some(c) = course::Entity::find_by_id(e.course_id).one(db).await? else {
            continue;
        };
        let sheet = AttendanceSheet::load(db, e.class_id, e.course_id).await?;
        out.push(summarize(&c, &sheet, student_id));
    }
    Ok(out)
}

/// The student's mark on one sitting. A sitting without a record is `Absent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMark {
    pub session_id: i64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentCourseReport {
    #[serde(flatten)]
    pub summary: CourseAttendanceSummary,
    /// Oldest first.
    pub sessions: Vec<SessionMark>,
}

/// Sheet of the class the student takes `course_id` with, narrowed to the
/// student's own row.
///
/// # Errors
/// `NotEnrolled` when the student does not take the course.
pub async fn student_sheet(
    db: &DatabaseConnection,
    student_id: i64,
    course_id: i64,
) -> Result<(course::Model, AttendanceSheet), AttendanceError> {
    let class_id = enrollment::Model::for_student(db, student_id)
        .await?
        .into_iter()
        .find(|e| e.course_id == course_id)
        .map(|e| e.class_id)
        .ok_or(AttendanceError::NotEnrolled)?;
    let course = course::Entity::find_by_id(course_id)
        .one(db)
        .await?
        .ok_or(AttendanceError::NotEnrolled)?;

    let mut sheet = AttendanceSheet::load(db, class_id, course_id).await?;
    sheet.students.retain(|s| s.id == student_id);
    Ok((course, sheet))
}

/// Per-sitting marks and the running percentage for one of the student's
/// courses.
pub async fn student_course_report(
    db: &DatabaseConnection,
    student_id: i64,
    course_id: i64,
) -> Result<StudentCourseReport, AttendanceError> {
    let (course, sheet) = student_sheet(db, student_id, course_id).await?;
    let sessions = sheet
        .sessions
        .iter()
        .map(|s| SessionMark {
            session_id: s.id,
            date: s.date,
            status: sheet.mark(s.id, student_id).unwrap_or(AttendanceStatus::Absent),
        })
        .collect();

    Ok(StudentCourseReport {
        summary: summarize(&course, &sheet, student_id),
        sessions,
    })
}
