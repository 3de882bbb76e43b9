#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::{StatusCode, header};
    use chrono::{Duration, NaiveDate, Utc};
    use db::models::attendance_record::{self, AttendanceStatus};
    use db::models::{attendance_session, course};
    use tower::ServiceExt;

    use crate::helpers::app::{Fixture, get, make_test_app, seed, send};

    /// Two past sittings: Ana present at the first only, Ben at both.
    async fn two_sittings(state: &util::state::AppState, fx: &Fixture) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        for back in [2, 1] {
            let day = Utc::now().date_naive() - Duration::days(back);
            let s = attendance_session::Model::create_closed(state.db(), fx.course.id, fx.class.id, fx.teacher.id, day, Utc::now())
                .await
                .unwrap();
            attendance_record::Model::upsert_manual(state.db(), s.id, fx.s2.id, AttendanceStatus::Present, Utc::now())
                .await
                .unwrap();
            if back == 2 {
                attendance_record::Model::upsert_manual(state.db(), s.id, fx.s1.id, AttendanceStatus::Present, Utc::now())
                    .await
                    .unwrap();
            }
            days.push(day);
        }
        days
    }

    #[tokio::test]
    async fn course_report_lists_own_marks_per_sitting() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        let days = two_sittings(&state, &fx).await;

        let uri = format!("/api/me/attendance/{}", fx.course.id);
        let (status, body) = send(&app, get(&uri, &fx.s1)).await;
        assert_eq!(status, StatusCode::OK);

        let data = &body["data"];
        assert_eq!(data["courseCode"], "CS101");
        assert_eq!(data["presentCount"], 1);
        assert_eq!(data["totalSessions"], 2);
        assert_eq!(data["attendancePercentage"], 50.0);

        let sessions = data["sessions"].as_array().unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0]["date"], days[0].to_string());
        assert_eq!(sessions[0]["status"], "Present");
        assert_eq!(sessions[1]["status"], "Absent");
    }

    #[tokio::test]
    async fn course_report_is_only_for_enrolled_students() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        let uri = format!("/api/me/attendance/{}", fx.course.id);

        let (status, body) = send(&app, get(&uri, &fx.outsider)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);

        let other = course::Model::create(state.db(), "CS102", "Data Structures").await.unwrap();
        let (status, _) = send(&app, get(&format!("/api/me/attendance/{}", other.id), &fx.s1)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, get(&uri, &fx.teacher)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn own_export_holds_only_the_callers_row() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        two_sittings(&state, &fx).await;

        let uri = format!("/api/me/attendance/{}/export", fx.course.id);
        let response = app.clone().oneshot(get(&format!("{uri}?format=csv"), &fx.s1)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"attendance_CS101.csv\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let csv = String::from_utf8(bytes.to_vec()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("2021-001,Ana,P,A,"));
        assert!(lines[1].ends_with(",1,2,50.00"));
        assert!(!csv.contains("Ben"));

        let response = app.clone().oneshot(get(&uri, &fx.s1)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let (status, _) = send(&app, get(&uri, &fx.outsider)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
