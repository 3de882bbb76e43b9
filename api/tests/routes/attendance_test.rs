#[cfg(test)]
mod tests {
    use axum::{
        body::to_bytes,
        http::{StatusCode, header},
    };
    use chrono::{Duration, Utc};
    use db::models::{
        attendance_record::{self, AttendanceStatus, RecordSource},
        attendance_session, notification,
    };
    use serde_json::json;
    use tower::ServiceExt;

    use crate::helpers::app::{Fixture, get, json, make_test_app, seed, send};

    async fn live_session(state: &util::state::AppState, fx: &Fixture) -> attendance_session::Model {
        attendance_session::Model::create(
            state.db(),
            fx.course.id,
            fx.class.id,
            fx.teacher.id,
            Utc::now().date_naive(),
            Utc::now(),
            Duration::minutes(5),
        )
        .await
        .unwrap()
    }

    // ---------------------------
    // redeem
    // ---------------------------

    #[tokio::test]
    async fn scan_twice_yields_one_record_and_soft_conflict() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        let session = live_session(&state, &fx).await;
        let body = json!({ "token": session.token, "studentId": fx.s1.id });

        let (status, first) = send(&app, json("POST", "/api/attendance/redeem", Some(&fx.s1), body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["success"], true);
        assert_eq!(first["data"]["status"], "Present");
        assert!(first["data"]["timestamp"].is_string());

        let (status, second) = send(&app, json("POST", "/api/attendance/redeem", Some(&fx.s1), body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(second["success"], true);
        assert_eq!(second["message"], "Attendance already marked");
        assert_eq!(second["data"]["timestamp"], first["data"]["timestamp"]);

        let rows = attendance_record::Model::for_session(state.db(), session.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].source, RecordSource::Qr);

        let inbox = notification::Model::list_for_student(state.db(), fx.s1.id).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert!(inbox[0].message.contains("marked present for CS101"));
    }

    #[tokio::test]
    async fn qr_payload_is_accepted_as_token() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        let session = live_session(&state, &fx).await;
        let qr = json!({ "token": session.token, "sessionId": session.id }).to_string();

        let (status, _) = send(
            &app,
            json("POST", "/api/attendance/redeem", Some(&fx.s1), json!({ "token": qr, "studentId": fx.s1.id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn concurrent_scans_create_one_record() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        let session = live_session(&state, &fx).await;
        let body = json!({ "token": session.token, "studentId": fx.s1.id });

        let attempts = (0..5).map(|_| send(&app, json("POST", "/api/attendance/redeem", Some(&fx.s1), body.clone())));
        let outcomes = futures::future::join_all(attempts).await;

        let ok = outcomes.iter().filter(|(s, _)| *s == StatusCode::OK).count();
        let conflicts = outcomes.iter().filter(|(s, _)| *s == StatusCode::CONFLICT).count();
        assert_eq!(ok, 1);
        assert_eq!(conflicts, 4);
        assert!(outcomes.iter().all(|(_, b)| b["success"] == true));

        assert_eq!(attendance_record::Model::for_session(state.db(), session.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn expired_token_is_gone_and_writes_nothing() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;

        // Issued six minutes ago with a five minute window.
        let issued = Utc::now() - Duration::minutes(6);
        let session = attendance_session::Model::create(
            state.db(),
            fx.course.id,
            fx.class.id,
            fx.teacher.id,
            issued.date_naive(),
            issued,
            Duration::minutes(5),
        )
        .await
        .unwrap();

        let (status, body) = send(
            &app,
            json(
                "POST",
                "/api/attendance/redeem",
                Some(&fx.s1),
                json!({ "token": session.token, "studentId": fx.s1.id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::GONE);
        assert_eq!(body["success"], false);
        assert!(attendance_record::Model::for_session(state.db(), session.id).await.unwrap().is_empty());
        assert_eq!(notification::Model::count_for_student(state.db(), fx.s1.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unenrolled_student_is_forbidden_and_not_notified() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        let session = live_session(&state, &fx).await;

        let (status, _) = send(
            &app,
            json(
                "POST",
                "/api/attendance/redeem",
                Some(&fx.outsider),
                json!({ "token": session.token, "studentId": fx.outsider.id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(attendance_record::Model::for_session(state.db(), session.id).await.unwrap().is_empty());
        assert_eq!(notification::Model::count_for_student(state.db(), fx.outsider.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn cannot_redeem_for_someone_else() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        let session = live_session(&state, &fx).await;

        let (status, _) = send(
            &app,
            json(
                "POST",
                "/api/attendance/redeem",
                Some(&fx.s2),
                json!({ "token": session.token, "studentId": fx.s1.id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(attendance_record::Model::find(state.db(), session.id, fx.s1.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_token_is_bad_request() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;

        let (status, _) = send(
            &app,
            json(
                "POST",
                "/api/attendance/redeem",
                Some(&fx.s1),
                json!({ "token": "f".repeat(64), "studentId": fx.s1.id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // ---------------------------
    // manual
    // ---------------------------

    #[tokio::test]
    async fn manual_submission_overrides_scan() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        let session = live_session(&state, &fx).await;

        send(
            &app,
            json(
                "POST",
                "/api/attendance/redeem",
                Some(&fx.s1),
                json!({ "token": session.token, "studentId": fx.s1.id }),
            ),
        )
        .await;

        let (status, body) = send(
            &app,
            json(
                "POST",
                "/api/attendance/manual",
                Some(&fx.teacher),
                json!({
                    "classId": fx.class.id,
                    "courseId": fx.course.id,
                    "teacherId": fx.teacher.id,
                    "date": Utc::now().date_naive(),
                    "records": [
                        { "studentId": fx.s1.id, "status": "Absent" },
                        { "studentId": fx.s2.id, "status": "Present" }
                    ]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["sessionId"], session.id);
        assert_eq!(body["data"]["written"], 2);

        let s1 = attendance_record::Model::find(state.db(), session.id, fx.s1.id).await.unwrap().unwrap();
        assert_eq!(s1.status, AttendanceStatus::Absent);
        assert_eq!(s1.source, RecordSource::Manual);
    }

    #[tokio::test]
    async fn manual_validation_errors_are_bad_request() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        let today = Utc::now().date_naive();

        let bodies = [
            json!({
                "classId": fx.class.id, "courseId": fx.course.id, "teacherId": fx.teacher.id,
                "date": today, "records": []
            }),
            json!({
                "classId": fx.class.id, "courseId": fx.course.id, "teacherId": fx.teacher.id,
                "date": today,
                "records": [{ "studentId": fx.outsider.id, "status": "Present" }]
            }),
            json!({
                "classId": fx.class.id, "courseId": fx.course.id, "teacherId": fx.teacher.id,
                "date": today,
                "records": [
                    { "studentId": fx.s1.id, "status": "Present" },
                    { "studentId": fx.s1.id, "status": "Absent" }
                ]
            }),
        ];
        for body in bodies {
            let (status, resp) = send(&app, json("POST", "/api/attendance/manual", Some(&fx.teacher), body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{resp}");
            assert_eq!(resp["success"], false);
        }

        let (status, _) = send(
            &app,
            json(
                "POST",
                "/api/attendance/manual",
                Some(&fx.other_teacher),
                json!({
                    "classId": fx.class.id, "courseId": fx.course.id, "teacherId": fx.other_teacher.id,
                    "date": today,
                    "records": [{ "studentId": fx.s1.id, "status": "Present" }]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    // ---------------------------
    // queries
    // ---------------------------

    /// Three past sittings: s1 attends all, s2 only the first.
    async fn history(state: &util::state::AppState, fx: &Fixture) -> Vec<chrono::NaiveDate> {
        let today = Utc::now().date_naive();
        let days: Vec<_> = (1..=3).rev().map(|d| today - Duration::days(d)).collect();
        for (i, day) in days.iter().enumerate() {
            let s = attendance_session::Model::create_closed(
                state.db(),
                fx.course.id,
                fx.class.id,
                fx.teacher.id,
                *day,
                Utc::now(),
            )
            .await
            .unwrap();
            attendance_record::Model::upsert_manual(state.db(), s.id, fx.s1.id, AttendanceStatus::Present, Utc::now())
                .await
                .unwrap();
            if i == 0 {
                attendance_record::Model::upsert_manual(
                    state.db(),
                    s.id,
                    fx.s2.id,
                    AttendanceStatus::Present,
                    Utc::now(),
                )
                .await
                .unwrap();
            }
        }
        days
    }

    #[tokio::test]
    async fn attendance_for_date_and_percentages() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        let days = history(&state, &fx).await;

        let uri = format!(
            "/api/attendance?classId={}&courseId={}&date={}",
            fx.class.id, fx.course.id, days[2]
        );
        let (status, body) = send(&app, get(&uri, &fx.teacher)).await;
        assert_eq!(status, StatusCode::OK);

        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        let ben = rows.iter().find(|r| r["studentId"] == fx.s2.id).unwrap();
        assert_eq!(ben["status"], "Absent");
        assert_eq!(ben["presentCount"], 1);
        assert_eq!(ben["totalSessions"], 3);
        assert_eq!(ben["attendancePercentage"], 33.33);

        let (status, _) = send(&app, get(&uri, &fx.other_teacher)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn low_attendance_lists_and_notifies() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        history(&state, &fx).await;

        let uri = format!("/api/attendance/low?classId={}&courseId={}", fx.class.id, fx.course.id);
        let (status, body) = send(&app, get(&uri, &fx.teacher)).await;
        assert_eq!(status, StatusCode::OK);
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["studentId"], fx.s2.id);

        let uri = format!("/api/attendance/low?classId={}&courseId={}&threshold=20", fx.class.id, fx.course.id);
        let (_, body) = send(&app, get(&uri, &fx.teacher)).await;
        assert!(body["data"].as_array().unwrap().is_empty());

        let (status, body) = send(
            &app,
            json(
                "POST",
                "/api/attendance/low/notify",
                Some(&fx.teacher),
                json!({ "classId": fx.class.id, "courseId": fx.course.id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["notified"], 1);
        assert_eq!(notification::Model::count_for_student(state.db(), fx.s2.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn export_downloads_xlsx_and_csv() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        history(&state, &fx).await;

        let uri = format!("/api/attendance/export?classId={}&courseId={}", fx.class.id, fx.course.id);
        let response = app.clone().oneshot(get(&uri, &fx.teacher)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_owned();
        assert!(disposition.ends_with(".xlsx\""));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..2], b"PK");

        let response = app
            .clone()
            .oneshot(get(&format!("{uri}&format=csv"), &fx.teacher))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let csv = String::from_utf8(bytes.to_vec()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Reg No,Name,"));
        assert!(lines[2].ends_with(",A,A,1,3,33.33"));

        let (status, _) = send(&app, get(&format!("{uri}&format=pdf"), &fx.teacher)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
