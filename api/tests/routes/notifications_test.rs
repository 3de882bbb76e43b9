#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use db::models::{attendance_record::AttendanceStatus, attendance_record, attendance_session, notification};
    use serde_json::json;

    use crate::helpers::app::{get, json, make_test_app, seed, send};

    #[tokio::test]
    async fn backlog_is_newest_first_and_read_is_owner_only() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;

        let older = notification::Model::create(state.db(), fx.s1.id, "first", Utc::now() - Duration::minutes(1))
            .await
            .unwrap();
        let newer = notification::Model::create(state.db(), fx.s1.id, "second", Utc::now())
            .await
            .unwrap();

        let (status, body) = send(&app, get("/api/notifications", &fx.s1)).await;
        assert_eq!(status, StatusCode::OK);
        let items = body["data"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["id"], newer.id);
        assert_eq!(items[0]["read"], false);
        assert!(items[0].get("createdAt").is_some());

        let uri = format!("/api/notifications/{}/read", older.id);
        let (status, _) = send(&app, json("PATCH", &uri, Some(&fx.s2), json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        for _ in 0..2 {
            let (status, body) = send(&app, json("PATCH", &uri, Some(&fx.s1), json!({}))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["data"]["read"], true);
        }

        let (_, body) = send(&app, get("/api/notifications", &fx.s2)).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn me_attendance_reports_own_percentage() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;

        for day in 1..=2 {
            let s = attendance_session::Model::create_closed(
                state.db(),
                fx.course.id,
                fx.class.id,
                fx.teacher.id,
                Utc::now().date_naive() - Duration::days(day),
                Utc::now(),
            )
            .await
            .unwrap();
            if day == 1 {
                attendance_record::Model::upsert_manual(state.db(), s.id, fx.s1.id, AttendanceStatus::Present, Utc::now())
                    .await
                    .unwrap();
            }
        }

        let (status, body) = send(&app, get("/api/me/attendance", &fx.s1)).await;
        assert_eq!(status, StatusCode::OK);
        let courses = body["data"].as_array().unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0]["courseCode"], "CS101");
        assert_eq!(courses[0]["attendancePercentage"], 50.0);
    }
}
