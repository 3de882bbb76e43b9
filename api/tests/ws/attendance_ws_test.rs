#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::Utc;
    use serde_json::json;
    use tokio_tungstenite::tungstenite::Error as WsError;

    use crate::helpers::app::{json, make_test_app, seed, send, token_for};
    use crate::helpers::ws::{connect_ws, next_json, send_json, spawn_server};

    #[tokio::test]
    async fn issuing_teacher_sees_marks_and_close() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        let addr = spawn_server(app.clone()).await;

        let (_, created) = send(
            &app,
            json(
                "POST",
                "/api/sessions",
                Some(&fx.teacher),
                json!({
                    "courseId": fx.course.id,
                    "classId": fx.class.id,
                    "teacherId": fx.teacher.id,
                    "date": Utc::now().date_naive(),
                }),
            ),
        )
        .await;
        let session_id = created["data"]["sessionId"].as_i64().unwrap();
        let token = created["data"]["token"].as_str().unwrap().to_owned();

        let path = format!("attendance/sessions/{session_id}");
        let (mut view, _) = connect_ws(addr, &path, &token_for(&fx.teacher)).await.unwrap();
        send_json(&mut view, json!({ "type": "ping" })).await;
        assert_eq!(next_json(&mut view, 1000).await["event"], "pong");

        let (status, _) = send(
            &app,
            json(
                "POST",
                "/api/attendance/redeem",
                Some(&fx.s1),
                json!({ "token": token, "studentId": fx.s1.id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let marked = next_json(&mut view, 1000).await;
        assert_eq!(marked["type"], "event");
        assert_eq!(marked["event"], "attendance.marked");
        assert_eq!(marked["topic"], format!("attendance:session:{session_id}"));
        assert_eq!(marked["payload"]["studentId"], fx.s1.id);
        assert_eq!(marked["payload"]["status"], "Present");
        assert_eq!(marked["payload"]["source"], "qr");
        assert_eq!(marked["payload"]["count"], 1);

        let (status, _) = send(
            &app,
            json("POST", &format!("/api/sessions/{session_id}/close"), Some(&fx.teacher), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let closed = next_json(&mut view, 1000).await;
        assert_eq!(closed["event"], "attendance.session_closed");
        assert_eq!(closed["payload"]["sessionId"], session_id);
    }

    #[tokio::test]
    async fn other_teacher_cannot_watch() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        let addr = spawn_server(app.clone()).await;

        let (_, created) = send(
            &app,
            json(
                "POST",
                "/api/sessions",
                Some(&fx.teacher),
                json!({
                    "courseId": fx.course.id,
                    "classId": fx.class.id,
                    "teacherId": fx.teacher.id,
                    "date": Utc::now().date_naive(),
                }),
            ),
        )
        .await;
        let session_id = created["data"]["sessionId"].as_i64().unwrap();

        let path = format!("attendance/sessions/{session_id}");
        match connect_ws(addr, &path, &token_for(&fx.other_teacher)).await.err().expect("expected HTTP 403") {
            WsError::Http(resp) => assert_eq!(resp.status(), StatusCode::FORBIDDEN),
            other => panic!("expected HTTP 403, got {other}"),
        }

        match connect_ws(addr, "attendance/sessions/9999", &token_for(&fx.teacher)).await.err().expect("expected HTTP 404") {
            WsError::Http(resp) => assert_eq!(resp.status(), StatusCode::NOT_FOUND),
            other => panic!("expected HTTP 404, got {other}"),
        }
    }
}
