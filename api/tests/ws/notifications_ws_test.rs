#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use db::models::{attendance_session, notification};
    use futures_util::StreamExt;
    use serde_json::json;
    use tokio_tungstenite::tungstenite::{Error as WsError, Message};

    use crate::helpers::app::{json, make_test_app, seed, send, token_for};
    use crate::helpers::ws::{connect_ws, next_json, send_json, spawn_server};

    #[tokio::test]
    async fn every_open_tab_receives_the_present_notification() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        let addr = spawn_server(app.clone()).await;
        let token = token_for(&fx.s1);

        let (mut tab1, _) = connect_ws(addr, "notifications", &token).await.unwrap();
        let (mut tab2, _) = connect_ws(addr, "notifications", &token).await.unwrap();
        for tab in [&mut tab1, &mut tab2] {
            send_json(tab, json!({ "studentId": fx.s1.id })).await;
            let ready = next_json(tab, 1000).await;
            assert_eq!(ready["event"], "ready");
        }

        let session = attendance_session::Model::create(
            state.db(),
            fx.course.id,
            fx.class.id,
            fx.teacher.id,
            Utc::now().date_naive(),
            Utc::now(),
            Duration::minutes(5),
        )
        .await
        .unwrap();
        let (status, _) = send(
            &app,
            json(
                "POST",
                "/api/attendance/redeem",
                Some(&fx.s1),
                json!({ "token": session.token, "studentId": fx.s1.id }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        for tab in [&mut tab1, &mut tab2] {
            let pushed = next_json(tab, 1000).await;
            assert!(pushed["message"].as_str().unwrap().contains("marked present"));
            assert_eq!(pushed["read"], false);
            assert!(pushed["id"].is_i64());
            assert!(pushed.get("createdAt").is_some());
        }

        assert_eq!(notification::Model::count_for_student(state.db(), fx.s1.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn mismatched_announce_is_rejected_and_closed() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        let addr = spawn_server(app).await;

        let (mut socket, _) = connect_ws(addr, "notifications", &token_for(&fx.s1)).await.unwrap();
        send_json(&mut socket, json!({ "studentId": fx.s2.id })).await;

        let err = next_json(&mut socket, 1000).await;
        assert_eq!(err["event"], "error");
        assert_eq!(err["payload"]["reason"], "student_mismatch");

        let closed = tokio::time::timeout(std::time::Duration::from_secs(1), async {
            while let Some(frame) = socket.next().await {
                match frame {
                    Ok(Message::Close(Some(f))) => return Some(u16::from(f.code)),
                    Ok(Message::Close(None)) | Err(_) => return None,
                    Ok(_) => continue,
                }
            }
            None
        })
        .await
        .unwrap();
        assert_eq!(closed, Some(1008));
    }

    #[tokio::test]
    async fn channel_requires_a_student_token() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        let addr = spawn_server(app).await;

        match connect_ws(addr, "notifications", "garbage").await.err().expect("expected HTTP 401") {
            WsError::Http(resp) => assert_eq!(resp.status(), StatusCode::UNAUTHORIZED),
            other => panic!("expected HTTP 401, got {other}"),
        }

        match connect_ws(addr, "notifications", &token_for(&fx.teacher)).await.err().expect("expected HTTP 403") {
            WsError::Http(resp) => assert_eq!(resp.status(), StatusCode::FORBIDDEN),
            other => panic!("expected HTTP 403, got {other}"),
        }
    }

    #[tokio::test]
    async fn app_ping_is_answered() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        let addr = spawn_server(app).await;

        let (mut socket, _) = connect_ws(addr, "notifications", &token_for(&fx.s1)).await.unwrap();
        send_json(&mut socket, json!({ "type": "ping" })).await;
        let pong = next_json(&mut socket, 1000).await;
        assert_eq!(pong["event"], "pong");
    }

    #[tokio::test]
    async fn closing_the_last_tab_releases_the_topic() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;
        let addr = spawn_server(app).await;
        let topic = api::ws::notifications::topics::student_notifications_topic(fx.s1.id);

        let (mut socket, _) = connect_ws(addr, "notifications", &token_for(&fx.s1)).await.unwrap();
        send_json(&mut socket, json!({ "studentId": fx.s1.id })).await;
        assert_eq!(next_json(&mut socket, 1000).await["event"], "ready");
        assert!(state.ws().is_user_present_on(&topic, fx.s1.id).await);

        socket.close(None).await.unwrap();

        let gone = tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while state.ws().is_user_present_on(&topic, fx.s1.id).await {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            }
        })
        .await;
        assert!(gone.is_ok(), "presence was not dropped");
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        // Already released by the socket teardown, so nothing is left to drop.
        assert_eq!(state.ws().receiver_count(&topic).await, 0);
        assert!(!state.ws().release_if_idle(&topic).await);
    }
}
