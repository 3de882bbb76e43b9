#[cfg(test)]
mod tests {
    use api::auth::generate_jwt;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use db::models::user::Role;

    use crate::helpers::app::{get, make_test_app, seed, send};

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;

        let req = Request::builder()
            .uri(format!("/api/sessions?classId={}&courseId={}", fx.class.id, fx.course.id))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Authentication required");
    }

    #[tokio::test]
    async fn students_cannot_use_teacher_routes_and_vice_versa() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;

        let uri = format!("/api/sessions?classId={}&courseId={}", fx.class.id, fx.course.id);
        let (status, _) = send(&app, get(&uri, &fx.s1)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, get("/api/notifications", &fx.teacher)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn role_in_token_is_rechecked_against_database() {
        let (app, state) = make_test_app().await;
        let fx = seed(state.db()).await;

        // A student holding a token that claims the teacher role.
        let (forged, _) = generate_jwt(fx.s1.id, Role::Teacher).unwrap();
        let req = Request::builder()
            .uri(format!("/api/sessions?classId={}&courseId={}", fx.class.id, fx.course.id))
            .header(header::AUTHORIZATION, format!("Bearer {forged}"))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let (app, _state) = make_test_app().await;
        let req = Request::builder()
            .uri("/api/me/attendance")
            .header(header::AUTHORIZATION, "Bearer not.a.jwt")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
