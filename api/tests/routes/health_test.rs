#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };

    use crate::helpers::app::{make_test_app, send};

    #[tokio::test]
    async fn health_is_public() {
        let (app, _state) = make_test_app().await;
        let req = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }
}
