use api::app::build_app;
use api::auth::generate_jwt;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use db::models::{class, course, course_assignment, enrollment, user};
use db::test_utils::setup_test_db;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;
use util::state::AppState;

/// Full application over a fresh in-memory database.
pub async fn make_test_app() -> (Router, AppState) {
    let db = setup_test_db().await;
    let app_state = AppState::with_db(db);
    (build_app(app_state.clone()), app_state)
}

/// CS101 taught to BSIT-7A by `teacher`. `s1` and `s2` are enrolled,
/// `outsider` is not.
pub struct Fixture {
    pub course: course::Model,
    pub class: class::Model,
    pub teacher: user::Model,
    pub other_teacher: user::Model,
    pub admin: user::Model,
    pub s1: user::Model,
    pub s2: user::Model,
    pub outsider: user::Model,
}

pub const PASSWORD: &str = "password123";

pub async fn seed(db: &DatabaseConnection) -> Fixture {
    let course = course::Model::create(db, "CS101", "Introduction to Computing").await.unwrap();
    let class = class::Model::create(db, "BSIT-7A", "A").await.unwrap();

    let teacher = user::Model::create(db, "Teacher", "teacher@school.test", None, PASSWORD, user::Role::Teacher)
        .await
        .unwrap();
    let other_teacher = user::Model::create(db, "Other", "other@school.test", None, PASSWORD, user::Role::Teacher)
        .await
        .unwrap();
    let admin = user::Model::create(db, "Admin", "admin@school.test", None, PASSWORD, user::Role::Admin)
        .await
        .unwrap();
    let s1 = user::Model::create(db, "Ana", "s1@school.test", Some("2021-001"), PASSWORD, user::Role::Student)
        .await
        .unwrap();
    let s2 = user::Model::create(db, "Ben", "s2@school.test", Some("2021-002"), PASSWORD, user::Role::Student)
        .await
        .unwrap();
    let outsider = user::Model::create(db, "Cy", "s3@school.test", Some("2021-003"), PASSWORD, user::Role::Student)
        .await
        .unwrap();

    course_assignment::Model::create(db, course.id, class.id, teacher.id).await.unwrap();
    enrollment::Model::create(db, s1.id, class.id, course.id).await.unwrap();
    enrollment::Model::create(db, s2.id, class.id, course.id).await.unwrap();

    Fixture {
        course,
        class,
        teacher,
        other_teacher,
        admin,
        s1,
        s2,
        outsider,
    }
}

pub fn token_for(user: &user::Model) -> String {
    generate_jwt(user.id, user.role).unwrap().0
}

pub fn get(uri: &str, user: &user::Model) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(user)))
        .body(Body::empty())
        .unwrap()
}

pub fn json(method: &str, uri: &str, user: Option<&user::Model>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token_for(user)));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Sends `req` and parses the JSON body.
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}
