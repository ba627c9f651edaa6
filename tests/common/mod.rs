#![allow(dead_code)]

use actix_cors::Cors;
use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;

use projectforge::auth::{AuthMiddleware, AuthResponse};
use projectforge::config::AuthSettings;
use projectforge::routes::{self, health};
use projectforge::storage::{MemoryRepository, Repository};

pub const PASSWORD: &str = "Secret123";

pub struct TestUser {
    pub id: i32,
    pub token: String,
}

pub fn settings() -> Arc<AuthSettings> {
    let mut settings = AuthSettings::new("integration-test-secret");
    settings.bcrypt_cost = 4;
    Arc::new(settings)
}

/// The full application over a fresh in-memory store.
pub async fn init_app() -> (
    impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    Arc<dyn Repository>,
) {
    let repo: Arc<dyn Repository> = Arc::new(MemoryRepository::new());
    let settings = settings();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(Arc::clone(&repo)))
            .app_data(web::Data::from(Arc::clone(&settings)))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(settings))
                    .configure(routes::config),
            ),
    )
    .await;

    (app, repo)
}

pub fn authed(req: test::TestRequest, user: &TestUser) -> test::TestRequest {
    req.insert_header((header::AUTHORIZATION, format!("Bearer {}", user.token)))
}

/// Sends `req` and returns the status with the JSON body (`Null` when there is none).
pub async fn send<S, B>(app: &S, req: test::TestRequest) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub async fn register<S, B>(app: &S, username: &str) -> TestUser
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": PASSWORD,
        }));
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);

    let auth: AuthResponse = serde_json::from_value(body).expect("auth response");
    TestUser {
        id: auth.user_id,
        token: auth.token,
    }
}

pub async fn create_project<S, B>(app: &S, user: &TestUser, name: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = authed(test::TestRequest::post().uri("/api/projects"), user)
        .set_json(json!({ "name": name, "priority": "high" }));
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "project creation failed: {}", body);
    body
}

pub async fn create_task<S, B>(app: &S, user: &TestUser, payload: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = authed(test::TestRequest::post().uri("/api/tasks"), user).set_json(payload);
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "task creation failed: {}", body);
    body
}
