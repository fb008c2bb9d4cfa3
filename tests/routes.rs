//! The production route table, mounted on a pool that never connects.
//!
//! Requests rejected by `AuthMiddleware` or `RequireRole` never reach a handler, so these
//! run without `DATABASE_URL`.

use actix_web::body::to_bytes;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{Method, StatusCode};
use actix_web::{test, web, App};
use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use taskmanager::auth::{AuthMiddleware, PasswordHasher, TokenService};
use taskmanager::routes::{self, health};
use uuid::Uuid;

const SECRET: &str = "route_table_secret";

async fn app(
    tokens: Arc<TokenService>,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .unwrap();
    let auth = AuthMiddleware::new(tokens.clone());

    test::init_service(
        App::new()
            .app_data(web::Data::new(pool))
            .app_data(web::Data::from(tokens))
            .app_data(web::Data::new(PasswordHasher::new(4)))
            .service(health::health)
            .service(web::scope("/api/v1").configure(|cfg| routes::config(cfg, auth))),
    )
    .await
}

fn bearer(tokens: &TokenService, subject: &str, role: &str) -> String {
    let pair = tokens
        .generate_token_pair(subject, &format!("{}@example.com", subject), role, Utc::now())
        .unwrap();
    format!("Bearer {}", pair.access_token)
}

async fn send(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    method: Method,
    uri: &str,
    authorization: Option<&str>,
) -> (StatusCode, Value) {
    let mut req = test::TestRequest::default().method(method).uri(uri);
    if let Some(value) = authorization {
        req = req.insert_header(("Authorization", value));
    }

    match test::try_call_service(app, req.to_request()).await {
        Ok(resp) => {
            let status = resp.status();
            let body = test::read_body(resp).await;
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            let body = to_bytes(resp.into_body()).await.unwrap();
            (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
        }
    }
}

#[actix_rt::test]
async fn test_user_deletion_is_admin_only() {
    let tokens = Arc::new(TokenService::new(SECRET).unwrap());
    let app = app(tokens.clone()).await;
    let developer = bearer(&tokens, "2", "developer");
    let manager = bearer(&tokens, "3", "manager");

    let (status, body) = send(&app, Method::DELETE, "/api/v1/users/1", Some(&developer)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "Insufficient permissions" }));

    let (status, _) = send(&app, Method::DELETE, "/api/v1/users/1", Some(&manager)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::DELETE, "/api/v1/users/1", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Authorization header required" }));
}

#[actix_rt::test]
async fn test_project_deletion_needs_manager_role() {
    let tokens = Arc::new(TokenService::new(SECRET).unwrap());
    let app = app(tokens.clone()).await;
    let uri = format!("/api/v1/projects/{}", Uuid::new_v4());

    let (status, _) = send(
        &app,
        Method::DELETE,
        &uri,
        Some(&bearer(&tokens, "2", "developer")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_resource_routes_require_a_token() {
    let tokens = Arc::new(TokenService::new(SECRET).unwrap());
    let app = app(tokens.clone()).await;

    for (method, uri) in [
        (Method::GET, "/api/v1/users"),
        (Method::GET, "/api/v1/projects"),
        (Method::GET, "/api/v1/tasks"),
        (Method::POST, "/api/v1/tasks"),
        (Method::GET, "/api/v1/activity"),
        (Method::GET, "/api/v1/auth/me"),
        (Method::POST, "/api/v1/auth/logout"),
    ] {
        let (status, _) = send(&app, method.clone(), uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }

    let other = TokenService::new("some_other_secret").unwrap();
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/tasks",
        Some(&bearer(&other, "2", "admin")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Invalid token" }));
}

#[actix_rt::test]
async fn test_health_and_api_root_are_public() {
    let tokens = Arc::new(TokenService::new(SECRET).unwrap());
    let app = app(tokens).await;

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/api/v1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "TaskManager API");
    assert!(body["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["method"] == "DELETE" && e["path"] == "/api/v1/users/{id}"));
}
