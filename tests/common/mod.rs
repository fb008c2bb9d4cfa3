//! Helpers shared by the Postgres-backed integration tests.
//!
//! These tests need `DATABASE_URL` and are `#[ignore]`d; run them with
//! `cargo test -- --ignored` against a scratch database.

#![allow(dead_code)]

use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use dotenv::dotenv;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use taskmanager::auth::{AuthMiddleware, PasswordHasher, TokenService};
use taskmanager::routes::{self, health};

pub const TEST_SECRET: &str = "integration_test_secret";

pub async fn pool() -> PgPool {
    dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

pub async fn app(
    pool: PgPool,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    let tokens = Arc::new(TokenService::new(TEST_SECRET).unwrap());
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

pub async fn cleanup_developer(pool: &PgPool, email: &str) {
    let _ = sqlx::query("DELETE FROM developers WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await;
}

pub async fn set_role(pool: &PgPool, email: &str, role: &str) {
    sqlx::query("UPDATE developers SET role = $2 WHERE email = $1")
        .bind(email)
        .bind(role)
        .execute(pool)
        .await
        .expect("Failed to set role");
}

/// A registered developer and their access token.
pub struct TestDeveloper {
    pub id: i64,
    pub token: String,
    pub refresh_token: String,
}

impl TestDeveloper {
    pub fn bearer(&self) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", self.token))
    }
}

/// Registers a developer, or logs in when the email already exists.
pub async fn register(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    name: &str,
    email: &str,
    password: &str,
) -> TestDeveloper {
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({ "name": name, "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;

    if !resp.status().is_success() {
        return login(app, email, password).await;
    }

    let body: Value = test::read_body_json(resp).await;
    developer_from(&body)
}

fn developer_from(body: &Value) -> TestDeveloper {
    TestDeveloper {
        id: body["developer"]["id"].as_i64().unwrap(),
        token: body["token"]["access_token"].as_str().unwrap().to_string(),
        refresh_token: body["token"]["refresh_token"].as_str().unwrap().to_string(),
    }
}

/// Logs in again so the token carries the developer's current role.
pub async fn login(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    email: &str,
    password: &str,
) -> TestDeveloper {
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    assert!(status.is_success(), "login failed: {}", body);
    developer_from(&body)
}
