mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

#[actix_rt::test]
#[ignore = "requires DATABASE_URL"]
async fn test_register_login_refresh_logout_flow() {
    let pool = common::pool().await;
    let email = "integration@example.com";
    common::cleanup_developer(&pool, email).await;
    let app = common::app(pool.clone()).await;

    let register_payload = json!({
        "name": "Integration User",
        "email": email,
        "password": "Password123!"
    });
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["developer"]["role"], "developer");
    assert_eq!(body["developer"]["status"], "online");
    assert!(body["developer"].get("password_hash").is_none());
    assert_eq!(body["token"]["token_type"], "Bearer");
    assert_eq!(body["token"]["expires_in"], 86400);

    // Same email, different case.
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "name": "Integration User",
            "email": "Integration@Example.com",
            "password": "Password123!"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let developer = common::login(&app, email, "Password123!").await;

    let req = test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(developer.bearer())
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["id"].as_i64(), Some(developer.id));
    assert_eq!(me["email"], email);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/refresh")
        .set_json(json!({ "refresh_token": developer.refresh_token }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let refreshed: Value = test::read_body_json(resp).await;
    assert!(refreshed["token"]["access_token"].is_string());

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/logout")
        .insert_header(developer.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let status: String = sqlx::query_scalar("SELECT status::text FROM developers WHERE email = $1")
        .bind(email)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "inactive");

    let actions: Vec<String> = sqlx::query_scalar(
        "SELECT action FROM activities WHERE developer_id = $1 ORDER BY id",
    )
    .bind(developer.id as i32)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(actions, vec!["user_logged_in", "user_logged_out"]);

    common::cleanup_developer(&pool, email).await;
}

#[actix_rt::test]
#[ignore = "requires DATABASE_URL"]
async fn test_invalid_registration_inputs() {
    let pool = common::pool().await;
    let app = common::app(pool).await;

    let test_cases = vec![
        // Deserialization errors
        (
            json!({ "email": "test@example.com", "password": "Password123!" }),
            StatusCode::BAD_REQUEST,
            "missing name",
        ),
        (
            json!({ "name": "Tester", "password": "Password123!" }),
            StatusCode::BAD_REQUEST,
            "missing email",
        ),
        // Validation errors
        (
            json!({ "name": "Tester", "email": "invalid-email", "password": "Password123!" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid email format",
        ),
        (
            json!({ "name": "T", "email": "test@example.com", "password": "Password123!" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "name too short",
        ),
        (
            json!({ "name": "Tester", "email": "test@example.com", "password": "123" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "password too short",
        ),
    ];

    for (payload, expected_status, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(&payload)
            .to_request();

        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body_bytes = test::read_body(resp).await;

        assert_eq!(
            status,
            expected_status,
            "Test case failed: {}. Body: {:?}",
            description,
            String::from_utf8_lossy(&body_bytes)
        );
    }
}

#[actix_rt::test]
#[ignore = "requires DATABASE_URL"]
async fn test_login_failures_share_one_message() {
    let pool = common::pool().await;
    let email = "login_test_user@example.com";
    common::cleanup_developer(&pool, email).await;
    let app = common::app(pool.clone()).await;

    common::register(&app, "Login Tester", email, "Password123!").await;

    for (payload, description) in [
        (
            json!({ "email": email, "password": "WrongPassword123!" }),
            "incorrect password",
        ),
        (
            json!({ "email": "nonexistent@example.com", "password": "Password123!" }),
            "non-existent developer",
        ),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", description);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Invalid email or password" }));
    }

    common::cleanup_developer(&pool, email).await;
}

#[actix_rt::test]
#[ignore = "requires DATABASE_URL"]
async fn test_admin_only_user_deletion() {
    let pool = common::pool().await;
    let admin_email = "admin_user@example.com";
    let victim_email = "victim_user@example.com";
    common::cleanup_developer(&pool, admin_email).await;
    common::cleanup_developer(&pool, victim_email).await;
    let app = common::app(pool.clone()).await;

    common::register(&app, "Admin", admin_email, "Password123!").await;
    let victim = common::register(&app, "Victim", victim_email, "Password123!").await;
    common::set_role(&pool, admin_email, "admin").await;
    // The token carries the role it was issued with.
    let admin = common::login(&app, admin_email, "Password123!").await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/users/{}", admin.id))
        .insert_header(victim.bearer())
        .to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/users/{}", victim.id))
        .insert_header(victim.bearer())
        .set_json(json!({ "role": "admin" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/users/{}", victim.id))
        .insert_header(admin.bearer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    common::cleanup_developer(&pool, admin_email).await;
}
