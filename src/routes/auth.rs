use crate::{
    auth::{
        AuthResponse, LoginRequest, PasswordHasher, RefreshRequest, RefreshResponse,
        RegisterRequest, RequestIdentity, TokenService, DEFAULT_ROLE,
    },
    error::AppError,
    models::{
        developer::{normalize_email, DEVELOPER_COLUMNS},
        ActivityAction, Developer, DeveloperStatus, NewActivity,
    },
    routes::activity,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

async fn mark_status(pool: &PgPool, developer_id: i32, status: DeveloperStatus) {
    if let Err(e) = Developer::set_status(pool, developer_id, status).await {
        log::warn!(
            "failed to set status of developer {} to {:?}: {}",
            developer_id,
            status,
            e
        );
    }
}

/// Register a new developer
///
/// Creates the account with the `developer` role, marks it online and returns a token pair.
///
/// ## Responses:
/// - `201 Created`: `{ "developer": Developer, "token": TokenPair }`.
/// - `409 Conflict`: the email is already registered.
/// - `422 Unprocessable Entity`: validation failed.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    hasher: web::Data<PasswordHasher>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let email = normalize_email(&register_data.email);
    if Developer::find_by_email(&pool, &email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hasher.hash(&register_data.password)?;

    let developer = sqlx::query_as::<_, Developer>(&format!(
        "INSERT INTO developers (name, email, password_hash, role, status)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {}",
        DEVELOPER_COLUMNS
    ))
    .bind(register_data.name.trim())
    .bind(&email)
    .bind(&password_hash)
    .bind(DEFAULT_ROLE)
    .bind(DeveloperStatus::Online)
    .fetch_one(&**pool)
    .await
    .map_err(|e| match e {
        // Lost a race with a concurrent registration of the same email.
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Conflict("Email already registered".into())
        }
        other => AppError::from(other),
    })?;

    let token = tokens.generate_token_pair(
        &developer.id.to_string(),
        &developer.email,
        &developer.role,
        Utc::now(),
    )?;

    log::info!("registered developer {}", developer.id);

    Ok(HttpResponse::Created().json(AuthResponse { developer, token }))
}

/// Login
///
/// Checks email and password and returns a fresh token pair. Unknown emails and wrong
/// passwords produce the same 401.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    hasher: web::Data<PasswordHasher>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let invalid_credentials = || AppError::Unauthorized("Invalid email or password".into());

    let mut developer = Developer::find_by_email(&pool, &login_data.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !hasher.verify(&login_data.password, &developer.password_hash) {
        return Err(invalid_credentials());
    }

    let token = tokens.generate_token_pair(
        &developer.id.to_string(),
        &developer.email,
        &developer.role,
        Utc::now(),
    )?;

    mark_status(&pool, developer.id, DeveloperStatus::Online).await;
    developer.status = DeveloperStatus::Online;
    activity::record(
        &pool,
        NewActivity::new(developer.id, ActivityAction::UserLoggedIn),
    )
    .await;

    Ok(HttpResponse::Ok().json(AuthResponse { developer, token }))
}

/// Refresh
///
/// Exchanges a valid refresh token for a new pair. The same refresh token can be exchanged
/// again until it expires.
///
/// ## Responses:
/// - `200 OK`: `{ "token": TokenPair }`.
/// - `401 Unauthorized`: the refresh token is invalid or expired.
#[post("/refresh")]
pub async fn refresh(
    tokens: web::Data<TokenService>,
    refresh_data: web::Json<RefreshRequest>,
) -> Result<impl Responder, AppError> {
    refresh_data.validate()?;

    let token = tokens.refresh_token_pair(&refresh_data.refresh_token, Utc::now())?;

    Ok(HttpResponse::Ok().json(RefreshResponse { token }))
}

/// Current developer
///
/// Returns the developer behind the access token, read fresh from the database.
#[get("/me")]
pub async fn me(
    pool: web::Data<PgPool>,
    identity: RequestIdentity,
) -> Result<impl Responder, AppError> {
    let developer = Developer::find_by_id(&pool, identity.numeric_id()?)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(developer))
}

/// Logout
///
/// Marks the developer inactive. Issued tokens remain valid until they expire.
#[post("/logout")]
pub async fn logout(
    pool: web::Data<PgPool>,
    identity: RequestIdentity,
) -> Result<impl Responder, AppError> {
    let developer_id = identity.numeric_id()?;

    mark_status(&pool, developer_id, DeveloperStatus::Inactive).await;
    activity::record(
        &pool,
        NewActivity::new(developer_id, ActivityAction::UserLoggedOut),
    )
    .await;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Logout successful"
    })))
}
