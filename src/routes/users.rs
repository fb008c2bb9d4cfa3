use crate::{
    auth::{RequestIdentity, RequireRole},
    error::AppError,
    models::{
        developer::DEVELOPER_COLUMNS, Developer, DeveloperUpdate, ListResponse, Pagination,
        StatusUpdate,
    },
};
use actix_web::{delete, get, patch, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Self or admin.
fn ensure_self_or_admin(identity: &RequestIdentity, developer_id: i32) -> Result<(), AppError> {
    if identity.is_admin() || identity.numeric_id()? == developer_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You can only modify your own profile".into(),
        ))
    }
}

/// Lists developers ordered by name.
///
/// ## Query Parameters:
/// - `limit` (optional): page size, default 50, at most 100.
/// - `offset` (optional): rows to skip, default 0.
#[get("")]
pub async fn list_users(
    pool: web::Data<PgPool>,
    pagination: web::Query<Pagination>,
) -> Result<impl Responder, AppError> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM developers")
        .fetch_one(&**pool)
        .await?;

    let data = sqlx::query_as::<_, Developer>(&format!(
        "SELECT {} FROM developers ORDER BY name, id LIMIT $1 OFFSET $2",
        DEVELOPER_COLUMNS
    ))
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(ListResponse { data, total }))
}

#[get("/{id}")]
pub async fn get_user(
    pool: web::Data<PgPool>,
    developer_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let developer = Developer::find_by_id(&pool, developer_id.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(developer))
}

/// Updates a developer profile.
///
/// Developers may update themselves; admins may update anyone. Only admins may change a
/// role. Fields left out of the body are unchanged.
///
/// ## Responses:
/// - `200 OK`: the updated `Developer`.
/// - `403 Forbidden`: updating someone else, or changing a role without being admin.
/// - `404 Not Found`: no developer with this id.
/// - `422 Unprocessable Entity`: validation failed.
#[put("/{id}")]
pub async fn update_user(
    pool: web::Data<PgPool>,
    developer_id: web::Path<i32>,
    update: web::Json<DeveloperUpdate>,
    identity: RequestIdentity,
) -> Result<impl Responder, AppError> {
    update.validate()?;
    let developer_id = developer_id.into_inner();
    ensure_self_or_admin(&identity, developer_id)?;

    if update.role.is_some() && !identity.is_admin() {
        return Err(AppError::Forbidden("Only admins can change roles".into()));
    }

    let developer = sqlx::query_as::<_, Developer>(&format!(
        "UPDATE developers
         SET name = COALESCE($2, name),
             avatar_url = COALESCE($3, avatar_url),
             status = COALESCE($4, status),
             role = COALESCE($5, role),
             updated_at = NOW()
         WHERE id = $1
         RETURNING {}",
        DEVELOPER_COLUMNS
    ))
    .bind(developer_id)
    .bind(&update.name)
    .bind(&update.avatar_url)
    .bind(update.status)
    .bind(&update.role)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    log::info!(
        "developer {} updated by {}",
        developer.id,
        identity.developer_id
    );

    Ok(HttpResponse::Ok().json(developer))
}

#[patch("/{id}/status")]
pub async fn update_user_status(
    pool: web::Data<PgPool>,
    developer_id: web::Path<i32>,
    body: web::Json<StatusUpdate>,
    identity: RequestIdentity,
) -> Result<impl Responder, AppError> {
    let developer_id = developer_id.into_inner();
    ensure_self_or_admin(&identity, developer_id)?;

    if !Developer::set_status(&pool, developer_id, body.status).await? {
        return Err(AppError::NotFound("User not found".into()));
    }

    let developer = Developer::find_by_id(&pool, developer_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(HttpResponse::Ok().json(developer))
}

/// Deletes a developer. Admin only.
#[delete("/{id}", wrap = "RequireRole::new(\"admin\")")]
pub async fn delete_user(
    pool: web::Data<PgPool>,
    developer_id: web::Path<i32>,
    identity: RequestIdentity,
) -> Result<impl Responder, AppError> {
    let developer_id = developer_id.into_inner();

    let result = sqlx::query("DELETE FROM developers WHERE id = $1")
        .bind(developer_id)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    log::info!(
        "developer {} deleted by {}",
        developer_id,
        identity.developer_id
    );

    Ok(HttpResponse::NoContent().finish())
}
