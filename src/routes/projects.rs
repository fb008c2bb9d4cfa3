use crate::{
    auth::{RequestIdentity, RequireRole},
    error::AppError,
    models::{
        ActivityAction, ListResponse, NewActivity, Pagination, Project, ProjectInput,
        ProjectQuery, ProjectUpdate,
    },
    routes::activity,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const PROJECT_COLUMNS: &str = "p.id, p.name, p.description, p.status, p.start_date, p.end_date, \
     p.created_by, p.created_at, p.updated_at, \
     (SELECT COUNT(*) FROM tasks t WHERE t.project_id = p.id) AS task_count";

async fn fetch_project(pool: &PgPool, project_id: Uuid) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(&format!(
        "SELECT {} FROM projects p WHERE p.id = $1",
        PROJECT_COLUMNS
    ))
    .bind(project_id)
    .fetch_optional(pool)
    .await
}

/// Lists projects, most recent first, each with its task count.
///
/// ## Query Parameters:
/// - `status` (optional): "active", "archived" or "completed".
/// - `limit` / `offset` (optional): pagination, default 50 / 0.
#[get("")]
pub async fn list_projects(
    pool: web::Data<PgPool>,
    query: web::Query<ProjectQuery>,
) -> Result<impl Responder, AppError> {
    let pagination = Pagination {
        limit: query.limit,
        offset: query.offset,
    };

    let (where_clause, param_count) = match query.status {
        Some(_) => (" WHERE p.status = $1", 2),
        None => ("", 1),
    };

    let count_sql = format!("SELECT COUNT(*) FROM projects p{}", where_clause);
    let list_sql = format!(
        "SELECT {} FROM projects p{} ORDER BY p.created_at DESC LIMIT ${} OFFSET ${}",
        PROJECT_COLUMNS,
        where_clause,
        param_count,
        param_count + 1
    );

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    let mut list_query = sqlx::query_as::<_, Project>(&list_sql);

    if let Some(status) = query.status {
        count_query = count_query.bind(status);
        list_query = list_query.bind(status);
    }

    let total = count_query.fetch_one(&**pool).await?;
    let data = list_query
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(ListResponse { data, total }))
}

/// Creates a project owned by the caller.
///
/// ## Responses:
/// - `201 Created`: the new `Project`.
/// - `422 Unprocessable Entity`: validation failed, including an end date before the
///   start date.
#[post("")]
pub async fn create_project(
    pool: web::Data<PgPool>,
    project_data: web::Json<ProjectInput>,
    identity: RequestIdentity,
) -> Result<impl Responder, AppError> {
    project_data.validate()?;
    let developer_id = identity.numeric_id()?;
    let input = project_data.into_inner();

    let project = sqlx::query_as::<_, Project>(
        "INSERT INTO projects (id, name, description, status, start_date, end_date, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id, name, description, status, start_date, end_date, created_by, created_at, updated_at",
    )
    .bind(Uuid::new_v4())
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.status.unwrap_or_default())
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(developer_id)
    .fetch_one(&**pool)
    .await?;

    activity::record(
        &pool,
        NewActivity::new(developer_id, ActivityAction::ProjectCreated)
            .project(project.id)
            .description(format!("Created project \"{}\"", project.name)),
    )
    .await;

    Ok(HttpResponse::Created().json(project))
}

#[get("/{id}")]
pub async fn get_project(
    pool: web::Data<PgPool>,
    project_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let project = fetch_project(&pool, project_id.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))?;

    Ok(HttpResponse::Ok().json(project))
}

/// Updates a project. Fields left out of the body keep their stored value.
///
/// ## Responses:
/// - `200 OK`: the updated `Project`.
/// - `404 Not Found`: no project with this id.
/// - `422 Unprocessable Entity`: validation failed, including an end date that would fall
///   before the start date once merged with the stored dates.
#[put("/{id}")]
pub async fn update_project(
    pool: web::Data<PgPool>,
    project_id: web::Path<Uuid>,
    project_data: web::Json<ProjectUpdate>,
    identity: RequestIdentity,
) -> Result<impl Responder, AppError> {
    project_data.validate()?;
    let developer_id = identity.numeric_id()?;

    let existing = fetch_project(&pool, project_id.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))?;
    if !existing.accepts_dates_of(&project_data) {
        return Err(AppError::ValidationError(
            "end_date must not be before start_date".into(),
        ));
    }

    let result = sqlx::query(
        "UPDATE projects
         SET name = COALESCE($2, name),
             description = COALESCE($3, description),
             status = COALESCE($4, status),
             start_date = COALESCE($5, start_date),
             end_date = COALESCE($6, end_date),
             updated_at = NOW()
         WHERE id = $1",
    )
    .bind(existing.id)
    .bind(&project_data.name)
    .bind(&project_data.description)
    .bind(project_data.status)
    .bind(project_data.start_date)
    .bind(project_data.end_date)
    .execute(&**pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Project not found".into()));
    }

    let project = fetch_project(&pool, existing.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))?;

    activity::record(
        &pool,
        NewActivity::new(developer_id, ActivityAction::ProjectUpdated)
            .project(project.id)
            .metadata(json!({ "status": project.status })),
    )
    .await;

    Ok(HttpResponse::Ok().json(project))
}

/// Deletes a project. Tasks in it are kept and lose their project.
///
/// Requires the `manager` role; admins pass as well.
#[delete("/{id}", wrap = "RequireRole::new(\"manager\")")]
pub async fn delete_project(
    pool: web::Data<PgPool>,
    project_id: web::Path<Uuid>,
    identity: RequestIdentity,
) -> Result<impl Responder, AppError> {
    let developer_id = identity.numeric_id()?;
    let project_id = project_id.into_inner();

    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(project_id)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Project not found".into()));
    }

    activity::record(
        &pool,
        NewActivity::new(developer_id, ActivityAction::ProjectDeleted).project(project_id),
    )
    .await;

    Ok(HttpResponse::NoContent().finish())
}
