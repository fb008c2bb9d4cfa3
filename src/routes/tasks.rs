use crate::{
    auth::RequestIdentity,
    error::AppError,
    models::{
        ActivityAction, ListResponse, NewActivity, Pagination, Task, TaskInput, TaskQuery,
        TaskStatus, TaskStatusUpdate, TaskUpdate,
    },
    routes::activity,
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const TASK_COLUMNS: &str = "id, title, description, status, priority, project_id, assignee_id, \
     due_date, estimated_hours, actual_hours, created_by, created_at, updated_at";

async fn fetch_task(pool: &PgPool, task_id: Uuid) -> Result<Task, AppError> {
    sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS))
        .bind(task_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))
}

/// Picks the activity entry for a status change.
fn status_change_action(previous: TaskStatus, current: TaskStatus) -> ActivityAction {
    if current == TaskStatus::Done && previous != TaskStatus::Done {
        ActivityAction::TaskCompleted
    } else {
        ActivityAction::TaskUpdated
    }
}

/// Retrieves a page of tasks.
///
/// Supports filtering by `status`, `priority`, `project_id`, `assignee_id`, and a
/// `search` term matched against titles and descriptions.
/// Tasks are ordered by creation date in descending order.
///
/// ## Query Parameters:
/// - `status` (optional): e.g. "todo", "in_progress", "review", "done".
/// - `priority` (optional): e.g. "low", "medium", "high", "urgent".
/// - `project_id` (optional): only tasks in this project.
/// - `assignee_id` (optional): only tasks assigned to this developer.
/// - `search` (optional): case-insensitive substring of title or description.
/// - `limit` / `offset` (optional): pagination, default 50 / 0, `limit` at most 100.
///
/// ## Responses:
/// - `200 OK`: `{ "data": [Task], "total": n }`, `total` counting every match.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
#[get("")]
pub async fn get_tasks(
    pool: web::Data<PgPool>,
    query_params: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let pagination = Pagination {
        limit: query_params.limit,
        offset: query_params.offset,
    };

    let mut param_count = 1;
    let mut conditions: Vec<String> = Vec::new();

    if query_params.status.is_some() {
        conditions.push(format!("status = ${}", param_count));
        param_count += 1;
    }
    if query_params.priority.is_some() {
        conditions.push(format!("priority = ${}", param_count));
        param_count += 1;
    }
    if query_params.project_id.is_some() {
        conditions.push(format!("project_id = ${}", param_count));
        param_count += 1;
    }
    if query_params.assignee_id.is_some() {
        conditions.push(format!("assignee_id = ${}", param_count));
        param_count += 1;
    }
    if query_params.search.is_some() {
        // One bind, referenced twice.
        conditions.push(format!(
            "(title ILIKE ${0} OR description ILIKE ${0})",
            param_count
        ));
        param_count += 1;
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM tasks{}", where_clause);
    let list_sql = format!(
        "SELECT {} FROM tasks{} ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
        TASK_COLUMNS,
        where_clause,
        param_count,
        param_count + 1
    );

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    let mut list_query = sqlx::query_as::<_, Task>(&list_sql);

    if let Some(status) = query_params.status {
        count_query = count_query.bind(status);
        list_query = list_query.bind(status);
    }
    if let Some(priority) = query_params.priority {
        count_query = count_query.bind(priority);
        list_query = list_query.bind(priority);
    }
    if let Some(project_id) = query_params.project_id {
        count_query = count_query.bind(project_id);
        list_query = list_query.bind(project_id);
    }
    if let Some(assignee_id) = query_params.assignee_id {
        count_query = count_query.bind(assignee_id);
        list_query = list_query.bind(assignee_id);
    }
    if let Some(search) = &query_params.search {
        let search_pattern = format!("%{}%", search);
        count_query = count_query.bind(search_pattern.clone());
        list_query = list_query.bind(search_pattern);
    }

    let total = count_query.fetch_one(&**pool).await?;
    let data = list_query
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(ListResponse { data, total }))
}

/// Creates a new task owned by the authenticated developer.
///
/// ## Request Body:
/// A JSON object matching `TaskInput`:
/// - `title`: 3 to 200 characters (required).
/// - `description` (optional): at most 1000 characters.
/// - `status` / `priority` (optional): default "todo" / "medium".
/// - `project_id`, `assignee_id`, `due_date`, `estimated_hours`, `actual_hours` (optional).
///
/// ## Responses:
/// - `201 Created`: Returns the newly created `Task` object as JSON.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `422 Unprocessable Entity`: If input validation on `TaskInput` fails.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    task_data: web::Json<TaskInput>,
    identity: RequestIdentity,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let developer_id = identity.numeric_id()?;
    let task = Task::new(task_data.into_inner(), developer_id);

    let result = sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (id, title, description, status, priority, project_id, assignee_id,
                            due_date, estimated_hours, actual_hours, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(task.id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status)
    .bind(task.priority)
    .bind(task.project_id)
    .bind(task.assignee_id)
    .bind(task.due_date)
    .bind(task.estimated_hours)
    .bind(task.actual_hours)
    .bind(task.created_by)
    .fetch_one(&**pool)
    .await?;

    activity::record(
        &pool,
        NewActivity::new(developer_id, ActivityAction::TaskCreated)
            .task(result.id)
            .description(format!("Created task \"{}\"", result.title)),
    )
    .await;

    Ok(HttpResponse::Created().json(result))
}

/// Retrieves a specific task by its ID.
///
/// ## Responses:
/// - `200 OK`: Returns the `Task` object as JSON.
/// - `404 Not Found`: If no task has the given ID.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = fetch_task(&pool, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Updates a task. Fields left out of the body keep their stored value.
///
/// The creator, the assignee, and admins may update a task.
///
/// ## Responses:
/// - `200 OK`: Returns the updated `Task` object as JSON.
/// - `403 Forbidden`: The caller may not modify this task.
/// - `404 Not Found`: If no task has the given ID.
/// - `422 Unprocessable Entity`: If input validation on `TaskUpdate` fails.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<TaskUpdate>,
    identity: RequestIdentity,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    let developer_id = identity.numeric_id()?;

    let existing = fetch_task(&pool, task_id.into_inner()).await?;
    if !existing.can_be_modified_by(developer_id, identity.is_admin()) {
        return Err(AppError::Forbidden(
            "You do not have permission to modify this task".into(),
        ));
    }

    let update = task_data.into_inner();

    let result = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks
         SET title = COALESCE($2, title),
             description = COALESCE($3, description),
             status = COALESCE($4, status),
             priority = COALESCE($5, priority),
             project_id = COALESCE($6, project_id),
             assignee_id = COALESCE($7, assignee_id),
             due_date = COALESCE($8, due_date),
             estimated_hours = COALESCE($9, estimated_hours),
             actual_hours = COALESCE($10, actual_hours),
             updated_at = NOW()
         WHERE id = $1
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(existing.id)
    .bind(&update.title)
    .bind(&update.description)
    .bind(update.status)
    .bind(update.priority)
    .bind(update.project_id)
    .bind(update.assignee_id)
    .bind(update.due_date)
    .bind(update.estimated_hours)
    .bind(update.actual_hours)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    activity::record(
        &pool,
        NewActivity::new(developer_id, status_change_action(existing.status, result.status))
            .task(result.id),
    )
    .await;

    Ok(HttpResponse::Ok().json(result))
}

/// Moves a task to a new status.
///
/// Same permissions as a full update.
#[patch("/{id}/status")]
pub async fn update_task_status(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    body: web::Json<TaskStatusUpdate>,
    identity: RequestIdentity,
) -> Result<impl Responder, AppError> {
    let developer_id = identity.numeric_id()?;

    let existing = fetch_task(&pool, task_id.into_inner()).await?;
    if !existing.can_be_modified_by(developer_id, identity.is_admin()) {
        return Err(AppError::Forbidden(
            "You do not have permission to modify this task".into(),
        ));
    }

    let result = sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(existing.id)
    .bind(body.status)
    .fetch_optional(&**pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    activity::record(
        &pool,
        NewActivity::new(developer_id, status_change_action(existing.status, result.status))
            .task(result.id)
            .metadata(json!({ "from": existing.status, "to": result.status })),
    )
    .await;

    Ok(HttpResponse::Ok().json(result))
}

/// Deletes a task by its ID.
///
/// Only the creator and admins may delete a task.
///
/// ## Responses:
/// - `204 No Content`: On successful deletion.
/// - `403 Forbidden`: The caller may not delete this task.
/// - `404 Not Found`: If no task has the given ID.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    identity: RequestIdentity,
) -> Result<impl Responder, AppError> {
    let developer_id = identity.numeric_id()?;

    let existing = fetch_task(&pool, task_id.into_inner()).await?;
    if !existing.can_be_deleted_by(developer_id, identity.is_admin()) {
        return Err(AppError::Forbidden(
            "You do not have permission to delete this task".into(),
        ));
    }

    let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(existing.id)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Task not found".into()));
    }

    activity::record(
        &pool,
        NewActivity::new(developer_id, ActivityAction::TaskDeleted)
            .task(existing.id)
            .description(format!("Deleted task \"{}\"", existing.title)),
    )
    .await;

    Ok(HttpResponse::NoContent().finish())
}
