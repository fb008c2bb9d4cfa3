use crate::{
    error::AppError,
    models::{Activity, ActivityQuery, ListResponse, NewActivity, Pagination},
};
use actix_web::{get, web, HttpResponse, Responder};
use sqlx::PgPool;

/// Writes an entry to the activity log.
///
/// Logging is best-effort: a failure is reported at `warn` and never fails the request
/// that triggered it.
pub async fn record(pool: &PgPool, entry: NewActivity) {
    let result = sqlx::query(
        "INSERT INTO activities (developer_id, task_id, project_id, action, description, metadata)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(entry.developer_id)
    .bind(entry.task_id)
    .bind(entry.project_id)
    .bind(entry.action.as_str())
    .bind(&entry.description)
    .bind(&entry.metadata)
    .execute(pool)
    .await;

    if let Err(e) = result {
        log::warn!(
            "failed to record activity {} for developer {}: {}",
            entry.action.as_str(),
            entry.developer_id,
            e
        );
    }
}

/// Lists activity log entries, newest first.
///
/// ## Query Parameters:
/// - `developer_id` (optional): only entries by this developer.
/// - `task_id` (optional): only entries about this task.
/// - `limit` / `offset` (optional): pagination, default 50 / 0.
///
/// ## Responses:
/// - `200 OK`: `{ "data": [Activity], "total": n }`.
/// - `401 Unauthorized`: missing, invalid or expired token.
#[get("/activity")]
pub async fn list_activity(
    pool: web::Data<PgPool>,
    query: web::Query<ActivityQuery>,
) -> Result<impl Responder, AppError> {
    let pagination = Pagination {
        limit: query.limit,
        offset: query.offset,
    };

    let mut conditions: Vec<String> = Vec::new();
    let mut param_count = 1;
    if query.developer_id.is_some() {
        conditions.push(format!("a.developer_id = ${}", param_count));
        param_count += 1;
    }
    if query.task_id.is_some() {
        conditions.push(format!("a.task_id = ${}", param_count));
        param_count += 1;
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM activities a{}", where_clause);
    let list_sql = format!(
        "SELECT a.id, a.developer_id, d.name AS developer_name, a.task_id, a.project_id, \
         a.action, a.description, a.metadata, a.created_at \
         FROM activities a LEFT JOIN developers d ON d.id = a.developer_id{} \
         ORDER BY a.created_at DESC, a.id DESC LIMIT ${} OFFSET ${}",
        where_clause,
        param_count,
        param_count + 1
    );

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    let mut list_query = sqlx::query_as::<_, Activity>(&list_sql);

    if let Some(developer_id) = query.developer_id {
        count_query = count_query.bind(developer_id);
        list_query = list_query.bind(developer_id);
    }
    if let Some(task_id) = query.task_id {
        count_query = count_query.bind(task_id);
        list_query = list_query.bind(task_id);
    }

    let total = count_query.fetch_one(&**pool).await?;
    let data = list_query
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&**pool)
        .await?;

    Ok(HttpResponse::Ok().json(ListResponse { data, total }))
}
