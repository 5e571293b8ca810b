use axum::{
    extract::{Path, Query, State},
    Json,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    middleware::CurrentUser,
    models::{
        BulkDeleteRequest, BulkStatusRequest, CreateTask, ListParams, SortField, SortOrder, Task,
        TaskPage, TaskStats, TaskStatus, UpdateTask,
    },
};

const DEFAULT_PAGE_SIZE: i64 = 10;

/// Load a task by id and enforce ownership. Missing task and foreign task are
/// distinct failures (404 vs 403).
async fn fetch_owned_task(pool: &SqlitePool, id: i64, owner_id: i64) -> Result<Task, AppError> {
    let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Task not found".to_string()))?;

    if task.owner_id != owner_id {
        return Err(AppError::Forbidden("Not authorized".to_string()));
    }

    Ok(task)
}

fn id_placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Count how many of `ids` exist and belong to `owner_id`. Bulk operations
/// are all-or-nothing: anything less than the full batch aborts the call.
async fn count_owned(pool: &SqlitePool, ids: &[i64], owner_id: i64) -> Result<i64, AppError> {
    let sql = format!(
        "SELECT COUNT(*) FROM tasks WHERE owner_id = ? AND id IN ({})",
        id_placeholders(ids.len())
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(owner_id);
    for id in ids {
        query = query.bind(id);
    }
    Ok(query.fetch_one(pool).await?)
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    params(ListParams),
    responses(
        (status = 200, description = "Paginated task list with aggregate status counts", body = TaskPage),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer" = [])
    )
)]
pub async fn list_tasks(
    State(pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<Json<TaskPage>, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
    let sort_by = params.sort_by.unwrap_or_default();
    let sort_order = params.sort_order.unwrap_or_default();

    // Priority is sorted by severity (low < medium < high), not by the
    // label's lexical order.
    let order_expr = match sort_by {
        SortField::CreatedAt => "created_at",
        SortField::DueDate => "due_date",
        SortField::Priority => {
            "CASE priority WHEN 'low' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END"
        }
    };
    let direction = match sort_order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };

    let sql = format!(
        "SELECT * FROM tasks WHERE owner_id = ? ORDER BY {order_expr} {direction}, id DESC \
         LIMIT ? OFFSET ?"
    );
    let tasks = sqlx::query_as::<_, Task>(&sql)
        .bind(user.id)
        .bind(limit)
        .bind((page - 1) * limit)
        .fetch_all(&pool)
        .await?;

    let stats = sqlx::query_as::<_, TaskStats>(
        "SELECT COUNT(*) AS total, \
            COUNT(*) FILTER (WHERE status = 'completed') AS completed, \
            COUNT(*) FILTER (WHERE status = 'in-progress') AS in_progress, \
            COUNT(*) FILTER (WHERE status = 'pending') AS pending \
         FROM tasks WHERE owner_id = ?",
    )
    .bind(user.id)
    .fetch_one(&pool)
    .await?;

    let total = stats.total;
    let pages = (total + limit - 1) / limit;

    Ok(Json(TaskPage {
        tasks,
        total,
        page,
        pages,
        limit,
        stats,
    }))
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTask,
    responses(
        (status = 200, description = "Task created successfully", body = Task),
        (status = 400, description = "Missing title"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer" = [])
    )
)]
pub async fn create_task(
    State(pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateTask>,
) -> Result<Json<Task>, AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::ValidationError("Title is required".to_string()));
    }

    let id = sqlx::query(
        "INSERT INTO tasks (title, description, status, priority, due_date, owner_id) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.status)
    .bind(payload.priority)
    .bind(payload.due_date)
    .bind(user.id)
    .execute(&pool)
    .await?
    .last_insert_rowid();

    let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
        .bind(id)
        .fetch_one(&pool)
        .await?;

    Ok(Json(task))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task details", body = Task),
        (status = 404, description = "Task not found"),
        (status = 403, description = "Owned by another user"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer" = [])
    )
)]
pub async fn get_task(
    State(pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Task>, AppError> {
    let task = fetch_owned_task(&pool, id, user.id).await?;
    Ok(Json(task))
}

#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    request_body = UpdateTask,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 404, description = "Task not found"),
        (status = 403, description = "Owned by another user"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer" = [])
    )
)]
pub async fn update_task(
    State(pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTask>,
) -> Result<Json<Task>, AppError> {
    let mut task = fetch_owned_task(&pool, id, user.id).await?;

    if let Some(title) = payload.title {
        if title.trim().is_empty() {
            return Err(AppError::ValidationError("Title cannot be empty".to_string()));
        }
        task.title = title;
    }
    if let Some(description) = payload.description {
        task.description = description;
    }
    if let Some(status) = payload.status {
        task.status = status;
    }
    if let Some(priority) = payload.priority {
        task.priority = priority;
    }
    if let Some(due_date) = payload.due_date {
        task.due_date = due_date;
    }

    sqlx::query(
        "UPDATE tasks SET title = ?, description = ?, status = ?, priority = ?, due_date = ? \
         WHERE id = ?",
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status)
    .bind(task.priority)
    .bind(task.due_date)
    .bind(id)
    .execute(&pool)
    .await?;

    Ok(Json(task))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(
        ("id" = i64, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task deleted"),
        (status = 404, description = "Task not found"),
        (status = 403, description = "Owned by another user"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer" = [])
    )
)]
pub async fn delete_task(
    State(pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    fetch_owned_task(&pool, id, user.id).await?;

    sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    Ok(Json(serde_json::json!({ "ok": true })))
}

#[utoipa::path(
    post,
    path = "/api/tasks/bulk-delete",
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "All requested tasks deleted"),
        (status = 400, description = "Empty id list"),
        (status = 403, description = "Batch contains a task owned by another user"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer" = [])
    )
)]
pub async fn bulk_delete(
    State(pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<BulkDeleteRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if payload.ids.is_empty() {
        return Err(AppError::ValidationError(
            "Please provide a list of task ids".to_string(),
        ));
    }

    let owned = count_owned(&pool, &payload.ids, user.id).await?;
    if owned < payload.ids.len() as i64 {
        return Err(AppError::Forbidden(
            "Not authorized to delete some tasks".to_string(),
        ));
    }

    let sql = format!(
        "DELETE FROM tasks WHERE owner_id = ? AND id IN ({})",
        id_placeholders(payload.ids.len())
    );
    let mut query = sqlx::query(&sql).bind(user.id);
    for id in &payload.ids {
        query = query.bind(id);
    }
    query.execute(&pool).await?;

    Ok(Json(serde_json::json!({
        "deleted": payload.ids.len(),
        "ids": payload.ids,
    })))
}

#[utoipa::path(
    put,
    path = "/api/tasks/bulk-status",
    request_body = BulkStatusRequest,
    responses(
        (status = 200, description = "Updated tasks", body = Vec<Task>),
        (status = 400, description = "Empty id list or invalid status"),
        (status = 403, description = "Batch contains a task owned by another user"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer" = [])
    )
)]
pub async fn bulk_status(
    State(pool): State<SqlitePool>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<BulkStatusRequest>,
) -> Result<Json<Vec<Task>>, AppError> {
    if payload.ids.is_empty() {
        return Err(AppError::ValidationError(
            "Please provide a list of task ids".to_string(),
        ));
    }

    let status: TaskStatus = payload
        .status
        .parse()
        .map_err(|_| AppError::ValidationError("Invalid status value".to_string()))?;

    let owned = count_owned(&pool, &payload.ids, user.id).await?;
    if owned < payload.ids.len() as i64 {
        return Err(AppError::Forbidden(
            "Not authorized to update some tasks".to_string(),
        ));
    }

    let sql = format!(
        "UPDATE tasks SET status = ? WHERE owner_id = ? AND id IN ({})",
        id_placeholders(payload.ids.len())
    );
    let mut query = sqlx::query(&sql).bind(status).bind(user.id);
    for id in &payload.ids {
        query = query.bind(id);
    }
    query.execute(&pool).await?;

    let sql = format!(
        "SELECT * FROM tasks WHERE owner_id = ? AND id IN ({})",
        id_placeholders(payload.ids.len())
    );
    let mut query = sqlx::query_as::<_, Task>(&sql).bind(user.id);
    for id in &payload.ids {
        query = query.bind(id);
    }
    let tasks = query.fetch_all(&pool).await?;

    Ok(Json(tasks))
}
