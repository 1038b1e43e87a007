/// Task endpoints
///
/// All routes require authentication. Visibility and mutation rights are
/// decided by [`taskdeck_shared::auth::policy`]: regular users only see
/// and touch their own tasks, admins see everything.
///
/// # Endpoints
///
/// - `POST   /v1/tasks` - Create task (owner stamped from caller)
/// - `GET    /v1/tasks` - List tasks (ownership-scoped)
/// - `GET    /v1/tasks/stats` - Per-status and per-priority counts
/// - `GET    /v1/tasks/:id` - Get one task
/// - `PUT    /v1/tasks/:id` - Update a task
/// - `DELETE /v1/tasks/:id` - Delete a task

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::ApiResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::{middleware::AuthUser, policy},
    models::task::{
        CreateTask, PriorityCounts, StatusCounts, Task, TaskFilter, TaskPriority, TaskStatus,
        UpdateTask,
    },
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Optional description
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    /// Initial status (defaults to pending)
    pub status: Option<TaskStatus>,

    /// Priority (defaults to medium)
    pub priority: Option<TaskPriority>,

    /// Optional assignee
    pub assignee: Option<Uuid>,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,
}

/// Update task request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    /// New description
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New priority
    pub priority: Option<TaskPriority>,

    /// New assignee
    pub assignee: Option<Uuid>,

    /// New due date
    pub due_date: Option<DateTime<Utc>>,
}

/// Query-string filters for the task listing
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    /// Restrict to a single status
    pub status: Option<TaskStatus>,

    /// Restrict to a single priority
    pub priority: Option<TaskPriority>,
}

/// Task statistics payload
#[derive(Debug, Serialize)]
pub struct TaskStats {
    /// Total tasks in scope
    pub total: i64,

    /// Counts per status, every category present
    pub by_status: StatusCounts,

    /// Counts per priority, every category present
    pub by_priority: PriorityCounts,
}

/// Scope for list and stats queries: admins see everything, everyone
/// else only their own tasks.
fn owner_scope(auth: &AuthUser) -> Option<Uuid> {
    if auth.is_admin() {
        None
    } else {
        Some(auth.id)
    }
}

/// Loads a task and checks the caller may access it
///
/// Existence is checked before access, so a task the caller cannot see
/// still distinguishes 404 (no such task) from 403 (not yours).
async fn load_authorized(state: &AppState, auth: &AuthUser, id: Uuid) -> ApiResult<Task> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    policy::check_task_access(task.owner, auth.id, auth.role)?;

    Ok(task)
}

/// Creates a task owned by the caller
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Task>>)> {
    req.validate()?;

    let task = Task::create(
        &state.db,
        CreateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assignee: req.assignee,
            due_date: req.due_date,
        },
        auth.id,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            "Task created successfully",
            task,
        )),
    ))
}

/// Lists tasks visible to the caller, newest first
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<TaskListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Task>>>> {
    let filter = TaskFilter {
        owner: owner_scope(&auth),
        status: query.status,
        priority: query.priority,
    };

    let tasks = Task::list(&state.db, &filter).await?;

    Ok(Json(ApiResponse::ok(tasks)))
}

/// Task statistics for the caller's scope
///
/// Every status and priority category is present in the response, with
/// zero for empty ones.
pub async fn task_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Json<ApiResponse<TaskStats>>> {
    let owner = owner_scope(&auth);

    let by_status = Task::status_counts(&state.db, owner).await?;
    let by_priority = Task::priority_counts(&state.db, owner).await?;

    Ok(Json(ApiResponse::ok(TaskStats {
        total: by_status.total(),
        by_status,
        by_priority,
    })))
}

/// Gets a single task
///
/// # Errors
///
/// - `404 Not Found`: No such task
/// - `403 Forbidden`: Task belongs to another user
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    let task = load_authorized(&state, &auth, id).await?;

    Ok(Json(ApiResponse::ok(task)))
}

/// Updates a task
///
/// The owner column is never writable; ownership is fixed at creation.
///
/// # Errors
///
/// - `404 Not Found`: No such task
/// - `403 Forbidden`: Task belongs to another user
/// - `422 Unprocessable Entity`: Validation failed
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<ApiResponse<Task>>> {
    req.validate()?;

    load_authorized(&state, &auth, id).await?;

    let task = Task::update(
        &state.db,
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assignee: req.assignee,
            due_date: req.due_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(ApiResponse::ok_with_message(
        "Task updated successfully",
        task,
    )))
}

/// Deletes a task
///
/// # Errors
///
/// - `404 Not Found`: No such task
/// - `403 Forbidden`: Task belongs to another user
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    load_authorized(&state, &auth, id).await?;

    let deleted = Task::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(Json(ApiResponse::message("Task deleted successfully")))
}
