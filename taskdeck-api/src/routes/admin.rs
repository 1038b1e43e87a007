/// Admin panel endpoints
///
/// All routes sit behind the admin gate in [`crate::app`]; handlers can
/// assume the caller is an authenticated admin. The self-protection
/// rules (no self-demotion, no self-deletion) are still enforced here
/// through [`taskdeck_shared::auth::policy`].
///
/// # Endpoints
///
/// - `GET    /v1/admin/users` - List users with search/role filters
/// - `GET    /v1/admin/users/:id` - User detail with task counts
/// - `PUT    /v1/admin/users/:id/role` - Change a user's role
/// - `DELETE /v1/admin/users/:id` - Delete a user and their tasks
/// - `GET    /v1/admin/users/:id/tasks` - Tasks owned by one user
/// - `GET    /v1/admin/tasks` - All tasks, paginated
/// - `GET    /v1/admin/stats` - Platform-wide statistics

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    response::{ApiResponse, Pagination},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskdeck_shared::{
    auth::{
        middleware::AuthUser,
        policy::{self, UserChange},
    },
    models::{
        task::{StatusCounts, Task, TaskFilter, TaskPriority, TaskStatus},
        user::{Role, User, UserFilter},
    },
};
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Query-string parameters for the user listing
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    /// Case-insensitive substring match over name or email
    pub search: Option<String>,

    /// Restrict to a single role
    pub role: Option<String>,

    /// Page number (1-based)
    pub page: Option<i64>,

    /// Page size (max 100)
    pub limit: Option<i64>,
}

/// Query-string parameters for the global task listing
#[derive(Debug, Default, Deserialize)]
pub struct AdminTaskListQuery {
    /// Restrict to tasks owned by this user
    pub user_id: Option<Uuid>,

    /// Restrict to a single status
    pub status: Option<TaskStatus>,

    /// Restrict to a single priority
    pub priority: Option<TaskPriority>,

    /// Page number (1-based)
    pub page: Option<i64>,

    /// Page size (max 100)
    pub limit: Option<i64>,
}

/// Role change request body
#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    /// New role, "user" or "admin"
    pub role: String,
}

/// User detail payload with per-status task counts
#[derive(Debug, Serialize)]
pub struct UserDetail {
    /// The user record
    pub user: User,

    /// How many tasks they own, per status
    pub task_counts: StatusCounts,

    /// Total tasks owned
    pub total_tasks: i64,
}

/// Platform-wide statistics
#[derive(Debug, Serialize)]
pub struct PlatformStats {
    /// Total registered users
    pub total_users: i64,

    /// Users holding the admin role
    pub admin_users: i64,

    /// Users registered in the last 7 days
    pub recent_signups: i64,

    /// Total tasks across all users
    pub total_tasks: i64,

    /// Tasks per status, every category present
    pub tasks_by_status: StatusCounts,

    /// Completed tasks as a percentage of all tasks, rounded to two
    /// decimal places; 0 when there are no tasks
    pub completion_rate: f64,
}

fn page_params(page: Option<i64>, limit: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    // Page comes straight from the query string; saturate instead of
    // overflowing on absurd values. A page past the data is just empty.
    let offset = (page - 1).saturating_mul(limit);
    (page, limit, offset)
}

fn parse_role(role: &str) -> Result<Role, ApiError> {
    Role::parse(role).ok_or_else(|| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "role".to_string(),
            message: format!("Invalid role: {}. Must be 'user' or 'admin'", role),
        }])
    })
}

/// Lists users with optional search and role filters, paginated
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Unknown role filter value
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<User>>>> {
    let role = query.role.as_deref().map(parse_role).transpose()?;

    let filter = UserFilter {
        search: query.search,
        role,
    };

    let (page, limit, offset) = page_params(query.page, query.limit);

    let users = User::list(&state.db, &filter, limit, offset).await?;
    let total = User::count(&state.db, &filter).await?;

    Ok(Json(ApiResponse::paginated(
        users,
        Pagination::new(page, limit, total),
    )))
}

/// Gets one user with their per-status task counts
///
/// # Errors
///
/// - `404 Not Found`: No such user
pub async fn user_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<UserDetail>>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let task_counts = Task::status_counts(&state.db, Some(id)).await?;
    let total_tasks = task_counts.total();

    Ok(Json(ApiResponse::ok(UserDetail {
        user,
        task_counts,
        total_tasks,
    })))
}

/// Changes a user's role
///
/// The role string is validated before any guard runs, so an unknown
/// role is always a 422 regardless of the target. Self-demotion is a
/// 403 from the policy.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Unknown role value
/// - `403 Forbidden`: Admin tried to demote themself
/// - `404 Not Found`: No such user
pub async fn change_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeRoleRequest>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let role = parse_role(&req.role)?;

    policy::check_user_change(id, auth.id, UserChange::SetRole(role))?;

    let user = User::set_role(&state.db, id, role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(admin_id = %auth.id, user_id = %id, role = %role, "User role changed");

    Ok(Json(ApiResponse::ok_with_message(
        "User role updated successfully",
        user,
    )))
}

/// Deletes a user together with every task they own
///
/// # Errors
///
/// - `403 Forbidden`: Admin tried to delete themself
/// - `404 Not Found`: No such user
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    policy::check_user_change(id, auth.id, UserChange::Delete)?;

    let deleted = User::delete_with_tasks(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(admin_id = %auth.id, user_id = %id, "User deleted with their tasks");

    Ok(Json(ApiResponse::message(
        "User and associated tasks deleted successfully",
    )))
}

/// Lists the tasks owned by one user
///
/// # Errors
///
/// - `404 Not Found`: No such user
pub async fn tasks_for_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<Task>>>> {
    // Distinguish an unknown user from a user with no tasks
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let filter = TaskFilter {
        owner: Some(user.id),
        ..Default::default()
    };

    let tasks = Task::list(&state.db, &filter).await?;

    Ok(Json(ApiResponse::ok(tasks)))
}

/// Lists all tasks on the platform, paginated, with optional filters
pub async fn list_all_tasks(
    State(state): State<AppState>,
    Query(query): Query<AdminTaskListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<Task>>>> {
    let filter = TaskFilter {
        owner: query.user_id,
        status: query.status,
        priority: query.priority,
    };

    let (page, limit, offset) = page_params(query.page, query.limit);

    let tasks = Task::list_paged(&state.db, &filter, limit, offset).await?;
    let total = Task::count(&state.db, &filter).await?;

    Ok(Json(ApiResponse::paginated(
        tasks,
        Pagination::new(page, limit, total),
    )))
}

/// Platform-wide statistics
pub async fn platform_stats(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<PlatformStats>>> {
    let total_users = User::count_all(&state.db).await?;

    let admin_users = User::count_by_role(&state.db)
        .await?
        .into_iter()
        .find(|(role, _)| *role == Role::Admin)
        .map(|(_, count)| count)
        .unwrap_or(0);

    let recent_signups = User::count_recent(&state.db, 7).await?;

    let tasks_by_status = Task::status_counts(&state.db, None).await?;
    let total_tasks = tasks_by_status.total();

    let completion_rate = completion_rate(tasks_by_status.completed, total_tasks);

    Ok(Json(ApiResponse::ok(PlatformStats {
        total_users,
        admin_users,
        recent_signups,
        total_tasks,
        tasks_by_status,
        completion_rate,
    })))
}

/// Completed tasks as a percentage, rounded to two decimal places
///
/// Zero tasks means a rate of 0, not a division by zero.
fn completion_rate(completed: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }

    let rate = completed as f64 / total as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_rate_rounding() {
        assert_eq!(completion_rate(0, 0), 0.0);
        assert_eq!(completion_rate(1, 2), 50.0);
        assert_eq!(completion_rate(1, 3), 33.33);
        assert_eq!(completion_rate(2, 3), 66.67);
        assert_eq!(completion_rate(7, 7), 100.0);
    }

    #[test]
    fn test_page_params_clamping() {
        assert_eq!(page_params(None, None), (1, 10, 0));
        assert_eq!(page_params(Some(0), Some(0)), (1, 1, 0));
        assert_eq!(page_params(Some(-5), Some(1000)), (1, 100, 0));
        assert_eq!(page_params(Some(3), Some(20)), (3, 20, 40));
    }

    #[test]
    fn test_page_params_huge_page_does_not_overflow() {
        // A well-formed request may carry any i64 page; the offset must
        // saturate rather than panic or wrap negative.
        let (page, limit, offset) = page_params(Some(i64::MAX), Some(100));

        assert_eq!(page, i64::MAX);
        assert_eq!(limit, 100);
        assert_eq!(offset, i64::MAX);

        let (_, _, offset) = page_params(Some(i64::MAX), Some(1));
        assert_eq!(offset, i64::MAX - 1);
    }

    #[test]
    fn test_parse_role_rejects_unknown() {
        assert!(parse_role("user").is_ok());
        assert!(parse_role("admin").is_ok());

        let err = parse_role("superuser").unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }
}
