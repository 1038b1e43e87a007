/// Task model and database operations
///
/// This module provides the Task model, the core entity of taskdeck.
/// Every task is stamped with an immutable owner at creation; visibility
/// and mutation rights are decided by [`crate::auth::policy`], never here.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'completed', 'cancelled');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high', 'urgent');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'pending',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     owner UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     assignee UUID REFERENCES users(id) ON DELETE SET NULL,
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskdeck_shared::models::task::{CreateTask, Task, TaskPriority};
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, CreateTask {
///     title: "Buy milk".to_string(),
///     description: None,
///     status: None,
///     priority: Some(TaskPriority::Low),
///     assignee: None,
///     due_date: None,
/// }, owner).await?;
///
/// assert_eq!(task.owner, owner);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task completion status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet
    Pending,

    /// Currently being worked on
    InProgress,

    /// Finished
    Completed,

    /// Abandoned without completion
    Cancelled,
}

impl TaskStatus {
    /// All status values, in display order
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    /// Gets status as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

/// Task priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    /// All priority values, lowest first
    pub const ALL: [TaskPriority; 4] = [
        TaskPriority::Low,
        TaskPriority::Medium,
        TaskPriority::High,
        TaskPriority::Urgent,
    ];

    /// Gets priority as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Short title
    pub title: String,

    /// Optional longer description
    pub description: Option<String>,

    /// Completion status
    pub status: TaskStatus,

    /// Priority level
    pub priority: TaskPriority,

    /// Owning user, set once at creation and never reassigned
    pub owner: Uuid,

    /// Optional user the task is assigned to
    pub assignee: Option<Uuid>,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
///
/// Deliberately carries no owner field: the owner is always stamped from
/// the authenticated caller, never from request input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Task title
    pub title: String,

    /// Optional description
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

/// Input for updating a task
///
/// All fields optional; only provided fields are written. There is no
/// owner field here, so ownership can never be patched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    /// New title
    pub title: Option<String>,

    /// New description
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

/// Filters for task listings
///
/// `owner` is set by the service layer from the caller's identity (None
/// for admins, who see everything); status/priority come from the query
/// string and are ANDed in.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Restrict to tasks owned by this user
    pub owner: Option<Uuid>,

    /// Restrict to a single status
    pub status: Option<TaskStatus>,

    /// Restrict to a single priority
    pub priority: Option<TaskPriority>,
}

/// Per-status task counts, every category always present
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
}

impl StatusCounts {
    /// Folds `GROUP BY status` rows into a dense count struct
    ///
    /// Categories absent from the rows stay at zero.
    pub fn from_rows(rows: &[(TaskStatus, i64)]) -> Self {
        let mut counts = Self::default();
        for (status, count) in rows {
            match status {
                TaskStatus::Pending => counts.pending = *count,
                TaskStatus::InProgress => counts.in_progress = *count,
                TaskStatus::Completed => counts.completed = *count,
                TaskStatus::Cancelled => counts.cancelled = *count,
            }
        }
        counts
    }

    /// Total across all statuses
    pub fn total(&self) -> i64 {
        self.pending + self.in_progress + self.completed + self.cancelled
    }
}

/// Per-priority task counts, every category always present
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
    pub urgent: i64,
}

impl PriorityCounts {
    /// Folds `GROUP BY priority` rows into a dense count struct
    pub fn from_rows(rows: &[(TaskPriority, i64)]) -> Self {
        let mut counts = Self::default();
        for (priority, count) in rows {
            match priority {
                TaskPriority::Low => counts.low = *count,
                TaskPriority::Medium => counts.medium = *count,
                TaskPriority::High => counts.high = *count,
                TaskPriority::Urgent => counts.urgent = *count,
            }
        }
        counts
    }
}

const TASK_COLUMNS: &str = "id, title, description, status, priority, owner, assignee, \
                            due_date, created_at, updated_at";

impl Task {
    /// Creates a new task owned by `owner`
    ///
    /// The owner comes from the authenticated caller; any owner value in
    /// the request body is structurally impossible since [`CreateTask`]
    /// has no such field.
    pub async fn create(pool: &PgPool, data: CreateTask, owner: Uuid) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, status, priority, owner, assignee, due_date)
            VALUES ($1, $2, COALESCE($3, 'pending'::task_status),
                    COALESCE($4, 'medium'::task_priority), $5, $6, $7)
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(owner)
        .bind(data.assignee)
        .bind(data.due_date)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Updates a task with the provided patch fields
    ///
    /// Only non-None fields are written; `updated_at` is bumped. The owner
    /// column is never touched by this statement.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                assignee = COALESCE($6, assignee),
                due_date = COALESCE($7, due_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.assignee)
        .bind(data.due_date)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists tasks matching the filter, newest first
    pub async fn list(pool: &PgPool, filter: &TaskFilter) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE ($1::uuid IS NULL OR owner = $1)
              AND ($2::task_status IS NULL OR status = $2)
              AND ($3::task_priority IS NULL OR priority = $3)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(filter.owner)
        .bind(filter.status)
        .bind(filter.priority)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks matching the filter with pagination, newest first
    pub async fn list_paged(
        pool: &PgPool,
        filter: &TaskFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE ($1::uuid IS NULL OR owner = $1)
              AND ($2::task_status IS NULL OR status = $2)
              AND ($3::task_priority IS NULL OR priority = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        ))
        .bind(filter.owner)
        .bind(filter.status)
        .bind(filter.priority)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Counts tasks matching the filter
    pub async fn count(pool: &PgPool, filter: &TaskFilter) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM tasks
            WHERE ($1::uuid IS NULL OR owner = $1)
              AND ($2::task_status IS NULL OR status = $2)
              AND ($3::task_priority IS NULL OR priority = $3)
            "#,
        )
        .bind(filter.owner)
        .bind(filter.status)
        .bind(filter.priority)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Counts all tasks
    pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Counts tasks grouped by status, scoped to `owner` when given
    ///
    /// Categories with no tasks report zero, never null.
    pub async fn status_counts(
        pool: &PgPool,
        owner: Option<Uuid>,
    ) -> Result<StatusCounts, sqlx::Error> {
        let rows: Vec<(TaskStatus, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*)
            FROM tasks
            WHERE ($1::uuid IS NULL OR owner = $1)
            GROUP BY status
            "#,
        )
        .bind(owner)
        .fetch_all(pool)
        .await?;

        Ok(StatusCounts::from_rows(&rows))
    }

    /// Counts tasks grouped by priority, scoped to `owner` when given
    pub async fn priority_counts(
        pool: &PgPool,
        owner: Option<Uuid>,
    ) -> Result<PriorityCounts, sqlx::Error> {
        let rows: Vec<(TaskPriority, i64)> = sqlx::query_as(
            r#"
            SELECT priority, COUNT(*)
            FROM tasks
            WHERE ($1::uuid IS NULL OR owner = $1)
            GROUP BY priority
            "#,
        )
        .bind(owner)
        .fetch_all(pool)
        .await?;

        Ok(PriorityCounts::from_rows(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
        assert_eq!(TaskStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_priority_as_str() {
        assert_eq!(TaskPriority::Low.as_str(), "low");
        assert_eq!(TaskPriority::Urgent.as_str(), "urgent");
    }

    #[test]
    fn test_status_serde_round_trip() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");

        let status: TaskStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, TaskStatus::Cancelled);

        assert!(serde_json::from_str::<TaskStatus>("\"done\"").is_err());
    }

    #[test]
    fn test_status_counts_from_rows() {
        let rows = vec![(TaskStatus::Pending, 3), (TaskStatus::Completed, 2)];
        let counts = StatusCounts::from_rows(&rows);

        assert_eq!(counts.pending, 3);
        assert_eq!(counts.completed, 2);
        // Absent categories report zero, never null
        assert_eq!(counts.in_progress, 0);
        assert_eq!(counts.cancelled, 0);
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn test_status_counts_empty() {
        let counts = StatusCounts::from_rows(&[]);
        assert_eq!(counts, StatusCounts::default());
        assert_eq!(counts.total(), 0);
    }

    #[test]
    fn test_priority_counts_from_rows() {
        let rows = vec![
            (TaskPriority::Low, 1),
            (TaskPriority::High, 4),
            (TaskPriority::Urgent, 2),
        ];
        let counts = PriorityCounts::from_rows(&rows);

        assert_eq!(counts.low, 1);
        assert_eq!(counts.medium, 0);
        assert_eq!(counts.high, 4);
        assert_eq!(counts.urgent, 2);
    }

    #[test]
    fn test_create_task_has_no_owner_field() {
        // Owner must come from the authenticated caller, so a body that
        // tries to smuggle one in simply deserializes without it.
        let json = r#"{"title": "Buy milk", "owner": "11111111-1111-1111-1111-111111111111"}"#;
        let create: CreateTask = serde_json::from_str(json).unwrap();
        assert_eq!(create.title, "Buy milk");
    }

    #[test]
    fn test_update_task_default() {
        let update = UpdateTask::default();
        assert!(update.title.is_none());
        assert!(update.status.is_none());
        assert!(update.priority.is_none());
    }
}
