use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[default]
    Todo,
    /// Task is currently being worked on.
    InProgress,
    /// Task is completed and under review.
    Review,
    /// Task is completed.
    Done,
}

/// Input structure for creating or replacing a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// Must be between 3 and 200 characters.
    #[validate(length(min = 3, max = 200))]
    pub title: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    /// Defaults to `todo`.
    pub status: Option<TaskStatus>,

    /// Defaults to `medium`.
    pub priority: Option<TaskPriority>,

    pub project_id: Option<Uuid>,

    pub assignee_id: Option<i32>,

    pub due_date: Option<DateTime<Utc>>,

    #[validate(range(min = 0.0))]
    pub estimated_hours: Option<f64>,

    #[validate(range(min = 0.0))]
    pub actual_hours: Option<f64>,
}

/// Partial update of a task. Absent fields keep their stored value.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 3, max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    pub project_id: Option<Uuid>,

    pub assignee_id: Option<i32>,

    pub due_date: Option<DateTime<Utc>>,

    #[validate(range(min = 0.0))]
    pub estimated_hours: Option<f64>,

    #[validate(range(min = 0.0))]
    pub actual_hours: Option<f64>,
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    /// Developer who created the task.
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for filtering the task list.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<i32>,
    /// Case-insensitive match against title or description.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TaskStatusUpdate {
    pub status: TaskStatus,
}

impl Task {
    /// Creates a new `Task` from `TaskInput`, owned by `created_by`.
    pub fn new(input: TaskInput, created_by: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            project_id: input.project_id,
            assignee_id: input.assignee_id,
            due_date: input.due_date,
            estimated_hours: input.estimated_hours,
            actual_hours: input.actual_hours,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creator, assignee and admins may change a task.
    pub fn can_be_modified_by(&self, developer_id: i32, is_admin: bool) -> bool {
        is_admin || self.created_by == developer_id || self.assignee_id == Some(developer_id)
    }

    /// Only the creator and admins may delete a task.
    pub fn can_be_deleted_by(&self, developer_id: i32, is_admin: bool) -> bool {
        is_admin || self.created_by == developer_id
    }
}
