use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Kinds of entries written to the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    TaskCreated,
    TaskUpdated,
    TaskCompleted,
    TaskDeleted,
    ProjectCreated,
    ProjectUpdated,
    ProjectDeleted,
    UserLoggedIn,
    UserLoggedOut,
}

impl ActivityAction {
    /// Value stored in the `action` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::TaskCreated => "task_created",
            ActivityAction::TaskUpdated => "task_updated",
            ActivityAction::TaskCompleted => "task_completed",
            ActivityAction::TaskDeleted => "task_deleted",
            ActivityAction::ProjectCreated => "project_created",
            ActivityAction::ProjectUpdated => "project_updated",
            ActivityAction::ProjectDeleted => "project_deleted",
            ActivityAction::UserLoggedIn => "user_logged_in",
            ActivityAction::UserLoggedOut => "user_logged_out",
        }
    }
}

/// An activity log entry, joined with the acting developer's name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: i64,
    pub developer_id: Option<i32>,
    pub developer_name: Option<String>,
    pub task_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub action: String,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// An entry about to be recorded.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub developer_id: i32,
    pub action: ActivityAction,
    pub task_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub description: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl NewActivity {
    pub fn new(developer_id: i32, action: ActivityAction) -> Self {
        Self {
            developer_id,
            action,
            task_id: None,
            project_id: None,
            description: None,
            metadata: None,
        }
    }

    pub fn task(mut self, task_id: Uuid) -> Self {
        self.task_id = Some(task_id);
        self
    }

    pub fn project(mut self, project_id: Uuid) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Filters and pagination for the activity list.
#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    pub developer_id: Option<i32>,
    pub task_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
