pub mod activity;
pub mod developer;
pub mod project;
pub mod task;

use serde::{Deserialize, Serialize};

pub use activity::{Activity, ActivityAction, ActivityQuery, NewActivity};
pub use developer::{Developer, DeveloperStatus, DeveloperUpdate, StatusUpdate};
pub use project::{Project, ProjectInput, ProjectQuery, ProjectStatus, ProjectUpdate};
pub use task::{
    Task, TaskInput, TaskPriority, TaskQuery, TaskStatus, TaskStatusUpdate, TaskUpdate,
};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

/// `limit`/`offset` query parameters shared by the paginated list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    /// Requested page size, defaulting to 50 and capped at 100. Non-positive values fall
    /// back to the default.
    pub fn limit(&self) -> i64 {
        match self.limit {
            Some(limit) if limit > 0 => limit.min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    pub fn offset(&self) -> i64 {
        self.offset.filter(|offset| *offset >= 0).unwrap_or(0)
    }
}

/// A page of results plus the total number of matching rows.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
}
