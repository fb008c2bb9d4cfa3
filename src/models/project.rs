use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Lifecycle state of a project.
/// Corresponds to the `project_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Archived,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_by: i32,
    /// Number of tasks in the project; computed by the list and get queries.
    #[sqlx(default)]
    pub task_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a project.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_date_range", skip_on_field_errors = false))]
pub struct ProjectInput {
    #[validate(length(min = 3, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Defaults to `active`.
    pub status: Option<ProjectStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Partial update of a project. Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_update_date_range", skip_on_field_errors = false))]
pub struct ProjectUpdate {
    #[validate(length(min = 3, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Query parameters for the project list.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectQuery {
    pub status: Option<ProjectStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn check_date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(ValidationError::new("end_before_start")),
        _ => Ok(()),
    }
}

fn validate_date_range(input: &ProjectInput) -> Result<(), ValidationError> {
    check_date_range(input.start_date, input.end_date)
}

fn validate_update_date_range(update: &ProjectUpdate) -> Result<(), ValidationError> {
    check_date_range(update.start_date, update.end_date)
}

impl Project {
    /// Whether applying `update` keeps `start_date <= end_date`, counting stored dates
    /// for the fields the update leaves out.
    pub fn accepts_dates_of(&self, update: &ProjectUpdate) -> bool {
        check_date_range(
            update.start_date.or(self.start_date),
            update.end_date.or(self.end_date),
        )
        .is_ok()
    }
}
