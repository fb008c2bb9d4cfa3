use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;

/// Presence status of a developer.
/// Corresponds to the `developer_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "developer_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeveloperStatus {
    /// Account exists, not currently signed in.
    Active,
    /// Signed in.
    Online,
    /// Busy; set by the developer.
    Busy,
    /// Signed out.
    Inactive,
}

/// A developer account as stored in the `developers` table.
///
/// This is also the credential store record: login looks developers up by email and
/// tokens carry their id and role.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Developer {
    pub id: i32,
    pub name: String,
    pub email: String,
    /// bcrypt hash; never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: String,
    pub avatar_url: Option<String>,
    pub status: DeveloperStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a developer profile. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct DeveloperUpdate {
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
    pub status: Option<DeveloperStatus>,
    /// Only honored when the caller is an admin.
    #[validate(length(min = 1, max = 50))]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: DeveloperStatus,
}

pub(crate) const DEVELOPER_COLUMNS: &str =
    "id, name, email, password_hash, role, avatar_url, status, created_at, updated_at";

impl Developer {
    pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Developer>, sqlx::Error> {
        sqlx::query_as::<_, Developer>(&format!(
            "SELECT {} FROM developers WHERE id = $1",
            DEVELOPER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Emails are stored lowercased, so lookups are case-insensitive.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Developer>, sqlx::Error> {
        sqlx::query_as::<_, Developer>(&format!(
            "SELECT {} FROM developers WHERE email = $1",
            DEVELOPER_COLUMNS
        ))
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await
    }

    /// Returns `false` when no developer has this id.
    pub async fn set_status(
        pool: &PgPool,
        id: i32,
        status: DeveloperStatus,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE developers SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
