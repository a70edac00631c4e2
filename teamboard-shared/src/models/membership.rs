/// Membership model and database operations
///
/// A membership is the `(project, user, role)` triple that every authorization
/// decision is based on. The owner membership is created together with the
/// project and is the only row with role `owner`.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE member_role AS ENUM ('owner', 'manager', 'developer', 'viewer');
///
/// CREATE TABLE memberships (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     username VARCHAR(255) NOT NULL,
///     role member_role NOT NULL DEFAULT 'developer',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, username)
/// );
/// ```
///
/// # Roles
///
/// - **owner**: Everything, including team management and project deletion
/// - **manager**: Edit project, manage all tasks, view analytics
/// - **developer**: Create tasks, edit and move own tasks
/// - **viewer**: Read-only access

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::CoreError;

/// Project roles (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Project creator, exactly one per project
    Owner,

    /// Manages tasks and project details
    Manager,

    /// Works on tasks
    Developer,

    /// Read-only access
    Viewer,
}

impl Role {
    /// All roles, most privileged first
    pub const ALL: [Role; 4] = [Role::Owner, Role::Manager, Role::Developer, Role::Viewer];

    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Manager => "manager",
            Role::Developer => "developer",
            Role::Viewer => "viewer",
        }
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, Role::Owner)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    /// Parses a role name, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "manager" => Ok(Role::Manager),
            "developer" => Ok(Role::Developer),
            "viewer" => Ok(Role::Viewer),
            _ => Err(CoreError::InvalidRole(s.to_string())),
        }
    }
}

/// Membership model representing a user's role in a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    /// Project ID
    pub project_id: Uuid,

    /// Member username
    pub username: String,

    /// Role within the project
    pub role: Role,

    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    /// Project ID
    pub project_id: Uuid,

    /// Username to add
    pub username: String,

    /// Role to assign (defaults to Developer)
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Developer
}

impl Membership {
    /// Creates a new membership (adds user to project)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Membership already exists (primary key violation)
    /// - Project doesn't exist (foreign key violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateMembership) -> Result<Self, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (project_id, username, role)
            VALUES ($1, $2, $3)
            RETURNING project_id, username, role, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.username)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(membership)
    }

    /// Finds a specific membership by project and username
    pub async fn find(
        pool: &PgPool,
        project_id: Uuid,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT project_id, username, role, created_at
            FROM memberships
            WHERE project_id = $1 AND username = $2
            "#,
        )
        .bind(project_id)
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Updates a member's role
    ///
    /// Returns `None` if the membership doesn't exist.
    pub async fn update_role(
        pool: &PgPool,
        project_id: Uuid,
        username: &str,
        role: Role,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships
            SET role = $3
            WHERE project_id = $1 AND username = $2
            RETURNING project_id, username, role, created_at
            "#,
        )
        .bind(project_id)
        .bind(username)
        .bind(role)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Deletes a membership
    ///
    /// Returns true if a row was removed.
    pub async fn delete(pool: &PgPool, project_id: Uuid, username: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM memberships WHERE project_id = $1 AND username = $2")
            .bind(project_id)
            .bind(username)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all members of a project, oldest first (owner leads)
    pub async fn list_by_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, Membership>(
            r#"
            SELECT project_id, username, role, created_at
            FROM memberships
            WHERE project_id = $1
            ORDER BY created_at ASC, username ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    /// Lists all projects a user belongs to
    pub async fn list_by_user(pool: &PgPool, username: &str) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, Membership>(
            r#"
            SELECT project_id, username, role, created_at
            FROM memberships
            WHERE username = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(username)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }
}
