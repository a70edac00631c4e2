/// Task model and database operations
///
/// Tasks belong to exactly one project. Status values are unrestricted in
/// which transitions they allow; the permission check is what gates a change.
///
/// # Status
///
/// ```text
/// todo ⇄ in_progress ⇄ completed
///   └───────────────────┘
/// ```
///
/// `completed_at` is set when a task enters `completed` and cleared when it
/// leaves it.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('todo', 'in_progress', 'completed');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     assignee VARCHAR(255),
///     status task_status NOT NULL DEFAULT 'todo',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     created_by VARCHAR(255) NOT NULL,
///     completed_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Task status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

/// Task model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    pub title: String,
    pub description: Option<String>,

    /// Assigned member, if any. May be stale after the member was removed.
    pub assignee: Option<String>,

    pub status: TaskStatus,
    pub priority: TaskPriority,

    /// Username of the creator
    pub created_by: String,

    /// When the task last entered `completed`
    pub completed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// True if `username` is the current assignee
    pub fn is_assigned_to(&self, username: &str) -> bool {
        self.assignee.as_deref() == Some(username)
    }
}

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub assignee: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    pub created_by: String,
}

/// Partial update for a task
///
/// Double options distinguish "leave alone" (`None`) from "clear"
/// (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

/// Filter for task queries; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub project_id: Option<Uuid>,
    pub assignee: Option<String>,
    pub status: Option<TaskStatus>,
}

impl TaskFilter {
    /// All tasks of one project
    pub fn project(project_id: Uuid) -> Self {
        Self {
            project_id: Some(project_id),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Checks a task against the filter
    pub fn matches(&self, task: &Task) -> bool {
        self.project_id.map_or(true, |id| task.project_id == id)
            && self
                .assignee
                .as_deref()
                .map_or(true, |a| task.assignee.as_deref() == Some(a))
            && self.status.map_or(true, |s| task.status == s)
    }
}

const TASK_COLUMNS: &str = "id, project_id, title, description, assignee, status, priority, \
                            created_by, completed_at, created_at, updated_at";

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &TaskFilter) {
    builder.push(" WHERE TRUE");
    if let Some(project_id) = filter.project_id {
        builder.push(" AND project_id = ").push_bind(project_id);
    }
    if let Some(assignee) = &filter.assignee {
        builder.push(" AND assignee = ").push_bind(assignee.clone());
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
}

impl Task {
    /// Creates a new task
    ///
    /// `completed_at` is stamped when the task is created already completed.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (project_id, title, description, assignee, status, priority,
                               created_by, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7,
                    CASE WHEN $5 = 'completed'::task_status THEN NOW() ELSE NULL END)
            RETURNING id, project_id, title, description, assignee, status, priority,
                      created_by, completed_at, created_at, updated_at
            "#,
        )
        .bind(data.project_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.assignee)
        .bind(data.status)
        .bind(data.priority)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE id = $1",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks matching the filter, newest first
    pub async fn list(pool: &PgPool, filter: &TaskFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM tasks", TASK_COLUMNS));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC, id");

        builder.build_query_as::<Task>().fetch_all(pool).await
    }

    /// Counts tasks matching the filter
    pub async fn count(pool: &PgPool, filter: &TaskFilter) -> Result<i64, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks");
        push_filter(&mut builder, filter);

        let (count,): (i64,) = builder.build_query_as().fetch_one(pool).await?;
        Ok(count)
    }

    /// Applies a partial update and stamps `updated_at`
    ///
    /// Returns `None` if the task doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE tasks SET updated_at = NOW()");

        if let Some(title) = data.title {
            builder.push(", title = ").push_bind(title);
        }
        if let Some(description) = data.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(assignee) = data.assignee {
            builder.push(", assignee = ").push_bind(assignee);
        }
        if let Some(status) = data.status {
            builder.push(", status = ").push_bind(status);
        }
        if let Some(priority) = data.priority {
            builder.push(", priority = ").push_bind(priority);
        }
        if let Some(completed_at) = data.completed_at {
            builder.push(", completed_at = ").push_bind(completed_at);
        }

        builder.push(" WHERE id = ").push_bind(id);
        builder.push(format!(" RETURNING {}", TASK_COLUMNS));

        builder.build_query_as::<Task>().fetch_optional(pool).await
    }

    /// Deletes a task
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(assignee: Option<&str>, status: TaskStatus) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            project_id: Uuid::nil(),
            title: "Write docs".to_string(),
            description: None,
            assignee: assignee.map(str::to_string),
            status,
            priority: TaskPriority::default(),
            created_by: "alice".to_string(),
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_and_priority_serde() {
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), "\"in_progress\"");
        assert_eq!(serde_json::to_string(&TaskPriority::High).unwrap(), "\"high\"");
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn test_is_assigned_to() {
        assert!(task(Some("bob"), TaskStatus::Todo).is_assigned_to("bob"));
        assert!(!task(Some("bob"), TaskStatus::Todo).is_assigned_to("carol"));
        assert!(!task(None, TaskStatus::Todo).is_assigned_to("bob"));
    }

    #[test]
    fn test_filter_matches() {
        let t = task(Some("bob"), TaskStatus::Completed);

        assert!(TaskFilter::default().matches(&t));
        assert!(TaskFilter::project(Uuid::nil()).matches(&t));
        assert!(!TaskFilter::project(Uuid::new_v4()).matches(&t));
        assert!(TaskFilter::default().with_assignee("bob").matches(&t));
        assert!(!TaskFilter::default().with_assignee("carol").matches(&t));
        assert!(TaskFilter::default().with_status(TaskStatus::Completed).matches(&t));
        assert!(!TaskFilter::default().with_status(TaskStatus::Todo).matches(&t));
    }
}
