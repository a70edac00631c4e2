/// Record store abstraction
///
/// Services never talk to PostgreSQL directly. They hold an
/// `Arc<dyn Store>` so the same code runs against [`PgStore`] in production
/// and [`MemoryStore`] in tests or with `STORE_BACKEND=memory`.
///
/// Both backends provide the same guarantees:
///
/// - creating a project also creates its owner membership
/// - `(project_id, username)` is unique; a duplicate insert is
///   [`StoreError::Conflict`]
/// - deleting a project removes its tasks and memberships
///
/// Nothing here adds locking or transactions on top of the backend's
/// per-row semantics.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::membership::{CreateMembership, Membership, Role};
use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::task::{CreateTask, Task, TaskFilter, UpdateTask};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Result alias for store calls
pub type StoreResult<T> = Result<T, StoreError>;

/// Store failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique key violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Anything else the backend reports
    #[error("{0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Create/get/query/update/delete over projects, memberships and tasks
#[async_trait]
pub trait Store: Send + Sync {
    // Projects

    /// Inserts a project and its owner membership
    async fn create_project(&self, data: CreateProject) -> StoreResult<Project>;

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    /// Projects the user is a member of, newest first
    async fn list_projects_for_member(&self, username: &str) -> StoreResult<Vec<Project>>;

    /// Applies a partial update; `None` if the project is gone
    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>>;

    /// Deletes the project with its tasks and memberships
    async fn delete_project(&self, id: Uuid) -> StoreResult<bool>;

    // Memberships

    /// Inserts a membership; `Conflict` if the user is already a member
    async fn create_membership(&self, data: CreateMembership) -> StoreResult<Membership>;

    async fn get_membership(&self, project_id: Uuid, username: &str)
        -> StoreResult<Option<Membership>>;

    /// Members of a project in join order
    async fn list_memberships(&self, project_id: Uuid) -> StoreResult<Vec<Membership>>;

    /// Memberships held by one user across projects
    async fn list_user_memberships(&self, username: &str) -> StoreResult<Vec<Membership>>;

    async fn update_membership_role(
        &self,
        project_id: Uuid,
        username: &str,
        role: Role,
    ) -> StoreResult<Option<Membership>>;

    async fn delete_membership(&self, project_id: Uuid, username: &str) -> StoreResult<bool>;

    // Tasks

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn get_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Tasks matching the filter, newest first
    async fn query_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>>;

    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<i64>;

    /// Applies a partial update and stamps `updated_at`
    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>>;

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;

    /// Cheap liveness probe
    async fn ping(&self) -> StoreResult<()>;
}
