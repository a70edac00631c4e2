/// PostgreSQL-backed [`Store`]
///
/// Every method delegates to the hand-written queries on the model types and
/// converts `sqlx::Error` into [`StoreError`].

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::db::pool::health_check;
use crate::models::membership::{CreateMembership, Membership, Role};
use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::task::{CreateTask, Task, TaskFilter, UpdateTask};

/// Store over a shared connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn storage_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |err| {
        let err = StoreError::from(err);
        if let StoreError::Backend(message) = &err {
            error!(operation, error = %message, "Database operation failed");
        }
        err
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_project(&self, data: CreateProject) -> StoreResult<Project> {
        Project::create(&self.pool, data)
            .await
            .map_err(storage_error("create_project"))
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Project::find_by_id(&self.pool, id)
            .await
            .map_err(storage_error("get_project"))
    }

    async fn list_projects_for_member(&self, username: &str) -> StoreResult<Vec<Project>> {
        Project::list_for_member(&self.pool, username)
            .await
            .map_err(storage_error("list_projects_for_member"))
    }

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>> {
        Project::update(&self.pool, id, data)
            .await
            .map_err(storage_error("update_project"))
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        Project::delete(&self.pool, id)
            .await
            .map_err(storage_error("delete_project"))
    }

    async fn create_membership(&self, data: CreateMembership) -> StoreResult<Membership> {
        Membership::create(&self.pool, data)
            .await
            .map_err(storage_error("create_membership"))
    }

    async fn get_membership(
        &self,
        project_id: Uuid,
        username: &str,
    ) -> StoreResult<Option<Membership>> {
        Membership::find(&self.pool, project_id, username)
            .await
            .map_err(storage_error("get_membership"))
    }

    async fn list_memberships(&self, project_id: Uuid) -> StoreResult<Vec<Membership>> {
        Membership::list_by_project(&self.pool, project_id)
            .await
            .map_err(storage_error("list_memberships"))
    }

    async fn list_user_memberships(&self, username: &str) -> StoreResult<Vec<Membership>> {
        Membership::list_by_user(&self.pool, username)
            .await
            .map_err(storage_error("list_user_memberships"))
    }

    async fn update_membership_role(
        &self,
        project_id: Uuid,
        username: &str,
        role: Role,
    ) -> StoreResult<Option<Membership>> {
        Membership::update_role(&self.pool, project_id, username, role)
            .await
            .map_err(storage_error("update_membership_role"))
    }

    async fn delete_membership(&self, project_id: Uuid, username: &str) -> StoreResult<bool> {
        Membership::delete(&self.pool, project_id, username)
            .await
            .map_err(storage_error("delete_membership"))
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        Task::create(&self.pool, data)
            .await
            .map_err(storage_error("create_task"))
    }

    async fn get_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Task::find_by_id(&self.pool, id)
            .await
            .map_err(storage_error("get_task"))
    }

    async fn query_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        Task::list(&self.pool, filter)
            .await
            .map_err(storage_error("query_tasks"))
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<i64> {
        Task::count(&self.pool, filter)
            .await
            .map_err(storage_error("count_tasks"))
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>> {
        Task::update(&self.pool, id, data)
            .await
            .map_err(storage_error("update_task"))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        Task::delete(&self.pool, id)
            .await
            .map_err(storage_error("delete_task"))
    }

    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await.map_err(storage_error("ping"))
    }
}
