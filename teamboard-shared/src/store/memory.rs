/// In-memory [`Store`]
///
/// Collections are `tokio::sync::RwLock`-guarded vectors kept in insertion
/// order, which gives the same "join order" and "newest first" orderings the
/// SQL backend produces. Used by the test suites and by
/// `STORE_BACKEND=memory`.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::membership::{CreateMembership, Membership, Role};
use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::task::{CreateTask, Task, TaskFilter, TaskStatus, UpdateTask};

/// Store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: RwLock<Vec<Project>>,
    memberships: RwLock<Vec<Membership>>,
    tasks: RwLock<Vec<Task>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `StoreError::Backend`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("memory store is unavailable".to_string()));
        }
        Ok(())
    }

    async fn project_exists(&self, id: Uuid) -> bool {
        self.projects.read().await.iter().any(|p| p.id == id)
    }
}

fn apply_task_update(task: &mut Task, data: UpdateTask) {
    if let Some(title) = data.title {
        task.title = title;
    }
    if let Some(description) = data.description {
        task.description = Some(description);
    }
    if let Some(assignee) = data.assignee {
        task.assignee = assignee;
    }
    if let Some(status) = data.status {
        task.status = status;
    }
    if let Some(priority) = data.priority {
        task.priority = priority;
    }
    if let Some(completed_at) = data.completed_at {
        task.completed_at = completed_at;
    }
    task.updated_at = Utc::now();
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_project(&self, data: CreateProject) -> StoreResult<Project> {
        self.check_available()?;

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            owner: data.owner,
            status: data.status,
            progress: 0,
            created_at: now,
            updated_at: now,
        };

        // Both locks are held so the project never appears without its owner
        let mut projects = self.projects.write().await;
        let mut memberships = self.memberships.write().await;
        memberships.push(Membership {
            project_id: project.id,
            username: project.owner.clone(),
            role: Role::Owner,
            created_at: now,
        });
        projects.push(project.clone());

        Ok(project)
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        self.check_available()?;
        Ok(self.projects.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn list_projects_for_member(&self, username: &str) -> StoreResult<Vec<Project>> {
        self.check_available()?;

        let projects = self.projects.read().await;
        let memberships = self.memberships.read().await;

        let mut result: Vec<Project> = projects
            .iter()
            .rev()
            .filter(|p| {
                memberships
                    .iter()
                    .any(|m| m.project_id == p.id && m.username == username)
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(result)
    }

    async fn update_project(&self, id: Uuid, data: UpdateProject) -> StoreResult<Option<Project>> {
        self.check_available()?;

        let mut projects = self.projects.write().await;
        let Some(project) = projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            project.name = name;
        }
        if let Some(description) = data.description {
            project.description = Some(description);
        }
        if let Some(status) = data.status {
            project.status = status;
        }
        if let Some(progress) = data.progress {
            project.progress = progress;
        }
        project.updated_at = Utc::now();

        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        self.check_available()?;

        let mut projects = self.projects.write().await;
        let before = projects.len();
        projects.retain(|p| p.id != id);
        if projects.len() == before {
            return Ok(false);
        }

        self.memberships.write().await.retain(|m| m.project_id != id);
        self.tasks.write().await.retain(|t| t.project_id != id);

        Ok(true)
    }

    async fn create_membership(&self, data: CreateMembership) -> StoreResult<Membership> {
        self.check_available()?;

        if !self.project_exists(data.project_id).await {
            return Err(StoreError::Backend(format!(
                "project {} does not exist",
                data.project_id
            )));
        }

        let mut memberships = self.memberships.write().await;
        if memberships
            .iter()
            .any(|m| m.project_id == data.project_id && m.username == data.username)
        {
            return Err(StoreError::Conflict(format!(
                "membership ({}, {}) already exists",
                data.project_id, data.username
            )));
        }
        if data.role.is_owner()
            && memberships
                .iter()
                .any(|m| m.project_id == data.project_id && m.role.is_owner())
        {
            return Err(StoreError::Conflict(format!(
                "project {} already has an owner",
                data.project_id
            )));
        }

        let membership = Membership {
            project_id: data.project_id,
            username: data.username,
            role: data.role,
            created_at: Utc::now(),
        };
        memberships.push(membership.clone());

        Ok(membership)
    }

    async fn get_membership(
        &self,
        project_id: Uuid,
        username: &str,
    ) -> StoreResult<Option<Membership>> {
        self.check_available()?;
        Ok(self
            .memberships
            .read()
            .await
            .iter()
            .find(|m| m.project_id == project_id && m.username == username)
            .cloned())
    }

    async fn list_memberships(&self, project_id: Uuid) -> StoreResult<Vec<Membership>> {
        self.check_available()?;
        Ok(self
            .memberships
            .read()
            .await
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn list_user_memberships(&self, username: &str) -> StoreResult<Vec<Membership>> {
        self.check_available()?;
        Ok(self
            .memberships
            .read()
            .await
            .iter()
            .filter(|m| m.username == username)
            .cloned()
            .collect())
    }

    async fn update_membership_role(
        &self,
        project_id: Uuid,
        username: &str,
        role: Role,
    ) -> StoreResult<Option<Membership>> {
        self.check_available()?;

        let mut memberships = self.memberships.write().await;
        let Some(membership) = memberships
            .iter_mut()
            .find(|m| m.project_id == project_id && m.username == username)
        else {
            return Ok(None);
        };
        membership.role = role;

        Ok(Some(membership.clone()))
    }

    async fn delete_membership(&self, project_id: Uuid, username: &str) -> StoreResult<bool> {
        self.check_available()?;

        let mut memberships = self.memberships.write().await;
        let before = memberships.len();
        memberships.retain(|m| !(m.project_id == project_id && m.username == username));

        Ok(memberships.len() < before)
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        self.check_available()?;

        if !self.project_exists(data.project_id).await {
            return Err(StoreError::Backend(format!(
                "project {} does not exist",
                data.project_id
            )));
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            title: data.title,
            description: data.description,
            assignee: data.assignee,
            status: data.status,
            priority: data.priority,
            created_by: data.created_by,
            completed_at: (data.status == TaskStatus::Completed).then_some(now),
            created_at: now,
            updated_at: now,
        };
        self.tasks.write().await.push(task.clone());

        Ok(task)
    }

    async fn get_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        self.check_available()?;
        Ok(self.tasks.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn query_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        self.check_available()?;

        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .iter()
            .rev()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(tasks)
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<i64> {
        self.check_available()?;
        Ok(self.tasks.read().await.iter().filter(|t| filter.matches(t)).count() as i64)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>> {
        self.check_available()?;

        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        apply_task_update(task, data);

        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        self.check_available()?;

        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);

        Ok(tasks.len() < before)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_available()
    }
}
