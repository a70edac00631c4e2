/// Task state machine
///
/// Applies task mutations after the permission evaluator allowed them, and
/// keeps project progress in step with task statuses.
///
/// | Operation | Permission | Recomputes progress |
/// |---|---|---|
/// | create | `create_task` (+ `assign_task` to assign someone else) | yes |
/// | transition | `update_task_status_own`, scoped to the task | yes |
/// | assign | `assign_task` | no |
/// | update | `edit_own_task`, scoped to the task | only if status changed |
/// | delete | `delete_task` | yes |
/// | get / list | `view_project` | no |
///
/// Any status may move to any other status; only the permission gates it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::progress::ProgressCalculator;
use crate::auth::authorization::PermissionEvaluator;
use crate::auth::permissions::Permission;
use crate::error::{CoreError, CoreResult};
use crate::models::task::{CreateTask, Task, TaskFilter, TaskPriority, TaskStatus, UpdateTask};
use crate::store::Store;

/// Fields accepted when creating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub assignee: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
}

/// Partial edit of a task
///
/// `assignee: Some(None)` unassigns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub assignee: Option<Option<String>>,
    pub status: Option<TaskStatus>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.assignee.is_none()
            && self.status.is_none()
    }
}

/// A mutated task plus the project's progress, when it was recomputed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskChange {
    pub task: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_progress: Option<i32>,
}

/// Filter accepted by [`TaskStateMachine::list`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub assignee: Option<String>,
}

/// `completed_at` edit for a status change: stamped on entering
/// `completed`, cleared on leaving it
fn completion_stamp(from: TaskStatus, to: TaskStatus) -> Option<Option<DateTime<Utc>>> {
    match (from.is_completed(), to.is_completed()) {
        (false, true) => Some(Some(Utc::now())),
        (true, false) => Some(None),
        _ => None,
    }
}

#[derive(Clone)]
pub struct TaskStateMachine {
    store: Arc<dyn Store>,
    evaluator: PermissionEvaluator,
    progress: ProgressCalculator,
}

impl TaskStateMachine {
    pub fn new(store: Arc<dyn Store>, evaluator: PermissionEvaluator) -> Self {
        let progress = ProgressCalculator::new(store.clone());
        Self {
            store,
            evaluator,
            progress,
        }
    }

    /// Loads a task that must belong to `project_id`
    async fn load(&self, project_id: Uuid, task_id: Uuid) -> CoreResult<Task> {
        match self.store.get_task(task_id).await? {
            Some(task) if task.project_id == project_id => Ok(task),
            _ => Err(CoreError::task_not_found(task_id)),
        }
    }

    async fn ensure_member(&self, project_id: Uuid, username: &str) -> CoreResult<()> {
        if self.evaluator.role_of(project_id, username).await?.is_none() {
            return Err(CoreError::NotAProjectMember(username.to_string()));
        }
        Ok(())
    }

    /// Single task, for any project member
    pub async fn get(&self, actor: &str, project_id: Uuid, task_id: Uuid) -> CoreResult<Task> {
        self.evaluator
            .require(actor, project_id, Permission::ViewProject, None)
            .await?;
        self.load(project_id, task_id).await
    }

    /// Project tasks, newest first
    pub async fn list(&self, actor: &str, project_id: Uuid, query: TaskQuery) -> CoreResult<Vec<Task>> {
        self.evaluator
            .require(actor, project_id, Permission::ViewProject, None)
            .await?;

        let filter = TaskFilter {
            project_id: Some(project_id),
            assignee: query.assignee,
            status: query.status,
        };
        Ok(self.store.query_tasks(&filter).await?)
    }

    /// Creates a task and recomputes progress
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a blank title
    /// - `NotAProjectMember` if the assignee is not on the team
    /// - `InsufficientPermission` without `create_task`, or without
    ///   `assign_task` when assigning someone other than the actor
    pub async fn create(&self, actor: &str, project_id: Uuid, new_task: NewTask) -> CoreResult<TaskChange> {
        self.evaluator
            .require(actor, project_id, Permission::CreateTask, None)
            .await?;

        let title = new_task.title.trim();
        if title.is_empty() {
            return Err(CoreError::InvalidInput("Task title cannot be empty".to_string()));
        }

        if let Some(assignee) = new_task.assignee.as_deref() {
            if assignee != actor {
                self.evaluator
                    .require(actor, project_id, Permission::AssignTask, None)
                    .await?;
            }
            self.ensure_member(project_id, assignee).await?;
        }

        let task = self
            .store
            .create_task(CreateTask {
                project_id,
                title: title.to_string(),
                description: new_task.description,
                assignee: new_task.assignee,
                status: new_task.status,
                priority: new_task.priority,
                created_by: actor.to_string(),
            })
            .await?;

        let progress = self.progress.recompute(project_id).await?;

        info!(%project_id, task_id = %task.id, actor, status = task.status.as_str(), "Task created");
        Ok(TaskChange {
            task,
            project_progress: Some(progress),
        })
    }

    /// Moves a task to `new_status` and recomputes progress
    ///
    /// Entering `completed` stamps `completed_at`; leaving it clears it.
    /// Re-applying the current status is allowed and only refreshes
    /// `updated_at`.
    ///
    /// # Errors
    ///
    /// `InsufficientPermission` unless the actor holds `edit_any_task`, or
    /// holds `update_task_status_own` and is the assignee. Non-members get
    /// `NotAMember`.
    pub async fn transition(
        &self,
        actor: &str,
        project_id: Uuid,
        task_id: Uuid,
        new_status: TaskStatus,
    ) -> CoreResult<TaskChange> {
        let task = self.load(project_id, task_id).await?;
        self.apply_transition(actor, task, new_status).await
    }

    async fn authorize_transition(&self, actor: &str, task: &Task) -> CoreResult<()> {
        self.evaluator
            .require(actor, task.project_id, Permission::UpdateTaskStatusOwn, Some(task))
            .await?;
        Ok(())
    }

    async fn authorize_assign(&self, actor: &str, project_id: Uuid, assignee: Option<&str>) -> CoreResult<()> {
        self.evaluator
            .require(actor, project_id, Permission::AssignTask, None)
            .await?;
        if let Some(username) = assignee {
            self.ensure_member(project_id, username).await?;
        }
        Ok(())
    }

    async fn apply_transition(&self, actor: &str, task: Task, new_status: TaskStatus) -> CoreResult<TaskChange> {
        self.authorize_transition(actor, &task).await?;

        let updated = self
            .store
            .update_task(
                task.id,
                UpdateTask {
                    status: Some(new_status),
                    completed_at: completion_stamp(task.status, new_status),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| CoreError::task_not_found(task.id))?;

        let progress = self.progress.recompute(task.project_id).await?;

        info!(
            project_id = %task.project_id,
            task_id = %task.id,
            actor,
            from = task.status.as_str(),
            to = new_status.as_str(),
            progress,
            "Task status changed"
        );
        Ok(TaskChange {
            task: updated,
            project_progress: Some(progress),
        })
    }

    /// Sets or clears the assignee
    ///
    /// # Errors
    ///
    /// - `InsufficientPermission` without `assign_task`
    /// - `NotAProjectMember` if `assignee` has no membership in the project
    pub async fn assign(
        &self,
        actor: &str,
        project_id: Uuid,
        task_id: Uuid,
        assignee: Option<String>,
    ) -> CoreResult<Task> {
        let task = self.load(project_id, task_id).await?;
        self.authorize_assign(actor, project_id, assignee.as_deref()).await?;

        let updated = self
            .store
            .update_task(
                task.id,
                UpdateTask {
                    assignee: Some(assignee.clone()),
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| CoreError::task_not_found(task.id))?;

        info!(
            %project_id,
            task_id = %task.id,
            actor,
            assignee = assignee.as_deref().unwrap_or("none"),
            "Task assigned"
        );
        Ok(updated)
    }

    /// Edits task fields
    ///
    /// Title, description and priority need `edit_own_task` on the task. An
    /// assignee change additionally needs what [`assign`](Self::assign)
    /// needs, and a status change what [`transition`](Self::transition)
    /// needs. Every check runs before the single write, so a rejected edit
    /// leaves the task untouched. Progress is recomputed only for a status
    /// change.
    pub async fn update(
        &self,
        actor: &str,
        project_id: Uuid,
        task_id: Uuid,
        changes: TaskChanges,
    ) -> CoreResult<TaskChange> {
        if changes.is_empty() {
            return Err(CoreError::InvalidInput("No fields to update".to_string()));
        }

        let task = self.load(project_id, task_id).await?;
        self.evaluator
            .require(actor, project_id, Permission::EditOwnTask, Some(&task))
            .await?;

        let title = match changes.title {
            Some(title) if title.trim().is_empty() => {
                return Err(CoreError::InvalidInput("Task title cannot be empty".to_string()))
            }
            Some(title) => Some(title.trim().to_string()),
            None => None,
        };

        let assignee = changes.assignee.filter(|assignee| *assignee != task.assignee);
        if let Some(assignee) = &assignee {
            self.authorize_assign(actor, project_id, assignee.as_deref()).await?;
        }
        if changes.status.is_some() {
            self.authorize_transition(actor, &task).await?;
        }

        let completed_at = changes
            .status
            .and_then(|status| completion_stamp(task.status, status));

        let updated = self
            .store
            .update_task(
                task.id,
                UpdateTask {
                    title,
                    description: changes.description,
                    priority: changes.priority,
                    assignee,
                    status: changes.status,
                    completed_at,
                },
            )
            .await?
            .ok_or_else(|| CoreError::task_not_found(task_id))?;

        let project_progress = match changes.status {
            Some(_) => Some(self.progress.recompute(project_id).await?),
            None => None,
        };

        info!(
            %project_id,
            %task_id,
            actor,
            from = task.status.as_str(),
            to = updated.status.as_str(),
            assignee = updated.assignee.as_deref().unwrap_or("none"),
            "Task updated"
        );
        Ok(TaskChange {
            task: updated,
            project_progress,
        })
    }

    /// Deletes a task and returns the recomputed progress
    pub async fn delete(&self, actor: &str, project_id: Uuid, task_id: Uuid) -> CoreResult<i32> {
        let task = self.load(project_id, task_id).await?;
        self.evaluator
            .require(actor, project_id, Permission::DeleteTask, Some(&task))
            .await?;

        if !self.store.delete_task(task_id).await? {
            return Err(CoreError::task_not_found(task_id));
        }

        let progress = self.progress.recompute(project_id).await?;

        info!(%project_id, %task_id, actor, progress, "Task deleted");
        Ok(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::permissions::RoleRegistry;
    use crate::models::membership::Role;
    use crate::models::project::{CreateProject, ProjectStatus};
    use crate::services::membership::MembershipStore;
    use crate::store::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        tasks: TaskStateMachine,
        project_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let project = store
            .create_project(CreateProject {
                name: "Apollo".to_string(),
                description: None,
                owner: "alice".to_string(),
                status: ProjectStatus::Active,
            })
            .await
            .unwrap();

        let members = MembershipStore::new(store.clone());
        members.add("alice", project.id, "bob", Role::Developer).await.unwrap();
        members.add("alice", project.id, "dave", Role::Developer).await.unwrap();
        members.add("alice", project.id, "erin", Role::Manager).await.unwrap();
        members.add("alice", project.id, "carol", Role::Viewer).await.unwrap();

        let evaluator = PermissionEvaluator::new(Arc::new(RoleRegistry::new()), store.clone());
        Fixture {
            tasks: TaskStateMachine::new(store.clone(), evaluator),
            store,
            project_id: project.id,
        }
    }

    fn new_task(title: &str, assignee: Option<&str>) -> NewTask {
        NewTask {
            title: title.to_string(),
            assignee: assignee.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_developer_moves_only_own_tasks() {
        let f = fixture().await;
        let bobs = f.tasks.create("erin", f.project_id, new_task("T1", Some("bob"))).await.unwrap().task;

        let change = f.tasks.transition("bob", f.project_id, bobs.id, TaskStatus::InProgress).await.unwrap();
        assert_eq!(change.task.status, TaskStatus::InProgress);
        assert_eq!(change.project_progress, Some(0));

        let err = f.tasks.transition("dave", f.project_id, bobs.id, TaskStatus::Completed).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientPermission(Permission::UpdateTaskStatusOwn)));

        let change = f.tasks.transition("erin", f.project_id, bobs.id, TaskStatus::Completed).await.unwrap();
        assert_eq!(change.project_progress, Some(100));
    }

    #[tokio::test]
    async fn test_transition_denials() {
        let f = fixture().await;
        let task = f.tasks.create("alice", f.project_id, new_task("T1", None)).await.unwrap().task;

        let err = f.tasks.transition("mallory", f.project_id, task.id, TaskStatus::Completed).await.unwrap_err();
        assert!(matches!(err, CoreError::NotAMember { .. }));

        let err = f.tasks.transition("carol", f.project_id, task.id, TaskStatus::Completed).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientPermission(_)));

        // Unassigned tasks are out of a developer's reach
        let err = f.tasks.transition("bob", f.project_id, task.id, TaskStatus::Completed).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientPermission(_)));
    }

    #[tokio::test]
    async fn test_completed_at_follows_status() {
        let f = fixture().await;
        let task = f.tasks.create("bob", f.project_id, new_task("T1", Some("bob"))).await.unwrap().task;
        assert!(task.completed_at.is_none());

        let done = f.tasks.transition("bob", f.project_id, task.id, TaskStatus::Completed).await.unwrap().task;
        let stamp = done.completed_at.expect("completed_at set");

        let again = f.tasks.transition("bob", f.project_id, task.id, TaskStatus::Completed).await.unwrap().task;
        assert_eq!(again.completed_at, Some(stamp));

        let reopened = f.tasks.transition("bob", f.project_id, task.id, TaskStatus::Todo).await.unwrap().task;
        assert!(reopened.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_create_permissions() {
        let f = fixture().await;

        let err = f.tasks.create("carol", f.project_id, new_task("T", None)).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientPermission(Permission::CreateTask)));

        let err = f.tasks.create("mallory", f.project_id, new_task("T", None)).await.unwrap_err();
        assert!(matches!(err, CoreError::NotAMember { .. }));

        // Developers may assign to themselves but not to others
        f.tasks.create("bob", f.project_id, new_task("mine", Some("bob"))).await.unwrap();
        let err = f.tasks.create("bob", f.project_id, new_task("yours", Some("dave"))).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientPermission(Permission::AssignTask)));

        let err = f.tasks.create("alice", f.project_id, new_task("ghost", Some("ghost"))).await.unwrap_err();
        assert!(matches!(err, CoreError::NotAProjectMember(ref u) if u == "ghost"));

        let err = f.tasks.create("alice", f.project_id, new_task("   ", None)).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_assign_rules() {
        let f = fixture().await;
        let task = f.tasks.create("alice", f.project_id, new_task("T", None)).await.unwrap().task;

        let err = f.tasks.assign("alice", f.project_id, task.id, Some("ghost".to_string())).await.unwrap_err();
        assert!(matches!(err, CoreError::NotAProjectMember(_)));

        let err = f.tasks.assign("bob", f.project_id, task.id, Some("bob".to_string())).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientPermission(Permission::AssignTask)));

        let assigned = f.tasks.assign("erin", f.project_id, task.id, Some("bob".to_string())).await.unwrap();
        assert_eq!(assigned.assignee.as_deref(), Some("bob"));

        let cleared = f.tasks.assign("erin", f.project_id, task.id, None).await.unwrap();
        assert_eq!(cleared.assignee, None);
    }

    #[tokio::test]
    async fn test_update_fields_and_status() {
        let f = fixture().await;
        let task = f.tasks.create("bob", f.project_id, new_task("T", Some("bob"))).await.unwrap().task;

        let change = f
            .tasks
            .update(
                "bob",
                f.project_id,
                task.id,
                TaskChanges {
                    title: Some("Renamed".to_string()),
                    priority: Some(TaskPriority::High),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(change.task.title, "Renamed");
        assert_eq!(change.task.priority, TaskPriority::High);
        assert_eq!(change.project_progress, None);

        let change = f
            .tasks
            .update(
                "bob",
                f.project_id,
                task.id,
                TaskChanges {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(change.project_progress, Some(100));

        let err = f
            .tasks
            .update(
                "dave",
                f.project_id,
                task.id,
                TaskChanges {
                    title: Some("Hijack".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientPermission(Permission::EditOwnTask)));

        let err = f.tasks.update("bob", f.project_id, task.id, TaskChanges::default()).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_update_with_same_assignee_skips_assign_check() {
        let f = fixture().await;
        let task = f.tasks.create("bob", f.project_id, new_task("T", Some("bob"))).await.unwrap().task;

        let change = f
            .tasks
            .update(
                "bob",
                f.project_id,
                task.id,
                TaskChanges {
                    assignee: Some(Some("bob".to_string())),
                    description: Some("details".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(change.task.description.as_deref(), Some("details"));
    }

    #[tokio::test]
    async fn test_rejected_update_writes_nothing() {
        let f = fixture().await;
        let task = f.tasks.create("bob", f.project_id, new_task("Original", Some("bob"))).await.unwrap().task;

        let err = f
            .tasks
            .update(
                "bob",
                f.project_id,
                task.id,
                TaskChanges {
                    title: Some("Hijacked".to_string()),
                    assignee: Some(Some("dave".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientPermission(Permission::AssignTask)));

        let err = f
            .tasks
            .update(
                "erin",
                f.project_id,
                task.id,
                TaskChanges {
                    title: Some("Hijacked".to_string()),
                    priority: Some(TaskPriority::High),
                    assignee: Some(Some("ghost".to_string())),
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotAProjectMember(_)));

        let stored = f.store.get_task(task.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Original");
        assert_eq!(stored.assignee.as_deref(), Some("bob"));
        assert_eq!(stored.priority, task.priority);
        assert_eq!(stored.status, task.status);
        assert_eq!(stored.completed_at, None);
        assert_eq!(stored.updated_at, task.updated_at);
    }

    #[tokio::test]
    async fn test_delete_recomputes_progress() {
        let f = fixture().await;
        let done = f.tasks.create("alice", f.project_id, new_task("done", None)).await.unwrap().task;
        f.tasks.transition("alice", f.project_id, done.id, TaskStatus::Completed).await.unwrap();
        let open = f.tasks.create("alice", f.project_id, new_task("open", None)).await.unwrap();
        assert_eq!(open.project_progress, Some(50));

        let err = f.tasks.delete("bob", f.project_id, open.task.id).await.unwrap_err();
        assert!(matches!(err, CoreError::InsufficientPermission(Permission::DeleteTask)));

        assert_eq!(f.tasks.delete("erin", f.project_id, open.task.id).await.unwrap(), 100);
        assert!(f.store.get_task(open.task.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_task_from_other_project_is_not_found() {
        let f = fixture().await;
        let task = f.tasks.create("alice", f.project_id, new_task("T", None)).await.unwrap().task;

        let err = f.tasks.get("alice", Uuid::new_v4(), task.id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotAMember { .. }));

        let err = f.tasks.transition("alice", Uuid::new_v4(), task.id, TaskStatus::Todo).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let f = fixture().await;
        f.tasks.create("alice", f.project_id, new_task("a", Some("bob"))).await.unwrap();
        f.tasks.create("alice", f.project_id, new_task("b", None)).await.unwrap();

        let all = f.tasks.list("carol", f.project_id, TaskQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let bobs = f
            .tasks
            .list(
                "carol",
                f.project_id,
                TaskQuery {
                    assignee: Some("bob".to_string()),
                    status: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].title, "a");
    }
}
