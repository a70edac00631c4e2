/// Permission evaluator
///
/// Answers "may `actor` do `permission` in `project` (on `task`)?" from the
/// actor's membership and the [`RoleRegistry`].
///
/// # Decision rule
///
/// 1. No membership: deny everything, including `view_project`.
/// 2. Own-scope permission with a target task: allow if the role holds the
///    any-scope sibling (`edit_any_task`), or holds the own-scope permission
///    and the actor is the task's assignee.
/// 3. Otherwise allow iff the role's set contains the permission.
///
/// [`PermissionEvaluator::authorize`] only ever returns a boolean for
/// denials. [`PermissionEvaluator::require`] turns a denial into the typed
/// error callers propagate.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use teamboard_shared::auth::authorization::PermissionEvaluator;
/// use teamboard_shared::auth::permissions::{Permission, RoleRegistry};
/// use teamboard_shared::store::MemoryStore;
/// use uuid::Uuid;
///
/// # async fn example(project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let evaluator = PermissionEvaluator::new(
///     Arc::new(RoleRegistry::new()),
///     Arc::new(MemoryStore::new()),
/// );
///
/// if !evaluator.authorize("carol", project_id, Permission::CreateTask, None).await? {
///     println!("carol cannot create tasks");
/// }
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::permissions::{Permission, RoleRegistry};
use crate::error::{CoreError, CoreResult};
use crate::models::membership::Role;
use crate::models::task::Task;
use crate::store::Store;

/// Pure decision function
///
/// `role` is the actor's role in the project (`None` for non-members).
pub fn decide(
    registry: &RoleRegistry,
    role: Option<Role>,
    actor: &str,
    permission: Permission,
    task: Option<&Task>,
) -> bool {
    let Some(role) = role else {
        return false;
    };
    if let (Some(any_scope), Some(task)) = (permission.any_scope_sibling(), task) {
        return registry.grants(role, any_scope)
            || (registry.grants(role, permission) && task.is_assigned_to(actor));
    }

    registry.grants(role, permission)
}

/// Evaluates permissions against stored memberships
#[derive(Clone)]
pub struct PermissionEvaluator {
    registry: Arc<RoleRegistry>,
    store: Arc<dyn Store>,
}

impl PermissionEvaluator {
    pub fn new(registry: Arc<RoleRegistry>, store: Arc<dyn Store>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    /// Looks up the actor's role in the project
    pub async fn role_of(&self, project_id: Uuid, username: &str) -> CoreResult<Option<Role>> {
        let membership = self.store.get_membership(project_id, username).await?;
        Ok(membership.map(|m| m.role))
    }

    /// Allow/deny decision
    ///
    /// # Errors
    ///
    /// Only store failures are errors; a denial is `Ok(false)`.
    pub async fn authorize(
        &self,
        actor: &str,
        project_id: Uuid,
        permission: Permission,
        task: Option<&Task>,
    ) -> CoreResult<bool> {
        let role = self.role_of(project_id, actor).await?;
        Ok(decide(&self.registry, role, actor, permission, task))
    }

    /// Like [`authorize`](Self::authorize), but a denial is an error
    ///
    /// Returns the actor's role on success.
    ///
    /// # Errors
    ///
    /// - `CoreError::NotAMember` if the actor has no membership
    /// - `CoreError::InsufficientPermission` if the role does not allow it
    pub async fn require(
        &self,
        actor: &str,
        project_id: Uuid,
        permission: Permission,
        task: Option<&Task>,
    ) -> CoreResult<Role> {
        let Some(role) = self.role_of(project_id, actor).await? else {
            debug!(%project_id, actor, %permission, "Denied: not a member");
            return Err(CoreError::NotAMember {
                project_id,
                username: actor.to_string(),
            });
        };

        if decide(&self.registry, Some(role), actor, permission, task) {
            Ok(role)
        } else {
            debug!(%project_id, actor, role = %role, %permission, "Denied: insufficient permission");
            Err(CoreError::InsufficientPermission(permission))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TaskStatus};
    use chrono::Utc;

    fn task_assigned_to(assignee: Option<&str>) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            title: "T1".to_string(),
            description: None,
            assignee: assignee.map(str::to_string),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            created_by: "alice".to_string(),
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_non_member_denied_everything() {
        let registry = RoleRegistry::new();
        let task = task_assigned_to(Some("mallory"));
        for permission in Permission::ALL {
            assert!(!decide(&registry, None, "mallory", permission, None));
            assert!(!decide(&registry, None, "mallory", permission, Some(&task)));
        }
    }

    #[test]
    fn test_developer_own_scope_requires_assignment() {
        let registry = RoleRegistry::new();
        let bobs = task_assigned_to(Some("bob"));
        let daves = task_assigned_to(Some("dave"));
        let unassigned = task_assigned_to(None);

        let p = Permission::UpdateTaskStatusOwn;
        assert!(decide(&registry, Some(Role::Developer), "bob", p, Some(&bobs)));
        assert!(!decide(&registry, Some(Role::Developer), "bob", p, Some(&daves)));
        assert!(!decide(&registry, Some(Role::Developer), "bob", p, Some(&unassigned)));

        let p = Permission::EditOwnTask;
        assert!(decide(&registry, Some(Role::Developer), "bob", p, Some(&bobs)));
        assert!(!decide(&registry, Some(Role::Developer), "bob", p, Some(&daves)));
    }

    #[test]
    fn test_any_scope_subsumes_ownership() {
        let registry = RoleRegistry::new();
        let bobs = task_assigned_to(Some("bob"));
        for role in [Role::Owner, Role::Manager] {
            assert!(decide(&registry, Some(role), "erin", Permission::UpdateTaskStatusOwn, Some(&bobs)));
            assert!(decide(&registry, Some(role), "erin", Permission::EditOwnTask, Some(&bobs)));
        }
    }

    #[test]
    fn test_viewer_cannot_touch_own_task() {
        let registry = RoleRegistry::new();
        let carols = task_assigned_to(Some("carol"));
        assert!(!decide(&registry, Some(Role::Viewer), "carol", Permission::UpdateTaskStatusOwn, Some(&carols)));
        assert!(decide(&registry, Some(Role::Viewer), "carol", Permission::ViewProject, None));
    }

    #[test]
    fn test_own_scope_without_task_uses_table() {
        let registry = RoleRegistry::new();
        assert!(decide(&registry, Some(Role::Developer), "bob", Permission::EditOwnTask, None));
        assert!(!decide(&registry, Some(Role::Viewer), "carol", Permission::EditOwnTask, None));
    }

    #[test]
    fn test_table_permissions_ignore_task() {
        let registry = RoleRegistry::new();
        let bobs = task_assigned_to(Some("bob"));
        assert!(!decide(&registry, Some(Role::Developer), "bob", Permission::DeleteTask, Some(&bobs)));
        assert!(decide(&registry, Some(Role::Manager), "erin", Permission::DeleteTask, Some(&bobs)));
    }
}
