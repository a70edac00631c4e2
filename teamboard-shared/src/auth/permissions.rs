/// Role registry: the static role → permission table
///
/// The table is built once at startup and shared behind an `Arc`. It is never
/// mutated afterwards, so concurrent readers need no synchronization.
///
/// | Permission | owner | manager | developer | viewer |
/// |---|---|---|---|---|
/// | create_project | ✓ | | | |
/// | edit_project | ✓ | ✓ | | |
/// | delete_project | ✓ | | | |
/// | view_project | ✓ | ✓ | ✓ | ✓ |
/// | create_task | ✓ | ✓ | ✓ | |
/// | edit_any_task | ✓ | ✓ | | |
/// | edit_own_task | ✓ | ✓ | ✓ | |
/// | delete_task | ✓ | ✓ | | |
/// | assign_task | ✓ | ✓ | | |
/// | update_task_status_own | ✓ | ✓ | ✓ | |
/// | add_member | ✓ | | | |
/// | remove_member | ✓ | | | |
/// | update_member_role | ✓ | | | |
/// | view_analytics | ✓ | ✓ | | |
///
/// # Example
///
/// ```
/// use teamboard_shared::auth::permissions::{Permission, RoleRegistry};
/// use teamboard_shared::models::membership::Role;
///
/// let registry = RoleRegistry::new();
/// assert!(registry.permissions_for(Role::Manager).contains(&Permission::AssignTask));
/// assert!(!registry.permissions_for(Role::Viewer).contains(&Permission::CreateTask));
/// ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::membership::Role;

/// Named permissions (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    CreateProject,
    EditProject,
    DeleteProject,
    ViewProject,
    CreateTask,
    EditAnyTask,
    EditOwnTask,
    DeleteTask,
    AssignTask,
    UpdateTaskStatusOwn,
    AddMember,
    RemoveMember,
    UpdateMemberRole,
    ViewAnalytics,
}

impl Permission {
    /// Every permission, in table order
    pub const ALL: [Permission; 14] = [
        Permission::CreateProject,
        Permission::EditProject,
        Permission::DeleteProject,
        Permission::ViewProject,
        Permission::CreateTask,
        Permission::EditAnyTask,
        Permission::EditOwnTask,
        Permission::DeleteTask,
        Permission::AssignTask,
        Permission::UpdateTaskStatusOwn,
        Permission::AddMember,
        Permission::RemoveMember,
        Permission::UpdateMemberRole,
        Permission::ViewAnalytics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CreateProject => "create_project",
            Permission::EditProject => "edit_project",
            Permission::DeleteProject => "delete_project",
            Permission::ViewProject => "view_project",
            Permission::CreateTask => "create_task",
            Permission::EditAnyTask => "edit_any_task",
            Permission::EditOwnTask => "edit_own_task",
            Permission::DeleteTask => "delete_task",
            Permission::AssignTask => "assign_task",
            Permission::UpdateTaskStatusOwn => "update_task_status_own",
            Permission::AddMember => "add_member",
            Permission::RemoveMember => "remove_member",
            Permission::UpdateMemberRole => "update_member_role",
            Permission::ViewAnalytics => "view_analytics",
        }
    }

    /// Any-scope permission that subsumes this own-scope permission
    ///
    /// Returns `None` for permissions that are not task-ownership scoped.
    pub fn any_scope_sibling(&self) -> Option<Permission> {
        match self {
            Permission::EditOwnTask | Permission::UpdateTaskStatusOwn => Some(Permission::EditAnyTask),
            _ => None,
        }
    }

    /// True for permissions that depend on task ownership
    pub fn is_own_scope(&self) -> bool {
        self.any_scope_sibling().is_some()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable role → permission mapping
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    table: HashMap<Role, BTreeSet<Permission>>,
}

impl RoleRegistry {
    /// Builds the registry from the fixed table
    pub fn new() -> Self {
        use Permission::*;

        let viewer: BTreeSet<Permission> = [ViewProject].into_iter().collect();

        let developer: BTreeSet<Permission> =
            [ViewProject, CreateTask, EditOwnTask, UpdateTaskStatusOwn]
                .into_iter()
                .collect();

        let manager: BTreeSet<Permission> = [
            EditProject,
            ViewProject,
            CreateTask,
            EditAnyTask,
            EditOwnTask,
            DeleteTask,
            AssignTask,
            UpdateTaskStatusOwn,
            ViewAnalytics,
        ]
        .into_iter()
        .collect();

        let owner: BTreeSet<Permission> = Permission::ALL.into_iter().collect();

        let mut table = HashMap::with_capacity(4);
        table.insert(Role::Owner, owner);
        table.insert(Role::Manager, manager);
        table.insert(Role::Developer, developer);
        table.insert(Role::Viewer, viewer);

        Self { table }
    }

    /// Permission set granted to a role
    pub fn permissions_for(&self, role: Role) -> &BTreeSet<Permission> {
        // Every Role variant is inserted in `new`
        &self.table[&role]
    }

    /// Convenience membership test
    pub fn grants(&self, role: Role, permission: Permission) -> bool {
        self.permissions_for(role).contains(&permission)
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
