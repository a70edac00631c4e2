/// Core error taxonomy
///
/// Every operation exposed by the services in this crate returns
/// [`CoreResult`]. Authorization outcomes are typed so the route layer can map
/// each one to a distinct user-visible status without string matching.
///
/// # Variants
///
/// - [`CoreError::NotAMember`]: actor has no role in the project. Treated as
///   "not found" by callers so project existence is not leaked.
/// - [`CoreError::InsufficientPermission`]: actor is a member but lacks the
///   permission.
/// - [`CoreError::Storage`]: the record store failed. This is the only kind a
///   caller may reasonably retry; the core never retries on its own.

use uuid::Uuid;

use crate::auth::permissions::Permission;
use crate::store::StoreError;

/// Result alias used throughout the core
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors produced by the RBAC, task and analytics core
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Actor (or target user) has no membership in the project
    #[error("User '{username}' is not a member of project {project_id}")]
    NotAMember { project_id: Uuid, username: String },

    /// Actor is a member but the role does not grant the permission
    #[error("Insufficient permissions: requires {0}")]
    InsufficientPermission(Permission),

    /// Role value outside owner/manager/developer/viewer
    #[error("Invalid role '{0}'. Must be one of: owner, manager, developer, viewer")]
    InvalidRole(String),

    /// User already has a membership in the project
    #[error("User '{0}' is already a member of this project")]
    DuplicateMember(String),

    /// The owner membership cannot be removed
    #[error("Cannot remove the project owner from the team")]
    CannotRemoveOwner,

    /// The owner membership cannot be modified, and no one else can become owner
    #[error("The project owner's role cannot be assigned or changed")]
    CannotModifyOwner,

    /// Assignee is not a current member of the task's project
    #[error("User '{0}' is not a member of this project")]
    NotAProjectMember(String),

    /// Project, task or membership could not be resolved
    #[error("{0} not found")]
    NotFound(String),

    /// Request is well-formed but cannot be applied
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Underlying store failure, surfaced as-is
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl CoreError {
    /// Shorthand for a missing project
    pub fn project_not_found(id: Uuid) -> Self {
        CoreError::NotFound(format!("Project '{}'", id))
    }

    /// Shorthand for a missing task
    pub fn task_not_found(id: Uuid) -> Self {
        CoreError::NotFound(format!("Task '{}'", id))
    }
}
