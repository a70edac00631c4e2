/// Membership store
///
/// Owns the invariants on project teams:
///
/// - exactly one owner per project, created with the project
/// - nobody is added as, promoted to, or demoted from `owner`
/// - the owner membership is never removed
///
/// Every change is logged with the actor, the subject and the old and new
/// roles. Permission checks on the actor happen one level up, in
/// [`TeamService`](super::team::TeamService).

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::models::membership::{CreateMembership, Membership, Role};
use crate::models::task::TaskFilter;
use crate::store::{Store, StoreError};

#[derive(Clone)]
pub struct MembershipStore {
    store: Arc<dyn Store>,
}

impl MembershipStore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Role of `username` in the project, `None` for non-members
    pub async fn role_of(&self, project_id: Uuid, username: &str) -> CoreResult<Option<Role>> {
        let membership = self.store.get_membership(project_id, username).await?;
        Ok(membership.map(|m| m.role))
    }

    /// Adds a user to the project
    ///
    /// # Errors
    ///
    /// - `CannotModifyOwner` if `role` is owner
    /// - `DuplicateMember` if the user already has a membership
    /// - `NotFound` if the project doesn't exist
    pub async fn add(
        &self,
        actor: &str,
        project_id: Uuid,
        username: &str,
        role: Role,
    ) -> CoreResult<Membership> {
        if role.is_owner() {
            return Err(CoreError::CannotModifyOwner);
        }
        if self.store.get_project(project_id).await?.is_none() {
            return Err(CoreError::project_not_found(project_id));
        }
        if self.role_of(project_id, username).await?.is_some() {
            return Err(CoreError::DuplicateMember(username.to_string()));
        }

        let membership = self
            .store
            .create_membership(CreateMembership {
                project_id,
                username: username.to_string(),
                role,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent add
                StoreError::Conflict(_) => CoreError::DuplicateMember(username.to_string()),
                other => CoreError::Storage(other),
            })?;

        info!(
            %project_id,
            actor,
            subject = username,
            old_role = "none",
            new_role = %role,
            "Member added"
        );
        Ok(membership)
    }

    /// Changes an existing member's role
    ///
    /// # Errors
    ///
    /// - `NotAMember` if the user has no membership
    /// - `CannotModifyOwner` if the user is the owner or `new_role` is owner
    pub async fn update_role(
        &self,
        actor: &str,
        project_id: Uuid,
        username: &str,
        new_role: Role,
    ) -> CoreResult<Membership> {
        let old_role = self.role_of(project_id, username).await?.ok_or_else(|| {
            CoreError::NotAMember {
                project_id,
                username: username.to_string(),
            }
        })?;

        if old_role.is_owner() || new_role.is_owner() {
            return Err(CoreError::CannotModifyOwner);
        }

        let membership = self
            .store
            .update_membership_role(project_id, username, new_role)
            .await?
            .ok_or_else(|| CoreError::NotAMember {
                project_id,
                username: username.to_string(),
            })?;

        info!(
            %project_id,
            actor,
            subject = username,
            old_role = %old_role,
            new_role = %new_role,
            "Member role updated"
        );
        Ok(membership)
    }

    /// Removes a member from the project
    ///
    /// Tasks assigned to the removed user keep their assignee.
    ///
    /// # Errors
    ///
    /// - `NotAMember` if the user has no membership
    /// - `CannotRemoveOwner` if the user is the owner
    pub async fn remove(&self, actor: &str, project_id: Uuid, username: &str) -> CoreResult<()> {
        let old_role = self.role_of(project_id, username).await?.ok_or_else(|| {
            CoreError::NotAMember {
                project_id,
                username: username.to_string(),
            }
        })?;

        if old_role.is_owner() {
            return Err(CoreError::CannotRemoveOwner);
        }

        if !self.store.delete_membership(project_id, username).await? {
            return Err(CoreError::NotAMember {
                project_id,
                username: username.to_string(),
            });
        }

        let still_assigned = match self
            .store
            .count_tasks(&TaskFilter::project(project_id).with_assignee(username))
            .await
        {
            Ok(count) => count,
            Err(e) => {
                warn!(%project_id, subject = username, error = %e, "Could not count stale assignments");
                0
            }
        };

        info!(
            %project_id,
            actor,
            subject = username,
            old_role = %old_role,
            new_role = "none",
            still_assigned_tasks = still_assigned,
            "Member removed"
        );
        Ok(())
    }
}
