/// Team management with actor permission checks
///
/// Reads need `view_project`. Writes need `add_member`, `update_member_role`
/// or `remove_member` and then go through the [`MembershipStore`], which
/// enforces the owner rules.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::membership::MembershipStore;
use crate::auth::authorization::PermissionEvaluator;
use crate::auth::permissions::Permission;
use crate::error::{CoreError, CoreResult};
use crate::models::membership::{Membership, Role};
use crate::store::Store;

/// A member's effective permissions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberPermissions {
    pub username: String,
    pub role: Role,
    pub permissions: Vec<Permission>,
}

#[derive(Clone)]
pub struct TeamService {
    store: Arc<dyn Store>,
    evaluator: PermissionEvaluator,
    memberships: MembershipStore,
}

fn validate_username(username: &str) -> CoreResult<&str> {
    let username = username.trim();
    if username.is_empty() {
        return Err(CoreError::InvalidInput("Username cannot be empty".to_string()));
    }
    Ok(username)
}

impl TeamService {
    pub fn new(store: Arc<dyn Store>, evaluator: PermissionEvaluator) -> Self {
        let memberships = MembershipStore::new(store.clone());
        Self {
            store,
            evaluator,
            memberships,
        }
    }

    /// Team in join order, owner first
    pub async fn list_members(&self, actor: &str, project_id: Uuid) -> CoreResult<Vec<Membership>> {
        self.evaluator
            .require(actor, project_id, Permission::ViewProject, None)
            .await?;
        Ok(self.store.list_memberships(project_id).await?)
    }

    pub async fn get_member(&self, actor: &str, project_id: Uuid, username: &str) -> CoreResult<Membership> {
        self.evaluator
            .require(actor, project_id, Permission::ViewProject, None)
            .await?;
        self.store
            .get_membership(project_id, username)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Member '{}'", username)))
    }

    /// Role and permission list of one member
    pub async fn member_permissions(
        &self,
        actor: &str,
        project_id: Uuid,
        username: &str,
    ) -> CoreResult<MemberPermissions> {
        let membership = self.get_member(actor, project_id, username).await?;
        let permissions = self
            .evaluator
            .registry()
            .permissions_for(membership.role)
            .iter()
            .copied()
            .collect();

        Ok(MemberPermissions {
            username: membership.username,
            role: membership.role,
            permissions,
        })
    }

    pub async fn add_member(
        &self,
        actor: &str,
        project_id: Uuid,
        username: &str,
        role: Role,
    ) -> CoreResult<Membership> {
        self.evaluator
            .require(actor, project_id, Permission::AddMember, None)
            .await?;
        let username = validate_username(username)?;
        self.memberships.add(actor, project_id, username, role).await
    }

    pub async fn update_member_role(
        &self,
        actor: &str,
        project_id: Uuid,
        username: &str,
        role: Role,
    ) -> CoreResult<Membership> {
        self.evaluator
            .require(actor, project_id, Permission::UpdateMemberRole, None)
            .await?;
        let username = validate_username(username)?;
        self.memberships.update_role(actor, project_id, username, role).await
    }

    pub async fn remove_member(&self, actor: &str, project_id: Uuid, username: &str) -> CoreResult<()> {
        self.evaluator
            .require(actor, project_id, Permission::RemoveMember, None)
            .await?;
        let username = validate_username(username)?;
        self.memberships.remove(actor, project_id, username).await
    }
}
