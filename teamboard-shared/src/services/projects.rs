/// Project lifecycle
///
/// Creating a project makes the creator its owner. Progress always starts at
/// 0 and is only changed by the progress calculator.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::progress::ProgressCalculator;
use crate::auth::authorization::PermissionEvaluator;
use crate::auth::permissions::Permission;
use crate::error::{CoreError, CoreResult};
use crate::models::membership::{Membership, Role};
use crate::models::project::{CreateProject, Project, ProjectStatus, UpdateProject};
use crate::store::Store;

/// Fields accepted when creating a project
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
}

/// Editable project fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
}

impl ProjectChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.status.is_none()
    }
}

/// Project with its team, as seen by one member
#[derive(Debug, Clone, Serialize)]
pub struct ProjectWithTeam {
    #[serde(flatten)]
    pub project: Project,
    pub team: Vec<Membership>,
    pub user_role: Role,
}

/// List entry for the projects a user belongs to
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    pub user_role: Role,
    pub team_size: usize,
}

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn Store>,
    evaluator: PermissionEvaluator,
    progress: ProgressCalculator,
}

fn validate_name(name: &str) -> CoreResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidInput("Project name cannot be empty".to_string()));
    }
    Ok(name.to_string())
}

impl ProjectService {
    pub fn new(store: Arc<dyn Store>, evaluator: PermissionEvaluator) -> Self {
        let progress = ProgressCalculator::new(store.clone());
        Self {
            store,
            evaluator,
            progress,
        }
    }

    /// Creates a project owned by `actor`
    pub async fn create(&self, actor: &str, new_project: NewProject) -> CoreResult<Project> {
        let name = validate_name(&new_project.name)?;

        let project = self
            .store
            .create_project(CreateProject {
                name,
                description: new_project.description,
                owner: actor.to_string(),
                status: new_project.status,
            })
            .await?;

        info!(project_id = %project.id, owner = actor, "Project created");
        Ok(project)
    }

    pub async fn get(&self, actor: &str, project_id: Uuid) -> CoreResult<ProjectWithTeam> {
        let role = self
            .evaluator
            .require(actor, project_id, Permission::ViewProject, None)
            .await?;

        let project = self
            .store
            .get_project(project_id)
            .await?
            .ok_or_else(|| CoreError::project_not_found(project_id))?;
        let team = self.store.list_memberships(project_id).await?;

        Ok(ProjectWithTeam {
            project,
            team,
            user_role: role,
        })
    }

    /// Every project the actor is a member of, newest first
    pub async fn list(&self, actor: &str) -> CoreResult<Vec<ProjectSummary>> {
        let projects = self.store.list_projects_for_member(actor).await?;

        let mut summaries = Vec::with_capacity(projects.len());
        for project in projects {
            let team = self.store.list_memberships(project.id).await?;
            // Membership may vanish between the two reads
            let Some(role) = team.iter().find(|m| m.username == actor).map(|m| m.role) else {
                continue;
            };
            summaries.push(ProjectSummary {
                project,
                user_role: role,
                team_size: team.len(),
            });
        }

        Ok(summaries)
    }

    /// Updates name, description or status
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for an empty change set or a blank name
    /// - `InsufficientPermission` without `edit_project`
    pub async fn update(&self, actor: &str, project_id: Uuid, changes: ProjectChanges) -> CoreResult<Project> {
        self.evaluator
            .require(actor, project_id, Permission::EditProject, None)
            .await?;

        if changes.is_empty() {
            return Err(CoreError::InvalidInput("No fields to update".to_string()));
        }

        let name = changes.name.as_deref().map(validate_name).transpose()?;

        let project = self
            .store
            .update_project(
                project_id,
                UpdateProject {
                    name,
                    description: changes.description,
                    status: changes.status,
                    progress: None,
                },
            )
            .await?
            .ok_or_else(|| CoreError::project_not_found(project_id))?;

        info!(%project_id, actor, "Project updated");
        Ok(project)
    }

    /// Deletes the project with its tasks and team
    pub async fn delete(&self, actor: &str, project_id: Uuid) -> CoreResult<()> {
        self.evaluator
            .require(actor, project_id, Permission::DeleteProject, None)
            .await?;

        if !self.store.delete_project(project_id).await? {
            return Err(CoreError::project_not_found(project_id));
        }

        info!(%project_id, actor, "Project deleted");
        Ok(())
    }

    /// Recomputes progress on demand; any member may ask
    pub async fn recompute_progress(&self, actor: &str, project_id: Uuid) -> CoreResult<i32> {
        self.evaluator
            .require(actor, project_id, Permission::ViewProject, None)
            .await?;
        self.progress.recompute(project_id).await
    }
}
