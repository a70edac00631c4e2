/// Personal dashboard
///
/// Everything here is scoped to the caller's own memberships, so no
/// permission lookups beyond "is a member" are needed.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::models::membership::Role;
use crate::models::project::{Project, ProjectStatus};
use crate::models::task::{Task, TaskFilter, TaskStatus};
use crate::store::Store;

/// Default size of the activity feed
pub const DEFAULT_ACTIVITY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardProject {
    pub id: Uuid,
    pub name: String,
    pub status: ProjectStatus,
    pub progress: i32,
    pub user_role: Role,
    pub team_size: usize,
    pub task_count: i64,
}

/// A task together with the name of its project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskWithProject {
    #[serde(flatten)]
    pub task: Task,
    pub project_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_projects: usize,
    pub total_assigned_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub projects: Vec<DashboardProject>,
    pub my_tasks: Vec<TaskWithProject>,
    pub statistics: DashboardStats,
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn Store>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn member_projects(&self, actor: &str) -> CoreResult<Vec<Project>> {
        Ok(self.store.list_projects_for_member(actor).await?)
    }

    /// Projects, assigned tasks and totals for `actor`
    ///
    /// Assigned tasks only count in projects the actor still belongs to.
    pub async fn dashboard(&self, actor: &str) -> CoreResult<Dashboard> {
        let projects = self.member_projects(actor).await?;

        let mut dashboard_projects = Vec::with_capacity(projects.len());
        for project in &projects {
            let team = self.store.list_memberships(project.id).await?;
            let Some(role) = team.iter().find(|m| m.username == actor).map(|m| m.role) else {
                continue;
            };
            let task_count = self.store.count_tasks(&TaskFilter::project(project.id)).await?;

            dashboard_projects.push(DashboardProject {
                id: project.id,
                name: project.name.clone(),
                status: project.status,
                progress: project.progress,
                user_role: role,
                team_size: team.len(),
                task_count,
            });
        }

        let names: HashMap<Uuid, &str> = projects.iter().map(|p| (p.id, p.name.as_str())).collect();
        let my_tasks: Vec<TaskWithProject> = self
            .store
            .query_tasks(&TaskFilter::default().with_assignee(actor))
            .await?
            .into_iter()
            .filter_map(|task| {
                let project_name = names.get(&task.project_id)?.to_string();
                Some(TaskWithProject { task, project_name })
            })
            .collect();

        let statistics = DashboardStats {
            total_projects: dashboard_projects.len(),
            total_assigned_tasks: my_tasks.len(),
            completed_tasks: my_tasks
                .iter()
                .filter(|t| t.task.status == TaskStatus::Completed)
                .count(),
            in_progress_tasks: my_tasks
                .iter()
                .filter(|t| t.task.status == TaskStatus::InProgress)
                .count(),
        };

        Ok(Dashboard {
            projects: dashboard_projects,
            my_tasks,
            statistics,
        })
    }

    /// Most recently updated tasks across the actor's projects
    pub async fn recent_activity(&self, actor: &str, limit: usize) -> CoreResult<Vec<TaskWithProject>> {
        let projects = self.member_projects(actor).await?;

        let mut activity = Vec::new();
        for project in projects {
            let tasks = self.store.query_tasks(&TaskFilter::project(project.id)).await?;
            activity.extend(tasks.into_iter().map(|task| TaskWithProject {
                task,
                project_name: project.name.clone(),
            }));
        }

        activity.sort_by(|a, b| b.task.updated_at.cmp(&a.task.updated_at));
        activity.truncate(limit);
        Ok(activity)
    }
}
