/// Business logic on top of the record store
///
/// Flow of a task mutation:
///
/// ```text
/// request → PermissionEvaluator → TaskStateMachine → Store
///                                        └──→ ProgressCalculator → Store
/// ```
///
/// Analytics are computed on demand and never written back.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use teamboard_shared::auth::permissions::RoleRegistry;
/// use teamboard_shared::models::membership::Role;
/// use teamboard_shared::services::{projects::NewProject, Services};
/// use teamboard_shared::store::MemoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let services = Services::new(Arc::new(MemoryStore::new()), Arc::new(RoleRegistry::new()));
///
/// let project = services
///     .projects
///     .create("alice", NewProject { name: "Apollo".into(), ..Default::default() })
///     .await?;
/// services.team.add_member("alice", project.id, "bob", Role::Developer).await?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use crate::auth::authorization::PermissionEvaluator;
use crate::auth::permissions::RoleRegistry;
use crate::store::Store;

pub mod analytics;
pub mod dashboard;
pub mod membership;
pub mod progress;
pub mod projects;
pub mod tasks;
pub mod team;

use analytics::AnalyticsAggregator;
use dashboard::DashboardService;
use progress::ProgressCalculator;
use projects::ProjectService;
use tasks::TaskStateMachine;
use team::TeamService;

/// Every service wired to one store and one role registry
#[derive(Clone)]
pub struct Services {
    pub evaluator: PermissionEvaluator,
    pub projects: ProjectService,
    pub team: TeamService,
    pub tasks: TaskStateMachine,
    pub progress: ProgressCalculator,
    pub analytics: AnalyticsAggregator,
    pub dashboard: DashboardService,
    store: Arc<dyn Store>,
}

impl Services {
    pub fn new(store: Arc<dyn Store>, registry: Arc<RoleRegistry>) -> Self {
        let evaluator = PermissionEvaluator::new(registry, store.clone());

        Self {
            projects: ProjectService::new(store.clone(), evaluator.clone()),
            team: TeamService::new(store.clone(), evaluator.clone()),
            tasks: TaskStateMachine::new(store.clone(), evaluator.clone()),
            progress: ProgressCalculator::new(store.clone()),
            analytics: AnalyticsAggregator::new(store.clone()),
            dashboard: DashboardService::new(store.clone()),
            evaluator,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }
}
