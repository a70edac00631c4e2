/// Progress calculator
///
/// A project's progress is recomputed from its tasks every time a task is
/// created, deleted or changes status. It is never incremented in place.
///
/// Rounding is half up: 1/3 → 33, 2/3 → 67, 1/8 → 13.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::models::project::UpdateProject;
use crate::models::task::{TaskFilter, TaskStatus};
use crate::store::Store;

/// `round(100 * completed / total)`, half up, 0 for an empty project
pub fn percentage(completed: i64, total: i64) -> i32 {
    if total <= 0 {
        return 0;
    }
    let completed = completed.clamp(0, total);
    ((200 * completed + total) / (2 * total)) as i32
}

/// Recomputes and persists project progress
#[derive(Clone)]
pub struct ProgressCalculator {
    store: Arc<dyn Store>,
}

impl ProgressCalculator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Counts the project's tasks, writes the percentage and returns it
    ///
    /// Idempotent: with no task change in between, repeated calls return
    /// the same value.
    ///
    /// # Errors
    ///
    /// `CoreError::NotFound` if the project no longer exists.
    pub async fn recompute(&self, project_id: Uuid) -> CoreResult<i32> {
        let all = TaskFilter::project(project_id);
        let total = self.store.count_tasks(&all).await?;
        let completed = self
            .store
            .count_tasks(&all.with_status(TaskStatus::Completed))
            .await?;

        let progress = percentage(completed, total);

        let update = UpdateProject {
            progress: Some(progress),
            ..Default::default()
        };
        self.store
            .update_project(project_id, update)
            .await?
            .ok_or_else(|| CoreError::project_not_found(project_id))?;

        debug!(%project_id, completed, total, progress, "Recomputed project progress");
        Ok(progress)
    }
}
