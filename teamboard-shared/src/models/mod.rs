/// Database models for Teamboard
///
/// This module contains the persisted entities and their PostgreSQL
/// operations. Services never call these directly; they go through the
/// [`Store`](crate::store::Store) trait so the in-memory backend can stand in.
///
/// # Models
///
/// - `project`: Projects with derived progress
/// - `membership`: (project, user, role) triples and the `Role` enum
/// - `task`: Tasks with status, priority and assignee
///
/// # Example
///
/// ```no_run
/// use teamboard_shared::models::membership::Membership;
/// use teamboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let team = Membership::list_by_project(&pool, project_id).await?;
/// println!("{} members", team.len());
/// # Ok(())
/// # }
/// ```

pub mod membership;
pub mod project;
pub mod task;
