/// Task endpoints
///
/// - `GET    /v1/projects/:project_id/tasks?status=&assignee=`
/// - `POST   /v1/projects/:project_id/tasks`
/// - `GET    /v1/projects/:project_id/tasks/:task_id`
/// - `PUT    /v1/projects/:project_id/tasks/:task_id`
/// - `DELETE /v1/projects/:project_id/tasks/:task_id`
/// - `PATCH  /v1/projects/:project_id/tasks/:task_id/status`
/// - `PUT    /v1/projects/:project_id/tasks/:task_id/assignee`
///
/// Every response for an operation that can change task status carries the
/// project's recomputed `project_progress`.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use teamboard_shared::auth::middleware::AuthContext;
use teamboard_shared::models::task::{Task, TaskPriority, TaskStatus};
use teamboard_shared::services::tasks::{NewTask, TaskChange, TaskChanges, TaskQuery};
use uuid::Uuid;
use validator::Validate;

/// Distinguishes an absent field from an explicit `null`
fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub assignee: Option<String>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,
}

/// Edit task request
///
/// `"assignee": null` unassigns; omitting it leaves the assignee alone.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "explicit_null")]
    pub assignee: Option<Option<String>>,

    pub status: Option<TaskStatus>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    /// `null` unassigns
    pub assignee: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListTasksResponse {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub struct DeleteTaskResponse {
    pub task_id: Uuid,
    pub project_progress: i32,
}

/// List a project's tasks, newest first
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<TaskQuery>,
) -> ApiResult<Json<ListTasksResponse>> {
    let tasks = state
        .services
        .tasks
        .list(&auth.username, project_id, query)
        .await?;
    Ok(Json(ListTasksResponse { tasks }))
}

/// Create a task
///
/// ```text
/// POST /v1/projects/:project_id/tasks
///
/// { "title": "Write copy", "assignee": "bob", "priority": "high" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: assignee is not a project member
/// - `403 Forbidden`: caller lacks `create_task`, or `assign_task` when
///   assigning someone else
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskChange>)> {
    req.validate()?;

    let change = state
        .services
        .tasks
        .create(
            &auth.username,
            project_id,
            NewTask {
                title: req.title,
                description: req.description,
                assignee: req.assignee,
                status: req.status.unwrap_or_default(),
                priority: req.priority.unwrap_or_default(),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(change)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Task>> {
    let task = state
        .services
        .tasks
        .get(&auth.username, project_id, task_id)
        .await?;
    Ok(Json(task))
}

/// Edit a task
///
/// Developers may only edit tasks assigned to them.
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskChange>> {
    req.validate()?;

    let change = state
        .services
        .tasks
        .update(
            &auth.username,
            project_id,
            task_id,
            TaskChanges {
                title: req.title,
                description: req.description,
                priority: req.priority,
                assignee: req.assignee,
                status: req.status,
            },
        )
        .await?;

    Ok(Json(change))
}

/// Move a task to a new status
///
/// ```text
/// PATCH /v1/projects/:project_id/tasks/:task_id/status
///
/// { "status": "completed" }
/// ```
///
/// Response:
///
/// ```json
/// { "task": { ... }, "project_progress": 50 }
/// ```
pub async fn transition_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<TransitionRequest>,
) -> ApiResult<Json<TaskChange>> {
    let change = state
        .services
        .tasks
        .transition(&auth.username, project_id, task_id, req.status)
        .await?;
    Ok(Json(change))
}

/// Assign or unassign a task
pub async fn assign_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<AssignRequest>,
) -> ApiResult<Json<Task>> {
    let task = state
        .services
        .tasks
        .assign(&auth.username, project_id, task_id, req.assignee)
        .await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, task_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<DeleteTaskResponse>> {
    let project_progress = state
        .services
        .tasks
        .delete(&auth.username, project_id, task_id)
        .await?;

    Ok(Json(DeleteTaskResponse {
        task_id,
        project_progress,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_request_assignee_states() {
        let absent: UpdateTaskRequest = serde_json::from_value(json!({ "title": "x" })).unwrap();
        assert_eq!(absent.assignee, None);

        let cleared: UpdateTaskRequest = serde_json::from_value(json!({ "assignee": null })).unwrap();
        assert_eq!(cleared.assignee, Some(None));

        let set: UpdateTaskRequest = serde_json::from_value(json!({ "assignee": "bob" })).unwrap();
        assert_eq!(set.assignee, Some(Some("bob".to_string())));
    }

    #[test]
    fn test_create_request_validation() {
        let req: CreateTaskRequest = serde_json::from_value(json!({ "title": "" })).unwrap();
        assert!(req.validate().is_err());

        let req: CreateTaskRequest =
            serde_json::from_value(json!({ "title": "Ship", "status": "in_progress" })).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.status, Some(TaskStatus::InProgress));
    }
}
