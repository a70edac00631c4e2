/// Project endpoints
///
/// - `POST   /v1/projects` - Create a project (caller becomes owner)
/// - `GET    /v1/projects` - Projects the caller belongs to
/// - `GET    /v1/projects/:project_id` - Project with team
/// - `PUT    /v1/projects/:project_id` - Edit name, description or status
/// - `DELETE /v1/projects/:project_id` - Delete with tasks and memberships
/// - `POST   /v1/projects/:project_id/progress` - Recompute progress

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use teamboard_shared::auth::middleware::AuthContext;
use teamboard_shared::models::project::{Project, ProjectStatus};
use teamboard_shared::services::projects::{NewProject, ProjectChanges, ProjectSummary, ProjectWithTeam};
use uuid::Uuid;
use validator::Validate;

/// Create project request
///
/// Progress is derived from tasks and cannot be supplied.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub status: Option<ProjectStatus>,
}

/// Update project request; at least one field must be present
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Serialize)]
pub struct ListProjectsResponse {
    pub projects: Vec<ProjectSummary>,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub project_id: Uuid,
    pub progress: i32,
}

/// Create project
///
/// ```text
/// POST /v1/projects
/// Authorization: Bearer <jwt_token>
///
/// { "name": "Website relaunch", "description": "Q3", "status": "active" }
/// ```
///
/// Returns `201 Created` with the project.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    req.validate()?;

    let project = state
        .services
        .projects
        .create(
            &auth.username,
            NewProject {
                name: req.name,
                description: req.description,
                status: req.status.unwrap_or_default(),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(project)))
}

/// List the caller's projects, newest first
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ListProjectsResponse>> {
    let projects = state.services.projects.list(&auth.username).await?;
    Ok(Json(ListProjectsResponse { projects }))
}

/// Get one project with its team
///
/// # Errors
///
/// - `404 Not Found`: project missing or caller is not a member
pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectWithTeam>> {
    let project = state.services.projects.get(&auth.username, project_id).await?;
    Ok(Json(project))
}

/// Edit a project
///
/// # Errors
///
/// - `400 Bad Request`: empty update
/// - `403 Forbidden`: caller lacks `edit_project`
/// - `404 Not Found`: project missing or caller is not a member
/// - `422 Unprocessable Entity`: field validation failed
pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate()?;

    let project = state
        .services
        .projects
        .update(
            &auth.username,
            project_id,
            ProjectChanges {
                name: req.name,
                description: req.description,
                status: req.status,
            },
        )
        .await?;

    Ok(Json(project))
}

/// Delete a project; owner only
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.projects.delete(&auth.username, project_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Recompute and store the project's progress
pub async fn recompute_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProgressResponse>> {
    let progress = state
        .services
        .projects
        .recompute_progress(&auth.username, project_id)
        .await?;

    Ok(Json(ProgressResponse { project_id, progress }))
}
