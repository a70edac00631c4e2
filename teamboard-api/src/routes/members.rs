/// Team membership endpoints
///
/// - `GET    /v1/projects/:project_id/members`
/// - `POST   /v1/projects/:project_id/members`
/// - `GET    /v1/projects/:project_id/members/:username`
/// - `PUT    /v1/projects/:project_id/members/:username`
/// - `DELETE /v1/projects/:project_id/members/:username`
/// - `GET    /v1/projects/:project_id/members/:username/permissions`
///
/// Roles arrive as strings so that an unknown role is reported as
/// `400 invalid role` rather than a body deserialization failure.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use teamboard_shared::auth::middleware::AuthContext;
use teamboard_shared::models::membership::{Membership, Role};
use teamboard_shared::services::team::MemberPermissions;
use uuid::Uuid;
use validator::Validate;

/// Add member request
#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    #[validate(length(min = 1, max = 100, message = "Username must be 1-100 characters"))]
    pub username: String,

    /// One of manager, developer, viewer (default developer)
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct ListMembersResponse {
    pub members: Vec<Membership>,
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ListMembersResponse>> {
    let members = state.services.team.list_members(&auth.username, project_id).await?;
    Ok(Json(ListMembersResponse { members }))
}

/// Add a member
///
/// ```text
/// POST /v1/projects/:project_id/members
///
/// { "username": "bob", "role": "developer" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: unknown role, or role `owner`
/// - `403 Forbidden`: caller lacks `add_member`
/// - `409 Conflict`: user is already a member
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<(StatusCode, Json<Membership>)> {
    req.validate()?;

    let role = match req.role.as_deref() {
        Some(role) => role.parse::<Role>()?,
        None => Role::Developer,
    };

    let membership = state
        .services
        .team
        .add_member(&auth.username, project_id, &req.username, role)
        .await?;

    Ok((StatusCode::CREATED, Json(membership)))
}

pub async fn get_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, username)): Path<(Uuid, String)>,
) -> ApiResult<Json<Membership>> {
    let member = state
        .services
        .team
        .get_member(&auth.username, project_id, &username)
        .await?;
    Ok(Json(member))
}

/// Change a member's role
///
/// The owner's role cannot be changed and no one can be made owner.
pub async fn update_member_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, username)): Path<(Uuid, String)>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<Membership>> {
    let role: Role = req.role.parse()?;

    let membership = state
        .services
        .team
        .update_member_role(&auth.username, project_id, &username, role)
        .await?;

    Ok(Json(membership))
}

/// Remove a member
///
/// Tasks assigned to the removed user keep their assignee.
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, username)): Path<(Uuid, String)>,
) -> ApiResult<StatusCode> {
    state
        .services
        .team
        .remove_member(&auth.username, project_id, &username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Role and effective permissions of one member
pub async fn member_permissions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, username)): Path<(Uuid, String)>,
) -> ApiResult<Json<MemberPermissions>> {
    let permissions = state
        .services
        .team
        .member_permissions(&auth.username, project_id, &username)
        .await?;
    Ok(Json(permissions))
}
