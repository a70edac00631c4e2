/// Personal dashboard endpoints
///
/// - `GET /v1/dashboard`
/// - `GET /v1/dashboard/activity?limit=N`

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use teamboard_shared::auth::middleware::AuthContext;
use teamboard_shared::services::dashboard::{Dashboard, TaskWithProject, DEFAULT_ACTIVITY_LIMIT};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ActivityQuery {
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub activity: Vec<TaskWithProject>,
}

/// Projects, assigned tasks and totals for the caller
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Dashboard>> {
    let dashboard = state.services.dashboard.dashboard(&auth.username).await?;
    Ok(Json(dashboard))
}

/// Most recently updated tasks across the caller's projects
pub async fn recent_activity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ActivityQuery>,
) -> ApiResult<Json<ActivityResponse>> {
    query.validate()?;

    let activity = state
        .services
        .dashboard
        .recent_activity(&auth.username, query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT))
        .await?;

    Ok(Json(ActivityResponse { activity }))
}
