/// Analytics endpoints
///
/// - `GET /v1/projects/:project_id/analytics`
/// - `GET /v1/projects/:project_id/analytics/timeline?days=N`
/// - `GET /v1/projects/:project_id/analytics/members/:username`
///
/// The aggregator does not check permissions, so every handler authorizes
/// first. Project analytics and the timeline need `view_analytics`; member
/// analytics are also open to the member themself.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use teamboard_shared::auth::middleware::AuthContext;
use teamboard_shared::auth::permissions::Permission;
use teamboard_shared::services::analytics::{
    MemberAnalytics, ProjectAnalytics, TimelineEntry, DEFAULT_TIMELINE_DAYS,
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct TimelineQuery {
    #[validate(range(min = 1, max = 365, message = "Days must be between 1 and 365"))]
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub project_id: Uuid,
    pub days: u32,
    pub timeline: Vec<TimelineEntry>,
}

pub async fn project_analytics(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectAnalytics>> {
    state
        .services
        .evaluator
        .require(&auth.username, project_id, Permission::ViewAnalytics, None)
        .await?;

    let analytics = state.services.analytics.project_analytics(project_id).await?;
    Ok(Json(analytics))
}

/// Daily created/completed counts ending today (UTC)
///
/// # Errors
///
/// - `422 Unprocessable Entity`: `days` outside 1..=365
pub async fn timeline(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<TimelineQuery>,
) -> ApiResult<Json<TimelineResponse>> {
    query.validate()?;
    let days = query.days.unwrap_or(DEFAULT_TIMELINE_DAYS);

    state
        .services
        .evaluator
        .require(&auth.username, project_id, Permission::ViewAnalytics, None)
        .await?;

    let timeline = state
        .services
        .analytics
        .timeline(project_id, days, Utc::now().date_naive())
        .await?;

    Ok(Json(TimelineResponse {
        project_id,
        days,
        timeline,
    }))
}

/// One member's statistics
///
/// Members without `view_analytics` can still read their own.
pub async fn member_analytics(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((project_id, username)): Path<(Uuid, String)>,
) -> ApiResult<Json<MemberAnalytics>> {
    let permission = if auth.username == username {
        Permission::ViewProject
    } else {
        Permission::ViewAnalytics
    };

    state
        .services
        .evaluator
        .require(&auth.username, project_id, permission, None)
        .await?;

    let analytics = state
        .services
        .analytics
        .member_analytics(project_id, &username)
        .await?;
    Ok(Json(analytics))
}
