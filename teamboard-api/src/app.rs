/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use teamboard_api::{app::{build_router, AppState}, config::Config};
/// use teamboard_shared::store::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use teamboard_shared::auth::{middleware::create_jwt_middleware, permissions::RoleRegistry};
use teamboard_shared::services::Services;
use teamboard_shared::store::Store;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Domain services over the configured store
    pub services: Services,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the services to `store` with the built-in role table
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            services: Services::new(store, Arc::new(RoleRegistry::new())),
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token verification
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health                                  (public)
/// └── /v1/                                         (JWT required)
///     ├── /projects                                GET, POST
///     │   └── /:project_id                         GET, PUT, DELETE
///     │       ├── /members                         GET, POST
///     │       │   └── /:username                   GET, PUT, DELETE
///     │       │       └── /permissions             GET
///     │       ├── /tasks                           GET, POST
///     │       │   └── /:task_id                    GET, PUT, DELETE
///     │       │       ├── /status                  PATCH
///     │       │       └── /assignee                PUT
///     │       ├── /progress                        POST
///     │       └── /analytics                       GET
///     │           ├── /timeline                    GET
///     │           └── /members/:username           GET
///     └── /dashboard                               GET
///         └── /activity                            GET
/// ```
///
/// Middleware, outermost first: security headers, CORS, tracing, then JWT
/// authentication on `/v1` only.
pub fn build_router(state: AppState) -> Router {
    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/:project_id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/:project_id/progress", post(routes::projects::recompute_progress))
        .route(
            "/:project_id/members",
            get(routes::members::list_members).post(routes::members::add_member),
        )
        .route(
            "/:project_id/members/:username",
            get(routes::members::get_member)
                .put(routes::members::update_member_role)
                .delete(routes::members::remove_member),
        )
        .route(
            "/:project_id/members/:username/permissions",
            get(routes::members::member_permissions),
        )
        .route(
            "/:project_id/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:project_id/tasks/:task_id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:project_id/tasks/:task_id/status", patch(routes::tasks::transition_task))
        .route("/:project_id/tasks/:task_id/assignee", put(routes::tasks::assign_task))
        .route("/:project_id/analytics", get(routes::analytics::project_analytics))
        .route("/:project_id/analytics/timeline", get(routes::analytics::timeline))
        .route(
            "/:project_id/analytics/members/:username",
            get(routes::analytics::member_analytics),
        );

    let dashboard_routes = Router::new()
        .route("/", get(routes::dashboard::dashboard))
        .route("/activity", get(routes::dashboard::recent_activity));

    let v1_routes = Router::new()
        .nest("/projects", project_routes)
        .nest("/dashboard", dashboard_routes)
        .layer(axum::middleware::from_fn(create_jwt_middleware(
            state.jwt_secret().to_string(),
        )));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
