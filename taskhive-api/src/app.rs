/// Application state and router builder
///
/// This module defines the shared application state and provides a
/// function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskhive_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskhive_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskhive_shared::auth::{jwt, Actor};
use taskhive_shared::services::{
    CategoryService, NotificationService, RoleService, TaskService, TeamService,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. The
/// services share the pool, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    pub tasks: TaskService,
    pub teams: TeamService,
    pub categories: CategoryService,
    pub roles: RoleService,
    pub notifications: NotificationService,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            tasks: TaskService::new(db.clone()),
            teams: TeamService::new(db.clone()),
            categories: CategoryService::new(db.clone()),
            roles: RoleService::new(db.clone()),
            notifications: NotificationService::new(db.clone()),
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token validation
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                        # Health check (public)
/// └── /v1/                           # API v1 (bearer-token auth)
///     ├── /tasks/                    # Task lifecycle
///     ├── /teams/                    # Teams and rosters
///     ├── /categories/               # Categories
///     ├── /users/                    # User directory and role assignment
///     ├── /roles/                    # Role and permission management
///     ├── /dashboard/                # Aggregate stats
///     └── /notifications/            # On-demand notification triggers
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (everything under /v1)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let task_routes = Router::new()
        .route("/", get(routes::tasks::list_tasks))
        .route("/", post(routes::tasks::create_task))
        .route("/:id", get(routes::tasks::get_task))
        .route("/:id", put(routes::tasks::update_task))
        .route("/:id", delete(routes::tasks::delete_task))
        .route("/:id/complete", patch(routes::tasks::mark_completed))
        .route("/:id/start", patch(routes::tasks::mark_in_progress))
        .route("/:id/cancel", patch(routes::tasks::mark_cancelled));

    let team_routes = Router::new()
        .route("/", get(routes::teams::list_teams))
        .route("/", post(routes::teams::create_team))
        .route("/:id", get(routes::teams::get_team))
        .route("/:id", put(routes::teams::update_team))
        .route("/:id", delete(routes::teams::delete_team))
        .route("/:id/members", get(routes::teams::list_members))
        .route("/:id/members", post(routes::teams::add_members))
        .route("/:id/members", delete(routes::teams::remove_members))
        .route("/:id/members/:user_id/role", patch(routes::teams::change_member_role))
        .route("/:id/transfer-ownership", post(routes::teams::transfer_ownership));

    let category_routes = Router::new()
        .route("/", get(routes::categories::list_categories))
        .route("/", post(routes::categories::create_category))
        .route("/:id", get(routes::categories::get_category))
        .route("/:id", put(routes::categories::update_category))
        .route("/:id", delete(routes::categories::delete_category));

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/:id", get(routes::users::get_user))
        .route("/:id/roles", put(routes::users::set_user_roles));

    let role_routes = Router::new()
        .route("/", get(routes::roles::list_roles))
        .route("/", post(routes::roles::create_role))
        .route("/permissions", get(routes::roles::list_permissions))
        .route("/:id", get(routes::roles::get_role))
        .route("/:id", put(routes::roles::update_role))
        .route("/:id", delete(routes::roles::delete_role))
        .route("/:id/permissions", put(routes::roles::set_role_permissions));

    let dashboard_routes = Router::new().route("/", get(routes::dashboard::dashboard_stats));

    let notification_routes = Router::new()
        .route("/overdue", post(routes::notifications::trigger_overdue))
        .route("/daily-summary", post(routes::notifications::trigger_daily_summary))
        .route("/weekly-report", post(routes::notifications::trigger_weekly_report));

    // Everything under /v1 requires a valid bearer token
    let v1_routes = Router::new()
        .nest("/tasks", task_routes)
        .nest("/teams", team_routes)
        .nest("/categories", category_routes)
        .nest("/users", user_routes)
        .nest("/roles", role_routes)
        .nest("/dashboard", dashboard_routes)
        .nest("/notifications", notification_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            actor_auth_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
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
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Actor-resolving authentication middleware
///
/// Validates the bearer token, loads the actor (user row, roles,
/// permission union) and injects it into request extensions. Unknown and
/// deactivated users are rejected even when their token is valid.
async fn actor_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        crate::error::ApiError::BadRequest("Expected Bearer token".to_string())
    })?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    let actor = Actor::load(&state.db, claims.sub)
        .await
        .map_err(crate::error::ApiError::from)?
        .ok_or_else(|| crate::error::ApiError::Unauthorized("Unknown user".to_string()))?;

    if !actor.user.is_active {
        return Err(crate::error::ApiError::Unauthorized(
            "Account is deactivated".to_string(),
        ));
    }

    req.extensions_mut().insert(actor);

    Ok(next.run(req).await)
}
