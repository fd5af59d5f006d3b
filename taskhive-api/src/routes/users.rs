/// User directory endpoints
///
/// Accounts are provisioned externally; these endpoints read the
/// directory and manage global role assignments.
///
/// # Endpoints
///
/// - `GET /v1/users` - List users (filters: is_active, department, search)
/// - `GET /v1/users/:id` - Fetch a user
/// - `PUT /v1/users/:id/roles` - Replace a user's global roles

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskhive_shared::auth::{policy, Actor};
use taskhive_shared::models::{User, UserFilter};
use uuid::Uuid;

/// Role assignment request
#[derive(Debug, Deserialize)]
pub struct SetRolesRequest {
    pub role_ids: Vec<Uuid>,
}

/// User with resolved role slugs
#[derive(Debug, Serialize)]
pub struct UserWithRoles {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<String>,
}

/// Lists users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<UserFilter>,
) -> ApiResult<Json<Vec<User>>> {
    policy::require_permission(&actor, "users.read")?;

    let users = User::list(&state.db, &filter).await?;

    Ok(Json(users))
}

/// Fetches a user with their role slugs
pub async fn get_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserWithRoles>> {
    policy::require_permission(&actor, "users.read")?;

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let roles = User::role_slugs(&state.db, id).await?;

    Ok(Json(UserWithRoles { user, roles }))
}

/// Replaces a user's global role assignments
pub async fn set_user_roles(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetRolesRequest>,
) -> ApiResult<Json<UserWithRoles>> {
    policy::require_permission(&actor, "users.manage")?;

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    User::set_roles(&state.db, id, &req.role_ids).await?;

    tracing::info!(user_id = %id, roles = req.role_ids.len(), actor = %actor.id(),
                   "user roles replaced");

    let roles = User::role_slugs(&state.db, id).await?;

    Ok(Json(UserWithRoles { user, roles }))
}
