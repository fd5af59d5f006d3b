/// Role and permission endpoints
///
/// # Endpoints
///
/// - `GET    /v1/roles` - List roles
/// - `POST   /v1/roles` - Create a custom role
/// - `GET    /v1/roles/permissions` - List all permissions
/// - `GET    /v1/roles/:id` - Fetch a role with its permissions
/// - `PUT    /v1/roles/:id` - Update a custom role
/// - `DELETE /v1/roles/:id` - Delete a custom role
/// - `PUT    /v1/roles/:id/permissions` - Replace a role's permission set
///
/// Roles seeded by migration are immutable; mutation attempts get a 403.

use crate::{
    app::AppState,
    error::{validation_error, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskhive_shared::auth::Actor;
use taskhive_shared::models::{CreateRole, Permission, Role, UpdateRole};
use uuid::Uuid;
use validator::Validate;

/// Create role request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Stable identifier; lowercase with underscores
    #[validate(length(min = 1, max = 100, message = "Slug must be 1-100 characters"))]
    pub slug: String,

    pub description: Option<String>,
}

/// Update role request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Permission set request
#[derive(Debug, Deserialize)]
pub struct SetPermissionsRequest {
    pub permission_ids: Vec<Uuid>,
}

/// Role with its attached permissions
#[derive(Debug, Serialize)]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
}

/// Lists all roles
pub async fn list_roles(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<Role>>> {
    let roles = state.roles.list(&actor).await?;

    Ok(Json(roles))
}

/// Lists all permissions
pub async fn list_permissions(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<Permission>>> {
    let permissions = state.roles.list_permissions(&actor).await?;

    Ok(Json(permissions))
}

/// Fetches a role with its permissions
pub async fn get_role(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RoleWithPermissions>> {
    let (role, permissions) = state.roles.get(&actor, id).await?;

    Ok(Json(RoleWithPermissions { role, permissions }))
}

/// Creates a custom role
pub async fn create_role(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<Role>)> {
    req.validate().map_err(validation_error)?;

    let role = state
        .roles
        .create(
            &actor,
            CreateRole {
                name: req.name,
                slug: req.slug,
                description: req.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(role)))
}

/// Updates a custom role
pub async fn update_role(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<Role>> {
    req.validate().map_err(validation_error)?;

    let role = state
        .roles
        .update(
            &actor,
            id,
            UpdateRole {
                name: req.name,
                description: req.description,
            },
        )
        .await?;

    Ok(Json(role))
}

/// Deletes a custom role
pub async fn delete_role(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.roles.delete(&actor, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Replaces a role's permission set
pub async fn set_role_permissions(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetPermissionsRequest>,
) -> ApiResult<Json<Vec<Permission>>> {
    let permissions = state
        .roles
        .set_permissions(&actor, id, &req.permission_ids)
        .await?;

    Ok(Json(permissions))
}
