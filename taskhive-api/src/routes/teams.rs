/// Team and roster endpoints
///
/// # Endpoints
///
/// - `GET    /v1/teams` - List teams (filterable, paginated)
/// - `POST   /v1/teams` - Create a team (actor becomes owner)
/// - `GET    /v1/teams/:id` - Fetch a team
/// - `PUT    /v1/teams/:id` - Update team settings
/// - `DELETE /v1/teams/:id` - Delete a team
/// - `GET    /v1/teams/:id/members` - List the roster
/// - `POST   /v1/teams/:id/members` - Add members
/// - `DELETE /v1/teams/:id/members` - Remove members
/// - `PATCH  /v1/teams/:id/members/:user_id/role` - Change a member's role
/// - `POST   /v1/teams/:id/transfer-ownership` - Transfer ownership

use crate::{
    app::AppState,
    error::{validation_error, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskhive_shared::auth::Actor;
use taskhive_shared::models::{Team, TeamMember, TeamMemberDetail, TeamRole, UpdateTeam};
use taskhive_shared::services::{CreateTeamInput, Page, TeamFilter};
use uuid::Uuid;
use validator::Validate;

/// Create team request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    /// Team name
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Display color
    pub color: Option<String>,

    /// Initial members, attached with the member role
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

/// Update team request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTeamRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
}

/// Roster mutation request: a non-empty set of user IDs
#[derive(Debug, Deserialize, Validate)]
pub struct MemberIdsRequest {
    #[validate(length(min = 1, message = "At least one user ID is required"))]
    pub user_ids: Vec<Uuid>,
}

/// Role change request
#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: TeamRole,
}

/// Ownership transfer request
#[derive(Debug, Deserialize)]
pub struct TransferOwnershipRequest {
    pub new_owner_id: Uuid,
}

/// Removal response
#[derive(Debug, Serialize)]
pub struct RemoveMembersResponse {
    pub removed: u64,
}

/// Lists teams
pub async fn list_teams(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<TeamFilter>,
) -> ApiResult<Json<Page<Team>>> {
    let page = state.teams.list(&actor, &filter).await?;

    Ok(Json(page))
}

/// Creates a team with the actor as owner
pub async fn create_team(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateTeamRequest>,
) -> ApiResult<(StatusCode, Json<Team>)> {
    req.validate().map_err(validation_error)?;

    let team = state
        .teams
        .create_team(
            &actor,
            CreateTeamInput {
                name: req.name,
                description: req.description,
                color: req.color,
                member_ids: req.member_ids,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(team)))
}

/// Fetches a team by ID
pub async fn get_team(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Team>> {
    let team = state.teams.get(&actor, id).await?;

    Ok(Json(team))
}

/// Updates team settings
pub async fn update_team(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTeamRequest>,
) -> ApiResult<Json<Team>> {
    req.validate().map_err(validation_error)?;

    let team = state
        .teams
        .update(
            &actor,
            id,
            UpdateTeam {
                name: req.name,
                description: req.description,
                color: req.color,
                is_active: req.is_active,
            },
        )
        .await?;

    Ok(Json(team))
}

/// Deletes a team
pub async fn delete_team(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.teams.delete_team(&actor, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists the team roster
pub async fn list_members(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<TeamMemberDetail>>> {
    let members = state.teams.members(&actor, id).await?;

    Ok(Json(members))
}

/// Adds members to the roster
pub async fn add_members(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<MemberIdsRequest>,
) -> ApiResult<Json<Vec<TeamMemberDetail>>> {
    req.validate().map_err(validation_error)?;

    let members = state.teams.add_members(&actor, id, &req.user_ids).await?;

    Ok(Json(members))
}

/// Removes members from the roster
pub async fn remove_members(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<MemberIdsRequest>,
) -> ApiResult<Json<RemoveMembersResponse>> {
    req.validate().map_err(validation_error)?;

    let removed = state.teams.remove_members(&actor, id, &req.user_ids).await?;

    Ok(Json(RemoveMembersResponse { removed }))
}

/// Changes a member's role within the team
pub async fn change_member_role(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ChangeRoleRequest>,
) -> ApiResult<Json<TeamMember>> {
    let member = state
        .teams
        .change_member_role(&actor, id, user_id, req.role)
        .await?;

    Ok(Json(member))
}

/// Transfers team ownership to another member
pub async fn transfer_ownership(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<TransferOwnershipRequest>,
) -> ApiResult<Json<Team>> {
    let team = state
        .teams
        .transfer_ownership(&actor, id, req.new_owner_id)
        .await?;

    Ok(Json(team))
}
