/// Dashboard endpoint
///
/// Aggregate counts for the landing view. Task counts respect the actor's
/// visibility window; team counts are global.
///
/// # Endpoint
///
/// ```text
/// GET /v1/dashboard
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use serde::Serialize;
use taskhive_shared::auth::Actor;
use taskhive_shared::services::{TaskStats, TeamStats};

/// Combined dashboard statistics
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub tasks: TaskStats,
    pub teams: TeamStats,
}

/// Dashboard stats handler
pub async fn dashboard_stats(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<DashboardResponse>> {
    let tasks = state.tasks.stats(&actor).await?;
    let teams = state.teams.stats(&actor).await?;

    Ok(Json(DashboardResponse { tasks, teams }))
}
