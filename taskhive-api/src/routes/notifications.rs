/// Notification trigger endpoints
///
/// Delivery is a logging stub; these endpoints let an external scheduler
/// (or an operator) kick off the periodic fan-outs on demand.
///
/// # Endpoints
///
/// - `POST /v1/notifications/overdue` - Notify about overdue tasks
/// - `POST /v1/notifications/daily-summary` - Per-user daily summaries
/// - `POST /v1/notifications/weekly-report` - Per-team weekly reports

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use serde::Serialize;
use taskhive_shared::auth::{policy, Actor};

/// Trigger response: how many notifications went out
#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub notified: usize,
}

/// Notifies assignees and creators of overdue tasks
pub async fn trigger_overdue(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<TriggerResponse>> {
    policy::require_permission(&actor, "reports.read")?;

    let notified = state.notifications.notify_overdue_tasks().await;

    Ok(Json(TriggerResponse { notified }))
}

/// Sends per-user daily summaries
pub async fn trigger_daily_summary(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<TriggerResponse>> {
    policy::require_permission(&actor, "reports.read")?;

    let notified = state.notifications.notify_daily_summary().await;

    Ok(Json(TriggerResponse { notified }))
}

/// Sends per-team weekly reports
pub async fn trigger_weekly_report(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<TriggerResponse>> {
    policy::require_permission(&actor, "reports.read")?;

    let notified = state.notifications.notify_weekly_report().await;

    Ok(Json(TriggerResponse { notified }))
}
