/// Task endpoints
///
/// # Endpoints
///
/// - `GET    /v1/tasks` - List visible tasks (filterable, paginated)
/// - `POST   /v1/tasks` - Create a task
/// - `GET    /v1/tasks/:id` - Fetch a task
/// - `PUT    /v1/tasks/:id` - Generic field update
/// - `DELETE /v1/tasks/:id` - Delete a task
/// - `PATCH  /v1/tasks/:id/complete` - Mark completed
/// - `PATCH  /v1/tasks/:id/start` - Mark in progress
/// - `PATCH  /v1/tasks/:id/cancel` - Mark cancelled

use crate::{
    app::AppState,
    error::{validation_error, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use taskhive_shared::auth::Actor;
use taskhive_shared::models::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask};
use taskhive_shared::services::{Page, TaskFilter};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status (defaults to pending)
    pub status: Option<TaskStatus>,

    /// Priority (defaults to medium)
    pub priority: Option<TaskPriority>,

    /// Optional due date
    pub due_date: Option<NaiveDate>,

    /// Optional assignee
    pub assigned_to: Option<Uuid>,

    /// Optional category
    pub category_id: Option<Uuid>,

    /// Optional team
    pub team_id: Option<Uuid>,

    /// Estimated effort in hours
    #[validate(range(min = 0.0, message = "Estimated hours must not be negative"))]
    pub estimated_hours: Option<f64>,

    /// Free-form tags
    pub tags: Option<JsonValue>,
}

/// Update task request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    #[validate(range(min = 0.0, message = "Estimated hours must not be negative"))]
    pub estimated_hours: Option<f64>,
    #[validate(range(min = 0.0, message = "Actual hours must not be negative"))]
    pub actual_hours: Option<f64>,
    pub tags: Option<JsonValue>,
    pub attachments: Option<JsonValue>,
}

impl From<UpdateTaskRequest> for UpdateTask {
    fn from(req: UpdateTaskRequest) -> Self {
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            assigned_to: req.assigned_to,
            category_id: req.category_id,
            team_id: req.team_id,
            estimated_hours: req.estimated_hours,
            actual_hours: req.actual_hours,
            tags: req.tags,
            attachments: req.attachments,
        }
    }
}

/// Lists tasks visible to the actor
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(filter): Query<TaskFilter>,
) -> ApiResult<Json<Page<Task>>> {
    let page = state.tasks.list(&actor, &filter).await?;

    Ok(Json(page))
}

/// Creates a task
pub async fn create_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate().map_err(validation_error)?;

    let data = CreateTask {
        title: req.title,
        description: req.description,
        status: req.status.unwrap_or(TaskStatus::Pending),
        priority: req.priority.unwrap_or(TaskPriority::Medium),
        due_date: req.due_date,
        created_by: actor.id(),
        assigned_to: req.assigned_to,
        category_id: req.category_id,
        team_id: req.team_id,
        estimated_hours: req.estimated_hours,
        tags: req.tags.unwrap_or_else(|| JsonValue::Array(Vec::new())),
    };

    let task = state.tasks.create(&actor, data).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// Fetches a task by ID
pub async fn get_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = state.tasks.get(&actor, id).await?;

    Ok(Json(task))
}

/// Applies a generic field update
pub async fn update_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate().map_err(validation_error)?;

    let task = state.tasks.update(&actor, id, req.into()).await?;

    Ok(Json(task))
}

/// Deletes a task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.tasks.delete(&actor, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Marks a task completed
pub async fn mark_completed(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = state.tasks.mark_completed(&actor, id).await?;

    Ok(Json(task))
}

/// Marks a task in progress
pub async fn mark_in_progress(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = state.tasks.mark_in_progress(&actor, id).await?;

    Ok(Json(task))
}

/// Marks a task cancelled
pub async fn mark_cancelled(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = state.tasks.mark_cancelled(&actor, id).await?;

    Ok(Json(task))
}
