/// Category endpoints
///
/// # Endpoints
///
/// - `GET    /v1/categories` - List categories with task counts
/// - `POST   /v1/categories` - Create a category
/// - `GET    /v1/categories/:id` - Fetch a category
/// - `PUT    /v1/categories/:id` - Update a category
/// - `DELETE /v1/categories/:id` - Delete a category

use crate::{
    app::AppState,
    error::{validation_error, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use taskhive_shared::auth::Actor;
use taskhive_shared::models::{Category, CategoryWithCounts, UpdateCategory};
use taskhive_shared::services::CreateCategoryInput;
use uuid::Uuid;
use validator::Validate;

/// Create category request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Update category request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
}

/// Lists categories with task counts
pub async fn list_categories(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<Vec<CategoryWithCounts>>> {
    let categories = state.categories.list(&actor).await?;

    Ok(Json(categories))
}

/// Creates a category
pub async fn create_category(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    req.validate().map_err(validation_error)?;

    let category = state
        .categories
        .create(
            &actor,
            CreateCategoryInput {
                name: req.name,
                description: req.description,
                color: req.color,
                icon: req.icon,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Fetches a category by ID
pub async fn get_category(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Category>> {
    let category = state.categories.get(&actor, id).await?;

    Ok(Json(category))
}

/// Updates a category
pub async fn update_category(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCategoryRequest>,
) -> ApiResult<Json<Category>> {
    req.validate().map_err(validation_error)?;

    let category = state
        .categories
        .update(
            &actor,
            id,
            UpdateCategory {
                name: req.name,
                description: req.description,
                color: req.color,
                icon: req.icon,
                is_active: req.is_active,
            },
        )
        .await?;

    Ok(Json(category))
}

/// Deletes a category
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.categories.delete(&actor, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
