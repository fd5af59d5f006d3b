/// Category service
///
/// Creation requires `categories.manage`; edits and deletion additionally
/// require being the creator or a global admin.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::{policy, Actor};
use crate::models::{Category, CategoryWithCounts, CreateCategory, UpdateCategory};
use crate::services::error::ServiceError;

/// Category service
#[derive(Debug, Clone)]
pub struct CategoryService {
    pool: PgPool,
}

/// Input for creating a category through the service
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl CategoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists categories with their task counts
    pub async fn list(&self, actor: &Actor) -> Result<Vec<CategoryWithCounts>, ServiceError> {
        policy::require_permission(actor, "categories.read")?;

        let categories = Category::list_with_counts(&self.pool).await?;

        Ok(categories)
    }

    /// Fetches a single category
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Category, ServiceError> {
        policy::require_permission(actor, "categories.read")?;

        Category::find_by_id(&self.pool, id)
            .await?
            .ok_or(ServiceError::NotFound("Category"))
    }

    /// Creates a category owned by the actor
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateCategoryInput,
    ) -> Result<Category, ServiceError> {
        policy::require_permission(actor, "categories.manage")?;

        let category = Category::create(
            &self.pool,
            CreateCategory {
                name: input.name,
                description: input.description,
                color: input.color,
                icon: input.icon,
                created_by: actor.id(),
            },
        )
        .await?;

        info!(category_id = %category.id, actor = %actor.id(), "category created");

        Ok(category)
    }

    /// Updates a category
    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        data: UpdateCategory,
    ) -> Result<Category, ServiceError> {
        policy::require_permission(actor, "categories.manage")?;

        let category = Category::find_by_id(&self.pool, id)
            .await?
            .ok_or(ServiceError::NotFound("Category"))?;

        policy::require_category_edit(actor, &category)?;

        let updated = Category::update(&self.pool, id, data)
            .await?
            .ok_or(ServiceError::NotFound("Category"))?;

        info!(category_id = %id, actor = %actor.id(), "category updated");

        Ok(updated)
    }

    /// Deletes a category; its tasks are kept and detached
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), ServiceError> {
        policy::require_permission(actor, "categories.manage")?;

        let category = Category::find_by_id(&self.pool, id)
            .await?
            .ok_or(ServiceError::NotFound("Category"))?;

        policy::require_category_edit(actor, &category)?;

        Category::delete(&self.pool, id).await?;

        info!(category_id = %id, actor = %actor.id(), "category deleted");

        Ok(())
    }
}
