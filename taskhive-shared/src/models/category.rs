/// Category model
///
/// Flat task categorisation with display metadata. Editing and deletion are
/// restricted to the creator or a global admin; the policy module holds
/// that rule.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE categories (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     color VARCHAR(50),
///     icon VARCHAR(100),
///     created_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Category model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    /// Unique category ID
    pub id: Uuid,

    /// Category name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Display color
    pub color: Option<String>,

    /// Display icon name
    pub icon: Option<String>,

    /// Creator (null after the creator account is deleted)
    pub created_by: Option<Uuid>,

    /// Whether the category is selectable for new tasks
    pub is_active: bool,

    /// When the category was created
    pub created_at: DateTime<Utc>,

    /// When the category was last updated
    pub updated_at: DateTime<Utc>,
}

/// Category with per-status task counts, for listings
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryWithCounts {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_by: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Total tasks in the category
    pub task_count: i64,

    /// Completed tasks in the category
    pub completed_count: i64,
}

impl CategoryWithCounts {
    /// Share of the category's tasks that are completed, 0 when empty
    pub fn completion_percentage(&self) -> f64 {
        if self.task_count == 0 {
            return 0.0;
        }

        (self.completed_count as f64 / self.task_count as f64) * 100.0
    }
}

/// Input for creating a category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub created_by: Uuid,
}

/// Input for updating a category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
}

const CATEGORY_COLUMNS: &str =
    "id, name, description, color, icon, created_by, is_active, created_at, updated_at";

impl Category {
    /// Creates a category
    pub async fn create(pool: &PgPool, data: CreateCategory) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO categories (name, description, color, icon, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CATEGORY_COLUMNS}
            "#
        );

        let category = sqlx::query_as::<_, Category>(&query)
            .bind(data.name)
            .bind(data.description)
            .bind(data.color)
            .bind(data.icon)
            .bind(data.created_by)
            .fetch_one(pool)
            .await?;

        Ok(category)
    }

    /// Finds a category by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");

        let category = sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(category)
    }

    /// Lists categories with task counts, alphabetically
    pub async fn list_with_counts(pool: &PgPool) -> Result<Vec<CategoryWithCounts>, sqlx::Error> {
        let categories = sqlx::query_as::<_, CategoryWithCounts>(
            r#"
            SELECT c.id, c.name, c.description, c.color, c.icon, c.created_by,
                   c.is_active, c.created_at, c.updated_at,
                   COUNT(t.id) AS task_count,
                   COUNT(t.id) FILTER (WHERE t.status = 'completed') AS completed_count
            FROM categories c
            LEFT JOIN tasks t ON t.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(categories)
    }

    /// Updates category fields, leaving absent fields untouched
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateCategory,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE categories SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${bind_count}"));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${bind_count}"));
        }
        if data.color.is_some() {
            bind_count += 1;
            query.push_str(&format!(", color = ${bind_count}"));
        }
        if data.icon.is_some() {
            bind_count += 1;
            query.push_str(&format!(", icon = ${bind_count}"));
        }
        if data.is_active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_active = ${bind_count}"));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {CATEGORY_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Category>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(color) = data.color {
            q = q.bind(color);
        }
        if let Some(icon) = data.icon {
            q = q.bind(icon);
        }
        if let Some(is_active) = data.is_active {
            q = q.bind(is_active);
        }

        let category = q.fetch_optional(pool).await?;

        Ok(category)
    }

    /// Deletes a category; tasks keep existing with a null category
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(task_count: i64, completed_count: i64) -> CategoryWithCounts {
        CategoryWithCounts {
            id: Uuid::new_v4(),
            name: "Backend".to_string(),
            description: None,
            color: None,
            icon: None,
            created_by: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            task_count,
            completed_count,
        }
    }

    #[test]
    fn test_completion_percentage() {
        assert_eq!(sample(0, 0).completion_percentage(), 0.0);
        assert_eq!(sample(4, 1).completion_percentage(), 25.0);
        assert_eq!(sample(4, 4).completion_percentage(), 100.0);
    }
}
