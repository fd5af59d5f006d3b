/// Role and permission models
///
/// Global roles carry sets of permission slugs; a user's effective
/// permissions are the union across their roles. Roles seeded by migration
/// are flagged `is_system` and cannot be modified or deleted through the
/// API; the role service enforces that.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE roles (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     slug VARCHAR(100) NOT NULL UNIQUE,
///     description TEXT,
///     is_system BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE permissions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     slug VARCHAR(100) NOT NULL UNIQUE,
///     description TEXT,
///     module VARCHAR(100) NOT NULL,
///     is_system BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Global role
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    /// Unique role ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Stable identifier used in policy checks
    pub slug: String,

    /// Optional description
    pub description: Option<String>,

    /// Seeded roles are immutable through the API
    pub is_system: bool,

    /// When the role was created
    pub created_at: DateTime<Utc>,

    /// When the role was last updated
    pub updated_at: DateTime<Utc>,
}

/// Permission
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Permission {
    /// Unique permission ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Stable slug, e.g. "tasks.assign"
    pub slug: String,

    /// Optional description
    pub description: Option<String>,

    /// Module the permission belongs to, e.g. "tasks"
    pub module: String,

    /// Seeded permissions are immutable
    pub is_system: bool,

    /// When the permission was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

/// Input for updating a role
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub description: Option<String>,
}

const ROLE_COLUMNS: &str = "id, name, slug, description, is_system, created_at, updated_at";
const PERMISSION_COLUMNS: &str = "id, name, slug, description, module, is_system, created_at";

impl Role {
    /// Lists all roles alphabetically by slug
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {ROLE_COLUMNS} FROM roles ORDER BY slug");

        let roles = sqlx::query_as::<_, Role>(&query).fetch_all(pool).await?;

        Ok(roles)
    }

    /// Finds a role by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1");

        let role = sqlx::query_as::<_, Role>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(role)
    }

    /// Creates a non-system role
    pub async fn create(pool: &PgPool, data: CreateRole) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO roles (name, slug, description, is_system)
            VALUES ($1, $2, $3, FALSE)
            RETURNING {ROLE_COLUMNS}
            "#
        );

        let role = sqlx::query_as::<_, Role>(&query)
            .bind(data.name)
            .bind(data.slug)
            .bind(data.description)
            .fetch_one(pool)
            .await?;

        Ok(role)
    }

    /// Updates a role's display fields (slug stays fixed)
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE roles SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${bind_count}"));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${bind_count}"));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {ROLE_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Role>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }

        let role = q.fetch_optional(pool).await?;

        Ok(role)
    }

    /// Deletes a role
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Permissions attached to the role
    pub async fn permissions(pool: &PgPool, role_id: Uuid) -> Result<Vec<Permission>, sqlx::Error> {
        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.id, p.name, p.slug, p.description, p.module, p.is_system, p.created_at
            FROM permissions p
            INNER JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            ORDER BY p.module, p.slug
            "#,
        )
        .bind(role_id)
        .fetch_all(pool)
        .await?;

        Ok(permissions)
    }

    /// Replaces the role's permission set
    pub async fn set_permissions(
        pool: &PgPool,
        role_id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO role_permissions (role_id, permission_id)
             SELECT $1, id FROM permissions WHERE id = ANY($2)",
        )
        .bind(role_id)
        .bind(permission_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }
}

impl Permission {
    /// Lists all permissions grouped by module then slug
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {PERMISSION_COLUMNS} FROM permissions ORDER BY module, slug");

        let permissions = sqlx::query_as::<_, Permission>(&query)
            .fetch_all(pool)
            .await?;

        Ok(permissions)
    }
}
