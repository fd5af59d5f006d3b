/// User model and role/permission lookups
///
/// Accounts are provisioned externally; this crate reads them and manages
/// their global role assignments. A user's effective permissions are the
/// union of the permissions of all roles they hold.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email CITEXT NOT NULL UNIQUE,
///     name VARCHAR(255) NOT NULL,
///     username VARCHAR(100) UNIQUE,
///     avatar_url VARCHAR(512),
///     bio TEXT,
///     phone VARCHAR(50),
///     position VARCHAR(100),
///     department VARCHAR(100),
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     last_login_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// User model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address (case-insensitive unique)
    pub email: String,

    /// Display name
    pub name: String,

    /// Optional handle
    pub username: Option<String>,

    /// Avatar image URL
    pub avatar_url: Option<String>,

    /// Short bio
    pub bio: Option<String>,

    /// Phone number
    pub phone: Option<String>,

    /// Job title
    pub position: Option<String>,

    /// Department name
    pub department: Option<String>,

    /// Inactive users cannot authenticate
    pub is_active: bool,

    /// Last successful login
    pub last_login_at: Option<DateTime<Utc>>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Filters for listing users
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    /// Filter by active flag
    pub is_active: Option<bool>,

    /// Filter by department (exact match)
    pub department: Option<String>,

    /// Case-insensitive search against name, email and username
    pub search: Option<String>,
}

const USER_COLUMNS: &str = "id, email, name, username, avatar_url, bio, phone, position, \
     department, is_active, last_login_at, created_at, updated_at";

impl User {
    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Finds a user by email (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    /// Lists users with optional filters, newest first
    pub async fn list(pool: &PgPool, filter: &UserFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = format!("SELECT {USER_COLUMNS} FROM users WHERE 1=1");
        let mut bind_count = 0;

        if filter.is_active.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND is_active = ${bind_count}"));
        }
        if filter.department.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND department = ${bind_count}"));
        }
        if filter.search.is_some() {
            bind_count += 1;
            query.push_str(&format!(
                " AND (name ILIKE ${bind_count} OR email::text ILIKE ${bind_count} \
                 OR username ILIKE ${bind_count})"
            ));
        }

        query.push_str(" ORDER BY created_at DESC");

        let mut q = sqlx::query_as::<_, User>(&query);

        if let Some(is_active) = filter.is_active {
            q = q.bind(is_active);
        }
        if let Some(department) = &filter.department {
            q = q.bind(department.clone());
        }
        if let Some(search) = &filter.search {
            q = q.bind(format!("%{search}%"));
        }

        let users = q.fetch_all(pool).await?;

        Ok(users)
    }

    /// How many of the given IDs exist
    ///
    /// Used to validate member-id sets before roster mutations.
    pub async fn count_existing(
        executor: impl PgExecutor<'_>,
        ids: &[Uuid],
    ) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_one(executor)
            .await?;

        Ok(count)
    }

    /// Slugs of the global roles the user holds
    pub async fn role_slugs(pool: &PgPool, user_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
        let slugs: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT r.slug
            FROM roles r
            INNER JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.slug
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(slugs)
    }

    /// Union of permission slugs across all of the user's roles
    pub async fn permission_slugs(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<String>, sqlx::Error> {
        let slugs: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT p.slug
            FROM permissions p
            INNER JOIN role_permissions rp ON rp.permission_id = p.id
            INNER JOIN user_roles ur ON ur.role_id = rp.role_id
            WHERE ur.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(slugs)
    }

    /// Replaces the user's global role assignments
    pub async fn set_roles(
        pool: &PgPool,
        user_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id)
             SELECT $1, id FROM roles WHERE id = ANY($2)",
        )
        .bind(user_id)
        .bind(role_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Stamps the user's last successful login
    pub async fn update_last_login(pool: &PgPool, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_filter_default_is_empty() {
        let filter = UserFilter::default();
        assert!(filter.is_active.is_none());
        assert!(filter.department.is_none());
        assert!(filter.search.is_none());
    }
}
