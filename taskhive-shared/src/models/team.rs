/// Team model, roster and membership roles
///
/// Teams group users for shared task visibility. The roster is a
/// many-to-many relationship with per-membership state (role, joined_at),
/// so it is modelled as an explicit join entity rather than a bare relation.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE team_role AS ENUM ('owner', 'admin', 'lead', 'member');
///
/// CREATE TABLE teams (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     owner_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     color VARCHAR(50),
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE team_members (
///     team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role team_role NOT NULL DEFAULT 'member',
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (team_id, user_id)
/// );
/// ```
///
/// Invariant: exactly one membership row carries the `owner` role, and it
/// belongs to the user referenced by `teams.owner_id`. The team service
/// maintains this across creation and ownership transfer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use std::fmt;
use uuid::Uuid;

/// Role a user holds within a specific team
///
/// Distinct from global roles: this is per-membership state. `owner` and
/// `admin` can manage the team; `lead` carries no extra rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "team_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    /// The single distinguished owner
    Owner,

    /// Can manage roster and team settings
    Admin,

    /// Honorific; no extra rights
    Lead,

    /// Regular member
    Member,
}

impl TeamRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Owner => "owner",
            TeamRole::Admin => "admin",
            TeamRole::Lead => "lead",
            TeamRole::Member => "member",
        }
    }

    /// Whether this membership role can manage the team
    pub fn can_manage(&self) -> bool {
        matches!(self, TeamRole::Owner | TeamRole::Admin)
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Team model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    /// Unique team ID
    pub id: Uuid,

    /// Team name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Distinguished owner (null only after the owner account is deleted)
    pub owner_id: Option<Uuid>,

    /// Display color
    pub color: Option<String>,

    /// Whether the team is active
    pub is_active: bool,

    /// When the team was created
    pub created_at: DateTime<Utc>,

    /// When the team was last updated
    pub updated_at: DateTime<Utc>,
}

/// Membership row: a user's place on a team roster
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamMember {
    /// Team ID
    pub team_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the team
    pub role: TeamRole,

    /// When the user joined
    pub joined_at: DateTime<Utc>,
}

/// Roster entry joined with user details, for listings
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TeamMemberDetail {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

/// Input for creating a new team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeam {
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub color: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Input for updating team fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTeam {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
}

const TEAM_COLUMNS: &str =
    "id, name, description, owner_id, color, is_active, created_at, updated_at";

impl Team {
    /// Creates a new team
    ///
    /// The caller is responsible for attaching the owner's membership row;
    /// the team service does both inside one transaction.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        data: CreateTeam,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO teams (name, description, owner_id, color, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {TEAM_COLUMNS}
            "#
        );

        let team = sqlx::query_as::<_, Team>(&query)
            .bind(data.name)
            .bind(data.description)
            .bind(data.owner_id)
            .bind(data.color)
            .bind(data.is_active)
            .fetch_one(executor)
            .await?;

        Ok(team)
    }

    /// Finds a team by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = $1");

        let team = sqlx::query_as::<_, Team>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(team)
    }

    /// Updates team fields, leaving absent fields untouched
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTeam,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE teams SET updated_at = NOW()");
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
        if data.is_active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_active = ${bind_count}"));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TEAM_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Team>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(color) = data.color {
            q = q.bind(color);
        }
        if let Some(is_active) = data.is_active {
            q = q.bind(is_active);
        }

        let team = q.fetch_optional(pool).await?;

        Ok(team)
    }

    /// Sets the team's distinguished owner reference
    pub async fn set_owner(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE teams SET owner_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(owner_id)
            .execute(executor)
            .await?;

        Ok(())
    }

    /// Checks whether any of the team's tasks is not completed
    pub async fn has_active_tasks(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE team_id = $1 AND status <> 'completed')",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Deletes a team
    pub async fn delete(executor: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM teams WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl TeamMember {
    /// Attaches a user to a team with the given role
    pub async fn attach(
        executor: impl PgExecutor<'_>,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> Result<Self, sqlx::Error> {
        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            INSERT INTO team_members (team_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING team_id, user_id, role, joined_at
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(executor)
        .await?;

        Ok(member)
    }

    /// Finds a specific membership row
    pub async fn find(
        executor: impl PgExecutor<'_>,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let member = sqlx::query_as::<_, TeamMember>(
            "SELECT team_id, user_id, role, joined_at FROM team_members
             WHERE team_id = $1 AND user_id = $2",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(member)
    }

    /// Checks if a user is on the roster (any role)
    pub async fn is_member(
        executor: impl PgExecutor<'_>,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM team_members WHERE team_id = $1 AND user_id = $2)",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    /// Gets a user's role within a team
    pub async fn get_role(
        executor: impl PgExecutor<'_>,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<TeamRole>, sqlx::Error> {
        let role: Option<TeamRole> = sqlx::query_scalar(
            "SELECT role FROM team_members WHERE team_id = $1 AND user_id = $2",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

        Ok(role)
    }

    /// Updates a member's role
    pub async fn update_role(
        executor: impl PgExecutor<'_>,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            UPDATE team_members
            SET role = $3
            WHERE team_id = $1 AND user_id = $2
            RETURNING team_id, user_id, role, joined_at
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(executor)
        .await?;

        Ok(member)
    }

    /// Detaches a set of users from the roster
    pub async fn detach_many(
        executor: impl PgExecutor<'_>,
        team_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM team_members WHERE team_id = $1 AND user_id = ANY($2)",
        )
        .bind(team_id)
        .bind(user_ids)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Detaches the entire roster (used before team deletion)
    pub async fn detach_all(
        executor: impl PgExecutor<'_>,
        team_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM team_members WHERE team_id = $1")
            .bind(team_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Lists the roster with user details, owner first then by join time
    pub async fn list_detailed(
        pool: &PgPool,
        team_id: Uuid,
    ) -> Result<Vec<TeamMemberDetail>, sqlx::Error> {
        let members = sqlx::query_as::<_, TeamMemberDetail>(
            r#"
            SELECT tm.team_id, tm.user_id, u.name, u.email::text AS email, tm.role, tm.joined_at
            FROM team_members tm
            INNER JOIN users u ON u.id = tm.user_id
            WHERE tm.team_id = $1
            ORDER BY (tm.role = 'owner') DESC, tm.joined_at ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// Lists the roster, owner first then by join time
    pub async fn list_by_team(pool: &PgPool, team_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let members = sqlx::query_as::<_, TeamMember>(
            "SELECT team_id, user_id, role, joined_at FROM team_members
             WHERE team_id = $1
             ORDER BY (role = 'owner') DESC, joined_at ASC",
        )
        .bind(team_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// Which of the given users are already on the roster
    pub async fn existing_among(
        executor: impl PgExecutor<'_>,
        team_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM team_members WHERE team_id = $1 AND user_id = ANY($2)",
        )
        .bind(team_id)
        .bind(user_ids)
        .fetch_all(executor)
        .await?;

        Ok(ids)
    }

    /// Lists the teams a user belongs to
    pub async fn team_ids_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT team_id FROM team_members WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(pool)
                .await?;

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_role_as_str() {
        assert_eq!(TeamRole::Owner.as_str(), "owner");
        assert_eq!(TeamRole::Admin.as_str(), "admin");
        assert_eq!(TeamRole::Lead.as_str(), "lead");
        assert_eq!(TeamRole::Member.as_str(), "member");
    }

    #[test]
    fn test_team_role_can_manage() {
        assert!(TeamRole::Owner.can_manage());
        assert!(TeamRole::Admin.can_manage());
        assert!(!TeamRole::Lead.can_manage());
        assert!(!TeamRole::Member.can_manage());
    }
}
