/// Team membership service
///
/// Roster mutations enforce the single-owner invariant: exactly one
/// membership row carries the owner role, and it belongs to the user the
/// team's owner reference points at. Every multi-step mutation runs inside
/// one transaction, so the invariant is never observable broken.
///
/// Management authorization is entity-scoped: the team's owner or a member
/// whose membership role can manage. Global roles deliberately don't grant
/// it; an admin who wants to manage a team joins it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::{policy, Actor};
use crate::models::{
    CreateTeam, Team, TeamMember, TeamMemberDetail, TeamRole, UpdateTeam, User,
};
use crate::services::error::ServiceError;
use crate::services::filter::{Page, TeamFilter};
use crate::services::notification::NotificationService;

/// Input for creating a team through the service
///
/// The owner is always the acting user; initial members join with the
/// member role.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTeamInput {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

/// Aggregate team counts for the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct TeamStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub total_memberships: i64,
}

/// Team membership service
#[derive(Debug, Clone)]
pub struct TeamService {
    pool: PgPool,
    notifications: NotificationService,
}

impl TeamService {
    pub fn new(pool: PgPool) -> Self {
        let notifications = NotificationService::new(pool.clone());
        Self {
            pool,
            notifications,
        }
    }

    /// Lists teams, filtered and paginated
    pub async fn list(
        &self,
        actor: &Actor,
        filter: &TeamFilter,
    ) -> Result<Page<Team>, ServiceError> {
        policy::require_permission(actor, "teams.read")?;

        let mut where_clause = String::from("WHERE 1=1");
        let mut bind_count = 0;

        if filter.is_active.is_some() {
            bind_count += 1;
            where_clause.push_str(&format!(" AND is_active = ${bind_count}"));
        }
        if filter.owner_id.is_some() {
            bind_count += 1;
            where_clause.push_str(&format!(" AND owner_id = ${bind_count}"));
        }
        if filter.search.is_some() {
            bind_count += 1;
            where_clause.push_str(&format!(
                " AND (name ILIKE ${bind_count} OR description ILIKE ${bind_count})"
            ));
        }

        let pagination = filter.pagination();
        let order = format!(
            "ORDER BY {} {}",
            filter.sort_column(),
            filter.sort_order().as_sql()
        );

        let count_query = format!("SELECT COUNT(*) FROM teams {where_clause}");
        let data_query = format!(
            "SELECT id, name, description, owner_id, color, is_active, created_at, updated_at \
             FROM teams {where_clause} {order} LIMIT {} OFFSET {}",
            pagination.per_page,
            pagination.offset()
        );

        let mut count_q = sqlx::query_scalar::<_, i64>(&count_query);
        let mut data_q = sqlx::query_as::<_, Team>(&data_query);

        if let Some(is_active) = filter.is_active {
            count_q = count_q.bind(is_active);
            data_q = data_q.bind(is_active);
        }
        if let Some(owner_id) = filter.owner_id {
            count_q = count_q.bind(owner_id);
            data_q = data_q.bind(owner_id);
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            count_q = count_q.bind(pattern.clone());
            data_q = data_q.bind(pattern);
        }

        let total = count_q.fetch_one(&self.pool).await?;
        let teams = data_q.fetch_all(&self.pool).await?;

        Ok(Page::new(teams, total, pagination))
    }

    /// Fetches a single team
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Team, ServiceError> {
        policy::require_permission(actor, "teams.read")?;

        Team::find_by_id(&self.pool, id)
            .await?
            .ok_or(ServiceError::NotFound("Team"))
    }

    /// The team roster with user details
    pub async fn members(
        &self,
        actor: &Actor,
        team_id: Uuid,
    ) -> Result<Vec<TeamMemberDetail>, ServiceError> {
        policy::require_permission(actor, "teams.read")?;

        Team::find_by_id(&self.pool, team_id)
            .await?
            .ok_or(ServiceError::NotFound("Team"))?;

        let members = TeamMember::list_detailed(&self.pool, team_id).await?;

        Ok(members)
    }

    /// Creates a team, making the actor its owner
    ///
    /// Initial members are attached with the member role; unknown IDs fail
    /// the whole operation before anything is written.
    pub async fn create_team(
        &self,
        actor: &Actor,
        input: CreateTeamInput,
    ) -> Result<Team, ServiceError> {
        policy::require_permission(actor, "teams.create")?;

        let member_ids = dedup_excluding(&input.member_ids, actor.id());
        if !member_ids.is_empty() {
            let found = User::count_existing(&self.pool, &member_ids).await?;
            if found != member_ids.len() as i64 {
                return Err(ServiceError::SomeUsersNotFound);
            }
        }

        let mut tx = self.pool.begin().await?;

        let team = Team::create(
            &mut *tx,
            CreateTeam {
                name: input.name,
                description: input.description,
                owner_id: actor.id(),
                color: input.color,
                is_active: true,
            },
        )
        .await?;

        TeamMember::attach(&mut *tx, team.id, actor.id(), TeamRole::Owner).await?;

        for user_id in &member_ids {
            TeamMember::attach(&mut *tx, team.id, *user_id, TeamRole::Member).await?;
        }

        tx.commit().await?;

        info!(team_id = %team.id, owner = %actor.id(), members = member_ids.len(),
              "team created");

        for user_id in member_ids {
            self.notifications
                .notify_team_invitation(&team, user_id, actor.id())
                .await;
        }

        Ok(team)
    }

    /// Updates team settings
    pub async fn update(
        &self,
        actor: &Actor,
        team_id: Uuid,
        data: UpdateTeam,
    ) -> Result<Team, ServiceError> {
        let team = self.require_management(actor, team_id).await?;

        let updated = Team::update(&self.pool, team.id, data)
            .await?
            .ok_or(ServiceError::NotFound("Team"))?;

        info!(team_id = %team_id, actor = %actor.id(), "team updated");

        Ok(updated)
    }

    /// Deletes a team
    ///
    /// Blocked while any of the team's tasks is not completed. Memberships
    /// are detached in the same transaction as the delete.
    pub async fn delete_team(&self, actor: &Actor, team_id: Uuid) -> Result<(), ServiceError> {
        let team = self.require_management(actor, team_id).await?;

        if Team::has_active_tasks(&self.pool, team.id).await? {
            return Err(ServiceError::TeamHasActiveTasks);
        }

        let mut tx = self.pool.begin().await?;
        TeamMember::detach_all(&mut *tx, team.id).await?;
        Team::delete(&mut *tx, team.id).await?;
        tx.commit().await?;

        info!(team_id = %team_id, actor = %actor.id(), "team deleted");

        Ok(())
    }

    /// Adds users to the roster with the member role
    ///
    /// Unknown IDs fail the whole call; IDs already on the roster are
    /// skipped, so retries are safe.
    pub async fn add_members(
        &self,
        actor: &Actor,
        team_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<Vec<TeamMemberDetail>, ServiceError> {
        let team = self.require_management(actor, team_id).await?;
        policy::require_permission(actor, "teams.manage_members")?;

        let candidates = dedup(user_ids);
        if !candidates.is_empty() {
            let found = User::count_existing(&self.pool, &candidates).await?;
            if found != candidates.len() as i64 {
                return Err(ServiceError::SomeUsersNotFound);
            }
        }

        let existing: HashSet<Uuid> = TeamMember::existing_among(&self.pool, team.id, &candidates)
            .await?
            .into_iter()
            .collect();

        let new_members: Vec<Uuid> = candidates
            .into_iter()
            .filter(|id| !existing.contains(id))
            .collect();

        let mut tx = self.pool.begin().await?;
        for user_id in &new_members {
            TeamMember::attach(&mut *tx, team.id, *user_id, TeamRole::Member).await?;
        }
        tx.commit().await?;

        info!(team_id = %team_id, added = new_members.len(), actor = %actor.id(),
              "team members added");

        for user_id in new_members {
            self.notifications
                .notify_team_invitation(&team, user_id, actor.id())
                .await;
        }

        TeamMember::list_detailed(&self.pool, team.id)
            .await
            .map_err(Into::into)
    }

    /// Removes users from the roster
    ///
    /// The owner's ID is silently dropped from the set; when nothing else
    /// remains the call fails instead of doing nothing.
    pub async fn remove_members(
        &self,
        actor: &Actor,
        team_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<u64, ServiceError> {
        let team = self.require_management(actor, team_id).await?;
        policy::require_permission(actor, "teams.manage_members")?;

        let removable: Vec<Uuid> = user_ids
            .iter()
            .copied()
            .filter(|id| team.owner_id != Some(*id))
            .collect();

        if removable.is_empty() {
            return Err(ServiceError::CannotRemoveOwner);
        }

        let removed = TeamMember::detach_many(&self.pool, team.id, &removable).await?;

        info!(team_id = %team_id, removed, actor = %actor.id(), "team members removed");

        Ok(removed)
    }

    /// Changes a member's role within the team
    ///
    /// The owner's membership can't be touched here, and the owner role
    /// can't be handed out here; both go through `transfer_ownership`.
    pub async fn change_member_role(
        &self,
        actor: &Actor,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> Result<TeamMember, ServiceError> {
        let team = self.require_management(actor, team_id).await?;
        policy::require_permission(actor, "teams.manage_members")?;

        if team.owner_id == Some(user_id) || role == TeamRole::Owner {
            return Err(ServiceError::CannotChangeOwnerRole);
        }

        let member = TeamMember::update_role(&self.pool, team.id, user_id, role)
            .await?
            .ok_or(ServiceError::NotFound("Member"))?;

        info!(team_id = %team_id, user_id = %user_id, role = %role, actor = %actor.id(),
              "member role changed");

        Ok(member)
    }

    /// Transfers ownership to another member
    ///
    /// In one transaction: the owner reference moves, the previous owner's
    /// membership is demoted to member, and the new owner's membership is
    /// promoted to owner.
    pub async fn transfer_ownership(
        &self,
        actor: &Actor,
        team_id: Uuid,
        new_owner_id: Uuid,
    ) -> Result<Team, ServiceError> {
        let team = self.require_management(actor, team_id).await?;
        policy::require_permission(actor, "teams.transfer_ownership")?;

        if !TeamMember::is_member(&self.pool, team.id, new_owner_id).await? {
            return Err(ServiceError::NewOwnerMustBeMember);
        }

        let mut tx = self.pool.begin().await?;

        if let Some(previous_owner) = team.owner_id {
            if previous_owner != new_owner_id {
                TeamMember::update_role(&mut *tx, team.id, previous_owner, TeamRole::Member)
                    .await?;
            }
        }

        TeamMember::update_role(&mut *tx, team.id, new_owner_id, TeamRole::Owner).await?;
        Team::set_owner(&mut *tx, team.id, new_owner_id).await?;

        tx.commit().await?;

        info!(team_id = %team_id, new_owner = %new_owner_id, actor = %actor.id(),
              "team ownership transferred");

        Team::find_by_id(&self.pool, team.id)
            .await?
            .ok_or(ServiceError::NotFound("Team"))
    }

    /// Dashboard counts over all teams
    pub async fn stats(&self, actor: &Actor) -> Result<TeamStats, ServiceError> {
        policy::require_permission(actor, "dashboard.read")?;

        let (total, active, inactive): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE is_active),
                   COUNT(*) FILTER (WHERE NOT is_active)
            FROM teams
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let total_memberships: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM team_members")
            .fetch_one(&self.pool)
            .await?;

        Ok(TeamStats {
            total,
            active,
            inactive,
            total_memberships,
        })
    }

    /// Loads the team and checks the actor may manage it
    async fn require_management(&self, actor: &Actor, team_id: Uuid) -> Result<Team, ServiceError> {
        let team = Team::find_by_id(&self.pool, team_id)
            .await?
            .ok_or(ServiceError::NotFound("Team"))?;

        let membership_role = TeamMember::get_role(&self.pool, team_id, actor.id()).await?;

        policy::require_team_management(actor, &team, membership_role)?;

        Ok(team)
    }
}

/// Deduplicates an ID list, preserving order
fn dedup(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Deduplicates an ID list, dropping one excluded ID
fn dedup_excluding(ids: &[Uuid], excluded: Uuid) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter()
        .copied()
        .filter(|id| *id != excluded && seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_excluding() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let me = Uuid::new_v4();

        let out = dedup_excluding(&[a, b, a, me, b], me);
        assert_eq!(out, vec![a, b]);
    }

    #[test]
    fn test_owner_filtering_never_retains_owner() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        let removable: Vec<Uuid> = [owner, other, owner]
            .iter()
            .copied()
            .filter(|id| *id != owner)
            .collect();

        assert_eq!(removable, vec![other]);

        let only_owner: Vec<Uuid> = [owner].iter().copied().filter(|id| *id != owner).collect();
        assert!(only_owner.is_empty());
    }
}
