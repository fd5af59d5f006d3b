/// Team membership integration tests
///
/// Exercise the team service against a real database: the single-owner
/// invariant, roster mutations and the ownership transfer path.

mod common;

use taskhive_shared::auth::PolicyError;
use taskhive_shared::models::{CreateTeam, Team, TeamMember, TeamRole};
use taskhive_shared::services::{CreateTeamInput, ServiceError, TeamService};
use uuid::Uuid;

fn team_input(members: Vec<Uuid>) -> CreateTeamInput {
    CreateTeamInput {
        name: format!("Team {}", Uuid::new_v4()),
        description: None,
        color: None,
        member_ids: members,
    }
}

/// Owner rows on the roster, straight from the table
async fn owner_rows(pool: &sqlx::PgPool, team_id: Uuid) -> Vec<Uuid> {
    TeamMember::list_by_team(pool, team_id)
        .await
        .expect("Should list members")
        .into_iter()
        .filter(|m| m.role == TeamRole::Owner)
        .map(|m| m.user_id)
        .collect()
}

#[tokio::test]
async fn test_transfer_keeps_exactly_one_owner() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let service = TeamService::new(pool.clone());
    let manager = common::create_actor(&pool, "manager").await;
    let member = common::create_actor(&pool, "user").await;

    let team = service
        .create_team(&manager, team_input(vec![member.id()]))
        .await
        .expect("Should create team");
    assert_eq!(team.owner_id, Some(manager.id()));
    assert_eq!(owner_rows(&pool, team.id).await, vec![manager.id()]);

    let team = service
        .transfer_ownership(&manager, team.id, member.id())
        .await
        .expect("Should transfer ownership");

    assert_eq!(team.owner_id, Some(member.id()));
    assert_eq!(owner_rows(&pool, team.id).await, vec![member.id()]);

    // The previous owner stays on the roster, demoted
    let role = TeamMember::get_role(&pool, team.id, manager.id())
        .await
        .expect("Should fetch role");
    assert_eq!(role, Some(TeamRole::Member));
}

#[tokio::test]
async fn test_transfer_target_must_be_member() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let service = TeamService::new(pool.clone());
    let manager = common::create_actor(&pool, "manager").await;
    let outsider = common::create_actor(&pool, "user").await;

    let team = service
        .create_team(&manager, team_input(vec![]))
        .await
        .expect("Should create team");

    let err = service
        .transfer_ownership(&manager, team.id, outsider.id())
        .await
        .expect_err("Outsider cannot receive ownership");
    assert!(matches!(err, ServiceError::NewOwnerMustBeMember));

    let team = Team::find_by_id(&pool, team.id)
        .await
        .expect("Should fetch team")
        .expect("Team should exist");
    assert_eq!(team.owner_id, Some(manager.id()));
}

#[tokio::test]
async fn test_transfer_requires_permission() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let service = TeamService::new(pool.clone());

    // A plain user can own a team but holds no transfer permission
    let owner = common::create_actor(&pool, "user").await;
    let member = common::create_actor(&pool, "user").await;

    let team = Team::create(
        &pool,
        CreateTeam {
            name: format!("Owned {}", Uuid::new_v4()),
            description: None,
            owner_id: owner.id(),
            color: None,
            is_active: true,
        },
    )
    .await
    .expect("Should create team");
    TeamMember::attach(&pool, team.id, owner.id(), TeamRole::Owner)
        .await
        .expect("Should attach owner");
    TeamMember::attach(&pool, team.id, member.id(), TeamRole::Member)
        .await
        .expect("Should attach member");

    let err = service
        .transfer_ownership(&owner, team.id, member.id())
        .await
        .expect_err("Transfer should require the permission");
    assert!(matches!(
        err,
        ServiceError::Policy(PolicyError::MissingPermission(_))
    ));

    assert_eq!(owner_rows(&pool, team.id).await, vec![owner.id()]);
}

#[tokio::test]
async fn test_remove_members_never_removes_owner() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let service = TeamService::new(pool.clone());
    let manager = common::create_actor(&pool, "manager").await;
    let a = common::create_actor(&pool, "user").await;
    let b = common::create_actor(&pool, "user").await;

    let team = service
        .create_team(&manager, team_input(vec![a.id(), b.id()]))
        .await
        .expect("Should create team");

    // The owner's ID is dropped, the rest are removed
    let removed = service
        .remove_members(&manager, team.id, &[manager.id(), a.id()])
        .await
        .expect("Should remove the non-owner");
    assert_eq!(removed, 1);
    assert_eq!(owner_rows(&pool, team.id).await, vec![manager.id()]);

    // Nothing but the owner left in the request
    let err = service
        .remove_members(&manager, team.id, &[manager.id()])
        .await
        .expect_err("Removing only the owner should fail");
    assert!(matches!(err, ServiceError::CannotRemoveOwner));
}

#[tokio::test]
async fn test_add_members_validates_and_skips_existing() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let service = TeamService::new(pool.clone());
    let manager = common::create_actor(&pool, "manager").await;
    let a = common::create_actor(&pool, "user").await;
    let b = common::create_actor(&pool, "user").await;

    let team = service
        .create_team(&manager, team_input(vec![]))
        .await
        .expect("Should create team");

    // One unknown ID fails the whole call before anything is written
    let err = service
        .add_members(&manager, team.id, &[a.id(), Uuid::new_v4()])
        .await
        .expect_err("Unknown user should fail the call");
    assert!(matches!(err, ServiceError::SomeUsersNotFound));
    assert!(!TeamMember::is_member(&pool, team.id, a.id())
        .await
        .expect("Should check membership"));

    let roster = service
        .add_members(&manager, team.id, &[a.id()])
        .await
        .expect("Should add member");
    assert!(roster.iter().any(|m| m.user_id == a.id()));

    // Re-adding is a no-op, not an error
    let roster = service
        .add_members(&manager, team.id, &[a.id(), b.id()])
        .await
        .expect("Retry should be safe");
    assert_eq!(
        roster.iter().filter(|m| m.user_id == a.id()).count(),
        1
    );
    assert!(roster.iter().any(|m| m.user_id == b.id()));
}

#[tokio::test]
async fn test_change_member_role_guards_ownership() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let service = TeamService::new(pool.clone());
    let manager = common::create_actor(&pool, "manager").await;
    let a = common::create_actor(&pool, "user").await;

    let team = service
        .create_team(&manager, team_input(vec![a.id()]))
        .await
        .expect("Should create team");

    // The owner's membership is off limits here
    let err = service
        .change_member_role(&manager, team.id, manager.id(), TeamRole::Member)
        .await
        .expect_err("Owner role must not change here");
    assert!(matches!(err, ServiceError::CannotChangeOwnerRole));

    // And the owner role can't be handed out here either
    let err = service
        .change_member_role(&manager, team.id, a.id(), TeamRole::Owner)
        .await
        .expect_err("Owner role must go through transfer");
    assert!(matches!(err, ServiceError::CannotChangeOwnerRole));

    let member = service
        .change_member_role(&manager, team.id, a.id(), TeamRole::Lead)
        .await
        .expect("Should promote to lead");
    assert_eq!(member.role, TeamRole::Lead);

    let err = service
        .change_member_role(&manager, team.id, Uuid::new_v4(), TeamRole::Member)
        .await
        .expect_err("Non-member has no role to change");
    assert!(matches!(err, ServiceError::NotFound("Member")));
}

#[tokio::test]
async fn test_delete_blocked_by_active_tasks() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let teams = TeamService::new(pool.clone());
    let tasks = taskhive_shared::services::TaskService::new(pool.clone());
    let manager = common::create_actor(&pool, "manager").await;

    let team = teams
        .create_team(&manager, team_input(vec![]))
        .await
        .expect("Should create team");

    let task = tasks
        .create(
            &manager,
            taskhive_shared::models::CreateTask {
                title: "Team work".to_string(),
                description: None,
                status: taskhive_shared::models::TaskStatus::Pending,
                priority: taskhive_shared::models::TaskPriority::Medium,
                due_date: None,
                created_by: manager.id(),
                assigned_to: None,
                category_id: None,
                team_id: Some(team.id),
                estimated_hours: None,
                tags: serde_json::json!([]),
            },
        )
        .await
        .expect("Should create team task");

    let err = teams
        .delete_team(&manager, team.id)
        .await
        .expect_err("Pending task should block deletion");
    assert!(matches!(err, ServiceError::TeamHasActiveTasks));

    tasks
        .mark_in_progress(&manager, task.id)
        .await
        .expect("Should start task");

    let err = teams
        .delete_team(&manager, team.id)
        .await
        .expect_err("In-progress task should block deletion");
    assert!(matches!(err, ServiceError::TeamHasActiveTasks));

    tasks
        .mark_completed(&manager, task.id)
        .await
        .expect("Should complete task");

    teams
        .delete_team(&manager, team.id)
        .await
        .expect("Completed task should not block deletion");

    let gone = Team::find_by_id(&pool, team.id)
        .await
        .expect("Should query team");
    assert!(gone.is_none());
}
