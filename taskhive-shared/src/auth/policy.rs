/// Access policy
///
/// Authorization happens in two layers:
///
/// 1. **Global gate** — the actor must hold the matching permission slug in
///    the union of their roles' permissions (`require_permission`).
/// 2. **Entity gate** — evaluated after the global gate, over ownership and
///    membership facts of the specific entity.
///
/// Every predicate here is a pure function over the actor and facts already
/// fetched by the caller; the policy module never touches the database.
/// Denials carry a human-readable reason.

use crate::auth::actor::Actor;
use crate::models::{Category, Task, Team, TeamRole};

/// Error type for policy checks
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Actor lacks a required permission slug
    #[error("Missing required permission: {0}")]
    MissingPermission(String),

    /// Entity-level check failed
    #[error("{0}")]
    Denied(&'static str),
}

/// Requires the actor to hold a permission slug
///
/// # Errors
///
/// Returns `PolicyError::MissingPermission` naming the slug otherwise.
pub fn require_permission(actor: &Actor, slug: &str) -> Result<(), PolicyError> {
    if !actor.has_permission(slug) {
        return Err(PolicyError::MissingPermission(slug.to_string()));
    }

    Ok(())
}

/// Whether the actor may edit a task
///
/// Creator, assignee, or a global admin/manager.
pub fn can_edit_task(actor: &Actor, task: &Task) -> bool {
    task.created_by == actor.id()
        || task.assigned_to == Some(actor.id())
        || actor.is_admin()
        || actor.is_manager()
}

/// Whether the actor may delete a task
///
/// Creator or a global admin; managers cannot delete others' tasks.
pub fn can_delete_task(actor: &Actor, task: &Task) -> bool {
    task.created_by == actor.id() || actor.is_admin()
}

/// Whether the actor may edit or delete a category
pub fn can_edit_category(actor: &Actor, category: &Category) -> bool {
    category.created_by == Some(actor.id()) || actor.is_admin()
}

/// Whether the actor may manage a team (settings, roster, deletion)
///
/// The team's owner, or a member whose membership role can manage. Global
/// roles don't grant team management.
pub fn can_manage_team(actor: &Actor, team: &Team, membership_role: Option<TeamRole>) -> bool {
    team.owner_id == Some(actor.id()) || membership_role.is_some_and(|r| r.can_manage())
}

/// Whether the actor sees all rows in listings
///
/// Non-admins are narrowed to rows they created, are assigned to, or whose
/// team they belong to.
pub fn sees_all_tasks(actor: &Actor) -> bool {
    actor.is_admin()
}

pub fn require_task_edit(actor: &Actor, task: &Task) -> Result<(), PolicyError> {
    if !can_edit_task(actor, task) {
        return Err(PolicyError::Denied(
            "Only the creator, the assignee, or an admin/manager can edit this task",
        ));
    }

    Ok(())
}

pub fn require_task_delete(actor: &Actor, task: &Task) -> Result<(), PolicyError> {
    if !can_delete_task(actor, task) {
        return Err(PolicyError::Denied(
            "Only the creator or an admin can delete this task",
        ));
    }

    Ok(())
}

pub fn require_category_edit(actor: &Actor, category: &Category) -> Result<(), PolicyError> {
    if !can_edit_category(actor, category) {
        return Err(PolicyError::Denied(
            "Only the creator or an admin can modify this category",
        ));
    }

    Ok(())
}

pub fn require_team_management(
    actor: &Actor,
    team: &Team,
    membership_role: Option<TeamRole>,
) -> Result<(), PolicyError> {
    if !can_manage_team(actor, team, membership_role) {
        return Err(PolicyError::Denied(
            "Only the team owner or a managing member can manage this team",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskPriority, TaskStatus, User};
    use chrono::Utc;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn user(id: Uuid) -> User {
        User {
            id,
            email: format!("{id}@example.com"),
            name: "Test".to_string(),
            username: None,
            avatar_url: None,
            bio: None,
            phone: None,
            position: None,
            department: None,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn actor_with_roles(id: Uuid, roles: &[&str]) -> Actor {
        Actor::new(
            user(id),
            roles.iter().map(|r| r.to_string()).collect(),
            HashSet::new(),
        )
    }

    fn task(created_by: Uuid, assigned_to: Option<Uuid>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "Test task".to_string(),
            description: None,
            status: TaskStatus::Pending,
            priority: TaskPriority::Medium,
            due_date: None,
            completed_at: None,
            created_by,
            assigned_to,
            category_id: None,
            team_id: None,
            estimated_hours: None,
            actual_hours: None,
            tags: serde_json::json!([]),
            attachments: serde_json::json!([]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn team(owner_id: Uuid) -> Team {
        Team {
            id: Uuid::new_v4(),
            name: "Platform".to_string(),
            description: None,
            owner_id: Some(owner_id),
            color: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_require_permission() {
        let mut actor = actor_with_roles(Uuid::new_v4(), &[]);
        actor.permissions.insert("tasks.read".to_string());

        assert!(require_permission(&actor, "tasks.read").is_ok());

        let err = require_permission(&actor, "tasks.assign").unwrap_err();
        assert!(err.to_string().contains("tasks.assign"));
    }

    #[test]
    fn test_task_edit_matrix() {
        let creator = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let t = task(creator, Some(assignee));

        assert!(can_edit_task(&actor_with_roles(creator, &["user"]), &t));
        assert!(can_edit_task(&actor_with_roles(assignee, &["user"]), &t));
        assert!(can_edit_task(&actor_with_roles(Uuid::new_v4(), &["admin"]), &t));
        assert!(can_edit_task(
            &actor_with_roles(Uuid::new_v4(), &["manager"]),
            &t
        ));
        assert!(!can_edit_task(
            &actor_with_roles(Uuid::new_v4(), &["user"]),
            &t
        ));
        assert!(!can_edit_task(
            &actor_with_roles(Uuid::new_v4(), &["viewer"]),
            &t
        ));
    }

    #[test]
    fn test_task_delete_matrix() {
        let creator = Uuid::new_v4();
        let assignee = Uuid::new_v4();
        let t = task(creator, Some(assignee));

        assert!(can_delete_task(&actor_with_roles(creator, &["user"]), &t));
        assert!(can_delete_task(
            &actor_with_roles(Uuid::new_v4(), &["admin"]),
            &t
        ));
        assert!(can_delete_task(
            &actor_with_roles(Uuid::new_v4(), &["super_admin"]),
            &t
        ));
        // The assignee can edit but not delete
        assert!(!can_delete_task(&actor_with_roles(assignee, &["user"]), &t));
        // Managers get no delete rights over others' tasks
        assert!(!can_delete_task(
            &actor_with_roles(Uuid::new_v4(), &["manager"]),
            &t
        ));
    }

    #[test]
    fn test_team_management_matrix() {
        let owner = Uuid::new_v4();
        let tm = team(owner);

        // Owner manages even without a membership-role fact
        assert!(can_manage_team(&actor_with_roles(owner, &["user"]), &tm, None));

        let outsider = actor_with_roles(Uuid::new_v4(), &["user"]);
        assert!(can_manage_team(&outsider, &tm, Some(TeamRole::Owner)));
        assert!(can_manage_team(&outsider, &tm, Some(TeamRole::Admin)));
        assert!(!can_manage_team(&outsider, &tm, Some(TeamRole::Lead)));
        assert!(!can_manage_team(&outsider, &tm, Some(TeamRole::Member)));
        assert!(!can_manage_team(&outsider, &tm, None));

        // Global roles don't grant team management
        assert!(!can_manage_team(
            &actor_with_roles(Uuid::new_v4(), &["admin"]),
            &tm,
            None
        ));
    }

    #[test]
    fn test_category_edit() {
        let creator = Uuid::new_v4();
        let category = Category {
            id: Uuid::new_v4(),
            name: "Ops".to_string(),
            description: None,
            color: None,
            icon: None,
            created_by: Some(creator),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(can_edit_category(
            &actor_with_roles(creator, &["user"]),
            &category
        ));
        assert!(can_edit_category(
            &actor_with_roles(Uuid::new_v4(), &["admin"]),
            &category
        ));
        assert!(!can_edit_category(
            &actor_with_roles(Uuid::new_v4(), &["user"]),
            &category
        ));
    }

    #[test]
    fn test_visibility_bypass() {
        assert!(sees_all_tasks(&actor_with_roles(Uuid::new_v4(), &["admin"])));
        assert!(sees_all_tasks(&actor_with_roles(
            Uuid::new_v4(),
            &["super_admin"]
        )));
        assert!(!sees_all_tasks(&actor_with_roles(
            Uuid::new_v4(),
            &["manager"]
        )));
        assert!(!sees_all_tasks(&actor_with_roles(Uuid::new_v4(), &["user"])));
    }

    #[test]
    fn test_policy_error_display() {
        let err = PolicyError::MissingPermission("teams.create".to_string());
        assert!(err.to_string().contains("teams.create"));

        let err = PolicyError::Denied("Only the creator or an admin can delete this task");
        assert!(err.to_string().contains("creator"));
    }
}
