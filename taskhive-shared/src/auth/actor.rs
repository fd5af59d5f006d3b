/// The authenticated actor
///
/// An `Actor` bundles the user row with their global role slugs and the
/// union of permission slugs across those roles. It is loaded once per
/// request at the HTTP boundary and passed explicitly to every policy check
/// and service call; nothing in this crate reaches for an ambient
/// current-user.

use std::collections::HashSet;

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;

/// Well-known role slugs seeded by migration
pub const ROLE_SUPER_ADMIN: &str = "super_admin";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MANAGER: &str = "manager";

/// Authenticated actor: user plus resolved roles and permissions
#[derive(Debug, Clone)]
pub struct Actor {
    /// The user row
    pub user: User,

    /// Slugs of the global roles the user holds
    pub roles: Vec<String>,

    /// Union of permission slugs across all roles
    pub permissions: HashSet<String>,
}

impl Actor {
    /// Builds an actor from already-resolved parts
    pub fn new(user: User, roles: Vec<String>, permissions: HashSet<String>) -> Self {
        Self {
            user,
            roles,
            permissions,
        }
    }

    /// Loads the actor for a user ID, resolving roles and permissions
    ///
    /// Returns `None` for unknown user IDs.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the lookups fail.
    pub async fn load(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let Some(user) = User::find_by_id(pool, user_id).await? else {
            return Ok(None);
        };

        let roles = User::role_slugs(pool, user_id).await?;
        let permissions = User::permission_slugs(pool, user_id)
            .await?
            .into_iter()
            .collect();

        Ok(Some(Self {
            user,
            roles,
            permissions,
        }))
    }

    /// The actor's user ID
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    /// Whether the actor holds the given global role
    pub fn has_role(&self, slug: &str) -> bool {
        self.roles.iter().any(|r| r == slug)
    }

    /// Whether the actor holds the given permission slug
    pub fn has_permission(&self, slug: &str) -> bool {
        self.permissions.contains(slug)
    }

    /// Admins bypass entity-level ownership checks
    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN) || self.has_role(ROLE_SUPER_ADMIN)
    }

    /// Managers get elevated task-edit rights but no admin bypass
    pub fn is_manager(&self) -> bool {
        self.has_role(ROLE_MANAGER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "dev@example.com".to_string(),
            name: "Dev".to_string(),
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

    #[test]
    fn test_role_and_permission_lookups() {
        let actor = Actor::new(
            sample_user(),
            vec!["manager".to_string()],
            ["tasks.read".to_string(), "tasks.assign".to_string()]
                .into_iter()
                .collect(),
        );

        assert!(actor.has_role("manager"));
        assert!(!actor.has_role("admin"));
        assert!(actor.has_permission("tasks.assign"));
        assert!(!actor.has_permission("users.manage"));
        assert!(actor.is_manager());
        assert!(!actor.is_admin());
    }

    #[test]
    fn test_is_admin_covers_super_admin() {
        let admin = Actor::new(sample_user(), vec!["admin".to_string()], HashSet::new());
        let super_admin = Actor::new(
            sample_user(),
            vec!["super_admin".to_string()],
            HashSet::new(),
        );

        assert!(admin.is_admin());
        assert!(super_admin.is_admin());
    }
}
