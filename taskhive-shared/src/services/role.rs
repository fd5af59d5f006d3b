/// Role management service
///
/// Custom roles can be created, renamed and granted permission sets.
/// Roles seeded by migration are flagged `is_system` and refuse mutation;
/// the built-in policy vocabulary stays stable.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::{policy, Actor};
use crate::models::{CreateRole, Permission, Role, UpdateRole};
use crate::services::error::ServiceError;

/// Role management service
#[derive(Debug, Clone)]
pub struct RoleService {
    pool: PgPool,
}

impl RoleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists all roles
    pub async fn list(&self, actor: &Actor) -> Result<Vec<Role>, ServiceError> {
        policy::require_permission(actor, "roles.read")?;

        let roles = Role::list(&self.pool).await?;

        Ok(roles)
    }

    /// Lists all permissions
    pub async fn list_permissions(&self, actor: &Actor) -> Result<Vec<Permission>, ServiceError> {
        policy::require_permission(actor, "roles.read")?;

        let permissions = Permission::list(&self.pool).await?;

        Ok(permissions)
    }

    /// A role with its attached permissions
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<(Role, Vec<Permission>), ServiceError> {
        policy::require_permission(actor, "roles.read")?;

        let role = Role::find_by_id(&self.pool, id)
            .await?
            .ok_or(ServiceError::NotFound("Role"))?;
        let permissions = Role::permissions(&self.pool, id).await?;

        Ok((role, permissions))
    }

    /// Creates a custom role
    pub async fn create(&self, actor: &Actor, data: CreateRole) -> Result<Role, ServiceError> {
        policy::require_permission(actor, "roles.manage")?;

        let role = Role::create(&self.pool, data).await?;

        info!(role_id = %role.id, slug = %role.slug, actor = %actor.id(), "role created");

        Ok(role)
    }

    /// Updates a custom role's display fields
    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        data: UpdateRole,
    ) -> Result<Role, ServiceError> {
        policy::require_permission(actor, "roles.manage")?;

        let role = self.require_mutable(id).await?;

        let updated = Role::update(&self.pool, role.id, data)
            .await?
            .ok_or(ServiceError::NotFound("Role"))?;

        info!(role_id = %id, actor = %actor.id(), "role updated");

        Ok(updated)
    }

    /// Deletes a custom role
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), ServiceError> {
        policy::require_permission(actor, "roles.manage")?;

        let role = self.require_mutable(id).await?;

        Role::delete(&self.pool, role.id).await?;

        info!(role_id = %id, actor = %actor.id(), "role deleted");

        Ok(())
    }

    /// Replaces a custom role's permission set
    pub async fn set_permissions(
        &self,
        actor: &Actor,
        id: Uuid,
        permission_ids: &[Uuid],
    ) -> Result<Vec<Permission>, ServiceError> {
        policy::require_permission(actor, "roles.manage")?;

        let role = self.require_mutable(id).await?;

        Role::set_permissions(&self.pool, role.id, permission_ids).await?;

        info!(role_id = %id, permissions = permission_ids.len(), actor = %actor.id(),
              "role permissions replaced");

        Role::permissions(&self.pool, role.id)
            .await
            .map_err(Into::into)
    }

    async fn require_mutable(&self, id: Uuid) -> Result<Role, ServiceError> {
        let role = Role::find_by_id(&self.pool, id)
            .await?
            .ok_or(ServiceError::NotFound("Role"))?;

        if role.is_system {
            return Err(ServiceError::SystemRoleImmutable);
        }

        Ok(role)
    }
}
