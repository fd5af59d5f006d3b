/// Service-layer error type
///
/// Every service operation returns this. The API crate maps variants onto
/// HTTP statuses; within this crate they stay semantic.

use crate::auth::PolicyError;
use crate::models::TaskStatus;

/// Error type for service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Access policy denial
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// Entity lookup failed
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Explicit transition requested into the current state
    #[error("Task is already {0}")]
    AlreadyInState(TaskStatus),

    /// Transition not allowed by the lifecycle table
    #[error("Cannot transition task from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    /// Actor tried to file a task under a team they don't belong to
    #[error("You are not a member of this team")]
    TeamAccessDenied,

    /// A roster mutation referenced unknown user IDs
    #[error("Some of the given user IDs do not exist")]
    SomeUsersNotFound,

    /// Removal set contained only the owner
    #[error("The team owner cannot be removed from the team")]
    CannotRemoveOwner,

    /// Role change targeted the owner's membership
    #[error("The owner's membership role cannot be changed; transfer ownership instead")]
    CannotChangeOwnerRole,

    /// Ownership transfer target is not on the roster
    #[error("The new owner must already be a member of the team")]
    NewOwnerMustBeMember,

    /// Team deletion blocked by unfinished tasks
    #[error("The team still has tasks that are not completed")]
    TeamHasActiveTasks,

    /// Seeded roles cannot be modified or deleted
    #[error("System roles cannot be modified or deleted")]
    SystemRoleImmutable,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServiceError::AlreadyInState(TaskStatus::Completed);
        assert_eq!(err.to_string(), "Task is already completed");

        let err = ServiceError::InvalidTransition {
            from: TaskStatus::Pending,
            to: TaskStatus::Completed,
        };
        assert!(err.to_string().contains("pending"));
        assert!(err.to_string().contains("completed"));

        let err = ServiceError::NotFound("Team");
        assert_eq!(err.to_string(), "Team not found");
    }

    #[test]
    fn test_policy_error_passes_through() {
        let err: ServiceError = PolicyError::MissingPermission("teams.create".to_string()).into();
        assert!(err.to_string().contains("teams.create"));
    }
}
