//! # TaskHive Shared Library
//!
//! Shared types and business logic for the TaskHive task/team-management
//! system, used by the API server and by tooling.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, roles, teams, categories, tasks)
//! - `auth`: Actor resolution, JWT validation and the access policy
//! - `services`: Task lifecycle, team roster, filtering and notifications
//! - `db`: Connection pool and migration utilities

pub mod auth;
pub mod db;
pub mod models;
pub mod services;

/// Current version of the TaskHive shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
