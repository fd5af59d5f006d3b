/// HTTP route handlers
///
/// Handlers are thin: deserialize and validate the request, hand it to the
/// matching service with the authenticated actor, serialize the result.

pub mod categories;
pub mod dashboard;
pub mod health;
pub mod notifications;
pub mod roles;
pub mod tasks;
pub mod teams;
pub mod users;
