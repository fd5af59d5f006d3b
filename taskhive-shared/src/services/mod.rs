/// Service layer
///
/// Services own the operation semantics: authorization, validation,
/// transactional mutations and notification fan-out. HTTP handlers call
/// services; services call models.

pub mod category;
pub mod error;
pub mod filter;
pub mod notification;
pub mod role;
pub mod task;
pub mod team;

pub use category::{CategoryService, CreateCategoryInput};
pub use error::ServiceError;
pub use filter::{Page, Pagination, SortOrder, TaskFilter, TeamFilter};
pub use notification::NotificationService;
pub use role::RoleService;
pub use task::{TaskService, TaskStats};
pub use team::{CreateTeamInput, TeamService, TeamStats};
