/// Data models
///
/// Each model owns its queries; multi-step mutations that span models live
/// in the service layer so they can share a transaction.

pub mod category;
pub mod role;
pub mod task;
pub mod team;
pub mod user;

pub use category::{Category, CategoryWithCounts, CreateCategory, UpdateCategory};
pub use role::{CreateRole, Permission, Role, UpdateRole};
pub use task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask};
pub use team::{CreateTeam, Team, TeamMember, TeamMemberDetail, TeamRole, UpdateTeam};
pub use user::{User, UserFilter};
