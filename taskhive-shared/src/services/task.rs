/// Task lifecycle service
///
/// All task operations go through here: authorization first, then the
/// mutation, then notification fan-out. Handlers never touch the task
/// model directly.
///
/// Two paths change status:
///
/// - The mark-as operations (`mark_completed`, `mark_in_progress`,
///   `mark_cancelled`) reject re-marking the current status with
///   `AlreadyInState` and accept any other target.
/// - The generic `update` accepts any status with no state check at all.
///   It is the corrections escape hatch. Both paths maintain the
///   `completed_at` invariant.

use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::{policy, Actor};
use crate::models::{CreateTask, Task, TaskStatus, TeamMember, UpdateTask};
use crate::services::error::ServiceError;
use crate::services::filter::{Page, TaskFilter};
use crate::services::notification::NotificationService;

/// Aggregate task counts for the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct TaskStats {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub overdue: i64,

    /// Completed share of all tasks, in percent
    pub completion_rate: f64,
}

/// Task lifecycle service
#[derive(Debug, Clone)]
pub struct TaskService {
    pool: PgPool,
    notifications: NotificationService,
}

/// SQL fragment restricting rows to what a non-admin actor may see:
/// tasks they created, are assigned to, or that belong to one of their
/// teams. The placeholder is the actor's user ID.
fn visibility_clause(bind: usize) -> String {
    format!(
        "(created_by = ${bind} OR assigned_to = ${bind} \
         OR team_id IN (SELECT team_id FROM team_members WHERE user_id = ${bind}))"
    )
}

impl TaskService {
    pub fn new(pool: PgPool) -> Self {
        let notifications = NotificationService::new(pool.clone());
        Self {
            pool,
            notifications,
        }
    }

    /// Lists tasks visible to the actor, filtered and paginated
    ///
    /// # Errors
    ///
    /// Returns an error if the actor lacks `tasks.read` or a query fails.
    pub async fn list(
        &self,
        actor: &Actor,
        filter: &TaskFilter,
    ) -> Result<Page<Task>, ServiceError> {
        policy::require_permission(actor, "tasks.read")?;

        let sees_all = policy::sees_all_tasks(actor);
        let mut where_clause = String::from("WHERE 1=1");
        let mut bind_count = 0;

        if !sees_all {
            bind_count += 1;
            where_clause.push_str(&format!(" AND {}", visibility_clause(bind_count)));
        }

        if filter.status.is_some() {
            bind_count += 1;
            where_clause.push_str(&format!(" AND status = ${bind_count}"));
        }
        if filter.priority.is_some() {
            bind_count += 1;
            where_clause.push_str(&format!(" AND priority = ${bind_count}"));
        }
        if filter.category_id.is_some() {
            bind_count += 1;
            where_clause.push_str(&format!(" AND category_id = ${bind_count}"));
        }
        if filter.team_id.is_some() {
            bind_count += 1;
            where_clause.push_str(&format!(" AND team_id = ${bind_count}"));
        }
        if filter.assigned_to.is_some() {
            bind_count += 1;
            where_clause.push_str(&format!(" AND assigned_to = ${bind_count}"));
        }
        if filter.search.is_some() {
            bind_count += 1;
            where_clause.push_str(&format!(
                " AND (title ILIKE ${bind_count} OR description ILIKE ${bind_count})"
            ));
        }

        let pagination = filter.pagination();
        let order = format!(
            "ORDER BY {} {}",
            filter.sort_column(),
            filter.sort_order().as_sql()
        );

        let count_query = format!("SELECT COUNT(*) FROM tasks {where_clause}");
        let data_query = format!(
            "SELECT id, title, description, status, priority, due_date, completed_at, \
             created_by, assigned_to, category_id, team_id, estimated_hours, actual_hours, \
             tags, attachments, created_at, updated_at \
             FROM tasks {where_clause} {order} LIMIT {} OFFSET {}",
            pagination.per_page,
            pagination.offset()
        );

        let mut count_q = sqlx::query_scalar::<_, i64>(&count_query);
        let mut data_q = sqlx::query_as::<_, Task>(&data_query);

        if !sees_all {
            count_q = count_q.bind(actor.id());
            data_q = data_q.bind(actor.id());
        }

        if let Some(status) = filter.status {
            count_q = count_q.bind(status);
            data_q = data_q.bind(status);
        }
        if let Some(priority) = filter.priority {
            count_q = count_q.bind(priority);
            data_q = data_q.bind(priority);
        }
        if let Some(category_id) = filter.category_id {
            count_q = count_q.bind(category_id);
            data_q = data_q.bind(category_id);
        }
        if let Some(team_id) = filter.team_id {
            count_q = count_q.bind(team_id);
            data_q = data_q.bind(team_id);
        }
        if let Some(assigned_to) = filter.assigned_to {
            count_q = count_q.bind(assigned_to);
            data_q = data_q.bind(assigned_to);
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{search}%");
            count_q = count_q.bind(pattern.clone());
            data_q = data_q.bind(pattern);
        }

        let total = count_q.fetch_one(&self.pool).await?;
        let tasks = data_q.fetch_all(&self.pool).await?;

        debug!(actor = %actor.id(), total, "listed tasks");

        Ok(Page::new(tasks, total, pagination))
    }

    /// Fetches a single task, applying the same visibility rule as `list`
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Task, ServiceError> {
        policy::require_permission(actor, "tasks.read")?;

        let task = Task::find_by_id(&self.pool, id)
            .await?
            .ok_or(ServiceError::NotFound("Task"))?;

        if !policy::sees_all_tasks(actor) && !self.is_visible_to(&task, actor.id()).await? {
            // Indistinguishable from a missing row on purpose
            return Err(ServiceError::NotFound("Task"));
        }

        Ok(task)
    }

    /// Creates a task
    ///
    /// Assigning to another user requires `tasks.assign`; filing under a
    /// team requires membership unless the actor is an admin.
    pub async fn create(&self, actor: &Actor, mut data: CreateTask) -> Result<Task, ServiceError> {
        policy::require_permission(actor, "tasks.create")?;

        data.created_by = actor.id();

        if let Some(assignee) = data.assigned_to {
            if assignee != actor.id() {
                policy::require_permission(actor, "tasks.assign")?;
            }
        }

        if let Some(team_id) = data.team_id {
            self.require_team_access(actor, team_id).await?;
        }

        let task = Task::create(&self.pool, data).await?;

        info!(task_id = %task.id, actor = %actor.id(), "task created");

        if task.assigned_to.is_some_and(|a| a != actor.id()) {
            self.notifications.notify_assignment(&task, actor.id()).await;
        }

        Ok(task)
    }

    /// Applies a generic field update
    ///
    /// Accepts any status with no state check; see the module docs.
    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Task, ServiceError> {
        let task = Task::find_by_id(&self.pool, id)
            .await?
            .ok_or(ServiceError::NotFound("Task"))?;

        policy::require_task_edit(actor, &task)?;

        if let Some(assignee) = data.assigned_to {
            if assignee != actor.id() && task.assigned_to != Some(assignee) {
                policy::require_permission(actor, "tasks.assign")?;
            }
        }

        if let Some(team_id) = data.team_id {
            if task.team_id != Some(team_id) {
                self.require_team_access(actor, team_id).await?;
            }
        }

        let old_status = task.status;
        let old_assignee = task.assigned_to;
        let new_status = data.status;
        let new_assignee = data.assigned_to;

        let updated = Task::update(&self.pool, id, data)
            .await?
            .ok_or(ServiceError::NotFound("Task"))?;

        info!(task_id = %updated.id, actor = %actor.id(), "task updated");

        if new_status.is_some_and(|s| s != old_status) {
            self.notifications
                .notify_status_change(&updated, old_status, actor.id())
                .await;
        }

        if new_assignee.is_some_and(|a| a != actor.id() && old_assignee != Some(a)) {
            self.notifications
                .notify_assignment(&updated, actor.id())
                .await;
        }

        Ok(updated)
    }

    /// Marks a task completed
    pub async fn mark_completed(&self, actor: &Actor, id: Uuid) -> Result<Task, ServiceError> {
        self.mark(actor, id, TaskStatus::Completed).await
    }

    /// Marks a task in progress
    pub async fn mark_in_progress(&self, actor: &Actor, id: Uuid) -> Result<Task, ServiceError> {
        self.mark(actor, id, TaskStatus::InProgress).await
    }

    /// Marks a task cancelled
    pub async fn mark_cancelled(&self, actor: &Actor, id: Uuid) -> Result<Task, ServiceError> {
        self.mark(actor, id, TaskStatus::Cancelled).await
    }

    async fn mark(
        &self,
        actor: &Actor,
        id: Uuid,
        target: TaskStatus,
    ) -> Result<Task, ServiceError> {
        let task = Task::find_by_id(&self.pool, id)
            .await?
            .ok_or(ServiceError::NotFound("Task"))?;

        policy::require_task_edit(actor, &task)?;

        if task.status == target {
            return Err(ServiceError::AlreadyInState(target));
        }

        let old_status = task.status;
        let updated = Task::set_status(&self.pool, id, target)
            .await?
            .ok_or(ServiceError::NotFound("Task"))?;

        info!(task_id = %updated.id, from = %old_status, to = %target, actor = %actor.id(),
              "task status changed");

        self.notifications
            .notify_status_change(&updated, old_status, actor.id())
            .await;

        Ok(updated)
    }

    /// Deletes a task
    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), ServiceError> {
        let task = Task::find_by_id(&self.pool, id)
            .await?
            .ok_or(ServiceError::NotFound("Task"))?;

        policy::require_task_delete(actor, &task)?;

        Task::delete(&self.pool, id).await?;

        info!(task_id = %id, actor = %actor.id(), "task deleted");

        Ok(())
    }

    /// Dashboard counts over the tasks visible to the actor
    pub async fn stats(&self, actor: &Actor) -> Result<TaskStats, ServiceError> {
        policy::require_permission(actor, "dashboard.read")?;

        let sees_all = policy::sees_all_tasks(actor);
        let where_clause = if sees_all {
            String::from("WHERE 1=1")
        } else {
            format!("WHERE {}", visibility_clause(1))
        };

        let query = format!(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status = 'pending'),
                   COUNT(*) FILTER (WHERE status = 'in_progress'),
                   COUNT(*) FILTER (WHERE status = 'completed'),
                   COUNT(*) FILTER (WHERE status = 'cancelled'),
                   COUNT(*) FILTER (WHERE due_date < CURRENT_DATE
                                      AND status NOT IN ('completed', 'cancelled'))
            FROM tasks {where_clause}
            "#
        );

        let (total, pending, in_progress, completed, cancelled, overdue): (
            i64,
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = {
            let mut q = sqlx::query_as(&query);
            if !sees_all {
                q = q.bind(actor.id());
            }
            q.fetch_one(&self.pool).await?
        };

        let completion_rate = if total == 0 {
            0.0
        } else {
            (completed as f64 / total as f64) * 100.0
        };

        Ok(TaskStats {
            total,
            pending,
            in_progress,
            completed,
            cancelled,
            overdue,
            completion_rate,
        })
    }

    /// Whether the task falls inside the actor's visibility window
    async fn is_visible_to(&self, task: &Task, user_id: Uuid) -> Result<bool, sqlx::Error> {
        if task.created_by == user_id || task.assigned_to == Some(user_id) {
            return Ok(true);
        }

        match task.team_id {
            Some(team_id) => TeamMember::is_member(&self.pool, team_id, user_id).await,
            None => Ok(false),
        }
    }

    async fn require_team_access(&self, actor: &Actor, team_id: Uuid) -> Result<(), ServiceError> {
        if actor.is_admin() {
            return Ok(());
        }

        if !TeamMember::is_member(&self.pool, team_id, actor.id()).await? {
            return Err(ServiceError::TeamAccessDenied);
        }

        Ok(())
    }
}
