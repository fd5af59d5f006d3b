/// Notification fan-out stub
///
/// Delivery transport is out of scope; every notification is resolved to
/// its recipient set and logged. The contract is fire-and-forget: nothing
/// here ever surfaces an error to the calling operation. A failed lookup
/// is logged and swallowed.

use std::collections::HashSet;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Task, TaskStatus, Team};

/// Logging notification service
#[derive(Debug, Clone)]
pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A task was assigned to a user other than the actor
    pub async fn notify_assignment(&self, task: &Task, assigned_by: Uuid) {
        let Some(assignee) = task.assigned_to else {
            return;
        };

        info!(
            task_id = %task.id,
            recipient = %assignee,
            assigned_by = %assigned_by,
            title = %task.title,
            "notification: task assigned"
        );
    }

    /// A task changed status
    ///
    /// Fans out to the creator, the assignee and the task's team members,
    /// excluding the user who made the change.
    pub async fn notify_status_change(
        &self,
        task: &Task,
        old_status: TaskStatus,
        changed_by: Uuid,
    ) {
        let mut recipients: HashSet<Uuid> = HashSet::new();
        recipients.insert(task.created_by);
        if let Some(assignee) = task.assigned_to {
            recipients.insert(assignee);
        }

        if let Some(team_id) = task.team_id {
            match sqlx::query_scalar::<_, Uuid>(
                "SELECT user_id FROM team_members WHERE team_id = $1",
            )
            .bind(team_id)
            .fetch_all(&self.pool)
            .await
            {
                Ok(members) => recipients.extend(members),
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "failed to resolve team recipients");
                }
            }
        }

        recipients.remove(&changed_by);

        for recipient in recipients {
            info!(
                task_id = %task.id,
                recipient = %recipient,
                from = %old_status,
                to = %task.status,
                changed_by = %changed_by,
                "notification: task status changed"
            );
        }
    }

    /// A user was added to a team roster
    pub async fn notify_team_invitation(&self, team: &Team, user_id: Uuid, invited_by: Uuid) {
        info!(
            team_id = %team.id,
            recipient = %user_id,
            invited_by = %invited_by,
            team = %team.name,
            "notification: added to team"
        );
    }

    /// Notifies assignees and creators of every overdue task
    ///
    /// Returns the number of tasks that produced notifications.
    pub async fn notify_overdue_tasks(&self) -> usize {
        let tasks = match Task::list_overdue(&self.pool).await {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(error = %e, "failed to load overdue tasks");
                return 0;
            }
        };

        for task in &tasks {
            let recipient = task.assigned_to.unwrap_or(task.created_by);
            info!(
                task_id = %task.id,
                recipient = %recipient,
                due_date = ?task.due_date,
                "notification: task overdue"
            );
        }

        tasks.len()
    }

    /// Per-user summary of open and due-today tasks
    ///
    /// Returns the number of users that received a summary.
    pub async fn notify_daily_summary(&self) -> usize {
        let rows: Vec<(Uuid, i64, i64)> = match sqlx::query_as(
            r#"
            SELECT u.id,
                   COUNT(t.id) FILTER (WHERE t.status IN ('pending', 'in_progress')),
                   COUNT(t.id) FILTER (WHERE t.due_date = CURRENT_DATE
                                         AND t.status NOT IN ('completed', 'cancelled'))
            FROM users u
            INNER JOIN tasks t ON t.assigned_to = u.id OR t.created_by = u.id
            WHERE u.is_active
            GROUP BY u.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "failed to compute daily summaries");
                return 0;
            }
        };

        for (user_id, open_tasks, due_today) in &rows {
            info!(
                recipient = %user_id,
                open_tasks,
                due_today,
                "notification: daily summary"
            );
        }

        rows.len()
    }

    /// Weekly per-team activity report, including the most active member
    ///
    /// Returns the number of teams that produced a report.
    pub async fn notify_weekly_report(&self) -> usize {
        let week_ago = Utc::now() - chrono::Duration::days(7);

        let rows: Vec<(Uuid, String, i64, Option<Uuid>)> = match sqlx::query_as(
            r#"
            SELECT tm.id,
                   tm.name,
                   COUNT(t.id) FILTER (WHERE t.status = 'completed'
                                         AND t.completed_at >= $1),
                   (SELECT t2.assigned_to
                    FROM tasks t2
                    WHERE t2.team_id = tm.id
                      AND t2.status = 'completed'
                      AND t2.completed_at >= $1
                      AND t2.assigned_to IS NOT NULL
                    GROUP BY t2.assigned_to
                    ORDER BY COUNT(*) DESC
                    LIMIT 1)
            FROM teams tm
            LEFT JOIN tasks t ON t.team_id = tm.id
            WHERE tm.is_active
            GROUP BY tm.id
            "#,
        )
        .bind(week_ago)
        .fetch_all(&self.pool)
        .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "failed to compute weekly reports");
                return 0;
            }
        };

        for (team_id, name, completed_this_week, most_active) in &rows {
            info!(
                team_id = %team_id,
                team = %name,
                completed_this_week,
                most_active_member = ?most_active,
                "notification: weekly team report"
            );
        }

        rows.len()
    }
}
