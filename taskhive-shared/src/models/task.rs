/// Task model and database operations
///
/// Tasks are the primary work item of TaskHive. Each task has a status
/// lifecycle and a priority, belongs to its creator, and can reference an
/// assignee, a category and a team.
///
/// # State Machine
///
/// ```text
/// pending     → in_progress | cancelled
/// in_progress → completed   | cancelled
/// completed   → in_progress
/// cancelled   → pending
/// ```
///
/// The table documents the intended flow; the task service rejects only
/// re-marking a task with its current status, so corrections can move a
/// task along any edge.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'in_progress', 'completed', 'cancelled');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high', 'urgent');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'pending',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     due_date DATE,
///     completed_at TIMESTAMPTZ,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL,
///     category_id UUID REFERENCES categories(id) ON DELETE SET NULL,
///     team_id UUID REFERENCES teams(id) ON DELETE SET NULL,
///     estimated_hours DOUBLE PRECISION,
///     actual_hours DOUBLE PRECISION,
///     tags JSONB NOT NULL DEFAULT '[]',
///     attachments JSONB NOT NULL DEFAULT '[]',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Invariant: `completed_at` is non-null exactly when `status = 'completed'`.
/// Every mutating path in the task service maintains it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, not yet started
    Pending,

    /// Someone is working on it
    InProgress,

    /// Finished; `completed_at` is stamped
    Completed,

    /// Abandoned; can be reopened to pending
    Cancelled,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    /// Converts status to its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Human-readable label, consumed by the front end
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Cancelled => "Cancelled",
        }
    }

    /// Display color class, consumed by the front end
    pub fn color(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "bg-yellow-500",
            TaskStatus::InProgress => "bg-blue-500",
            TaskStatus::Completed => "bg-green-500",
            TaskStatus::Cancelled => "bg-red-500",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskStatus::Cancelled)
    }

    /// Whether the target status is a step in the intended workflow
    ///
    /// Total over all status pairs; anything not listed is a correction
    /// rather than part of the normal flow. The services do not gate on
    /// this, it classifies flows for callers.
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        match (self, target) {
            (TaskStatus::Pending, TaskStatus::InProgress) => true,
            (TaskStatus::Pending, TaskStatus::Cancelled) => true,

            (TaskStatus::InProgress, TaskStatus::Completed) => true,
            (TaskStatus::InProgress, TaskStatus::Cancelled) => true,

            // A completed task can be reopened
            (TaskStatus::Completed, TaskStatus::InProgress) => true,

            // A cancelled task can be restored to the backlog
            (TaskStatus::Cancelled, TaskStatus::Pending) => true,

            _ => false,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
            TaskPriority::Urgent => "Urgent",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            TaskPriority::Low => "green",
            TaskPriority::Medium => "blue",
            TaskPriority::High => "orange",
            TaskPriority::Urgent => "red",
        }
    }

    /// Numeric weight for sorting (urgent sorts last ascending)
    pub fn weight(&self) -> u8 {
        match self {
            TaskPriority::Low => 1,
            TaskPriority::Medium => 2,
            TaskPriority::High => 3,
            TaskPriority::Urgent => 4,
        }
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self, TaskPriority::Urgent)
    }

    pub fn is_high(&self) -> bool {
        matches!(self, TaskPriority::High | TaskPriority::Urgent)
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Short title
    pub title: String,

    /// Optional long-form description
    pub description: Option<String>,

    /// Current lifecycle status
    pub status: TaskStatus,

    /// Priority
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<NaiveDate>,

    /// When the task entered the completed status (null otherwise)
    pub completed_at: Option<DateTime<Utc>>,

    /// User who created the task
    pub created_by: Uuid,

    /// User the task is assigned to, if any
    pub assigned_to: Option<Uuid>,

    /// Category, if any
    pub category_id: Option<Uuid>,

    /// Team the task belongs to, if any
    pub team_id: Option<Uuid>,

    /// Estimated effort in hours
    pub estimated_hours: Option<f64>,

    /// Actual effort in hours
    pub actual_hours: Option<f64>,

    /// Free-form tags (JSON array of strings)
    pub tags: JsonValue,

    /// Attachment descriptors (JSON array)
    pub attachments: JsonValue,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

const TASK_COLUMNS: &str = "id, title, description, status, priority, due_date, completed_at, \
     created_by, assigned_to, category_id, team_id, estimated_hours, actual_hours, \
     tags, attachments, created_at, updated_at";

/// Input for creating a new task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    /// Short title
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status (defaults to pending)
    #[serde(default = "default_status")]
    pub status: TaskStatus,

    /// Priority (defaults to medium)
    #[serde(default = "default_priority")]
    pub priority: TaskPriority,

    /// Optional due date
    pub due_date: Option<NaiveDate>,

    /// Creating user
    pub created_by: Uuid,

    /// Optional assignee
    pub assigned_to: Option<Uuid>,

    /// Optional category
    pub category_id: Option<Uuid>,

    /// Optional team
    pub team_id: Option<Uuid>,

    /// Estimated hours
    pub estimated_hours: Option<f64>,

    /// Free-form tags
    #[serde(default = "empty_json_array")]
    pub tags: JsonValue,
}

fn default_status() -> TaskStatus {
    TaskStatus::Pending
}

fn default_priority() -> TaskPriority {
    TaskPriority::Medium
}

fn empty_json_array() -> JsonValue {
    JsonValue::Array(Vec::new())
}

/// Input for the generic field update
///
/// Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub tags: Option<JsonValue>,
    pub attachments: Option<JsonValue>,
}

impl Task {
    /// Checks if the task is past due and not completed
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) => due < now.date_naive() && !self.status.is_completed(),
            None => false,
        }
    }

    /// Checks if the task is due within the next three days
    pub fn is_due_soon(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) => {
                let today = now.date_naive();
                due >= today && (due - today).num_days() <= 3 && !self.status.is_completed()
            }
            None => false,
        }
    }

    /// Progress estimate in percent, from hour bookkeeping or completion
    pub fn progress_percentage(&self) -> u8 {
        match (self.estimated_hours, self.actual_hours) {
            (Some(estimated), Some(actual)) if estimated > 0.0 => {
                ((actual / estimated) * 100.0).round().min(100.0) as u8
            }
            _ => {
                if self.status.is_completed() {
                    100
                } else {
                    0
                }
            }
        }
    }

    /// Creates a new task
    ///
    /// `completed_at` is stamped when the initial status is completed, so the
    /// completion invariant holds from birth.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO tasks (title, description, status, priority, due_date, completed_at,
                               created_by, assigned_to, category_id, team_id, estimated_hours, tags)
            VALUES ($1, $2, $3, $4, $5,
                    CASE WHEN $3 = 'completed'::task_status THEN NOW() ELSE NULL END,
                    $6, $7, $8, $9, $10, $11)
            RETURNING {TASK_COLUMNS}
            "#
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.priority)
            .bind(data.due_date)
            .bind(data.created_by)
            .bind(data.assigned_to)
            .bind(data.category_id)
            .bind(data.team_id)
            .bind(data.estimated_hours)
            .bind(data.tags)
            .fetch_one(pool)
            .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(task)
    }

    /// Applies a generic field update, leaving absent fields untouched
    ///
    /// When the status field is part of the update, `completed_at` is
    /// stamped or cleared in the same statement so the completion invariant
    /// cannot be observed broken.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${bind_count}"));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${bind_count}"));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(
                ", status = ${bind_count}, completed_at = CASE \
                 WHEN ${bind_count} = 'completed'::task_status \
                 THEN COALESCE(completed_at, NOW()) ELSE NULL END"
            ));
        }
        if data.priority.is_some() {
            bind_count += 1;
            query.push_str(&format!(", priority = ${bind_count}"));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${bind_count}"));
        }
        if data.assigned_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assigned_to = ${bind_count}"));
        }
        if data.category_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", category_id = ${bind_count}"));
        }
        if data.team_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", team_id = ${bind_count}"));
        }
        if data.estimated_hours.is_some() {
            bind_count += 1;
            query.push_str(&format!(", estimated_hours = ${bind_count}"));
        }
        if data.actual_hours.is_some() {
            bind_count += 1;
            query.push_str(&format!(", actual_hours = ${bind_count}"));
        }
        if data.tags.is_some() {
            bind_count += 1;
            query.push_str(&format!(", tags = ${bind_count}"));
        }
        if data.attachments.is_some() {
            bind_count += 1;
            query.push_str(&format!(", attachments = ${bind_count}"));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TASK_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(assigned_to) = data.assigned_to {
            q = q.bind(assigned_to);
        }
        if let Some(category_id) = data.category_id {
            q = q.bind(category_id);
        }
        if let Some(team_id) = data.team_id {
            q = q.bind(team_id);
        }
        if let Some(estimated_hours) = data.estimated_hours {
            q = q.bind(estimated_hours);
        }
        if let Some(actual_hours) = data.actual_hours {
            q = q.bind(actual_hours);
        }
        if let Some(tags) = data.tags {
            q = q.bind(tags);
        }
        if let Some(attachments) = data.attachments {
            q = q.bind(attachments);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Moves the task to a new status, maintaining `completed_at`
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE tasks
            SET status = $2,
                completed_at = CASE WHEN $2 = 'completed'::task_status
                                    THEN COALESCE(completed_at, NOW())
                                    ELSE NULL END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await?;

        Ok(task)
    }

    /// Lists overdue, unfinished tasks (for the overdue notification fan-out)
    pub async fn list_overdue(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE due_date < CURRENT_DATE
               AND status NOT IN ('completed', 'cancelled')
             ORDER BY due_date ASC"
        );

        let tasks = sqlx::query_as::<_, Task>(&query).fetch_all(pool).await?;

        Ok(tasks)
    }

    /// Deletes a task
    ///
    /// Hard delete; there is no undo.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::InProgress.as_str(), "in_progress");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
        assert_eq!(TaskStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_transition_table_is_total() {
        use TaskStatus::*;

        let legal = [
            (Pending, InProgress),
            (Pending, Cancelled),
            (InProgress, Completed),
            (InProgress, Cancelled),
            (Completed, InProgress),
            (Cancelled, Pending),
        ];

        // Every one of the 16 pairs is classified, and only the six listed
        // transitions are legal.
        for from in TaskStatus::ALL {
            for to in TaskStatus::ALL {
                let expected = legal.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{from} -> {to} misclassified"
                );
            }
        }
    }

    #[test]
    fn test_status_labels_and_colors() {
        assert_eq!(TaskStatus::Pending.color(), "bg-yellow-500");
        assert_eq!(TaskStatus::InProgress.label(), "In progress");
        assert_eq!(TaskStatus::Completed.color(), "bg-green-500");
        assert_eq!(TaskStatus::Cancelled.color(), "bg-red-500");
    }

    #[test]
    fn test_priority_weights_are_ordered() {
        assert!(TaskPriority::Low.weight() < TaskPriority::Medium.weight());
        assert!(TaskPriority::Medium.weight() < TaskPriority::High.weight());
        assert!(TaskPriority::High.weight() < TaskPriority::Urgent.weight());
    }

    #[test]
    fn test_priority_flags() {
        assert!(TaskPriority::Urgent.is_urgent());
        assert!(!TaskPriority::High.is_urgent());
        assert!(TaskPriority::High.is_high());
        assert!(TaskPriority::Urgent.is_high());
        assert!(!TaskPriority::Medium.is_high());
    }

    fn sample_task(status: TaskStatus, due_date: Option<NaiveDate>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "sample".to_string(),
            description: None,
            status,
            priority: TaskPriority::Medium,
            due_date,
            completed_at: None,
            created_by: Uuid::new_v4(),
            assigned_to: None,
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

    #[test]
    fn test_is_overdue() {
        let now = Utc::now();
        let yesterday = now.date_naive() - chrono::Duration::days(1);

        let task = sample_task(TaskStatus::Pending, Some(yesterday));
        assert!(task.is_overdue(now));

        let done = sample_task(TaskStatus::Completed, Some(yesterday));
        assert!(!done.is_overdue(now));

        let undated = sample_task(TaskStatus::Pending, None);
        assert!(!undated.is_overdue(now));
    }

    #[test]
    fn test_is_due_soon_window() {
        let now = Utc::now();
        let in_two_days = now.date_naive() + chrono::Duration::days(2);
        let in_five_days = now.date_naive() + chrono::Duration::days(5);

        assert!(sample_task(TaskStatus::Pending, Some(in_two_days)).is_due_soon(now));
        assert!(!sample_task(TaskStatus::Pending, Some(in_five_days)).is_due_soon(now));
        assert!(!sample_task(TaskStatus::Completed, Some(in_two_days)).is_due_soon(now));
    }

    #[test]
    fn test_progress_percentage() {
        let mut task = sample_task(TaskStatus::Pending, None);
        assert_eq!(task.progress_percentage(), 0);

        task.estimated_hours = Some(10.0);
        task.actual_hours = Some(5.0);
        assert_eq!(task.progress_percentage(), 50);

        task.actual_hours = Some(20.0);
        assert_eq!(task.progress_percentage(), 100);

        let done = sample_task(TaskStatus::Completed, None);
        assert_eq!(done.progress_percentage(), 100);
    }
}
