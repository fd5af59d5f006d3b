/// Task lifecycle integration tests
///
/// Exercise the task service against a real database: the mark-as
/// operations, the `completed_at` invariant and the visibility window.

mod common;

use serde_json::json;
use taskhive_shared::models::{CreateTask, TaskPriority, TaskStatus, UpdateTask};
use taskhive_shared::services::{ServiceError, TaskFilter, TaskService};
use uuid::Uuid;

fn new_task(title: &str) -> CreateTask {
    CreateTask {
        title: title.to_string(),
        description: None,
        status: TaskStatus::Pending,
        priority: TaskPriority::Medium,
        due_date: None,
        // Overwritten by the service with the acting user
        created_by: Uuid::nil(),
        assigned_to: None,
        category_id: None,
        team_id: None,
        estimated_hours: None,
        tags: json!([]),
    }
}

#[tokio::test]
async fn test_completed_at_follows_status() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let service = TaskService::new(pool.clone());
    let actor = common::create_actor(&pool, "user").await;

    let task = service
        .create(&actor, new_task("Lifecycle round trip"))
        .await
        .expect("Should create task");
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(task.completed_at.is_none());

    let task = service
        .mark_in_progress(&actor, task.id)
        .await
        .expect("Should start task");
    assert!(task.completed_at.is_none());

    let task = service
        .mark_completed(&actor, task.id)
        .await
        .expect("Should complete task");
    assert_eq!(task.status, TaskStatus::Completed);
    assert!(task.completed_at.is_some());

    // Reopening clears the completion stamp
    let task = service
        .mark_in_progress(&actor, task.id)
        .await
        .expect("Should reopen task");
    assert_eq!(task.status, TaskStatus::InProgress);
    assert!(task.completed_at.is_none());

    // Completing again stamps it fresh
    let task = service
        .mark_completed(&actor, task.id)
        .await
        .expect("Should complete task again");
    assert!(task.completed_at.is_some());
}

#[tokio::test]
async fn test_marking_current_status_is_rejected() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let service = TaskService::new(pool.clone());
    let actor = common::create_actor(&pool, "user").await;

    let task = service
        .create(&actor, new_task("Double completion"))
        .await
        .expect("Should create task");

    service
        .mark_in_progress(&actor, task.id)
        .await
        .expect("Should start task");
    service
        .mark_completed(&actor, task.id)
        .await
        .expect("Should complete task");

    let err = service
        .mark_completed(&actor, task.id)
        .await
        .expect_err("Second completion should fail");
    assert!(matches!(
        err,
        ServiceError::AlreadyInState(TaskStatus::Completed)
    ));
}

#[tokio::test]
async fn test_pending_task_completes_directly() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let service = TaskService::new(pool.clone());
    let actor = common::create_actor(&pool, "user").await;

    // A fresh task can be marked completed without passing through
    // in-progress; only re-marking the current status is rejected.
    let task = service
        .create(&actor, new_task("Pending straight to completed"))
        .await
        .expect("Should create task");
    assert_eq!(task.status, TaskStatus::Pending);

    let task = service
        .mark_completed(&actor, task.id)
        .await
        .expect("Pending should complete directly");
    assert_eq!(task.status, TaskStatus::Completed);
    assert!(task.completed_at.is_some());

    let err = service
        .mark_completed(&actor, task.id)
        .await
        .expect_err("Second completion should fail");
    assert!(matches!(
        err,
        ServiceError::AlreadyInState(TaskStatus::Completed)
    ));
}

#[tokio::test]
async fn test_generic_update_maintains_completion_stamp() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let service = TaskService::new(pool.clone());
    let actor = common::create_actor(&pool, "user").await;

    let task = service
        .create(&actor, new_task("Corrections escape hatch"))
        .await
        .expect("Should create task");

    // The generic update applies any status without a state check
    let task = service
        .update(
            &actor,
            task.id,
            UpdateTask {
                status: Some(TaskStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .expect("Should force status to completed");
    assert_eq!(task.status, TaskStatus::Completed);
    assert!(task.completed_at.is_some());

    let task = service
        .update(
            &actor,
            task.id,
            UpdateTask {
                status: Some(TaskStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .expect("Should force status back to pending");
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(task.completed_at.is_none());
}

#[tokio::test]
async fn test_tasks_invisible_outside_visibility_window() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let service = TaskService::new(pool.clone());
    let creator = common::create_actor(&pool, "user").await;
    let stranger = common::create_actor(&pool, "user").await;
    let admin = common::create_actor(&pool, "admin").await;

    let task = service
        .create(&creator, new_task("Private work item"))
        .await
        .expect("Should create task");

    // A fresh user with no teams sees nothing at all
    let page = service
        .list(&stranger, &TaskFilter::default())
        .await
        .expect("Should list tasks");
    assert_eq!(page.total, 0);
    assert!(page.data.is_empty());

    // Fetching it directly looks like a missing row
    let err = service
        .get(&stranger, task.id)
        .await
        .expect_err("Foreign task should be invisible");
    assert!(matches!(err, ServiceError::NotFound("Task")));

    // Admins see everything
    let fetched = service
        .get(&admin, task.id)
        .await
        .expect("Admin should see the task");
    assert_eq!(fetched.id, task.id);
}

#[tokio::test]
async fn test_delete_requires_creator_or_admin() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let service = TaskService::new(pool.clone());
    let creator = common::create_actor(&pool, "user").await;
    let stranger = common::create_actor(&pool, "user").await;

    let task = service
        .create(&creator, new_task("Deletion guard"))
        .await
        .expect("Should create task");

    let err = service
        .delete(&stranger, task.id)
        .await
        .expect_err("Stranger must not delete");
    assert!(matches!(err, ServiceError::Policy(_)));

    service
        .delete(&creator, task.id)
        .await
        .expect("Creator should delete");

    let err = service
        .get(&creator, task.id)
        .await
        .expect_err("Task should be gone");
    assert!(matches!(err, ServiceError::NotFound("Task")));
}

#[tokio::test]
async fn test_filing_under_foreign_team_is_rejected() {
    let Some(pool) = common::test_pool().await else {
        return;
    };
    let tasks = TaskService::new(pool.clone());
    let teams = taskhive_shared::services::TeamService::new(pool.clone());

    let manager = common::create_actor(&pool, "manager").await;
    let outsider = common::create_actor(&pool, "user").await;

    let team = teams
        .create_team(
            &manager,
            taskhive_shared::services::CreateTeamInput {
                name: format!("Guarded {}", Uuid::new_v4()),
                description: None,
                color: None,
                member_ids: vec![],
            },
        )
        .await
        .expect("Should create team");

    let mut data = new_task("Not my team");
    data.team_id = Some(team.id);

    let err = tasks
        .create(&outsider, data)
        .await
        .expect_err("Non-member must not file under the team");
    assert!(matches!(err, ServiceError::TeamAccessDenied));
}
