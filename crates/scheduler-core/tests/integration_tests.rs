use chrono::NaiveDate;
use scheduler_core::db::establish_connection;
use scheduler_core::error::CoreError;
use scheduler_core::lifecycle::TaskLifecycle;
use scheduler_core::models::{CompletionResult, NewTask, RepeatRule, TaskId, TaskInput};
use scheduler_core::recurrence::parse_date;
use scheduler_core::repository::{SqliteRepository, TaskRepository};
use std::sync::Arc;
use tempfile::TempDir;

/// Helper function to create a test database
async fn setup_test_db() -> (SqliteRepository, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("store").join("scheduler.db");

    let pool = establish_connection(&db_path.to_string_lossy())
        .await
        .expect("Failed to establish test database connection");

    (SqliteRepository::new(pool), temp_dir)
}

fn date(s: &str) -> NaiveDate {
    parse_date(s).expect("valid test date")
}

fn new_task(title: &str, date_str: &str, repeat: Option<RepeatRule>) -> NewTask {
    NewTask {
        date: date(date_str),
        title: title.to_string(),
        comment: format!("Test task: {}", title),
        repeat,
    }
}

#[tokio::test]
async fn test_establish_connection_creates_missing_directories() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("a").join("b").join("scheduler.db");

    establish_connection(&db_path.to_string_lossy()).await.unwrap();
    assert!(db_path.exists());

    // Reopening runs the migrations again without failing.
    establish_connection(&db_path.to_string_lossy()).await.unwrap();
}

#[tokio::test]
async fn test_basic_crud_workflow() {
    let (repo, _temp_dir) = setup_test_db().await;

    let id = repo
        .insert(&new_task("Pay rent", "20240605", Some(RepeatRule::Daily(30))))
        .await
        .unwrap();

    let mut task = repo.fetch_by_id(id).await.unwrap().expect("task stored");
    assert_eq!(task.title, "Pay rent");
    assert_eq!(task.comment, "Test task: Pay rent");
    assert_eq!(task.date, date("20240605"));
    assert_eq!(task.repeat, Some(RepeatRule::Daily(30)));

    task.title = "Pay rent (flat)".to_string();
    task.repeat = None;
    assert_eq!(repo.update(&task).await.unwrap(), 1);

    let updated = repo.fetch_by_id(id).await.unwrap().unwrap();
    assert_eq!(updated.title, "Pay rent (flat)");
    assert_eq!(updated.repeat, None);

    assert_eq!(repo.delete(id).await.unwrap(), 1);
    assert!(repo.fetch_by_id(id).await.unwrap().is_none());
    assert_eq!(repo.delete(id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_missing_row_affects_nothing() {
    let (repo, _temp_dir) = setup_test_db().await;
    let id = repo.insert(&new_task("Only", "20240101", None)).await.unwrap();
    let mut task = repo.fetch_by_id(id).await.unwrap().unwrap();
    task.id = TaskId(id.0 + 100);

    assert_eq!(repo.update(&task).await.unwrap(), 0);
}

#[tokio::test]
async fn test_fetch_all_orders_by_date_and_limits() {
    let (repo, _temp_dir) = setup_test_db().await;

    for (title, day) in [("c", "20240303"), ("a", "20240101"), ("b", "20240202")] {
        repo.insert(&new_task(title, day, None)).await.unwrap();
    }

    let titles: Vec<String> = repo
        .fetch_all(30)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["a", "b", "c"]);

    assert_eq!(repo.fetch_all(2).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_fetch_all_on_empty_table() {
    let (repo, _temp_dir) = setup_test_db().await;
    assert!(repo.fetch_all(30).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_guarded_writes_reject_stale_reads() {
    let (repo, _temp_dir) = setup_test_db().await;
    let id = repo
        .insert(&new_task("Stretch", "20240601", Some(RepeatRule::Daily(1))))
        .await
        .unwrap();
    let stale = repo.fetch_by_id(id).await.unwrap().unwrap();

    assert_eq!(repo.reschedule(&stale, date("20240602")).await.unwrap(), 1);
    assert_eq!(repo.reschedule(&stale, date("20240602")).await.unwrap(), 0);

    // A repeating row is never removed by the one-off completion path.
    let fresh = repo.fetch_by_id(id).await.unwrap().unwrap();
    assert_eq!(repo.delete_completed(&fresh).await.unwrap(), 0);
    assert!(repo.fetch_by_id(id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_malformed_stored_rule_is_skipped_in_listing() {
    let (repo, _temp_dir) = setup_test_db().await;
    let valid = repo.insert(&new_task("Current", "20240201", None)).await.unwrap();

    let legacy = sqlx::query(
        "INSERT INTO scheduler (date, title, comment, repeat) VALUES ($1, $2, $3, $4)",
    )
    .bind("20240101")
    .bind("Legacy")
    .bind("")
    .bind("w 1,2")
    .execute(repo.pool())
    .await
    .unwrap()
    .last_insert_rowid();

    let listed = repo.fetch_all(30).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, valid);

    let result = repo.fetch_by_id(TaskId(legacy)).await;
    assert!(matches!(result, Err(CoreError::UnsupportedRule(rule)) if rule == "w 1,2"));
}

#[tokio::test]
async fn test_concurrent_completions_of_due_task_never_collapse() {
    let (repo, _temp_dir) = setup_test_db().await;
    let lifecycle = TaskLifecycle::new(Arc::new(repo));
    let today = date("20240610");
    let id = lifecycle
        .add_task(
            TaskInput {
                title: "Daily standup".to_string(),
                repeat: "d 1".to_string(),
                ..Default::default()
            },
            today,
        )
        .await
        .unwrap()
        .to_string();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let lifecycle = lifecycle.clone();
            let id = id.clone();
            tokio::spawn(async move { lifecycle.complete_task(&id, today).await })
        })
        .collect();

    let mut applied = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(CompletionResult::Rescheduled(_)) => applied += 1,
            Err(CoreError::Conflict(_)) => {}
            other => panic!("unexpected completion result: {:?}", other),
        }
    }

    // Every applied completion moved the task exactly one more day.
    assert!(applied >= 1);
    let stored = lifecycle.get_task(&id).await.unwrap();
    assert_eq!((stored.date - today).num_days(), applied);
}

#[tokio::test]
async fn test_lifecycle_over_sqlite() {
    let (repo, _temp_dir) = setup_test_db().await;
    let lifecycle = TaskLifecycle::new(Arc::new(repo));
    let today = date("20240610");

    let once = lifecycle
        .add_task(
            TaskInput {
                title: "Call the bank".to_string(),
                date: "20240101".to_string(),
                ..Default::default()
            },
            today,
        )
        .await
        .unwrap();
    let yearly = lifecycle
        .add_task(
            TaskInput {
                title: "Birthday".to_string(),
                date: "20200229".to_string(),
                repeat: "y".to_string(),
                ..Default::default()
            },
            today,
        )
        .await
        .unwrap();

    let once_task = lifecycle.get_task(&once.to_string()).await.unwrap();
    assert_eq!(once_task.date, today);

    // 2020-02-29 steps to 2021-03-01 and stays on Mar 1.
    let yearly_task = lifecycle.get_task(&yearly.to_string()).await.unwrap();
    assert_eq!(yearly_task.date, date("20250301"));

    assert_eq!(
        lifecycle.complete_task(&once.to_string(), today).await.unwrap(),
        CompletionResult::Deleted
    );
    assert!(matches!(
        lifecycle.complete_task(&once.to_string(), today).await,
        Err(CoreError::NotFound(_))
    ));

    // A future date is pushed one more year by completion.
    assert_eq!(
        lifecycle.complete_task(&yearly.to_string(), today).await.unwrap(),
        CompletionResult::Rescheduled(date("20260301"))
    );

    let remaining = lifecycle.list_tasks(30).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].repeat_string(), "y");
}

#[tokio::test]
async fn test_concurrent_completions_delete_once() {
    let (repo, _temp_dir) = setup_test_db().await;
    let lifecycle = TaskLifecycle::new(Arc::new(repo));
    let today = date("20240610");
    let id = lifecycle
        .add_task(
            TaskInput {
                title: "Once".to_string(),
                ..Default::default()
            },
            today,
        )
        .await
        .unwrap()
        .to_string();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let lifecycle = lifecycle.clone();
            let id = id.clone();
            tokio::spawn(async move { lifecycle.complete_task(&id, today).await })
        })
        .collect();

    let mut deleted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(CompletionResult::Deleted) => deleted += 1,
            Err(CoreError::NotFound(_)) | Err(CoreError::Conflict(_)) => {}
            other => panic!("unexpected completion result: {:?}", other),
        }
    }
    assert_eq!(deleted, 1);
}
