mod common;

use common::test_policy;
use drive_image_bot::entities::{metadata, prelude::*};
use drive_image_bot::infrastructure::database;
use drive_image_bot::services::catalog::{CatalogStore, CreateOutcome, NewImage};
use drive_image_bot::services::executor::{Executor, RetryPolicy, StoreError};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait,
    Set, TransactionTrait,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tempfile::TempDir;

async fn setup_executor(dir: &TempDir, busy_timeout: Duration) -> Executor {
    let path = dir.path().join("retry.db");
    let db = database::connect(path.to_str().unwrap(), busy_timeout, 4)
        .await
        .unwrap();
    database::init_schema(&db).await.unwrap();
    database::migrate(&db).await.unwrap();
    Executor::new(db, test_policy())
}

async fn insert_marker(txn: &DatabaseTransaction, key: &str) -> Result<(), DbErr> {
    metadata::ActiveModel {
        key: Set(key.to_string()),
        value: Set(Some("x".to_string())),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn marker_count(db: &DatabaseConnection) -> u64 {
    Metadata::find().count(db).await.unwrap() - 1 // schema_version row
}

#[tokio::test]
async fn test_retries_lock_errors_then_commits_once() {
    let dir = tempfile::tempdir().unwrap();
    let executor = setup_executor(&dir, Duration::from_secs(5)).await;

    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let result = executor
        .run("flaky_insert", move |txn| {
            let counter = counter.clone();
            Box::pin(async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                insert_marker(txn, "marker").await?;
                if n < 3 {
                    return Err(StoreError::Busy("database is locked".to_string()));
                }
                Ok(n)
            })
        })
        .await;

    assert_eq!(result.unwrap(), 3);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    // Failed attempts were rolled back
    assert_eq!(marker_count(executor.connection()).await, 1);
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let dir = tempfile::tempdir().unwrap();
    let executor = setup_executor(&dir, Duration::from_secs(5)).await;

    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let result: Result<(), StoreError> = executor
        .run("always_locked", move |txn| {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                insert_marker(txn, "marker").await?;
                Err(StoreError::Busy("database is locked".to_string()))
            })
        })
        .await;

    assert!(matches!(result, Err(StoreError::Busy(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), test_policy().max_attempts);
    assert_eq!(marker_count(executor.connection()).await, 0);
}

#[tokio::test]
async fn test_other_errors_fail_fast() {
    let dir = tempfile::tempdir().unwrap();
    let executor = setup_executor(&dir, Duration::from_secs(5)).await;

    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let result: Result<(), StoreError> = executor
        .run("broken", move |txn| {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                insert_marker(txn, "marker").await?;
                Err(StoreError::Database(DbErr::Custom("disk I/O error".to_string())))
            })
        })
        .await;

    assert!(matches!(result, Err(StoreError::Database(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(marker_count(executor.connection()).await, 0);
}

#[tokio::test]
async fn test_real_write_lock_is_reported_as_busy() {
    let dir = tempfile::tempdir().unwrap();
    let executor = setup_executor(&dir, Duration::from_millis(50)).await;
    let catalog = CatalogStore::new(Executor::new(
        executor.connection().clone(),
        RetryPolicy {
            max_attempts: 2,
            backoff_unit: Duration::from_millis(10),
        },
    ));

    // Hold the write lock from another connection
    let holder = executor.connection().begin().await.unwrap();
    insert_marker(&holder, "lock-holder").await.unwrap();

    let image = NewImage {
        title: "Blocked".to_string(),
        source_file_id: "tg-1".to_string(),
        storage_file_id: "d1".to_string(),
        share_link: "https://drive.google.com/file/d/d1/view".to_string(),
        direct_link: None,
        file_size: None,
        uploader_id: None,
    };

    let blocked = catalog.create(image.clone()).await;
    assert!(matches!(blocked, Err(StoreError::Busy(_))));

    holder.commit().await.unwrap();

    let outcome = catalog.create(image).await.unwrap();
    assert!(matches!(outcome, CreateOutcome::Created(_)));
}
