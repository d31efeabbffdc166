//! Executor lifecycle: submission, state handling, deadline and cancellation.

use std::time::Duration;

use scrapetok_athena::*;
use tokio_util::sync::CancellationToken;

use crate::fake::{settings, FakeBackend};

#[tokio::test(start_paused = true)]
async fn test_running_running_failed_surfaces_reason() {
    let backend = FakeBackend::new(
        vec![
            JobStatus::running(),
            JobStatus::running(),
            JobStatus::failed("insufficient permissions"),
        ],
        vec![],
    );
    let executor = QueryExecutor::new(backend.clone(), settings());

    let err = executor
        .execute(&Query::new("SELECT 1"), "scrapetok_db", "s3://out/")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("insufficient permissions"));
    // Failed jobs are never fetched or cancelled.
    assert_eq!(*backend.fetches.lock().unwrap(), 0);
    assert_eq!(*backend.cancels.lock().unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_query_text_and_target_pass_through() {
    let backend = FakeBackend::succeeding(vec![vec![Some("x")]]);
    let executor = QueryExecutor::new(backend.clone(), settings());

    let sql = "SELECT x FROM t -- caller's text is not rewritten";
    executor
        .execute(&Query::new(sql), "other_db", "s3://elsewhere/")
        .await
        .unwrap();

    let requests = backend.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].sql, sql);
    assert_eq!(requests[0].database, "other_db");
    assert_eq!(requests[0].output_location, "s3://elsewhere/");
    assert!(requests[0].parameters.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_identical_queries_run_as_separate_jobs() {
    let backend = FakeBackend::succeeding(vec![vec![Some("x")]]);
    let executor = QueryExecutor::new(backend.clone(), settings());
    let query = Query::new("SELECT 1");

    let (a, b) = tokio::join!(
        executor.execute(&query, "db", "s3://out/"),
        executor.execute(&query, "db", "s3://out/"),
    );
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(backend.requests.lock().unwrap().len(), 2);
    assert_eq!(*backend.fetches.lock().unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_after_deadline() {
    let backend = FakeBackend::new(vec![JobStatus::running()], vec![]);
    let mut settings = settings();
    settings.timeout = Duration::from_secs(10);
    let executor = QueryExecutor::new(backend.clone(), settings);

    let err = executor
        .execute(&Query::new("SELECT 1"), "db", "s3://out/")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("timed out after 10s"));
    assert_eq!(*backend.cancels.lock().unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_guard_cancels_job() {
    let backend = FakeBackend::new(vec![JobStatus::running()], vec![]);
    let executor = std::sync::Arc::new(QueryExecutor::new(backend.clone(), settings()));
    let token = CancellationToken::new();

    let task = {
        let executor = executor.clone();
        let token = token.clone();
        tokio::spawn(async move { executor.run(&Query::new("SELECT 1"), &token).await })
    };

    let guard = token.drop_guard();
    tokio::time::sleep(Duration::from_secs(5)).await;
    drop(guard);

    let err = task.await.unwrap().unwrap_err();
    assert!(matches!(err, AthenaError::Cancelled { .. }));
    assert_eq!(*backend.cancels.lock().unwrap(), 1);
}
