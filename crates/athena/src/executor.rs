//! Query execution: submit, poll until terminal, fetch and reshape.
//!
//! [`QueryExecutor`] owns an injected [`QueryBackend`] and runs one job per
//! call. Polling uses a fixed interval bounded by a deadline; on deadline or
//! caller cancellation the remote job is stopped on a best-effort basis.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backend::{JobHandle, JobState, JobStatus, QueryBackend, QueryRequest};
use crate::config::AthenaConfig;
use crate::error::AthenaError;
use crate::result::Record;
use crate::sql::Query;

/// Where queries run by default and how long to wait for them.
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub database: String,
    pub output_location: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl From<&AthenaConfig> for ExecutorSettings {
    fn from(config: &AthenaConfig) -> Self {
        Self {
            database: config.database.clone(),
            output_location: config.output_location.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }
}

/// Runs SQL against the backing service and returns row-oriented records.
///
/// Holds no per-call state; one instance is shared by all requests.
pub struct QueryExecutor {
    backend: Option<Arc<dyn QueryBackend>>,
    settings: ExecutorSettings,
}

impl QueryExecutor {
    pub fn new(backend: Arc<dyn QueryBackend>, settings: ExecutorSettings) -> Self {
        Self {
            backend: Some(backend),
            settings,
        }
    }

    /// An executor whose every call fails with [`AthenaError::NotInitialized`].
    pub fn uninitialized(settings: ExecutorSettings) -> Self {
        Self {
            backend: None,
            settings,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Execute `query` against the configured database and output location.
    pub async fn run(
        &self,
        query: &Query,
        cancel: &CancellationToken,
    ) -> Result<Vec<Record>, AthenaError> {
        self.execute_cancellable(
            query,
            &self.settings.database,
            &self.settings.output_location,
            cancel,
        )
        .await
    }

    /// Execute `query` bound to `database`, writing results to `output_location`.
    pub async fn execute(
        &self,
        query: &Query,
        database: &str,
        output_location: &str,
    ) -> Result<Vec<Record>, AthenaError> {
        self.execute_cancellable(query, database, output_location, &CancellationToken::new())
            .await
    }

    /// Like [`execute`](Self::execute), but gives up when `cancel` fires.
    ///
    /// The deadline covers the whole call, including submission and the
    /// result fetch. Every backend call is raced against it and `cancel`, so
    /// a stalled request cannot hold the caller past either.
    pub async fn execute_cancellable(
        &self,
        query: &Query,
        database: &str,
        output_location: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Record>, AthenaError> {
        let backend = self.backend.as_deref().ok_or(AthenaError::NotInitialized)?;
        let start = Instant::now();
        let deadline = start + self.settings.timeout;

        let request = QueryRequest {
            sql: query.sql().to_string(),
            parameters: query.execution_parameters(),
            database: database.to_string(),
            output_location: output_location.to_string(),
        };

        info!(
            sql = %request.sql,
            parameters = request.parameters.len(),
            database = %database,
            "Starting Athena query"
        );
        let handle = match bounded(backend.submit(&request), deadline, cancel).await {
            Ok(submitted) => submitted?,
            // No handle yet, so there is nothing to stop remotely.
            Err(interrupt) => return Err(self.interrupted(interrupt, UNSUBMITTED)),
        };
        info!(query_id = %handle, "Query execution started");

        let status = self
            .wait_for_completion(backend, &handle, start, deadline, cancel)
            .await?;
        if status.state != JobState::Succeeded {
            let reason = status.reason.unwrap_or_else(|| "Unknown".to_string());
            error!(query_id = %handle, state = %status.state, reason = %reason, "Query failed");
            return Err(AthenaError::QueryFailed {
                state: status.state,
                reason,
            });
        }

        let result_set = match bounded(backend.results(&handle), deadline, cancel).await {
            Ok(fetched) => fetched?,
            Err(interrupt) => return Err(self.interrupted(interrupt, handle.as_str())),
        };
        let records = result_set.into_records()?;
        info!(query_id = %handle, records = records.len(), "Query finished");
        Ok(records)
    }

    /// Poll at the fixed interval until the job leaves `RUNNING`.
    ///
    /// Any early exit (deadline, caller cancel, failed status call) stops the
    /// remote job first.
    async fn wait_for_completion(
        &self,
        backend: &dyn QueryBackend,
        handle: &JobHandle,
        start: Instant,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<JobStatus, AthenaError> {
        loop {
            let status = match bounded(backend.status(handle), deadline, cancel).await {
                Ok(Ok(status)) => status,
                Ok(Err(e)) => {
                    warn!(query_id = %handle, error = %e, "Status check failed, cancelling");
                    abandon(backend, handle).await;
                    return Err(e);
                }
                Err(interrupt) => {
                    abandon(backend, handle).await;
                    return Err(self.interrupted(interrupt, handle.as_str()));
                }
            };

            debug!(
                query_id = %handle,
                state = ?status.state,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Polling query status"
            );

            if status.state.is_terminal() {
                return Ok(status);
            }

            if Instant::now() >= deadline {
                abandon(backend, handle).await;
                return Err(self.interrupted(Interrupt::Deadline, handle.as_str()));
            }

            let wake = (Instant::now() + self.settings.poll_interval).min(deadline);
            let nap = async {
                tokio::time::sleep_until(wake).await;
                Ok::<(), AthenaError>(())
            };
            if let Err(interrupt) = bounded(nap, deadline, cancel).await {
                abandon(backend, handle).await;
                return Err(self.interrupted(interrupt, handle.as_str()));
            }
        }
    }

    /// Log an interrupted call and turn it into the matching error.
    fn interrupted(&self, interrupt: Interrupt, query_id: &str) -> AthenaError {
        match interrupt {
            Interrupt::Deadline => {
                warn!(
                    query_id = %query_id,
                    timeout_seconds = self.settings.timeout.as_secs(),
                    "Query timed out"
                );
                AthenaError::Timeout {
                    query_id: query_id.to_string(),
                    seconds: self.settings.timeout.as_secs(),
                }
            }
            Interrupt::Cancelled => {
                warn!(query_id = %query_id, "Query abandoned by caller");
                AthenaError::Cancelled {
                    query_id: query_id.to_string(),
                }
            }
        }
    }
}

/// Placeholder id for a job whose submission never returned.
const UNSUBMITTED: &str = "<unsubmitted>";

/// Why a backend call was given up on before it resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    Deadline,
    Cancelled,
}

/// Race `call` against the deadline and the caller's token.
///
/// `call` is polled first, so a call that is already complete wins over a
/// deadline that elapses at the same instant.
async fn bounded<T>(
    call: impl Future<Output = Result<T, AthenaError>>,
    deadline: Instant,
    cancel: &CancellationToken,
) -> Result<Result<T, AthenaError>, Interrupt> {
    tokio::select! {
        biased;
        result = call => Ok(result),
        _ = cancel.cancelled() => Err(Interrupt::Cancelled),
        _ = tokio::time::sleep_until(deadline) => Err(Interrupt::Deadline),
    }
}

/// Best-effort remote cancel; failures are only logged.
async fn abandon(backend: &dyn QueryBackend, handle: &JobHandle) {
    if let Err(e) = backend.cancel(handle).await {
        warn!(query_id = %handle, error = %e, "Failed to cancel query");
    }
}

// ---------------------------------------------------------------------------
// Tests: scripted backend, no AWS calls
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::result::ResultSet;

    /// Replays a fixed sequence of statuses; the last one repeats forever.
    struct Scripted {
        statuses: Mutex<VecDeque<JobStatus>>,
        rows: Vec<Vec<Option<String>>>,
        submitted: Mutex<Vec<QueryRequest>>,
        polls: Mutex<u32>,
        cancels: Mutex<u32>,
    }

    impl Scripted {
        fn new(statuses: Vec<JobStatus>, rows: Vec<Vec<Option<&str>>>) -> Arc<Self> {
            Arc::new(Self {
                statuses: Mutex::new(statuses.into()),
                rows: rows
                    .into_iter()
                    .map(|r| r.into_iter().map(|c| c.map(str::to_string)).collect())
                    .collect(),
                submitted: Mutex::new(Vec::new()),
                polls: Mutex::new(0),
                cancels: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl QueryBackend for Scripted {
        async fn submit(&self, request: &QueryRequest) -> Result<JobHandle, AthenaError> {
            self.submitted.lock().unwrap().push(request.clone());
            Ok(JobHandle::new("job-1"))
        }

        async fn status(&self, _handle: &JobHandle) -> Result<JobStatus, AthenaError> {
            *self.polls.lock().unwrap() += 1;
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                Ok(statuses.pop_front().unwrap())
            } else {
                Ok(statuses.front().cloned().unwrap_or_else(JobStatus::running))
            }
        }

        async fn results(&self, _handle: &JobHandle) -> Result<ResultSet, AthenaError> {
            Ok(ResultSet::new(self.rows.clone()))
        }

        async fn cancel(&self, _handle: &JobHandle) -> Result<(), AthenaError> {
            *self.cancels.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn settings(timeout_secs: u64) -> ExecutorSettings {
        ExecutorSettings {
            database: "scrapetok_db".into(),
            output_location: "s3://results/".into(),
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_success_then_reshapes() {
        let backend = Scripted::new(
            vec![JobStatus::running(), JobStatus::running(), JobStatus::succeeded()],
            vec![vec![Some("user_id"), Some("count")], vec![Some("42"), Some("7")]],
        );
        let executor = QueryExecutor::new(backend.clone(), settings(300));

        let start = Instant::now();
        let records = executor
            .execute(&Query::new("SELECT 1"), "scrapetok_db", "s3://results/")
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["user_id"].as_deref(), Some("42"));
        assert_eq!(*backend.polls.lock().unwrap(), 3);
        // Two sleeps of one second between three polls.
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert_eq!(*backend.cancels.lock().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_state_carries_reason() {
        let backend = Scripted::new(
            vec![
                JobStatus::running(),
                JobStatus::running(),
                JobStatus::failed("insufficient permissions"),
            ],
            vec![],
        );
        let executor = QueryExecutor::new(backend, settings(300));

        let err = executor
            .execute(&Query::new("SELECT 1"), "db", "s3://out/")
            .await
            .unwrap_err();
        assert!(matches!(err, AthenaError::QueryFailed { state: JobState::Failed, .. }));
        assert!(err.to_string().contains("insufficient permissions"));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_reason_reads_unknown() {
        let backend = Scripted::new(
            vec![JobStatus { state: JobState::Cancelled, reason: None }],
            vec![],
        );
        let executor = QueryExecutor::new(backend, settings(300));

        let err = executor
            .execute(&Query::new("SELECT 1"), "db", "s3://out/")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Query failed: CANCELLED - Unknown");
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_cancels_remote_job() {
        let backend = Scripted::new(vec![JobStatus::running()], vec![]);
        let executor = QueryExecutor::new(backend.clone(), settings(3));

        let err = executor
            .execute(&Query::new("SELECT 1"), "db", "s3://out/")
            .await
            .unwrap_err();

        assert!(matches!(err, AthenaError::Timeout { seconds: 3, .. }));
        assert_eq!(*backend.cancels.lock().unwrap(), 1);
        // Polls at t = 0, 1, 2, 3.
        assert_eq!(*backend.polls.lock().unwrap(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn caller_cancellation_stops_polling() {
        let backend = Scripted::new(vec![JobStatus::running()], vec![]);
        let executor = QueryExecutor::new(backend.clone(), settings(300));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            trigger.cancel();
        });

        let err = executor.run(&Query::new("SELECT 1"), &cancel).await.unwrap_err();
        assert!(matches!(err, AthenaError::Cancelled { ref query_id } if query_id == "job-1"));
        assert_eq!(*backend.cancels.lock().unwrap(), 1);
        assert_eq!(*backend.polls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn uninitialized_never_submits() {
        let executor = QueryExecutor::uninitialized(settings(300));
        assert!(!executor.is_initialized());

        let err = executor
            .execute(&Query::new("SELECT 1"), "db", "s3://out/")
            .await
            .unwrap_err();
        assert!(matches!(err, AthenaError::NotInitialized));
    }

    #[tokio::test(start_paused = true)]
    async fn run_uses_configured_target_and_parameters() {
        let backend = Scripted::new(vec![JobStatus::succeeded()], vec![vec![Some("a")]]);
        let executor = QueryExecutor::new(backend.clone(), settings(300));

        let query = Query::new("SELECT a FROM t WHERE flag = ?").bind("true");
        let records = executor.run(&query, &CancellationToken::new()).await.unwrap();
        assert!(records.is_empty());

        let submitted = backend.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].database, "scrapetok_db");
        assert_eq!(submitted[0].output_location, "s3://results/");
        assert_eq!(submitted[0].parameters, vec!["'true'"]);
    }

    /// Which backend call never answers.
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Hang {
        Submit,
        Status,
        Results,
        /// Status calls fail outright instead of hanging.
        StatusError,
    }

    struct Unresponsive {
        hang: Hang,
        cancels: Mutex<u32>,
    }

    impl Unresponsive {
        fn new(hang: Hang) -> Arc<Self> {
            Arc::new(Self { hang, cancels: Mutex::new(0) })
        }
    }

    #[async_trait]
    impl QueryBackend for Unresponsive {
        async fn submit(&self, _request: &QueryRequest) -> Result<JobHandle, AthenaError> {
            if self.hang == Hang::Submit {
                return std::future::pending().await;
            }
            Ok(JobHandle::new("job-1"))
        }

        async fn status(&self, _handle: &JobHandle) -> Result<JobStatus, AthenaError> {
            match self.hang {
                Hang::Status => std::future::pending().await,
                Hang::StatusError => Err(AthenaError::AwsSdk("throttled".into())),
                _ => Ok(JobStatus::succeeded()),
            }
        }

        async fn results(&self, _handle: &JobHandle) -> Result<ResultSet, AthenaError> {
            if self.hang == Hang::Results {
                return std::future::pending().await;
            }
            Ok(ResultSet::default())
        }

        async fn cancel(&self, _handle: &JobHandle) -> Result<(), AthenaError> {
            *self.cancels.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_status_call_still_times_out() {
        let backend = Unresponsive::new(Hang::Status);
        let executor = QueryExecutor::new(backend.clone(), settings(5));

        let start = Instant::now();
        let err = executor
            .execute(&Query::new("SELECT 1"), "db", "s3://out/")
            .await
            .unwrap_err();

        assert!(matches!(err, AthenaError::Timeout { seconds: 5, ref query_id } if query_id == "job-1"));
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert_eq!(*backend.cancels.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_status_call_yields_to_caller_cancel() {
        let backend = Unresponsive::new(Hang::Status);
        let executor = QueryExecutor::new(backend.clone(), settings(5));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let outcome = tokio::time::timeout(
            Duration::from_secs(3600),
            executor.run(&Query::new("SELECT 1"), &cancel),
        )
        .await
        .expect("executor returns once the caller cancels");

        assert!(matches!(outcome, Err(AthenaError::Cancelled { .. })));
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert_eq!(*backend.cancels.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_submission_times_out_without_remote_cancel() {
        let backend = Unresponsive::new(Hang::Submit);
        let executor = QueryExecutor::new(backend.clone(), settings(5));

        let err = executor
            .execute(&Query::new("SELECT 1"), "db", "s3://out/")
            .await
            .unwrap_err();

        assert!(matches!(err, AthenaError::Timeout { ref query_id, .. } if query_id == UNSUBMITTED));
        assert_eq!(*backend.cancels.lock().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_result_fetch_times_out() {
        let backend = Unresponsive::new(Hang::Results);
        let executor = QueryExecutor::new(backend.clone(), settings(5));

        let start = Instant::now();
        let err = executor
            .execute(&Query::new("SELECT 1"), "db", "s3://out/")
            .await
            .unwrap_err();

        assert!(matches!(err, AthenaError::Timeout { seconds: 5, .. }));
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_status_call_stops_remote_job() {
        let backend = Unresponsive::new(Hang::StatusError);
        let executor = QueryExecutor::new(backend.clone(), settings(300));

        let err = executor
            .execute(&Query::new("SELECT 1"), "db", "s3://out/")
            .await
            .unwrap_err();

        assert!(matches!(err, AthenaError::AwsSdk(ref msg) if msg == "throttled"));
        assert_eq!(*backend.cancels.lock().unwrap(), 1);
    }
}
