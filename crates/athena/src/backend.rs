//! Seam between the executor and the remote query service.
//!
//! [`QueryBackend`] is the three-call surface the executor needs (submit,
//! poll, fetch) plus a cancel hook. [`crate::AthenaBackend`] implements it
//! over the AWS SDK; tests implement it with scripted fakes.

use std::fmt;

use async_trait::async_trait;

use crate::error::AthenaError;
use crate::result::ResultSet;

/// Opaque identifier of one remote query execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a remote job. `Running` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Running => "RUNNING",
            JobState::Succeeded => "SUCCEEDED",
            JobState::Failed => "FAILED",
            JobState::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One status observation: the state plus the service's stated reason, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub state: JobState,
    pub reason: Option<String>,
}

impl JobStatus {
    pub fn running() -> Self {
        Self { state: JobState::Running, reason: None }
    }

    pub fn succeeded() -> Self {
        Self { state: JobState::Succeeded, reason: None }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self { state: JobState::Failed, reason: Some(reason.into()) }
    }
}

/// Everything the backend needs to start one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub sql: String,
    /// Literal values for the `?` placeholders in `sql`, in order.
    pub parameters: Vec<String>,
    pub database: String,
    pub output_location: String,
}

/// Remote query service used by [`crate::QueryExecutor`].
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Start a job and return its handle.
    async fn submit(&self, request: &QueryRequest) -> Result<JobHandle, AthenaError>;

    /// Current state of a job.
    async fn status(&self, handle: &JobHandle) -> Result<JobStatus, AthenaError>;

    /// All result rows of a succeeded job, header row first.
    async fn results(&self, handle: &JobHandle) -> Result<ResultSet, AthenaError>;

    /// Ask the service to stop a job. Callers treat this as best-effort.
    async fn cancel(&self, handle: &JobHandle) -> Result<(), AthenaError>;
}
