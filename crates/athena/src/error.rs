use crate::backend::JobState;

/// Errors that can occur while executing a query against Athena.
#[derive(Debug, thiserror::Error)]
pub enum AthenaError {
    /// No backend client is available (startup could not build one).
    #[error("Athena client not initialized. Check the AWS configuration.")]
    NotInitialized,

    /// AWS credentials could not be resolved while building the client.
    #[error("Could not resolve AWS credentials: {0}")]
    Credentials(String),

    /// Athena rejected the query submission.
    #[error("Failed to submit query: {0}")]
    Submission(String),

    /// The job reached `FAILED` or `CANCELLED` on the Athena side.
    #[error("Query failed: {state} - {reason}")]
    QueryFailed { state: JobState, reason: String },

    /// The job did not finish before the executor deadline.
    #[error("Query {query_id} timed out after {seconds}s")]
    Timeout { query_id: String, seconds: u64 },

    /// The caller gave up on the job (e.g. the HTTP client disconnected).
    #[error("Query {query_id} was abandoned by the caller")]
    Cancelled { query_id: String },

    /// The result set did not have the expected header/data shape.
    #[error("Malformed result: {0}")]
    MalformedResult(String),

    /// Status polling or result fetching failed (stringified SDK error).
    #[error("AWS SDK error: {0}")]
    AwsSdk(String),
}
