//! AWS Athena implementation of [`QueryBackend`].
//!
//! Builds the SDK client once from [`AthenaConfig`] and the AWS credential
//! settings, then maps the four backend calls onto `StartQueryExecution`,
//! `GetQueryExecution`, `GetQueryResults` and `StopQueryExecution`.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::Credentials;
use aws_sdk_athena::config::Region;
use aws_sdk_athena::error::DisplayErrorContext;
use aws_sdk_athena::types::{QueryExecutionContext, QueryExecutionState, ResultConfiguration};
use tracing::{debug, info};

use scrapetok_core::config::AwsConfig;

use crate::backend::{JobHandle, JobState, JobStatus, QueryBackend, QueryRequest};
use crate::config::AthenaConfig;
use crate::error::AthenaError;
use crate::result::ResultSet;

/// Largest page `GetQueryResults` will return.
const RESULTS_PAGE_SIZE: i32 = 1000;

/// Athena-backed [`QueryBackend`].
pub struct AthenaBackend {
    client: aws_sdk_athena::Client,
    workgroup: String,
}

impl AthenaBackend {
    /// Build the SDK client.
    ///
    /// Static keys from the environment are used when both halves are
    /// present. Otherwise the default provider chain is loaded for the named
    /// profile and probed once, so a machine without credentials fails here
    /// with [`AthenaError::Credentials`] rather than on the first query.
    pub async fn connect(config: &AthenaConfig, aws: &AwsConfig) -> Result<Self, AthenaError> {
        let region = Region::new(config.region.clone());

        let client = match (&aws.access_key_id, &aws.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => {
                let credentials = Credentials::new(
                    access_key_id,
                    secret_access_key,
                    aws.session_token.clone(),
                    None, // expiry
                    "scrapetok-env",
                );

                let mut builder = aws_sdk_athena::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .region(region)
                    .credentials_provider(credentials);
                if let Some(ref endpoint) = aws.endpoint_url {
                    builder = builder.endpoint_url(endpoint);
                }

                info!(
                    temporary = aws.session_token.is_some(),
                    "Using AWS credentials from environment"
                );
                aws_sdk_athena::Client::from_conf(builder.build())
            }
            _ => {
                let mut loader = aws_config::defaults(BehaviorVersion::latest())
                    .region(region)
                    .profile_name(&aws.profile_name);
                if let Some(ref endpoint) = aws.endpoint_url {
                    loader = loader.endpoint_url(endpoint);
                }
                let sdk_config = loader.load().await;

                let provider = sdk_config.credentials_provider().ok_or_else(|| {
                    AthenaError::Credentials("no credentials provider configured".into())
                })?;
                provider
                    .provide_credentials()
                    .await
                    .map_err(|e| AthenaError::Credentials(DisplayErrorContext(&e).to_string()))?;

                info!(profile = %aws.profile_name, "Using AWS credentials from provider chain");
                aws_sdk_athena::Client::new(&sdk_config)
            }
        };

        info!(
            region = %config.region,
            database = %config.database,
            workgroup = %config.workgroup,
            "Athena client initialised"
        );

        Ok(Self {
            client,
            workgroup: config.workgroup.clone(),
        })
    }
}

#[async_trait]
impl QueryBackend for AthenaBackend {
    async fn submit(&self, request: &QueryRequest) -> Result<JobHandle, AthenaError> {
        let mut start = self
            .client
            .start_query_execution()
            .query_string(&request.sql)
            .query_execution_context(
                QueryExecutionContext::builder()
                    .database(&request.database)
                    .build(),
            )
            .result_configuration(
                ResultConfiguration::builder()
                    .output_location(&request.output_location)
                    .build(),
            )
            .work_group(&self.workgroup);
        for parameter in &request.parameters {
            start = start.execution_parameters(parameter);
        }

        let resp = start
            .send()
            .await
            .map_err(|e| AthenaError::Submission(DisplayErrorContext(&e).to_string()))?;

        resp.query_execution_id()
            .map(JobHandle::new)
            .ok_or_else(|| AthenaError::Submission("No query execution ID returned".into()))
    }

    async fn status(&self, handle: &JobHandle) -> Result<JobStatus, AthenaError> {
        let resp = self
            .client
            .get_query_execution()
            .query_execution_id(handle.as_str())
            .send()
            .await
            .map_err(|e| AthenaError::AwsSdk(DisplayErrorContext(&e).to_string()))?;

        let status = resp
            .query_execution()
            .and_then(|qe| qe.status())
            .ok_or_else(|| AthenaError::AwsSdk("No query execution status in response".into()))?;

        let state = match status.state() {
            Some(QueryExecutionState::Succeeded) => JobState::Succeeded,
            Some(QueryExecutionState::Failed) => JobState::Failed,
            Some(QueryExecutionState::Cancelled) => JobState::Cancelled,
            // Queued | Running | unknown future variant
            _ => JobState::Running,
        };

        let reason = status
            .state_change_reason()
            .or_else(|| status.athena_error().and_then(|e| e.error_message()))
            .map(str::to_string);

        Ok(JobStatus { state, reason })
    }

    /// Follows `NextToken` until the last page. Only the first page carries
    /// the header row, so concatenating pages keeps it in front.
    async fn results(&self, handle: &JobHandle) -> Result<ResultSet, AthenaError> {
        let mut rows: Vec<Vec<Option<String>>> = Vec::new();
        let mut next_token: Option<String> = None;
        let mut pages = 0u32;

        loop {
            let resp = self
                .client
                .get_query_results()
                .query_execution_id(handle.as_str())
                .max_results(RESULTS_PAGE_SIZE)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| AthenaError::AwsSdk(DisplayErrorContext(&e).to_string()))?;
            pages += 1;

            if let Some(result_set) = resp.result_set() {
                rows.extend(result_set.rows().iter().map(|row| {
                    row.data()
                        .iter()
                        .map(|datum| datum.var_char_value().map(str::to_string))
                        .collect::<Vec<_>>()
                }));
            }

            match resp.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(query_id = %handle, rows = rows.len(), pages, "Fetched Athena results");
        Ok(ResultSet::new(rows))
    }

    async fn cancel(&self, handle: &JobHandle) -> Result<(), AthenaError> {
        self.client
            .stop_query_execution()
            .query_execution_id(handle.as_str())
            .send()
            .await
            .map_err(|e| AthenaError::AwsSdk(DisplayErrorContext(&e).to_string()))?;

        info!(query_id = %handle, "Query cancellation requested");
        Ok(())
    }
}
