//! In-memory [`QueryBackend`] with a scripted status sequence.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scrapetok_athena::*;

pub struct FakeBackend {
    statuses: Mutex<VecDeque<JobStatus>>,
    rows: Vec<Vec<Option<String>>>,
    pub requests: Mutex<Vec<QueryRequest>>,
    pub fetches: Mutex<u32>,
    pub cancels: Mutex<u32>,
}

impl FakeBackend {
    pub fn new(statuses: Vec<JobStatus>, rows: Vec<Vec<Option<&str>>>) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(statuses.into()),
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(|c| c.map(str::to_string)).collect())
                .collect(),
            requests: Mutex::new(Vec::new()),
            fetches: Mutex::new(0),
            cancels: Mutex::new(0),
        })
    }

    /// Succeeds on the first poll with the given rows.
    pub fn succeeding(rows: Vec<Vec<Option<&str>>>) -> Arc<Self> {
        Self::new(vec![JobStatus::succeeded()], rows)
    }
}

#[async_trait]
impl QueryBackend for FakeBackend {
    async fn submit(&self, request: &QueryRequest) -> Result<JobHandle, AthenaError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        Ok(JobHandle::new(format!("fake-{}", requests.len())))
    }

    async fn status(&self, _handle: &JobHandle) -> Result<JobStatus, AthenaError> {
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            Ok(statuses.pop_front().unwrap())
        } else {
            Ok(statuses.front().cloned().unwrap_or_else(JobStatus::running))
        }
    }

    async fn results(&self, _handle: &JobHandle) -> Result<ResultSet, AthenaError> {
        *self.fetches.lock().unwrap() += 1;
        Ok(ResultSet::new(self.rows.clone()))
    }

    async fn cancel(&self, _handle: &JobHandle) -> Result<(), AthenaError> {
        *self.cancels.lock().unwrap() += 1;
        Ok(())
    }
}

pub fn settings() -> ExecutorSettings {
    ExecutorSettings {
        database: "scrapetok_db".into(),
        output_location: "s3://default-bucket/athena-results/".into(),
        poll_interval: Duration::from_secs(1),
        timeout: Duration::from_secs(60),
    }
}
