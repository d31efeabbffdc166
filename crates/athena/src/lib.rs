pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod result;
pub mod sql;

pub use backend::{JobHandle, JobState, JobStatus, QueryBackend, QueryRequest};
pub use client::AthenaBackend;
pub use config::AthenaConfig;
pub use error::AthenaError;
pub use executor::{ExecutorSettings, QueryExecutor};
pub use result::{Record, ResultSet};
pub use sql::{validate_identifier, Query, SqlError, SqlValue};
