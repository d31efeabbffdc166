use scrapetok_core::config::{profiled_env_opt, profiled_env_or, profiled_env_u64};

/// Default Athena database when neither `ATHENA_DATABASE` nor `DATABASE` is set.
pub const DEFAULT_DATABASE: &str = "scrapetok_db";

/// Default S3 output location for Athena query results.
pub const DEFAULT_OUTPUT_LOCATION: &str = "s3://default-bucket/athena-results/";

const DEFAULT_REGION: &str = "us-east-1";

/// Lower bound for `ATHENA_POLL_INTERVAL_MS`; smaller values are raised to it.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

/// Configuration for the Athena query executor.
///
/// Reads from environment variables with optional profile prefix.
/// When `GATEWAY_PROFILE=PROD`, checks `PROD_ATHENA_DATABASE` before `ATHENA_DATABASE`.
#[derive(Debug, Clone)]
pub struct AthenaConfig {
    /// AWS region for Athena queries.
    pub region: String,
    /// Athena database queries are bound to.
    pub database: String,
    /// Athena workgroup.
    pub workgroup: String,
    /// S3 path for query results.
    pub output_location: String,
    /// Fixed delay between status polls, never below [`MIN_POLL_INTERVAL_MS`].
    pub poll_interval_ms: u64,
    /// Deadline for one query, after which it is cancelled.
    pub timeout_seconds: u64,
    /// Keys that were absent and fell back to a default.
    pub defaulted: Vec<&'static str>,
}

impl AthenaConfig {
    /// Build config for a specific named profile (empty string = default).
    ///
    /// Region falls back `ATHENA_REGION` → `AWS_DEFAULT_REGION` → `AWS_REGION`.
    /// Database and output location also accept the short `DATABASE` and
    /// `OUTPUT_BUCKET` keys.
    pub fn from_env_profiled(profile: &str) -> Self {
        let mut defaulted = Vec::new();

        let region = profiled_env_opt(profile, "ATHENA_REGION")
            .or_else(|| profiled_env_opt(profile, "AWS_DEFAULT_REGION"))
            .or_else(|| profiled_env_opt(profile, "AWS_REGION"))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let database = profiled_env_opt(profile, "ATHENA_DATABASE")
            .or_else(|| profiled_env_opt(profile, "DATABASE"))
            .unwrap_or_else(|| {
                defaulted.push("ATHENA_DATABASE");
                DEFAULT_DATABASE.to_string()
            });

        let output_location = profiled_env_opt(profile, "ATHENA_OUTPUT_LOCATION")
            .or_else(|| profiled_env_opt(profile, "OUTPUT_BUCKET"))
            .unwrap_or_else(|| {
                defaulted.push("ATHENA_OUTPUT_LOCATION");
                DEFAULT_OUTPUT_LOCATION.to_string()
            });

        Self {
            region,
            database,
            workgroup: profiled_env_or(profile, "ATHENA_WORKGROUP", "primary"),
            output_location,
            poll_interval_ms: profiled_env_u64(profile, "ATHENA_POLL_INTERVAL_MS", 1000)
                .max(MIN_POLL_INTERVAL_MS),
            timeout_seconds: profiled_env_u64(profile, "ATHENA_TIMEOUT_SECONDS", 300),
            defaulted,
        }
    }

    /// Returns `true` when database and output location were set explicitly.
    pub fn is_configured(&self) -> bool {
        self.defaulted.is_empty()
    }
}

// ── Tests ────────────────────────────────────────────────────────
