//! Server startup: build the Athena executor and the shared state.

use std::sync::Arc;

use tracing::{info, warn};

use scrapetok_athena::{AthenaBackend, AthenaConfig, ExecutorSettings, QueryExecutor};
use scrapetok_core::Config;

use crate::state::AppState;

/// Build `AppState`.
///
/// Missing Athena settings or unresolvable credentials abort startup in
/// strict mode. Otherwise defaults are logged and, without credentials, the
/// executor is left uninitialized so every query reports it.
pub async fn build_app_state(config: &Config, athena: &AthenaConfig) -> anyhow::Result<Arc<AppState>> {
    if !athena.is_configured() {
        if config.gateway.strict_config {
            anyhow::bail!(
                "Missing required Athena settings: {}",
                athena.defaulted.join(", ")
            );
        }
        warn!(
            database = %athena.database,
            output_location = %athena.output_location,
            "Athena settings not configured, using defaults for: {}",
            athena.defaulted.join(", ")
        );
    }

    let settings = ExecutorSettings::from(athena);
    let executor = match AthenaBackend::connect(athena, &config.aws).await {
        Ok(backend) => QueryExecutor::new(Arc::new(backend), settings),
        Err(e) if config.gateway.strict_config => {
            anyhow::bail!("Athena client could not be initialised: {}", e);
        }
        Err(e) => {
            warn!("Athena client not available: {}; queries will fail until AWS access is configured", e);
            QueryExecutor::uninitialized(settings)
        }
    };

    if config.gateway.debug_routes {
        warn!("Debug routes enabled: POST /debug/query executes arbitrary SQL");
    }

    info!(
        database = %athena.database,
        poll_interval_ms = athena.poll_interval_ms,
        timeout_seconds = athena.timeout_seconds,
        athena_ready = executor.is_initialized(),
        "Query executor ready"
    );

    Ok(Arc::new(AppState {
        executor: Arc::new(executor),
        debug_routes: config.gateway.debug_routes,
        cors_origin: config.server.cors_origin.clone(),
    }))
}
