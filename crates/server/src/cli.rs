//! Command-line overrides for the environment configuration.

use clap::Parser;

use scrapetok_athena::AthenaConfig;
use scrapetok_core::Config;

/// HTTP gateway that runs analytics queries on Athena and returns JSON rows.
#[derive(Parser, Debug)]
#[command(name = "scrapetok-server", version, about)]
pub struct Cli {
    /// Configuration profile; `PROD` reads `PROD_<KEY>` before `<KEY>`.
    #[arg(long, env = "GATEWAY_PROFILE")]
    pub profile: Option<String>,

    /// Bind address (overrides HOST).
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port (overrides PORT).
    #[arg(long)]
    pub port: Option<u16>,

    /// Expose /debug/* routes, including raw SQL execution.
    #[arg(long)]
    pub debug_routes: bool,
}

impl Cli {
    /// Read both config layers for the selected profile and apply overrides.
    pub fn load(&self) -> (Config, AthenaConfig) {
        let profile = self.profile.as_deref().unwrap_or_default().to_uppercase();
        let mut config = Config::for_profile(&profile);
        let athena = AthenaConfig::from_env_profiled(&profile);

        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.debug_routes {
            config.gateway.debug_routes = true;
        }

        (config, athena)
    }
}
