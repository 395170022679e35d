//! Host binary for the MCAdmin Data API.
//!
//! Runs the demo simulation on its authority thread and, when enabled,
//! the read-only HTTP API alongside it, until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Write the default `config.yml` if none exists, then load it
//! 3. Build the demo world and move it onto the authority thread
//! 4. Bind and spawn the Data API (a failure only disables the API)
//! 5. Wait for `Ctrl-C`, stop the API, then stop the authority thread

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use mcadmin_api::{ApiHandle, AppState, ServerConfig, spawn_api};
use mcadmin_core::config::{DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH};
use mcadmin_core::{AuthorityConfig, AuthorityHandle, AuthorityThread, DataApiConfig, World};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::HostError;

/// Environment variable selecting the log output format (`json` or text).
const ENV_LOG_FORMAT: &str = "MCADMIN_LOG_FORMAT";

/// Application entry point for the host.
///
/// # Errors
///
/// Returns an error if configuration loading, the authority thread or
/// signal handling fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    init_tracing();
    info!("mcadmin-host starting");

    run().await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if std::env::var(ENV_LOG_FORMAT).is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run() -> Result<(), HostError> {
    // 2. Load configuration.
    let config = load_config()?;
    info!(
        port = config.port,
        host = config.host,
        enabled = config.enabled,
        collection_timeout_ms = config.collection_timeout_ms,
        tick_interval_ms = config.simulation.tick_interval_ms,
        "Configuration loaded"
    );
    for warning in startup_warnings(&config) {
        warn!("{warning}");
    }

    // 3. Start the simulation.
    let simulation = &config.simulation;
    let world = World::populated(
        simulation.server_name.clone(),
        simulation.seed,
        simulation.demo_participants,
    );
    info!(
        server = simulation.server_name,
        participants = world.players().len(),
        "Demo world created"
    );
    let authority = AuthorityThread::spawn(world, &AuthorityConfig::from_config(&config))?;

    // 4. Start the Data API.
    let api = start_api(&config, authority.handle()).await;

    // 5. Run until interrupted.
    tokio::signal::ctrl_c()
        .await
        .map_err(|source| HostError::Signal { source })?;
    info!("Shutdown requested");

    if let Some(api) = api {
        api.stop().await;
    }

    let world = tokio::task::spawn_blocking(move || authority.shutdown())
        .await
        .map_err(|e| HostError::Shutdown {
            message: format!("{e}"),
        })??;
    info!(participants = world.players().len(), "mcadmin-host stopped");

    Ok(())
}

/// Resolve the config path, persist the default file when missing and
/// load it.
fn load_config() -> Result<DataApiConfig, HostError> {
    let path = std::env::var_os(ENV_CONFIG_PATH)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    if DataApiConfig::write_default_if_missing(&path)? {
        info!(path = %path.display(), "Default configuration written");
    }
    Ok(DataApiConfig::from_file(&path)?)
}

/// Configuration problems worth a warning at startup.
fn startup_warnings(config: &DataApiConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if config.uses_default_api_key() {
        warnings.push("Using the default API key; set api-key before exposing the Data API");
    }
    warnings
}

/// Bind and spawn the Data API unless it is disabled. A bind failure is
/// logged and leaves the simulation running without the API.
async fn start_api(config: &DataApiConfig, handle: AuthorityHandle<World>) -> Option<ApiHandle> {
    if !config.enabled {
        info!("Data API disabled in configuration");
        return None;
    }
    let state = Arc::new(AppState::from_config(config, Arc::new(handle)));
    match spawn_api(&ServerConfig::from(config), state).await {
        Ok(api) => {
            info!(addr = %api.local_addr(), "Data API started");
            Some(api)
        }
        Err(e) => {
            error!(error = %e, "Data API failed to start; service disabled");
            None
        }
    }
}
