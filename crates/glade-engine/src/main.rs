//! World runtime binary for the Glade simulation.
//!
//! This is the entry point that wires together the configuration, the
//! initial world, the resolution core, and the gateway server, then runs
//! the tick loop until a termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `glade-config.yaml` (first CLI argument
//!    overrides the path; a missing file falls back to defaults)
//! 2. Initialize structured logging (tracing)
//! 3. Build the initial world from the `initial` config section
//! 4. Create the broadcast hub and the core command inbox
//! 5. Start the gateway server
//! 6. Install the Ctrl-C shutdown handler
//! 7. Run the scheduler until shutdown, the tick bound, or a fatal error

mod error;
mod spawner;

use std::path::Path;
use std::sync::Arc;

use glade_core::command::CoreCommand;
use glade_core::config::GladeConfig;
use glade_core::hub::BroadcastHub;
use glade_core::scheduler::{Scheduler, SchedulerConfig};
use glade_gateway::{GatewayState, ServerConfig};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Depth of the bounded command inbox between the gateway and the core.
const COMMAND_INBOX_DEPTH: usize = 64;

/// Default configuration file path, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "glade-config.yaml";

/// Application entry point for the world runtime.
///
/// # Errors
///
/// Returns an error if any initialization step or the run itself fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration (before logging, so the configured level can
    //    seed the filter; RUST_LOG still takes precedence).
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from(DEFAULT_CONFIG_PATH));
    let (config, config_found) = if Path::new(&config_path).exists() {
        (GladeConfig::from_file(Path::new(&config_path))?, true)
    } else {
        (GladeConfig::default(), false)
    };

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .with_target(true)
        .init();

    info!("glade-engine starting");
    if config_found {
        info!(path = config_path, "Configuration loaded");
    } else {
        warn!(path = config_path, "Config file not found, using defaults");
    }
    info!(
        grid_width = config.grid.width,
        grid_height = config.grid.height,
        tick_duration_ms = config.tick.duration_ms,
        tick_deadline_ms = config.tick.deadline_ms,
        lease_ttl_ms = config.lease.ttl_ms,
        observation_radius = config.observation.radius,
        max_ticks = config.run.max_ticks,
        "Runtime configuration"
    );

    // 3. Build the initial world.
    let world = spawner::build_world(&config)?;

    // 4. Create the hub and the command inbox.
    let scheduler_config = SchedulerConfig::from_config(&config)?;
    let hub = Arc::new(BroadcastHub::new(config.broadcast.queue_depth));
    let (command_tx, command_rx) = mpsc::channel::<CoreCommand>(COMMAND_INBOX_DEPTH);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let scheduler = Scheduler::new(
        world,
        scheduler_config,
        Arc::clone(&hub),
        command_rx,
        shutdown_rx,
    );

    // 5. Start the gateway server.
    let gateway_state = Arc::new(GatewayState::new(command_tx, Arc::clone(&hub)));
    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };
    let _gateway_handle = glade_gateway::spawn_server(&server_config, gateway_state).await?;
    info!(
        host = server_config.host,
        port = server_config.port,
        "Gateway server started"
    );

    // 6. Ctrl-C requests a clean shutdown; the scheduler completes the
    //    in-flight tick before exiting.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, requesting shutdown");
            let _ = shutdown_tx.send(true);
        }
    });

    // 7. Run the tick loop. An invariant abort has already rolled state
    //    back and logged the fatal record; propagating it exits the
    //    process, which is the mandated behavior.
    let report = scheduler.run().await?;
    info!(
        ticks_completed = report.ticks_completed,
        overruns = report.overruns,
        "glade-engine stopped"
    );
    Ok(())
}
