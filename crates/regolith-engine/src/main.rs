//! Engine binary for the Regolith simulation.
//!
//! Loads configuration, reads the wall description, drops sand until the
//! configured variant ends, and reports the number of grains at rest. With
//! visualization enabled, the recorded timeline is then served over TCP
//! until a client sends `STOP` or the process receives Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `regolith-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Read the wall description
//! 4. Run the simulation
//! 5. Print the answer
//! 6. Serve the timeline, if recording was enabled

mod error;

use std::path::Path;

use regolith_core::config::RegolithConfig;
use regolith_core::runner::{self, Solution};
use regolith_observer::spawn_visualization;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Config file looked up in the working directory.
const CONFIG_PATH: &str = "regolith-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, input, the simulation, or the
/// visualization service fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration before logging so it can pick the level.
    let config = RegolithConfig::load_or_default(Path::new(CONFIG_PATH))?;

    // 2. Initialize structured logging. RUST_LOG wins over the config.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        input = %config.simulation.input_path.display(),
        variant = ?config.simulation.variant,
        visualization = config.visualization.enabled,
        "Configuration loaded"
    );

    // 3-4. Read the walls and run.
    let solution = solve_file(&config)?;
    runner::log_simulation_end(&solution.result);

    // 5. The answer goes to stdout; everything else goes to the log.
    println!("{}", solution.result.turns);

    // 6. Serve the replay.
    if let Some(timeline) = solution.timeline {
        let handle = spawn_visualization(&config.visualization, timeline).await?;
        let abort = handle.abort_handle();
        info!(address = %handle.local_addr(), "Waiting for STOP");

        tokio::select! {
            result = handle.wait() => result?,
            signal = tokio::signal::ctrl_c() => {
                signal.map_err(|source| EngineError::Signal { source })?;
                warn!("Ctrl-C received, stopping visualization service");
                abort.abort();
            }
        }
    }

    info!("Engine shut down");
    Ok(())
}

/// Read the configured input and solve the configured variant.
fn solve_file(config: &RegolithConfig) -> Result<Solution, EngineError> {
    let path = &config.simulation.input_path;
    let input = std::fs::read_to_string(path).map_err(|source| EngineError::Input {
        path: path.clone(),
        source,
    })?;
    Ok(runner::solve(
        &input,
        config.simulation.variant,
        &config.run_options(),
    )?)
}
