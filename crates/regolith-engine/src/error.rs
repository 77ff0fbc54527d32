//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and the simulation run.

use std::path::PathBuf;

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: regolith_core::config::ConfigError,
    },

    /// The wall description could not be read.
    #[error("failed to read input {}: {source}", path.display())]
    Input {
        /// The configured input path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The simulation failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: regolith_core::runner::RunnerError,
    },

    /// The visualization service could not start, or its task failed.
    #[error("visualization error: {source}")]
    Visualization {
        /// The underlying startup error.
        #[from]
        source: regolith_observer::StartupError,
    },

    /// Waiting for Ctrl-C failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
