//! Service startup helper for embedding in the engine.
//!
//! Provides [`spawn_visualization`] which binds the listener, moves the
//! finished timeline into a background Tokio task running the serve loop,
//! and hands back a [`VisualizationHandle`] so the caller decides whether
//! to wait for `STOP` or abort the service.
//!
//! # Usage
//!
//! ```rust,ignore
//! use regolith_observer::startup::spawn_visualization;
//!
//! let handle = spawn_visualization(&config.visualization, timeline).await?;
//! // Serves until a client sends STOP.
//! handle.wait().await?;
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use regolith_core::config::VisualizationConfig;
use regolith_events::Timeline;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::server::{TimelineService, serve};

/// Errors that can occur when starting or awaiting the service.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The listener could not be bound.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// The configured address.
        address: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The background task panicked or was aborted.
    #[error("service task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A running visualization service.
#[derive(Debug)]
pub struct VisualizationHandle {
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl VisualizationHandle {
    /// The address the service is listening on.
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Whether the serve loop has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until a client stops the service.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Join`] if the task panicked or was aborted.
    pub async fn wait(self) -> Result<(), StartupError> {
        self.task.await?;
        Ok(())
    }

    /// Stop the service without waiting for a client.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// A handle that aborts the service, usable while [`wait`](Self::wait)
    /// holds the task.
    pub fn abort_handle(&self) -> tokio::task::AbortHandle {
        self.task.abort_handle()
    }
}

/// Spawn the visualization service on a background Tokio task.
///
/// The listener is bound before this returns, so an unusable address is
/// reported here rather than inside the task. After that the service
/// owns the timeline exclusively and never exits on transport errors.
///
/// # Errors
///
/// Returns [`StartupError::Bind`] if the configured address cannot be
/// bound.
pub async fn spawn_visualization(
    config: &VisualizationConfig,
    timeline: Timeline,
) -> Result<VisualizationHandle, StartupError> {
    let listener = TcpListener::bind(config.address.as_str())
        .await
        .map_err(|source| StartupError::Bind {
            address: config.address.clone(),
            source,
        })?;
    let local_addr = listener.local_addr().map_err(|source| StartupError::Bind {
        address: config.address.clone(),
        source,
    })?;

    let retry_delay = Duration::from_millis(config.retry_delay_ms);
    let service = TimelineService::new(timeline);
    let bind = move || TcpListener::bind(local_addr);
    let task = tokio::spawn(serve(listener, bind, service, retry_delay));

    tracing::info!(%local_addr, "Visualization service spawned on background task");

    Ok(VisualizationHandle { local_addr, task })
}
