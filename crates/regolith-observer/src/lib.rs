//! Replay service for recorded Regolith timelines.
//!
//! After a simulation finishes, its [`Timeline`] is moved into a single
//! background task that answers requests over TCP:
//!
//! - `STOP` replies `OK` and ends the service;
//! - `GET <n>` replies `OK` with the picture at step `n`, or `ERROR` if
//!   `n` is malformed or out of range;
//! - anything else replies `ERROR`.
//!
//! # Modules
//!
//! - [`client`] -- [`VisualizationClient`] for tests and tools.
//! - [`error`] -- Transport, protocol, and client errors.
//! - [`protocol`] -- Message framing plus [`Request`] and [`Reply`].
//! - [`server`] -- [`TimelineService`], [`Accept`], and the recovering serve loop.
//! - [`startup`] -- [`spawn_visualization`] and [`VisualizationHandle`].
//!
//! [`Timeline`]: regolith_events::Timeline

pub mod client;
pub mod error;
pub mod protocol;
pub mod server;
pub mod startup;

// Re-export primary types for convenience.
pub use client::VisualizationClient;
pub use error::{ClientError, ProtocolError, TransportError};
pub use protocol::{Reply, Request};
pub use server::{Accept, TimelineService};
pub use startup::{StartupError, VisualizationHandle, spawn_visualization};
