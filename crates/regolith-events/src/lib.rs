//! Snapshots and the replayable timeline for the Regolith simulation.
//!
//! Every turn of a recorded simulation produces a snapshot. Most are tiny
//! [`Delta`]s naming the one grain that came to rest; every so often, or
//! whenever a grain lands outside the area the last full picture covers,
//! a [`Checkpoint`] stores the whole cave as ASCII. Any turn can then be
//! rebuilt from the nearest checkpoint plus a bounded run of deltas.
//!
//! # Modules
//!
//! - [`raster`] -- [`Raster`]: the cave printed as one character per cell.
//! - [`snapshot`] -- [`Checkpoint`], [`Delta`], and [`Snapshot`].
//! - [`timeline`] -- [`Timeline`] reconstruction and the [`TimelineRecorder`].
//! - [`error`] -- [`TimelineError`].

pub mod error;
pub mod raster;
pub mod snapshot;
pub mod timeline;

pub use error::TimelineError;
pub use raster::{CellState, Raster};
pub use snapshot::{Checkpoint, Delta, Snapshot, SnapshotKind};
pub use timeline::{DEFAULT_CHECKPOINT_INTERVAL, Timeline, TimelineRecorder};
