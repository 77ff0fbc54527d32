//! Recording and replaying the simulation history.
//!
//! The [`TimelineRecorder`] is fed the cave after every turn and decides
//! whether that turn is stored as a [`Checkpoint`] or a [`Delta`]:
//!
//! 1. every `interval`-th snapshot is a checkpoint, whatever happened;
//! 2. a grain resting inside the latest checkpoint's bounds is a delta;
//! 3. a grain resting outside them forces a fresh checkpoint;
//! 4. a grain lost to the void records nothing.
//!
//! Rule 1 caps reconstruction at `interval - 1` delta applications.

use regolith_types::Coordinate;
use regolith_world::Cave;

use crate::error::TimelineError;
use crate::snapshot::{Checkpoint, Delta, Snapshot, SnapshotKind};

/// Snapshots between forced checkpoints unless configured otherwise.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 100;

/// A finished, read-only sequence of snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    snapshots: Vec<Snapshot>,
}

impl Timeline {
    /// Number of snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// The snapshot at an index, as stored.
    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// All snapshots in recording order.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Rebuild the picture at `index`.
    ///
    /// Starts from the nearest checkpoint at or before `index` and replays
    /// every delta after it, in order.
    ///
    /// # Errors
    ///
    /// - [`TimelineError::OutOfRange`] if `index >= len()`.
    /// - [`TimelineError::MissingCheckpoint`] if no checkpoint precedes it.
    /// - [`TimelineError::ForeignDelta`] if a delta in the replayed run
    ///   refers to a different checkpoint.
    pub fn reconstruct(&self, index: usize) -> Result<String, TimelineError> {
        let len = self.snapshots.len();
        let history = self
            .snapshots
            .get(..=index)
            .ok_or(TimelineError::OutOfRange { index, len })?;

        let (base, checkpoint) = history
            .iter()
            .enumerate()
            .rev()
            .find_map(|(position, snapshot)| match snapshot {
                Snapshot::Checkpoint(checkpoint) => Some((position, checkpoint)),
                Snapshot::Delta(_) => None,
            })
            .ok_or(TimelineError::MissingCheckpoint(index))?;

        let mut raster = checkpoint.raster().clone();
        for (position, snapshot) in history.iter().enumerate().skip(base.saturating_add(1)) {
            if let Snapshot::Delta(delta) = snapshot {
                if delta.checkpoint != base {
                    return Err(TimelineError::ForeignDelta {
                        index: position,
                        checkpoint: delta.checkpoint,
                    });
                }
                delta.apply(&mut raster);
            }
        }
        Ok(raster.into_string())
    }
}

impl From<Vec<Snapshot>> for Timeline {
    fn from(snapshots: Vec<Snapshot>) -> Self {
        Self { snapshots }
    }
}

/// Builds a [`Timeline`] turn by turn.
#[derive(Debug, Clone)]
pub struct TimelineRecorder {
    interval: usize,
    snapshots: Vec<Snapshot>,
    /// Index of the most recent checkpoint.
    latest_checkpoint: Option<usize>,
}

impl TimelineRecorder {
    /// Create a recorder that forces a checkpoint every `interval`
    /// snapshots. An interval of 0 is treated as 1.
    pub fn new(interval: usize) -> Self {
        Self {
            interval: interval.max(1),
            snapshots: Vec::new(),
            latest_checkpoint: None,
        }
    }

    /// The effective checkpoint interval.
    pub const fn interval(&self) -> usize {
        self.interval
    }

    /// Number of snapshots recorded so far.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Store the cave before the first grain as a checkpoint.
    pub fn record_initial(&mut self, cave: &Cave) {
        self.push_checkpoint(cave);
    }

    /// Record the outcome of one turn.
    ///
    /// `rested` is where the grain came to rest, or `None` if it was lost
    /// to the void. Returns the kind of snapshot stored, if any.
    pub fn record_turn(&mut self, cave: &Cave, rested: Option<Coordinate>) -> Option<SnapshotKind> {
        let index = self.snapshots.len();
        if index.checked_rem(self.interval) == Some(0) {
            self.push_checkpoint(cave);
            return Some(SnapshotKind::Checkpoint);
        }

        let coordinate = rested?;
        let base = self.latest_checkpoint.and_then(|base| {
            match self.snapshots.get(base) {
                Some(Snapshot::Checkpoint(checkpoint)) if checkpoint.includes(coordinate) => {
                    Some(base)
                }
                _ => None,
            }
        });

        if let Some(checkpoint) = base {
            self.snapshots.push(Snapshot::Delta(Delta {
                checkpoint,
                coordinate,
            }));
            Some(SnapshotKind::Delta)
        } else {
            self.push_checkpoint(cave);
            Some(SnapshotKind::Checkpoint)
        }
    }

    /// Stop recording and hand over the timeline.
    pub fn finish(self) -> Timeline {
        tracing::debug!(snapshots = self.snapshots.len(), "Timeline recorded");
        Timeline {
            snapshots: self.snapshots,
        }
    }

    fn push_checkpoint(&mut self, cave: &Cave) {
        let index = self.snapshots.len();
        let checkpoint = Checkpoint::capture(cave);
        let bounds = checkpoint.bounds();
        tracing::debug!(
            index,
            x = bounds.x,
            y = bounds.y,
            width = bounds.width,
            height = bounds.height,
            "Recorded checkpoint"
        );
        self.snapshots.push(Snapshot::Checkpoint(checkpoint));
        self.latest_checkpoint = Some(index);
    }
}

impl Default for TimelineRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_CHECKPOINT_INTERVAL)
    }
}
