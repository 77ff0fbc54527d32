//! Error types for timeline reconstruction.

/// Errors that can occur when rebuilding a snapshot from the timeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    /// The requested index is past the end of the timeline.
    #[error("snapshot {index} is out of range for a timeline of {len}")]
    OutOfRange {
        /// The requested index.
        index: usize,
        /// Number of snapshots in the timeline.
        len: usize,
    },

    /// No checkpoint precedes the requested snapshot.
    #[error("no checkpoint at or before snapshot {0}")]
    MissingCheckpoint(usize),

    /// A delta refers to a checkpoint other than the one it follows.
    #[error("delta at {index} refers to checkpoint {checkpoint}, not the one preceding it")]
    ForeignDelta {
        /// Index of the offending delta.
        index: usize,
        /// The checkpoint it names.
        checkpoint: usize,
    },
}
