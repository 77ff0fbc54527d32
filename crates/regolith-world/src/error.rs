//! Error types for the `regolith-world` crate.
//!
//! [`WorldError`] covers both malformed wall descriptions (the parse
//! class) and broken cave contracts such as relocating onto an occupied
//! cell or resolving a stale handle (the state class). State errors are
//! programming errors for the caller; the simulation treats them as fatal.

use regolith_types::Coordinate;

/// Errors that can occur while parsing walls or editing the cave.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A wall description line could not be parsed.
    #[error("parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number in the wall description.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// A segment was neither horizontal nor vertical.
    #[error("segment {start} -> {end} is neither horizontal nor vertical")]
    DiagonalSegment {
        /// First endpoint.
        start: Coordinate,
        /// Second endpoint.
        end: Coordinate,
    },

    /// A cell was relocated onto a coordinate that is already occupied.
    #[error("cannot relocate onto occupied coordinate {0}")]
    Occupied(Coordinate),

    /// A handle was used after its cell was removed or relocated.
    #[error("cell handle no longer refers to a stored cell")]
    StaleHandle,

    /// The cave has no spawn cell.
    #[error("cave has no spawn cell")]
    MissingSpawn,

    /// A grain was spawned while the spawn point was still blocked.
    #[error("spawn cell at {0} is already blocked by sand")]
    SpawnNotIdle(Coordinate),

    /// The verification pass found a broken structural invariant.
    #[error("cave invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// A structural invariant of the cave that did not hold.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// There must be exactly one spawn cell, idle or blocked.
    #[error("expected exactly one spawn cell, found {0}")]
    SpawnCount(usize),

    /// A cell is indexed under a key that differs from its own coordinate.
    #[error("cell at {cell} is indexed under {key}")]
    MisplacedCell {
        /// The bucket key pair the cell is stored under.
        key: Coordinate,
        /// The coordinate the cell carries.
        cell: Coordinate,
    },

    /// An index entry points at a freed arena slot.
    #[error("index entry {0} refers to a freed cell")]
    DanglingEntry(Coordinate),

    /// An empty column bucket was left behind.
    #[error("column {0} has an empty bucket")]
    EmptyBucket(i32),

    /// The arena holds cells that the column index does not reach.
    #[error("{live} live cells but only {indexed} indexed")]
    OrphanedCells {
        /// Occupied arena slots.
        live: usize,
        /// Entries across all column buckets.
        indexed: usize,
    },
}
