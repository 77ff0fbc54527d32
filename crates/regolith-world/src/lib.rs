//! Cave geometry and the sparse spatial store for the Regolith simulation.
//!
//! This crate models the physical cave: wall descriptions parsed from
//! text and rasterized into cells, and the [`Cave`] that stores those
//! cells by coordinate and answers occupancy queries for the physics.
//!
//! # Modules
//!
//! - [`cave`] -- [`Cave`] with its generational arena, column index, and
//!   floor configuration; [`CellHandle`] references into it.
//! - [`error`] -- [`WorldError`] and [`InvariantViolation`].
//! - [`wall`] -- [`Segment`] and [`Wall`] parsing and rasterization.

pub mod cave;
pub mod error;
pub mod wall;

// Re-export primary types at crate root.
pub use cave::{Cave, CellHandle};
pub use error::{InvariantViolation, WorldError};
pub use wall::{Segment, Wall, max_wall_y, parse_walls};
