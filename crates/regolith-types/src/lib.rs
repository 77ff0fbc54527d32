//! Shared type definitions for the Regolith falling-sand simulation.
//!
//! This crate is the vocabulary used across the workspace: cave
//! coordinates, raster bounds, cell kinds, and the floor configuration.
//! It has no behaviour beyond small geometric helpers.
//!
//! # Modules
//!
//! - [`geometry`] -- [`Coordinate`] with its falling neighbours, and [`Bounds`]
//! - [`cell`] -- [`CellType`], [`Cell`], and [`Floor`]

pub mod cell;
pub mod geometry;

// Re-export all public types at crate root for convenience.
pub use cell::{Cell, CellType, Floor};
pub use geometry::{Bounds, Coordinate, SPAWN_POINT};
