//! Cave coordinates and axis-aligned bounds.
//!
//! The cave uses screen orientation: `x` grows to the right and `y` grows
//! downwards, so "below" means `y + 1`.

use serde::{Deserialize, Serialize};

/// The fixed coordinate from which every grain of sand enters the cave.
pub const SPAWN_POINT: Coordinate = Coordinate::new(500, 0);

/// An integer position in the cave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    /// Column, growing to the right.
    pub x: i32,
    /// Row, growing downwards.
    pub y: i32,
}

impl Coordinate {
    /// Create a coordinate from its components.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The coordinate one row up.
    pub const fn above(self) -> Self {
        Self::new(self.x, self.y.saturating_sub(1))
    }

    /// The coordinate one row down.
    pub const fn below(self) -> Self {
        Self::new(self.x, self.y.saturating_add(1))
    }

    /// The coordinate one row down and one column left.
    pub const fn below_left(self) -> Self {
        Self::new(self.x.saturating_sub(1), self.y.saturating_add(1))
    }

    /// The coordinate one row down and one column right.
    pub const fn below_right(self) -> Self {
        Self::new(self.x.saturating_add(1), self.y.saturating_add(1))
    }
}

impl core::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Axis-aligned rectangle covering part of the cave.
///
/// `x`/`y` is the top-left corner; `width` and `height` count cells, so a
/// single cell has a width and height of 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    /// Left-most column.
    pub x: i32,
    /// Top-most row.
    pub y: i32,
    /// Number of columns.
    pub width: i32,
    /// Number of rows.
    pub height: i32,
}

impl Bounds {
    /// Build the smallest bounds containing both inclusive corners.
    pub const fn from_extents(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            x: min_x,
            y: min_y,
            width: max_x.saturating_sub(min_x).saturating_add(1),
            height: max_y.saturating_sub(min_y).saturating_add(1),
        }
    }

    /// Whether the coordinate lies inside these bounds.
    pub const fn includes(&self, coordinate: Coordinate) -> bool {
        coordinate.x >= self.x
            && coordinate.x < self.x.saturating_add(self.width)
            && coordinate.y >= self.y
            && coordinate.y < self.y.saturating_add(self.height)
    }
}
