//! Cell kinds and the cave floor.

use serde::{Deserialize, Serialize};

use crate::geometry::Coordinate;

/// What occupies a cell of the cave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CellType {
    /// Rock from the scanned wall description.
    Wall,
    /// A grain of sand, falling or at rest.
    Sand,
    /// The idle spawn point.
    Spawn,
    /// A grain of sand sitting on the spawn point.
    ///
    /// A grain occupies this state while it leaves the spawn point, and
    /// keeps it forever if it comes to rest there.
    SandBlockingSpawn,
}

impl CellType {
    /// Whether this is the spawn point, idle or blocked.
    pub const fn is_spawn(self) -> bool {
        matches!(self, Self::Spawn | Self::SandBlockingSpawn)
    }

    /// Whether a grain of sand occupies the cell.
    pub const fn is_sand(self) -> bool {
        matches!(self, Self::Sand | Self::SandBlockingSpawn)
    }
}

/// A single occupied position in the cave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// What occupies the position.
    pub cell_type: CellType,
    /// Where it is.
    pub coordinate: Coordinate,
}

impl Cell {
    /// Create a cell.
    pub const fn new(cell_type: CellType, coordinate: Coordinate) -> Self {
        Self {
            cell_type,
            coordinate,
        }
    }

    /// A wall cell at the given coordinate.
    pub const fn wall(coordinate: Coordinate) -> Self {
        Self::new(CellType::Wall, coordinate)
    }

    /// A sand cell at the given coordinate.
    pub const fn sand(coordinate: Coordinate) -> Self {
        Self::new(CellType::Sand, coordinate)
    }
}

/// The bottom of the cave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Floor {
    /// No floor: sand falling past every wall is lost to the void.
    #[default]
    Void,
    /// An infinite horizontal floor at the given row.
    Horizontal(i32),
}

impl Floor {
    /// The floor row, if there is one.
    pub const fn horizontal(self) -> Option<i32> {
        match self {
            Self::Void => None,
            Self::Horizontal(y) => Some(y),
        }
    }

    /// Whether a grain at `coordinate` sits directly on the floor.
    pub const fn supports(self, coordinate: Coordinate) -> bool {
        match self {
            Self::Void => false,
            Self::Horizontal(y) => coordinate.y == y.saturating_sub(1),
        }
    }
}
