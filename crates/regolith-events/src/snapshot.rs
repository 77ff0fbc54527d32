//! The two kinds of timeline entry.

use regolith_types::{Bounds, Coordinate};
use regolith_world::Cave;

use crate::raster::Raster;

/// A self-contained picture of the cave at one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    raster: Raster,
}

impl Checkpoint {
    /// Rasterize the cave in its current state.
    pub fn capture(cave: &Cave) -> Self {
        Self {
            raster: Raster::from_cave(cave),
        }
    }

    /// The stored picture.
    pub const fn raster(&self) -> &Raster {
        &self.raster
    }

    /// The area the picture covers.
    pub const fn bounds(&self) -> Bounds {
        self.raster.bounds()
    }

    /// Whether a grain resting at `coordinate` can be replayed on top of
    /// this checkpoint.
    pub const fn includes(&self, coordinate: Coordinate) -> bool {
        self.raster.includes(coordinate)
    }
}

/// One grain that came to rest after the checkpoint it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    /// Timeline index of the checkpoint this delta builds on.
    pub checkpoint: usize,
    /// Where the grain came to rest.
    pub coordinate: Coordinate,
}

impl Delta {
    /// Draw the grain onto a raster materialized from the referenced
    /// checkpoint. Returns `false` if the coordinate lies outside it.
    pub fn apply(&self, raster: &mut Raster) -> bool {
        raster.add_sand(self.coordinate)
    }
}

/// Discriminant of a [`Snapshot`], used for logging and recorder results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    /// A full raster.
    Checkpoint,
    /// A single new grain.
    Delta,
}

/// One entry of the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    /// Full picture.
    Checkpoint(Checkpoint),
    /// Incremental change on top of an earlier checkpoint.
    Delta(Delta),
}

impl Snapshot {
    /// Which kind of snapshot this is.
    pub const fn kind(&self) -> SnapshotKind {
        match self {
            Self::Checkpoint(_) => SnapshotKind::Checkpoint,
            Self::Delta(_) => SnapshotKind::Delta,
        }
    }
}

impl From<Checkpoint> for Snapshot {
    fn from(checkpoint: Checkpoint) -> Self {
        Self::Checkpoint(checkpoint)
    }
}

impl From<Delta> for Snapshot {
    fn from(delta: Delta) -> Self {
        Self::Delta(delta)
    }
}

#[cfg(test)]
mod tests {
    use regolith_types::{Cell, SPAWN_POINT};

    use super::*;

    #[test]
    fn delta_draws_onto_checkpoint_raster() {
        let mut cave = Cave::new();
        cave.insert(Cell::wall(Coordinate::new(498, 2)));
        cave.insert(Cell::wall(Coordinate::new(502, 2)));
        let checkpoint = Checkpoint::capture(&cave);
        assert!(checkpoint.includes(Coordinate::new(500, 1)));
        assert!(!checkpoint.includes(Coordinate::new(503, 1)));

        let mut raster = checkpoint.raster().clone();
        let delta = Delta {
            checkpoint: 0,
            coordinate: Coordinate::new(500, 1),
        };
        assert!(delta.apply(&mut raster));
        assert_eq!(raster.as_str(), "..+..\n..o..\n#...#\n");

        let outside = Delta {
            checkpoint: 0,
            coordinate: Coordinate::new(SPAWN_POINT.x, 5),
        };
        assert!(!outside.apply(&mut raster));
        assert_eq!(raster.as_str(), "..+..\n..o..\n#...#\n");
    }

    #[test]
    fn snapshot_reports_its_kind() {
        let checkpoint = Snapshot::from(Checkpoint::capture(&Cave::new()));
        let delta = Snapshot::from(Delta {
            checkpoint: 0,
            coordinate: SPAWN_POINT,
        });
        assert_eq!(checkpoint.kind(), SnapshotKind::Checkpoint);
        assert_eq!(delta.kind(), SnapshotKind::Delta);
    }
}
