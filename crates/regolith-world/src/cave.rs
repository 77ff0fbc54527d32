//! The cave: a sparse spatial store of cells keyed by coordinate.
//!
//! Cells live in a generational arena and are addressed through
//! [`CellHandle`]s. A column index maps each `x` to an ordered map from
//! `y` to the handle stored there, which makes "what is the next object
//! below this point" a single range query on one column.
//!
//! A handle stays valid until its cell is removed, overwritten, or
//! relocated; after that every lookup through it fails with
//! [`WorldError::StaleHandle`] instead of reaching a different cell.
//!
//! Exactly one cell of type [`CellType::Spawn`] or
//! [`CellType::SandBlockingSpawn`] exists at all times. [`Cave::verify`]
//! checks this and the index invariants on demand.

use std::collections::BTreeMap;
use std::ops::Bound;

use regolith_types::{Bounds, Cell, CellType, Coordinate, Floor, SPAWN_POINT};
use slotmap::{SlotMap, new_key_type};

use crate::error::{InvariantViolation, WorldError};
use crate::wall::Wall;

new_key_type! {
    /// Stable reference to a cell stored in a [`Cave`].
    pub struct CellHandle;
}

/// Sparse 2-D cave of walls, sand, and the spawn point.
#[derive(Debug, Clone)]
pub struct Cave {
    /// Cell storage addressed by [`CellHandle`].
    slots: SlotMap<CellHandle, Cell>,
    /// Column index: `x` -> (`y` -> handle), each column ordered by `y`.
    buckets: BTreeMap<i32, BTreeMap<i32, CellHandle>>,
    /// What lies beneath every wall.
    floor: Floor,
}

impl Cave {
    /// Create a cave holding only the idle spawn cell at [`SPAWN_POINT`].
    pub fn new() -> Self {
        let mut cave = Self {
            slots: SlotMap::with_key(),
            buckets: BTreeMap::new(),
            floor: Floor::Void,
        };
        cave.insert(Cell::new(CellType::Spawn, SPAWN_POINT));
        cave
    }

    // -------------------------------------------------------------------
    // Structural edits
    // -------------------------------------------------------------------

    /// Store a cell, replacing whatever was at its coordinate.
    ///
    /// Any handle to a replaced cell becomes stale.
    pub fn insert(&mut self, cell: Cell) -> CellHandle {
        let Coordinate { x, y } = cell.coordinate;
        let handle = self.slots.insert(cell);
        let replaced = self.buckets.entry(x).or_default().insert(y, handle);
        if let Some(old) = replaced {
            self.slots.remove(old);
        }
        handle
    }

    /// Rasterize a wall and store every one of its cells.
    ///
    /// Returns the number of cells written, counting shared corners once
    /// per segment.
    pub fn insert_wall(&mut self, wall: &Wall) -> usize {
        let mut written: usize = 0;
        for cell in wall.cells() {
            self.insert(cell);
            written = written.saturating_add(1);
        }
        written
    }

    /// Remove the cell at a coordinate, if any.
    pub fn remove(&mut self, coordinate: Coordinate) -> Option<Cell> {
        let handle = self.unindex(coordinate)?;
        self.slots.remove(handle)
    }

    /// Remove the cell a handle refers to.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::StaleHandle`] if the handle is no longer valid.
    pub fn remove_handle(&mut self, handle: CellHandle) -> Result<Cell, WorldError> {
        let coordinate = self.get(handle)?.coordinate;
        self.unindex(coordinate);
        self.slots.remove(handle).ok_or(WorldError::StaleHandle)
    }

    /// Move a cell to a new coordinate.
    ///
    /// Relocating a cell onto its own coordinate returns the same handle
    /// and changes nothing. Otherwise the old handle becomes stale and the
    /// returned handle refers to the moved cell.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Occupied`] if another cell sits at `to`, or
    /// [`WorldError::StaleHandle`] if the handle is no longer valid.
    pub fn relocate(&mut self, handle: CellHandle, to: Coordinate) -> Result<CellHandle, WorldError> {
        let from = self.get(handle)?.coordinate;
        if from == to {
            return Ok(handle);
        }
        if self.find(to).is_some() {
            return Err(WorldError::Occupied(to));
        }
        let mut moving = self.remove_handle(handle)?;
        moving.coordinate = to;
        Ok(self.insert(moving))
    }

    // -------------------------------------------------------------------
    // Handle access
    // -------------------------------------------------------------------

    /// Resolve a handle to its cell.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::StaleHandle`] if the handle is no longer valid.
    pub fn get(&self, handle: CellHandle) -> Result<&Cell, WorldError> {
        self.slots.get(handle).ok_or(WorldError::StaleHandle)
    }

    /// Change the type of the cell a handle refers to.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::StaleHandle`] if the handle is no longer valid.
    pub fn set_type(&mut self, handle: CellHandle, cell_type: CellType) -> Result<(), WorldError> {
        let cell = self.slots.get_mut(handle).ok_or(WorldError::StaleHandle)?;
        cell.cell_type = cell_type;
        Ok(())
    }

    /// Handle of the cell at a coordinate, if any.
    pub fn find(&self, coordinate: Coordinate) -> Option<CellHandle> {
        self.buckets
            .get(&coordinate.x)
            .and_then(|bucket| bucket.get(&coordinate.y))
            .copied()
    }

    /// The cell at a coordinate, if any.
    pub fn cell_at(&self, coordinate: Coordinate) -> Option<&Cell> {
        self.find(coordinate).and_then(|handle| self.get(handle).ok())
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Whether nothing is stored at the coordinate.
    ///
    /// The floor is not stored as cells, so floor rows read as empty.
    pub fn is_empty(&self, coordinate: Coordinate) -> bool {
        self.find(coordinate).is_none()
    }

    /// Whether a wall cell is stored at the coordinate.
    pub fn is_wall(&self, coordinate: Coordinate) -> bool {
        self.cell_at(coordinate)
            .is_some_and(|cell| cell.cell_type == CellType::Wall)
    }

    /// The nearest occupied coordinate strictly below, in the same column.
    ///
    /// Returns `None` if the column has nothing below the coordinate or
    /// has never held a cell.
    pub fn find_object_below(&self, coordinate: Coordinate) -> Option<Coordinate> {
        self.buckets
            .get(&coordinate.x)?
            .range((Bound::Excluded(coordinate.y), Bound::Unbounded))
            .next()
            .map(|(&y, _)| Coordinate::new(coordinate.x, y))
    }

    /// Handle of the spawn cell, idle or blocked.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::MissingSpawn`] if the spawn point holds no
    /// spawn cell, which means the single-spawn invariant was broken.
    pub fn spawn_cell(&self) -> Result<CellHandle, WorldError> {
        let handle = self.find(SPAWN_POINT).ok_or(WorldError::MissingSpawn)?;
        if self.get(handle)?.cell_type.is_spawn() {
            Ok(handle)
        } else {
            Err(WorldError::MissingSpawn)
        }
    }

    /// Place a new grain on the spawn point.
    ///
    /// The idle spawn cell becomes [`CellType::SandBlockingSpawn`] and its
    /// handle is returned as the grain to simulate.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::SpawnNotIdle`] if a grain already blocks the
    /// spawn point, or [`WorldError::MissingSpawn`] if there is no spawn cell.
    pub fn spawn_sand(&mut self) -> Result<CellHandle, WorldError> {
        let handle = self.spawn_cell()?;
        if self.get(handle)?.cell_type != CellType::Spawn {
            return Err(WorldError::SpawnNotIdle(SPAWN_POINT));
        }
        self.set_type(handle, CellType::SandBlockingSpawn)?;
        Ok(handle)
    }

    /// The configured floor.
    pub const fn floor(&self) -> Floor {
        self.floor
    }

    /// Replace the floor configuration.
    pub const fn set_floor(&mut self, floor: Floor) {
        self.floor = floor;
    }

    /// Bounds covering every stored cell and, if configured, the floor row.
    pub fn calculate_bounds(&self) -> Bounds {
        let mut min_x = i32::MAX;
        let mut max_x = i32::MIN;
        let mut min_y = i32::MAX;
        let mut max_y = i32::MIN;

        for (&x, bucket) in &self.buckets {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            if let (Some((&top, _)), Some((&bottom, _))) =
                (bucket.first_key_value(), bucket.last_key_value())
            {
                min_y = min_y.min(top);
                max_y = max_y.max(bottom);
            }
        }

        if let Some(floor) = self.floor.horizontal() {
            max_y = floor;
        }

        Bounds::from_extents(min_x, min_y, max_x, max_y)
    }

    /// Every stored cell, ordered by `x` then `y`.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.buckets
            .values()
            .flat_map(BTreeMap::values)
            .filter_map(|handle| self.get(*handle).ok())
    }

    /// Number of stored cells.
    pub fn cell_count(&self) -> usize {
        self.buckets.values().map(BTreeMap::len).sum()
    }

    /// Number of grains of sand in the cave, including one blocking the spawn point.
    pub fn sand_count(&self) -> usize {
        self.cells().filter(|cell| cell.cell_type.is_sand()).count()
    }

    // -------------------------------------------------------------------
    // Verification
    // -------------------------------------------------------------------

    /// Check the structural invariants of the cave.
    ///
    /// - exactly one spawn cell (idle or blocked) exists;
    /// - every index entry resolves to a live cell whose coordinate equals
    ///   its bucket keys;
    /// - no empty column bucket is retained;
    /// - every live arena slot is reachable from the index.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn verify(&self) -> Result<(), InvariantViolation> {
        let mut spawns: usize = 0;
        let mut indexed: usize = 0;

        for (&x, bucket) in &self.buckets {
            if bucket.is_empty() {
                return Err(InvariantViolation::EmptyBucket(x));
            }
            for (&y, handle) in bucket {
                let key = Coordinate::new(x, y);
                let cell = self
                    .get(*handle)
                    .ok()
                    .ok_or(InvariantViolation::DanglingEntry(key))?;
                if cell.coordinate != key {
                    return Err(InvariantViolation::MisplacedCell {
                        key,
                        cell: cell.coordinate,
                    });
                }
                if cell.cell_type.is_spawn() {
                    spawns = spawns.saturating_add(1);
                }
                indexed = indexed.saturating_add(1);
            }
        }

        if spawns != 1 {
            return Err(InvariantViolation::SpawnCount(spawns));
        }

        let live = self.slots.len();
        if live != indexed {
            return Err(InvariantViolation::OrphanedCells { live, indexed });
        }

        Ok(())
    }

    // -------------------------------------------------------------------
    // Index internals
    // -------------------------------------------------------------------

    /// Drop a coordinate from the column index, pruning an emptied bucket.
    fn unindex(&mut self, coordinate: Coordinate) -> Option<CellHandle> {
        let bucket = self.buckets.get_mut(&coordinate.x)?;
        let handle = bucket.remove(&coordinate.y)?;
        if bucket.is_empty() {
            self.buckets.remove(&coordinate.x);
        }
        Some(handle)
    }
}

impl Default for Cave {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_cave() -> Cave {
        let mut cave = Cave::new();
        let walls = crate::wall::parse_walls(
            "498,4 -> 498,6 -> 496,6\n503,4 -> 502,4 -> 502,9 -> 494,9\n",
        )
        .unwrap();
        for wall in &walls {
            cave.insert_wall(wall);
        }
        cave
    }

    #[test]
    fn new_cave_holds_only_the_spawn_cell() {
        let cave = Cave::new();
        assert_eq!(cave.cell_count(), 1);
        let spawn = cave.spawn_cell().unwrap();
        assert_eq!(cave.get(spawn).unwrap().cell_type, CellType::Spawn);
        assert!(cave.verify().is_ok());
    }

    #[test]
    fn insert_overwrites_and_invalidates_previous_handle() {
        let mut cave = Cave::new();
        let at = Coordinate::new(3, 3);
        let first = cave.insert(Cell::sand(at));
        let second = cave.insert(Cell::wall(at));
        assert!(matches!(cave.get(first), Err(WorldError::StaleHandle)));
        assert_eq!(cave.get(second).unwrap().cell_type, CellType::Wall);
        assert_eq!(cave.cell_count(), 2);
        assert!(cave.verify().is_ok());
    }

    #[test]
    fn remove_prunes_empty_buckets() {
        let mut cave = Cave::new();
        let at = Coordinate::new(7, 1);
        cave.insert(Cell::sand(at));
        assert_eq!(cave.remove(at), Some(Cell::sand(at)));
        assert!(cave.find_object_below(Coordinate::new(7, 0)).is_none());
        assert_eq!(cave.remove(at), None);
        assert!(cave.verify().is_ok());
    }

    #[test]
    fn remove_handle_rejects_stale_handles() {
        let mut cave = Cave::new();
        let handle = cave.insert(Cell::sand(Coordinate::new(1, 1)));
        assert!(cave.remove_handle(handle).is_ok());
        assert!(matches!(
            cave.remove_handle(handle),
            Err(WorldError::StaleHandle)
        ));
    }

    #[test]
    fn reused_slots_do_not_revive_stale_handles() {
        let mut cave = Cave::new();
        let at = Coordinate::new(2, 2);
        let old = cave.insert(Cell::sand(at));
        cave.remove(at);
        let new = cave.insert(Cell::wall(at));
        assert_ne!(old, new);
        assert!(matches!(cave.get(old), Err(WorldError::StaleHandle)));
        assert!(matches!(
            cave.set_type(old, CellType::Sand),
            Err(WorldError::StaleHandle)
        ));
        assert_eq!(cave.get(new).unwrap().cell_type, CellType::Wall);
        assert!(cave.verify().is_ok());
    }

    #[test]
    fn relocate_moves_and_invalidates() {
        let mut cave = Cave::new();
        let from = Coordinate::new(10, 1);
        let to = Coordinate::new(10, 5);
        let handle = cave.insert(Cell::sand(from));
        let moved = cave.relocate(handle, to).unwrap();
        assert!(cave.is_empty(from));
        assert_eq!(cave.get(moved).unwrap().coordinate, to);
        assert!(cave.get(handle).is_err());
        assert!(cave.verify().is_ok());
    }

    #[test]
    fn relocate_onto_occupied_cell_fails() {
        let mut cave = Cave::new();
        let handle = cave.insert(Cell::sand(Coordinate::new(10, 1)));
        cave.insert(Cell::wall(Coordinate::new(10, 2)));
        let err = cave.relocate(handle, Coordinate::new(10, 2)).unwrap_err();
        assert!(matches!(err, WorldError::Occupied(c) if c == Coordinate::new(10, 2)));
        assert_eq!(
            cave.get(handle).unwrap().coordinate,
            Coordinate::new(10, 1)
        );
    }

    #[test]
    fn relocate_in_place_is_a_no_op() {
        let mut cave = Cave::new();
        let at = Coordinate::new(4, 4);
        let handle = cave.insert(Cell::sand(at));
        let same = cave.relocate(handle, at).unwrap();
        assert_eq!(same, handle);
        assert_eq!(cave.get(handle).unwrap().coordinate, at);
        assert!(cave.verify().is_ok());
    }

    #[test]
    fn find_object_below_returns_nearest_in_column() {
        let cave = sample_cave();
        assert_eq!(
            cave.find_object_below(Coordinate::new(500, 0)),
            Some(Coordinate::new(500, 9))
        );
        assert_eq!(
            cave.find_object_below(Coordinate::new(498, 0)),
            Some(Coordinate::new(498, 4))
        );
        assert_eq!(cave.find_object_below(Coordinate::new(498, 9)), None);
        assert_eq!(cave.find_object_below(Coordinate::new(600, 0)), None);
    }

    #[test]
    fn wall_and_empty_queries_agree() {
        let cave = sample_cave();
        assert!(cave.is_wall(Coordinate::new(498, 5)));
        assert!(!cave.is_empty(Coordinate::new(498, 5)));
        assert!(!cave.is_wall(SPAWN_POINT));
        assert!(!cave.is_empty(SPAWN_POINT));
        assert!(cave.is_empty(Coordinate::new(500, 8)));
    }

    #[test]
    fn spawn_sand_blocks_the_spawn_point_once() {
        let mut cave = Cave::new();
        let grain = cave.spawn_sand().unwrap();
        assert_eq!(
            cave.get(grain).unwrap().cell_type,
            CellType::SandBlockingSpawn
        );
        assert!(matches!(cave.spawn_sand(), Err(WorldError::SpawnNotIdle(_))));
        assert_eq!(cave.sand_count(), 1);
    }

    #[test]
    fn bounds_cover_cells_and_floor() {
        let mut cave = sample_cave();
        assert_eq!(cave.calculate_bounds(), Bounds::from_extents(494, 0, 503, 9));
        cave.set_floor(Floor::Horizontal(11));
        assert_eq!(
            cave.calculate_bounds(),
            Bounds::from_extents(494, 0, 503, 11)
        );
    }

    #[test]
    fn verify_detects_missing_and_duplicate_spawn() {
        let mut cave = Cave::new();
        cave.remove(SPAWN_POINT);
        assert_eq!(cave.verify(), Err(InvariantViolation::SpawnCount(0)));
        assert!(matches!(cave.spawn_cell(), Err(WorldError::MissingSpawn)));

        let mut cave = Cave::new();
        cave.insert(Cell::new(CellType::Spawn, Coordinate::new(1, 1)));
        assert_eq!(cave.verify(), Err(InvariantViolation::SpawnCount(2)));
    }

    #[test]
    fn cells_iterate_in_column_order() {
        let cave = sample_cave();
        let coordinates: Vec<_> = cave.cells().map(|cell| cell.coordinate).collect();
        let mut sorted = coordinates.clone();
        sorted.sort_by_key(|c| (c.x, c.y));
        assert_eq!(coordinates, sorted);
        assert_eq!(coordinates.len(), cave.cell_count());
    }
}
