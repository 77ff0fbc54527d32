//! Per-grain physics.
//!
//! A grain is driven through a small state machine until it either comes
//! to rest or falls out of the cave. Each step picks exactly one
//! [`Transition`] from the grain's current cell:
//!
//! - a grain still on the spawn point leaves it straight down, then
//!   down-left, then down-right ([`Transition::LeaveSpawn`]);
//! - a grain with empty space below drops in one jump to just above the
//!   next object in its column, or to just above the floor
//!   ([`Transition::Fall`]); with neither, it is lost
//!   ([`Transition::Destroy`]);
//! - a grain resting on something slides down-left, then down-right
//!   ([`Transition::Slide`]);
//! - a grain that cannot move, or that sits directly on the floor, stops
//!   ([`Transition::Rest`]).
//!
//! The long fall lands exactly where single-row stepping would: every
//! cell between the grain and the object below is empty, and the grain
//! only considers diagonals once the cell below it is occupied.

use std::ops::ControlFlow;

use regolith_types::{Cell, CellType, Coordinate};
use regolith_world::{Cave, CellHandle, WorldError};
use tracing::trace;

/// Errors that can occur while simulating a grain.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    /// The cave rejected an edit or failed verification.
    #[error("cave error: {source}")]
    World {
        /// The underlying cave error.
        #[from]
        source: WorldError,
    },
}

/// One step of a grain's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Move off the spawn point into the given cell, restoring the spawn.
    LeaveSpawn(Coordinate),
    /// Drop straight down to the given cell.
    Fall(Coordinate),
    /// Move one cell diagonally down.
    Slide(Coordinate),
    /// Stop moving.
    Rest,
    /// Fall out of the bottom of the cave.
    Destroy,
}

/// Moves grains of sand through a cave.
#[derive(Debug)]
pub struct Physics<'a> {
    cave: &'a mut Cave,
    verify_invariants: bool,
}

impl<'a> Physics<'a> {
    /// Simulate grains in `cave`.
    ///
    /// With `verify_invariants` set, the cave's verification pass runs
    /// after every transition and a violation aborts the simulation.
    pub const fn new(cave: &'a mut Cave, verify_invariants: bool) -> Self {
        Self {
            cave,
            verify_invariants,
        }
    }

    /// Run one grain until it rests or is lost.
    ///
    /// `grain` is the handle returned by [`Cave::spawn_sand`]. Returns the
    /// resting coordinate, or `None` if the grain fell into the void.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::World`] if the handle is stale or the cave
    /// rejects an edit, or if verification is enabled and fails.
    pub fn simulate(&mut self, grain: CellHandle) -> Result<Option<Coordinate>, PhysicsError> {
        let mut handle = grain;
        loop {
            let cell = *self.cave.get(handle)?;
            let transition = self.next_transition(&cell);
            trace!(at = %cell.coordinate, ?transition, "Grain transition");

            let step = match transition {
                Transition::LeaveSpawn(to) => {
                    self.cave.set_type(handle, CellType::Spawn)?;
                    handle = self.cave.insert(Cell::sand(to));
                    ControlFlow::Continue(())
                }
                Transition::Fall(to) | Transition::Slide(to) => {
                    handle = self.cave.relocate(handle, to)?;
                    ControlFlow::Continue(())
                }
                Transition::Rest => ControlFlow::Break(Some(cell.coordinate)),
                Transition::Destroy => {
                    if cell.cell_type == CellType::SandBlockingSpawn {
                        self.cave.set_type(handle, CellType::Spawn)?;
                    } else {
                        self.cave.remove_handle(handle)?;
                    }
                    ControlFlow::Break(None)
                }
            };

            if self.verify_invariants {
                self.cave.verify().map_err(WorldError::from)?;
            }

            if let ControlFlow::Break(rested) = step {
                return Ok(rested);
            }
        }
    }

    /// Decide the next step for a grain occupying `cell`.
    pub fn next_transition(&self, cell: &Cell) -> Transition {
        let at = cell.coordinate;
        let floor = self.cave.floor();

        if floor.supports(at) {
            return Transition::Rest;
        }

        if cell.cell_type == CellType::SandBlockingSpawn {
            return [at.below(), at.below_left(), at.below_right()]
                .into_iter()
                .find(|&target| self.cave.is_empty(target))
                .map_or(Transition::Rest, Transition::LeaveSpawn);
        }

        if self.cave.is_empty(at.below()) {
            let obstruction = self.cave.find_object_below(at).map(Coordinate::above);
            let above_floor = floor
                .horizontal()
                .map(|y| Coordinate::new(at.x, y.saturating_sub(1)));
            return [obstruction, above_floor]
                .into_iter()
                .flatten()
                .min_by_key(|landing| landing.y)
                .map_or(Transition::Destroy, Transition::Fall);
        }

        [at.below_left(), at.below_right()]
            .into_iter()
            .find(|&target| self.cave.is_empty(target))
            .map_or(Transition::Rest, Transition::Slide)
    }
}
