//! Simulation driver.
//!
//! [`run_simulation`] drops one grain per turn from the spawn point until
//! either a grain falls into the void or a grain comes to rest on the
//! spawn point itself. [`solve`] wraps it with input parsing and cave
//! preparation for the two puzzle variants.

use regolith_events::{Timeline, TimelineRecorder};
use regolith_types::{CellType, Coordinate, Floor};
use regolith_world::{Cave, Wall, WorldError, max_wall_y, parse_walls};
use serde::Deserialize;
use tracing::{info, warn};

use crate::physics::{Physics, PhysicsError};

/// Rows between the lowest wall and the floor in the floored variant.
const FLOOR_OFFSET: i32 = 2;

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Parsing the input or preparing the cave failed.
    #[error("world error: {source}")]
    World {
        /// The underlying cave error.
        #[from]
        source: WorldError,
    },

    /// A grain could not be simulated.
    #[error("physics error: {source}")]
    Physics {
        /// The underlying physics error.
        #[from]
        source: PhysicsError,
    },
}

/// Which puzzle is being solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Part 1: no floor; count grains until one falls out.
    #[default]
    Void,
    /// Part 2: floor two rows below the lowest wall; count grains until
    /// the spawn point is blocked.
    Floored,
}

impl Variant {
    /// The floor this variant places beneath the given walls.
    pub fn floor(self, walls: &[Wall]) -> Floor {
        match self {
            Self::Void => Floor::Void,
            Self::Floored => Floor::Horizontal(max_wall_y(walls).saturating_add(FLOOR_OFFSET)),
        }
    }
}

/// Why the simulation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// A grain fell past every wall with no floor to catch it.
    FellIntoVoid,
    /// A grain came to rest on the spawn point.
    SpawnBlocked,
}

/// Knobs for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOptions {
    /// Run the cave verification pass after every transition.
    pub verify_invariants: bool,
    /// Record a timeline, forcing a checkpoint every this many snapshots.
    /// `None` disables recording.
    pub checkpoint_interval: Option<usize>,
}

/// Result of the simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationResult {
    /// Number of grains that came to rest.
    pub turns: u64,
    /// The reason the simulation ended.
    pub end_reason: EndReason,
}

/// Everything [`solve`] produces.
#[derive(Debug)]
pub struct Solution {
    /// How the run went.
    pub result: SimulationResult,
    /// The recorded history, if recording was enabled.
    pub timeline: Option<Timeline>,
}

/// Callback invoked around each turn.
///
/// Implementations can use this to record snapshots or collect
/// statistics. The cave is passed read-only.
pub trait TurnCallback {
    /// Called once with the prepared cave, before the first grain.
    fn on_start(&mut self, cave: &Cave);

    /// Called after every grain, with where it came to rest or `None` if
    /// it fell into the void.
    fn on_turn(&mut self, cave: &Cave, rested: Option<Coordinate>);
}

/// A no-op turn callback.
pub struct NoOpCallback;

impl TurnCallback for NoOpCallback {
    fn on_start(&mut self, _cave: &Cave) {}

    fn on_turn(&mut self, _cave: &Cave, _rested: Option<Coordinate>) {}
}

impl TurnCallback for TimelineRecorder {
    fn on_start(&mut self, cave: &Cave) {
        self.record_initial(cave);
    }

    fn on_turn(&mut self, cave: &Cave, rested: Option<Coordinate>) {
        self.record_turn(cave, rested);
    }
}

/// Drop grains until the cave can take no more.
///
/// Each turn checks the spawn point first: if a grain already rests
/// there the run ends with [`EndReason::SpawnBlocked`]. Otherwise a new
/// grain is spawned and simulated; if it is lost the run ends with
/// [`EndReason::FellIntoVoid`], and if it rests the turn is counted.
///
/// # Errors
///
/// Returns [`RunnerError`] if the cave is missing its spawn cell or a
/// grain cannot be simulated.
pub fn run_simulation(
    cave: &mut Cave,
    options: &RunOptions,
    callback: &mut dyn TurnCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut turns: u64 = 0;

    info!(
        floor = ?cave.floor(),
        cells = cave.cell_count(),
        verify_invariants = options.verify_invariants,
        "Simulation starting"
    );
    callback.on_start(cave);

    let end_reason = loop {
        let spawn = cave.spawn_cell()?;
        if cave.get(spawn)?.cell_type == CellType::SandBlockingSpawn {
            break EndReason::SpawnBlocked;
        }

        let grain = cave.spawn_sand()?;
        let rested = Physics::new(cave, options.verify_invariants).simulate(grain)?;
        callback.on_turn(cave, rested);

        if rested.is_none() {
            break EndReason::FellIntoVoid;
        }
        turns = turns.saturating_add(1);
    };

    Ok(SimulationResult { turns, end_reason })
}

/// Parse a wall description and run one puzzle variant on it.
///
/// # Errors
///
/// Returns [`RunnerError::World`] if the input is malformed, or any
/// error from [`run_simulation`].
pub fn solve(input: &str, variant: Variant, options: &RunOptions) -> Result<Solution, RunnerError> {
    let walls = parse_walls(input)?;
    let mut cave = Cave::new();
    for wall in &walls {
        cave.insert_wall(wall);
    }
    cave.set_floor(variant.floor(&walls));

    match options.checkpoint_interval {
        Some(interval) => {
            let mut recorder = TimelineRecorder::new(interval);
            let result = run_simulation(&mut cave, options, &mut recorder)?;
            Ok(Solution {
                result,
                timeline: Some(recorder.finish()),
            })
        }
        None => {
            let result = run_simulation(&mut cave, options, &mut NoOpCallback)?;
            Ok(Solution {
                result,
                timeline: None,
            })
        }
    }
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        turns = result.turns,
        "Simulation ended"
    );
    if result.turns == 0 {
        warn!("Simulation ended with no grain at rest");
    }
}
