//! ASCII rendering of the cave.
//!
//! A [`Raster`] covers the cave's bounds with one character per cell and
//! one newline-terminated line per row:
//!
//! | Glyph | Meaning |
//! |-------|---------|
//! | `.` | empty |
//! | `o` | sand (including a grain blocking the spawn point) |
//! | `#` | wall or floor |
//! | `+` | idle spawn point |

use regolith_types::{Bounds, CellType, Coordinate};
use regolith_world::Cave;

/// What a raster shows at one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    /// Nothing there.
    Empty,
    /// A grain of sand.
    Sand,
    /// Rock or floor.
    Wall,
    /// The idle spawn point.
    Spawn,
}

impl CellState {
    /// The character printed for this state.
    pub const fn glyph(self) -> char {
        match self {
            Self::Empty => '.',
            Self::Sand => 'o',
            Self::Wall => '#',
            Self::Spawn => '+',
        }
    }
}

impl From<CellType> for CellState {
    fn from(cell_type: CellType) -> Self {
        match cell_type {
            CellType::Wall => Self::Wall,
            CellType::Sand | CellType::SandBlockingSpawn => Self::Sand,
            CellType::Spawn => Self::Spawn,
        }
    }
}

/// The cave printed as text, together with the bounds it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    bounds: Bounds,
    data: String,
}

impl Raster {
    /// Print the whole cave.
    ///
    /// The floor, when configured, is drawn as a full bottom row of walls.
    pub fn from_cave(cave: &Cave) -> Self {
        let bounds = cave.calculate_bounds();
        let width = usize::try_from(bounds.width).unwrap_or(0);
        let height = usize::try_from(bounds.height).unwrap_or(0);

        let mut grid = vec![vec![CellState::Empty; width]; height];
        for cell in cave.cells() {
            if let Some((row, col)) = offset(bounds, cell.coordinate)
                && let Some(slot) = grid.get_mut(row).and_then(|r| r.get_mut(col))
            {
                *slot = CellState::from(cell.cell_type);
            }
        }

        if cave.floor().horizontal().is_some()
            && let Some(bottom) = grid.last_mut()
        {
            bottom.fill(CellState::Wall);
        }

        let mut data = String::with_capacity(height.saturating_mul(width.saturating_add(1)));
        for row in &grid {
            data.extend(row.iter().map(|state| state.glyph()));
            data.push('\n');
        }

        Self { bounds, data }
    }

    /// The area of the cave this raster covers.
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Whether the coordinate falls inside the raster.
    pub const fn includes(&self, coordinate: Coordinate) -> bool {
        self.bounds.includes(coordinate)
    }

    /// Draw a grain of sand at the coordinate.
    ///
    /// Coordinates outside the bounds are ignored; returns whether the
    /// raster changed.
    pub fn add_sand(&mut self, coordinate: Coordinate) -> bool {
        let Some(index) = self.index_of(coordinate) else {
            return false;
        };
        let end = index.saturating_add(1);
        if !self.data.is_char_boundary(index) || !self.data.is_char_boundary(end) {
            return false;
        }
        self.data
            .replace_range(index..end, CellState::Sand.glyph().encode_utf8(&mut [0; 4]));
        true
    }

    /// The raster text.
    pub fn as_str(&self) -> &str {
        &self.data
    }

    /// Consume the raster, returning its text.
    pub fn into_string(self) -> String {
        self.data
    }

    /// Byte offset of a coordinate in the text, accounting for newlines.
    fn index_of(&self, coordinate: Coordinate) -> Option<usize> {
        let (row, col) = offset(self.bounds, coordinate)?;
        let stride = usize::try_from(self.bounds.width).ok()?.checked_add(1)?;
        let index = row.checked_mul(stride)?.checked_add(col)?;
        (index < self.data.len()).then_some(index)
    }
}

impl core::fmt::Display for Raster {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.data)
    }
}

/// Row and column of a coordinate relative to the bounds' top-left corner.
fn offset(bounds: Bounds, coordinate: Coordinate) -> Option<(usize, usize)> {
    if !bounds.includes(coordinate) {
        return None;
    }
    let row = usize::try_from(coordinate.y.checked_sub(bounds.y)?).ok()?;
    let col = usize::try_from(coordinate.x.checked_sub(bounds.x)?).ok()?;
    Some((row, col))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use regolith_types::Floor;
    use regolith_world::parse_walls;

    use super::*;

    const SAMPLE: &str = "498,4 -> 498,6 -> 496,6\n503,4 -> 502,4 -> 502,9 -> 494,9\n";

    fn sample_cave() -> Cave {
        let mut cave = Cave::new();
        for wall in &parse_walls(SAMPLE).unwrap() {
            cave.insert_wall(wall);
        }
        cave
    }

    #[test]
    fn prints_the_sample_cave() {
        let raster = Raster::from_cave(&sample_cave());
        let expected = "\
......+...
..........
..........
..........
....#...##
....#...#.
..###...#.
........#.
........#.
#########.
";
        assert_eq!(raster.as_str(), expected);
        assert_eq!(raster.bounds(), Bounds::from_extents(494, 0, 503, 9));
    }

    #[test]
    fn prints_the_floor_as_a_wall_row() {
        let mut cave = sample_cave();
        cave.set_floor(Floor::Horizontal(11));
        let raster = Raster::from_cave(&cave);
        let lines: Vec<_> = raster.as_str().lines().collect();
        assert_eq!(lines.len(), 12);
        assert_eq!(lines.last().copied(), Some("##########"));
        assert_eq!(lines.get(10).copied(), Some(".........."));
    }

    #[test]
    fn blocked_spawn_prints_as_sand() {
        let mut cave = Cave::new();
        cave.spawn_sand().unwrap();
        assert_eq!(Raster::from_cave(&cave).as_str(), "o\n");
    }

    #[test]
    fn add_sand_writes_inside_bounds_only() {
        let mut raster = Raster::from_cave(&sample_cave());
        assert!(raster.add_sand(Coordinate::new(500, 8)));
        assert_eq!(raster.as_str().lines().nth(8), Some("......o.#."));
        assert!(!raster.add_sand(Coordinate::new(520, 8)));
        assert!(!raster.add_sand(Coordinate::new(500, 10)));
    }
}
