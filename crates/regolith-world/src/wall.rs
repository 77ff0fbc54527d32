//! Wall descriptions: parsing and rasterization.
//!
//! A wall is written as a path of coordinates on one line, for example
//! `498,4 -> 498,6 -> 496,6`. Each consecutive pair of coordinates forms
//! a [`Segment`], and every segment must be horizontal or vertical. A line
//! with a single coordinate describes a one-cell wall.

use regolith_types::{Cell, Coordinate};

use crate::error::WorldError;

/// Separator between coordinates on a wall line.
const PATH_SEPARATOR: &str = "->";

/// A straight, axis-aligned piece of wall between two endpoints (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    start: Coordinate,
    end: Coordinate,
}

impl Segment {
    /// Create a segment between two endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DiagonalSegment`] if the endpoints differ in
    /// both `x` and `y`.
    pub fn new(start: Coordinate, end: Coordinate) -> Result<Self, WorldError> {
        if start.x != end.x && start.y != end.y {
            return Err(WorldError::DiagonalSegment { start, end });
        }
        Ok(Self { start, end })
    }

    /// First endpoint as written.
    pub const fn start(&self) -> Coordinate {
        self.start
    }

    /// Second endpoint as written.
    pub const fn end(&self) -> Coordinate {
        self.end
    }

    /// Whether the segment runs along a row. Single-cell segments count as horizontal.
    pub const fn is_horizontal(&self) -> bool {
        self.start.y == self.end.y
    }

    /// Whether the segment runs along a column.
    pub const fn is_vertical(&self) -> bool {
        !self.is_horizontal()
    }

    /// The lowest row the segment touches.
    pub fn max_y(&self) -> i32 {
        self.start.y.max(self.end.y)
    }

    /// Every coordinate covered by the segment, one per unit step.
    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> {
        let low = self.start.min(self.end);
        let high = self.start.max(self.end);
        let horizontal = self.is_horizontal();
        let span = if horizontal {
            low.x..=high.x
        } else {
            low.y..=high.y
        };
        span.map(move |v| {
            if horizontal {
                Coordinate::new(v, low.y)
            } else {
                Coordinate::new(low.x, v)
            }
        })
    }
}

/// An ordered chain of segments parsed from one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wall {
    segments: Vec<Segment>,
}

impl Wall {
    /// Chain consecutive coordinates into segments.
    ///
    /// A single coordinate becomes one degenerate segment; no coordinates
    /// produce an empty wall.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DiagonalSegment`] if two consecutive
    /// coordinates are not axis-aligned.
    pub fn from_coordinates(coordinates: &[Coordinate]) -> Result<Self, WorldError> {
        let segments = match coordinates {
            [] => Vec::new(),
            [only] => vec![Segment::new(*only, *only)?],
            _ => coordinates
                .windows(2)
                .filter_map(|pair| match pair {
                    [start, end] => Some(Segment::new(*start, *end)),
                    _ => None,
                })
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(Self { segments })
    }

    /// Parse one wall line. `line_number` is 1-based and only used for errors.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Parse`] if a coordinate is malformed or a
    /// segment is diagonal.
    pub fn parse(line: &str, line_number: usize) -> Result<Self, WorldError> {
        let coordinates = line
            .split(PATH_SEPARATOR)
            .map(|token| parse_coordinate(token.trim(), line_number))
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_coordinates(&coordinates).map_err(|e| WorldError::Parse {
            line: line_number,
            message: e.to_string(),
        })
    }

    /// The segments in input order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The lowest row touched by any segment, or `None` for an empty wall.
    pub fn max_y(&self) -> Option<i32> {
        self.segments.iter().map(Segment::max_y).max()
    }

    /// Rasterize the wall into wall cells. Corners shared by consecutive
    /// segments appear once per segment.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.segments
            .iter()
            .flat_map(Segment::coordinates)
            .map(Cell::wall)
    }
}

/// Parse a full wall description, one wall per non-blank line.
///
/// # Errors
///
/// Returns [`WorldError::Parse`] naming the first offending line.
pub fn parse_walls(input: &str) -> Result<Vec<Wall>, WorldError> {
    let walls = input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| Wall::parse(line, index.saturating_add(1)))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(walls = walls.len(), "Parsed wall description");
    Ok(walls)
}

/// The lowest wall row across all walls, or 0 when there are none.
pub fn max_wall_y(walls: &[Wall]) -> i32 {
    walls.iter().filter_map(Wall::max_y).max().unwrap_or(0)
}

fn parse_coordinate(token: &str, line: usize) -> Result<Coordinate, WorldError> {
    let parse_error = |message: String| WorldError::Parse { line, message };

    let (x, y) = token
        .split_once(',')
        .ok_or_else(|| parse_error(format!("expected `x,y`, found `{token}`")))?;
    let x = x
        .trim()
        .parse::<i32>()
        .map_err(|e| parse_error(format!("invalid x in `{token}`: {e}")))?;
    let y = y
        .trim()
        .parse::<i32>()
        .map_err(|e| parse_error(format!("invalid y in `{token}`: {e}")))?;
    Ok(Coordinate::new(x, y))
}
