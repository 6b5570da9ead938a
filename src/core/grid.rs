//! Static maze geometry and the deterministic move resolver.
//!
//! The grid is a fixed `HEIGHT x WIDTH` boolean wall mask with a walled border
//! and a single goal cell. Action noise lives in [`crate::env`]; this module
//! only answers "where does this move land".

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

pub const HEIGHT: usize = 7;
pub const WIDTH: usize = 13;

/// Number of cells in the grid.
pub const CELLS: usize = HEIGHT * WIDTH;

/// Two rooms joined by a single doorway in the dividing wall at (3, 6).
const TWO_ROOMS: &str = "\
#############
#.....#.....#
#.....#.....#
#...........#
#.....#.....#
#.....#.....#
#############";

const TWO_ROOMS_GOAL: Position = Position { row: 5, col: 11 };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    #[inline]
    pub(crate) fn in_bounds(self) -> bool {
        self.row < HEIGHT && self.col < WIDTH
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.row * WIDTH + self.col
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The closed action set. Indices are stable: left=0, right=1, up=2, down=3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Action {
    Left,
    Right,
    Up,
    Down,
}

impl Action {
    pub const COUNT: usize = 4;
    pub const ALL: [Action; Action::COUNT] = [Action::Left, Action::Right, Action::Up, Action::Down];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Action::Left => 0,
            Action::Right => 1,
            Action::Up => 2,
            Action::Down => 3,
        }
    }

    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| GridError::InvalidAction(format!("index {index}")))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Left => "left",
            Action::Right => "right",
            Action::Up => "up",
            Action::Down => "down",
        }
    }

    /// (row, col) offset of a successful move.
    #[inline]
    pub fn delta(self) -> (isize, isize) {
        match self {
            Action::Left => (0, -1),
            Action::Right => (0, 1),
            Action::Up => (-1, 0),
            Action::Down => (1, 0),
        }
    }

    pub fn arrow(self) -> char {
        match self {
            Action::Left => '\u{2190}',
            Action::Right => '\u{2192}',
            Action::Up => '\u{2191}',
            Action::Down => '\u{2193}',
        }
    }
}

impl FromStr for Action {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(Action::Left),
            "right" => Ok(Action::Right),
            "up" => Ok(Action::Up),
            "down" => Ok(Action::Down),
            other => Err(GridError::InvalidAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable wall layout plus goal cell.
///
/// Invariants (checked on construction): every border cell is a wall and the
/// goal is an open interior cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    walls: [[bool; WIDTH]; HEIGHT],
    goal: Position,
}

impl Grid {
    pub fn new(walls: [[bool; WIDTH]; HEIGHT], goal: Position) -> Result<Self> {
        for (row, cells) in walls.iter().enumerate() {
            for (col, &wall) in cells.iter().enumerate() {
                let border = row == 0 || col == 0 || row == HEIGHT - 1 || col == WIDTH - 1;
                if border && !wall {
                    return Err(GridError::InvalidGrid(format!(
                        "border cell ({row}, {col}) must be a wall"
                    )));
                }
            }
        }
        if !goal.in_bounds() || walls[goal.row][goal.col] {
            return Err(GridError::InvalidGrid(format!(
                "goal {goal} must be an open interior cell"
            )));
        }
        Ok(Self { walls, goal })
    }

    /// Parses a text layout: `#`/`1` is a wall, `.`/`0` is open. Spaces are
    /// ignored and blank lines skipped.
    pub fn from_layout(layout: &str, goal: Position) -> Result<Self> {
        let mut walls = [[true; WIDTH]; HEIGHT];
        let mut rows = 0usize;
        for line in layout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if rows >= HEIGHT {
                return Err(GridError::InvalidGrid(format!(
                    "expected {HEIGHT} rows, got more"
                )));
            }
            let mut cols = 0usize;
            for ch in line.chars().filter(|c| !c.is_whitespace()) {
                if cols >= WIDTH {
                    return Err(GridError::InvalidGrid(format!(
                        "row {rows} is wider than {WIDTH} cells"
                    )));
                }
                walls[rows][cols] = match ch {
                    '#' | '1' => true,
                    '.' | '0' => false,
                    other => {
                        return Err(GridError::InvalidGrid(format!(
                            "unknown layout character {other:?} at ({rows}, {cols})"
                        )))
                    }
                };
                cols += 1;
            }
            if cols != WIDTH {
                return Err(GridError::InvalidGrid(format!(
                    "row {rows} has {cols} cells, expected {WIDTH}"
                )));
            }
            rows += 1;
        }
        if rows != HEIGHT {
            return Err(GridError::InvalidGrid(format!(
                "expected {HEIGHT} rows, got {rows}"
            )));
        }
        Self::new(walls, goal)
    }

    /// The reference two-room maze with the goal in the bottom-right room.
    pub fn two_rooms() -> Self {
        match Self::from_layout(TWO_ROOMS, TWO_ROOMS_GOAL) {
            Ok(grid) => grid,
            Err(e) => unreachable!("built-in layout is valid: {e}"),
        }
    }

    pub fn height(&self) -> usize {
        HEIGHT
    }

    pub fn width(&self) -> usize {
        WIDTH
    }

    pub fn goal(&self) -> Position {
        self.goal
    }

    /// Out-of-bounds positions count as walls.
    #[inline]
    pub fn is_wall(&self, pos: Position) -> bool {
        !pos.in_bounds() || self.walls[pos.row][pos.col]
    }

    #[inline]
    pub fn is_open(&self, pos: Position) -> bool {
        !self.is_wall(pos)
    }

    pub fn open_cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..HEIGHT)
            .flat_map(|row| (0..WIDTH).map(move |col| Position::new(row, col)))
            .filter(move |&p| self.is_open(p))
    }

    pub fn wall_mask(&self) -> [[bool; WIDTH]; HEIGHT] {
        self.walls
    }

    /// Resolves one attempted move. A move into a wall is absorbed and the
    /// original position is returned.
    pub fn attempt_move(&self, pos: Position, action: Action) -> Position {
        let (dr, dc) = action.delta();
        let next = match (pos.row.checked_add_signed(dr), pos.col.checked_add_signed(dc)) {
            (Some(row), Some(col)) => Position::new(row, col),
            _ => return pos,
        };
        if self.is_open(next) {
            next
        } else {
            pos
        }
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::two_rooms()
    }
}
