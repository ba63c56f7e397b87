use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A 0-indexed `(row, col)` coordinate on the board.
///
/// Ordering is row-major, which gives every `BTreeSet<Cell>` in the crate a
/// stable iteration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Cell { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Iterates the in-bounds 8-neighborhood of `cell`, excluding the cell itself.
pub(crate) fn neighbors(cell: Cell, height: usize, width: usize) -> impl Iterator<Item = Cell> {
    (-1isize..=1).flat_map(move |dr| {
        (-1isize..=1).filter_map(move |dc| {
            if dr == 0 && dc == 0 {
                return None;
            }

            let r = cell.row as isize + dr;
            let c = cell.col as isize + dc;

            if r >= 0 && r < height as isize && c >= 0 && c < width as isize {
                Some(Cell::new(r as usize, c as usize))
            } else {
                None
            }
        })
    })
}

/// The hidden ground truth of a game: which cells hold mines.
///
/// The layout is fixed at construction. The board plays no part in inference;
/// it only answers the questions a real game would answer after a reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    height: usize,
    width: usize,
    /// `grid[row][col]` is true when the cell holds a mine.
    grid: Vec<Vec<bool>>,
    mine_count: usize,
}

impl Board {
    /// Builds a board with mines at exactly the given cells.
    ///
    /// Duplicate cells are counted once. At least one cell must stay safe.
    pub fn new(height: usize, width: usize, mines: impl IntoIterator<Item = Cell>) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(Error::InvalidLayout {
                message: format!("board must be at least 1x1, got {height}x{width}"),
            });
        }

        let mut grid = vec![vec![false; width]; height];
        let mut mine_count = 0;
        for cell in mines {
            if cell.row >= height || cell.col >= width {
                return Err(Error::OutOfBounds {
                    cell,
                    height,
                    width,
                });
            }
            if !grid[cell.row][cell.col] {
                grid[cell.row][cell.col] = true;
                mine_count += 1;
            }
        }

        if mine_count >= height * width {
            return Err(Error::TooManyMines {
                mines: mine_count,
                cells: height * width,
            });
        }

        Ok(Board {
            height,
            width,
            grid,
            mine_count,
        })
    }

    /// Builds a board from an ASCII layout where `*` is a mine and `.` is safe.
    ///
    /// Leading and trailing whitespace on each line is ignored, as are blank
    /// lines around the layout.
    ///
    /// # Errors
    ///
    /// Fails if the layout is empty, not rectangular, or contains any other
    /// character.
    pub fn parse(layout: &str) -> Result<Self> {
        let lines: Vec<&str> = layout.trim().lines().map(str::trim).collect();
        let width = lines.first().map_or(0, |l| l.chars().count());
        if width == 0 {
            return Err(Error::InvalidLayout {
                message: "layout has no cells".to_string(),
            });
        }

        let mut mines = Vec::new();
        for (row, line) in lines.iter().enumerate() {
            if line.chars().count() != width {
                return Err(Error::InvalidLayout {
                    message: format!(
                        "row {row} has {} cells, expected {width}",
                        line.chars().count()
                    ),
                });
            }
            for (col, c) in line.chars().enumerate() {
                match c {
                    '*' => mines.push(Cell::new(row, col)),
                    '.' => {}
                    other => {
                        return Err(Error::InvalidLayout {
                            message: format!("unexpected character '{other}' at ({row}, {col})"),
                        });
                    }
                }
            }
        }

        Board::new(lines.len(), width, mines)
    }

    /// Decodes a board previously produced by [`Board::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let board: Board = bcs::from_bytes(bytes)?;
        // The grid must match the declared dimensions before it is indexed.
        if board.grid.len() != board.height {
            return Err(Error::InvalidLayout {
                message: format!(
                    "grid has {} rows, expected {}",
                    board.grid.len(),
                    board.height
                ),
            });
        }
        if let Some((row, cells)) = board
            .grid
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != board.width)
        {
            return Err(Error::InvalidLayout {
                message: format!(
                    "row {row} has {} cells, expected {}",
                    cells.len(),
                    board.width
                ),
            });
        }
        Board::new(board.height, board.width, board.mines())
    }

    /// Encodes the board so a host can hand a fixed layout to the driver.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + use<> {
        let width = self.width;
        (0..self.height).flat_map(move |row| (0..width).map(move |col| Cell::new(row, col)))
    }

    /// The set of cells holding mines.
    pub fn mines(&self) -> BTreeSet<Cell> {
        self.cells()
            .filter(|cell| self.grid[cell.row][cell.col])
            .collect()
    }

    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + use<> {
        neighbors(cell, self.height, self.width)
    }

    pub fn is_mine(&self, cell: Cell) -> Result<bool> {
        self.check_bounds(cell)?;
        Ok(self.grid[cell.row][cell.col])
    }

    /// Counts mines among the neighbors of `cell`, not including the cell itself.
    pub fn count_adjacent_mines(&self, cell: Cell) -> Result<u8> {
        self.check_bounds(cell)?;
        let count = self
            .neighbors(cell)
            .filter(|n| self.grid[n.row][n.col])
            .count();
        Ok(count as u8)
    }

    /// True iff `flagged` is exactly the set of mines. A strict subset is not a win.
    pub fn has_won(&self, flagged: &BTreeSet<Cell>) -> bool {
        flagged.len() == self.mine_count
            && flagged.iter().all(|&c| self.is_mine(c).unwrap_or(false))
    }

    fn check_bounds(&self, cell: Cell) -> Result<()> {
        if self.contains(cell) {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                cell,
                height: self.height,
                width: self.width,
            })
        }
    }
}
