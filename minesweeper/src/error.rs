use thiserror::Error;

use crate::Cell;

/// Errors raised by the board model and the knowledge base.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("cell {cell} is outside the {height}x{width} board")]
    OutOfBounds {
        cell: Cell,
        height: usize,
        width: usize,
    },

    #[error("invalid board layout: {message}")]
    InvalidLayout { message: String },

    #[error("cannot place {mines} mines on a board with {cells} cells")]
    TooManyMines { mines: usize, cells: usize },

    #[error("board encoding error: {0}")]
    Codec(#[from] bcs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
