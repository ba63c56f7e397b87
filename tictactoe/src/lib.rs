//! Tic-Tac-Toe with an exact minimax player.

pub mod board;
pub mod error;
pub mod search;

pub use board::{Action, Board, Player, WINNING_LINES};
pub use error::{Error, Result};
pub use search::{evaluate, minimax};
