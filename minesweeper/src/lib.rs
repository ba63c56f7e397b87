//! A Minesweeper player built on propositional inference.
//!
//! Every revealed cell becomes a [`Sentence`] ("exactly n of these cells are
//! mines"). The [`KnowledgeBase`] reduces sentences against each other until no
//! rule applies, and the [`Agent`] plays whatever that proves safe, guessing
//! only when nothing is proven. [`Game`] runs an agent against a fixed
//! [`Board`].

pub mod agent;
pub mod board;
pub mod error;
pub mod game;
pub mod knowledge;
pub mod oracle;
pub mod sentence;

pub use agent::{Agent, Move, MoveKind};
pub use board::{Board, Cell};
pub use error::{Error, Result};
pub use game::{Game, GameState};
pub use knowledge::{CellState, KnowledgeBase};
pub use oracle::{Deduction, exact_deductions};
pub use sentence::Sentence;
