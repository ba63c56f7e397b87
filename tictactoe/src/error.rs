use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("position ({row}, {col}) is off the board")]
    OutOfBounds { row: usize, col: usize },

    #[error("position ({row}, {col}) is already occupied")]
    Occupied { row: usize, col: usize },

    #[error("game already over")]
    GameOver,

    #[error("invalid board '{text}': {reason}")]
    InvalidBoard { text: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
