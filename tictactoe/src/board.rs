//! Board state representation and basic operations

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Winning lines as `(row, col)` triples: rows, columns, diagonals.
pub const WINNING_LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    X,
    O,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }
}

/// A move: place the current player's mark at `(row, col)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Action {
    pub row: usize,
    pub col: usize,
}

impl Action {
    pub const fn new(row: usize, col: usize) -> Self {
        Action { row, col }
    }
}

/// An immutable 3x3 position. X always moves first.
///
/// Applying an action returns a new board; positions are `Copy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Board {
    cells: [[Option<Player>; 3]; 3],
}

impl Board {
    /// The empty starting position.
    pub fn initial() -> Self {
        Board::default()
    }

    /// Parses nine cells (`X`, `O` or `.`), ignoring whitespace.
    ///
    /// # Errors
    ///
    /// Fails on the wrong number of cells, unknown characters, or piece counts
    /// no game with X moving first can reach.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidBoard {
            text: text.to_string(),
            reason,
        };

        let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        if chars.len() != 9 {
            return Err(invalid(format!("expected 9 cells, got {}", chars.len())));
        }

        let mut cells = [[None; 3]; 3];
        for (i, &c) in chars.iter().enumerate() {
            cells[i / 3][i % 3] = match c {
                'X' | 'x' => Some(Player::X),
                'O' | 'o' => Some(Player::O),
                '.' => None,
                other => return Err(invalid(format!("unexpected character '{other}'"))),
            };
        }

        let board = Board { cells };
        let (x, o) = board.counts();
        if x != o && x != o + 1 {
            return Err(invalid(format!("X={x}, O={o} is not reachable")));
        }
        Ok(board)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Player> {
        self.cells.get(row)?.get(col).copied().flatten()
    }

    /// Whose turn it is. X moves whenever the counts are equal.
    pub fn player(&self) -> Player {
        let (x, o) = self.counts();
        if x == o { Player::X } else { Player::O }
    }

    /// Every empty cell, in row-major order.
    pub fn actions(&self) -> Vec<Action> {
        (0..3)
            .flat_map(|row| (0..3).map(move |col| Action::new(row, col)))
            .filter(|a| self.cells[a.row][a.col].is_none())
            .collect()
    }

    /// The board after the player to move takes `action`.
    pub fn result(&self, action: Action) -> Result<Board> {
        let Action { row, col } = action;
        if row >= 3 || col >= 3 {
            return Err(Error::OutOfBounds { row, col });
        }
        if self.is_terminal() {
            return Err(Error::GameOver);
        }
        if self.cells[row][col].is_some() {
            return Err(Error::Occupied { row, col });
        }

        let mut next = *self;
        next.cells[row][col] = Some(self.player());
        Ok(next)
    }

    pub fn winner(&self) -> Option<Player> {
        WINNING_LINES.iter().find_map(|&line| {
            let [a, b, c] = line.map(|(row, col)| self.cells[row][col]);
            if a.is_some() && a == b && b == c { a } else { None }
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.winner().is_some() || self.cells.iter().flatten().all(Option::is_some)
    }

    /// +1 if X has won, -1 if O has won, 0 otherwise.
    pub fn utility(&self) -> i8 {
        match self.winner() {
            Some(Player::X) => 1,
            Some(Player::O) => -1,
            None => 0,
        }
    }

    fn counts(&self) -> (usize, usize) {
        let marks = self.cells.iter().flatten();
        marks.fold((0, 0), |(x, o), cell| match cell {
            Some(Player::X) => (x + 1, o),
            Some(Player::O) => (x, o + 1),
            None => (x, o),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let board = Board::initial();
        assert_eq!(board.player(), Player::X);
        assert_eq!(board.actions().len(), 9);
        assert_eq!(board.winner(), None);
        assert!(!board.is_terminal());
        assert_eq!(board.utility(), 0);
    }

    #[test]
    fn test_turns_alternate() {
        let board = Board::initial().result(Action::new(1, 1)).unwrap();
        assert_eq!(board.get(1, 1), Some(Player::X));
        assert_eq!(board.player(), Player::O);

        let board = board.result(Action::new(0, 0)).unwrap();
        assert_eq!(board.get(0, 0), Some(Player::O));
        assert_eq!(board.player(), Player::X);
        assert_eq!(board.actions().len(), 7);
    }

    #[test]
    fn test_result_leaves_original_untouched() {
        let board = Board::initial();
        let next = board.result(Action::new(2, 2)).unwrap();
        assert_eq!(board, Board::initial());
        assert_ne!(next, board);
    }

    #[test]
    fn test_invalid_actions() {
        let board = Board::parse("X.. ... ...").unwrap();
        assert_eq!(
            board.result(Action::new(0, 0)),
            Err(Error::Occupied { row: 0, col: 0 })
        );
        assert_eq!(
            board.result(Action::new(3, 0)),
            Err(Error::OutOfBounds { row: 3, col: 0 })
        );

        let won = Board::parse("XXX OO. ...").unwrap();
        assert_eq!(won.result(Action::new(2, 2)), Err(Error::GameOver));
    }

    #[test]
    fn test_winner_detection() {
        assert_eq!(Board::parse("XXX OO. ...").unwrap().winner(), Some(Player::X));
        assert_eq!(Board::parse("X.O X.O .XO").unwrap().winner(), Some(Player::O));
        assert_eq!(Board::parse("X.O .XO ..X").unwrap().winner(), Some(Player::X));
        assert_eq!(Board::parse("XOX .OX .XO").unwrap().winner(), None);
    }

    #[test]
    fn test_draw_is_terminal() {
        let board = Board::parse("XOX XOO OXX").unwrap();
        assert_eq!(board.winner(), None);
        assert!(board.is_terminal());
        assert_eq!(board.utility(), 0);
        assert!(board.actions().is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Board::parse("XO."), Err(Error::InvalidBoard { .. })));
        assert!(matches!(
            Board::parse("XOZ ... ..."),
            Err(Error::InvalidBoard { .. })
        ));
        assert!(matches!(
            Board::parse("XXX ... ..."),
            Err(Error::InvalidBoard { .. })
        ));
    }
}
