use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Agent, Board, Cell, Move, MoveKind};

/// Represents the current state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

/// Drives an [`Agent`] against a [`Board`] until the game ends.
///
/// Each step the agent picks a move, the board reveals it, and the adjacent
/// mine count goes back into the agent's knowledge base.
pub struct Game {
    board: Board,
    agent: Agent,
    state: GameState,
    /// Random guesses when set, row-major guesses otherwise.
    rng: Option<StdRng>,
    revealed: usize,
}

impl Game {
    pub fn new(board: Board) -> Self {
        let agent = Agent::new(board.height(), board.width());
        Game {
            board,
            agent,
            state: GameState::Playing,
            rng: None,
            revealed: 0,
        }
    }

    /// Like [`Game::new`], but guesses are drawn from an RNG seeded with `seed`.
    pub fn with_seed(board: Board, seed: u64) -> Self {
        Game {
            rng: Some(StdRng::seed_from_u64(seed)),
            ..Game::new(board)
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    /// Mines the agent has proven so far, for callers that want to flag them.
    pub fn flagged(&self) -> impl Iterator<Item = Cell> + use<> {
        self.agent.known_mines().into_iter()
    }

    /// Plays a single move. Returns `None` once the game is over or the agent
    /// has nothing left to try.
    pub fn step(&mut self) -> anyhow::Result<Option<Move>> {
        if self.state != GameState::Playing {
            return Ok(None);
        }

        // --- 1. Ask the agent for a move ---
        let Some(next) = self.agent.next_move(self.rng.as_mut()) else {
            info!("no moves left");
            self.update_state();
            return Ok(None);
        };

        // --- 2. Reveal it; only a guess may hit a mine ---
        let logical = next.kind == MoveKind::Logical;
        info!(cell = %next.cell, logical, "move");
        if self.board.is_mine(next.cell)? {
            anyhow::ensure!(
                next.kind == MoveKind::Guess,
                "cell {} was deduced safe but holds a mine",
                next.cell
            );
            info!(cell = %next.cell, "hit a mine");
            self.state = GameState::Lost;
            return Ok(Some(next));
        }

        // --- 3. Feed the count back and check for a win ---
        let count = self.board.count_adjacent_mines(next.cell)?;
        self.agent.add_knowledge(next.cell, usize::from(count))?;
        self.revealed += 1;
        self.update_state();
        Ok(Some(next))
    }

    /// Steps until the game is won or lost.
    pub fn play(&mut self) -> anyhow::Result<GameState> {
        while self.step()?.is_some() {}
        if self.state == GameState::Playing {
            anyhow::bail!("agent stopped without finishing the game");
        }
        info!(state = ?self.state, moves = self.revealed, "game over");
        Ok(self.state)
    }

    /// Won once the agent has pinned down exactly the board's mines, or once
    /// every safe cell is revealed.
    fn update_state(&mut self) {
        let all_safe_revealed = self.revealed + self.board.mine_count()
            == self.board.height() * self.board.width();
        if all_safe_revealed || self.board.has_won(&self.agent.known_mines()) {
            self.state = GameState::Won;
        }
    }
}
