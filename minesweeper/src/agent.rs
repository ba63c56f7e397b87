use std::collections::BTreeSet;

use rand::Rng;
use rand::prelude::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::{Cell, KnowledgeBase};

/// How the agent arrived at a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveKind {
    /// The cell is proven safe.
    Logical,
    /// No deduction applied; the cell is merely not a known mine.
    Guess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub cell: Cell,
    pub kind: MoveKind,
}

/// A Minesweeper player that only ever acts on what its knowledge base proves,
/// guessing when nothing is proven.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    height: usize,
    width: usize,
    knowledge: KnowledgeBase,
}

impl Agent {
    pub fn new(height: usize, width: usize) -> Self {
        Agent {
            height,
            width,
            knowledge: KnowledgeBase::new(height, width),
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn known_mines(&self) -> BTreeSet<Cell> {
        self.knowledge.known_mines()
    }

    pub fn known_safe(&self) -> BTreeSet<Cell> {
        self.knowledge.known_safe()
    }

    pub fn moves_made(&self) -> &BTreeSet<Cell> {
        self.knowledge.moves_made()
    }

    /// Forwards a revealed cell and its adjacent-mine count to the knowledge base.
    pub fn add_knowledge(&mut self, cell: Cell, count: usize) -> Result<()> {
        self.knowledge.add_observation(cell, count)
    }

    /// The first proven-safe cell, in row-major order, not yet played.
    pub fn choose_safe_move(&self) -> Option<Cell> {
        let mines = self.knowledge.known_mines();
        self.knowledge
            .known_safe()
            .into_iter()
            .find(|cell| !self.knowledge.moves_made().contains(cell) && !mines.contains(cell))
    }

    /// The first cell, in row-major order, that is neither played nor a known mine.
    pub fn choose_any_move(&self) -> Option<Cell> {
        self.candidates().next()
    }

    /// A uniformly random cell among those [`Agent::choose_any_move`] could return.
    pub fn choose_random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        let candidates: Vec<Cell> = self.candidates().collect();
        candidates.choose(rng).copied()
    }

    /// A proven-safe move if there is one, otherwise a guess.
    ///
    /// Guesses are random when `rng` is given and row-major otherwise.
    pub fn next_move<R: Rng + ?Sized>(&self, rng: Option<&mut R>) -> Option<Move> {
        if let Some(cell) = self.choose_safe_move() {
            return Some(Move {
                cell,
                kind: MoveKind::Logical,
            });
        }

        let guess = match rng {
            Some(rng) => self.choose_random_move(rng),
            None => self.choose_any_move(),
        };
        guess.map(|cell| Move {
            cell,
            kind: MoveKind::Guess,
        })
    }

    fn candidates(&self) -> impl Iterator<Item = Cell> + '_ {
        let mines = self.knowledge.known_mines();
        let width = self.width;
        (0..self.height)
            .flat_map(move |row| (0..width).map(move |col| Cell::new(row, col)))
            .filter(move |cell| {
                !self.knowledge.moves_made().contains(cell) && !mines.contains(cell)
            })
    }
}
