use std::collections::{BTreeSet, HashSet};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::board::neighbors;
use crate::error::{Error, Result};
use crate::{Cell, Sentence};

/// What the knowledge base has proven about a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Unknown,
    Safe,
    Mine,
}

/// Sentences about the board plus every cell status proven from them.
///
/// Each observation is folded in and inference runs to a fixpoint before the
/// call returns, so the known sets are always as complete as the subset rule
/// allows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBase {
    height: usize,
    width: usize,
    /// `states[row][col]`; a cell is never both mine and safe.
    states: Vec<Vec<CellState>>,
    /// Live sentences. None is empty and none mentions a resolved cell.
    sentences: Vec<Sentence>,
    moves_made: BTreeSet<Cell>,
}

impl KnowledgeBase {
    pub fn new(height: usize, width: usize) -> Self {
        KnowledgeBase {
            height,
            width,
            states: vec![vec![CellState::Unknown; width]; height],
            sentences: Vec::new(),
            moves_made: BTreeSet::new(),
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn state(&self, cell: Cell) -> Result<CellState> {
        self.check_bounds(cell)?;
        Ok(self.states[cell.row][cell.col])
    }

    pub fn known_mines(&self) -> BTreeSet<Cell> {
        self.cells_in_state(CellState::Mine)
    }

    pub fn known_safe(&self) -> BTreeSet<Cell> {
        self.cells_in_state(CellState::Safe)
    }

    pub fn moves_made(&self) -> &BTreeSet<Cell> {
        &self.moves_made
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    /// Records `cell` as a mine and removes it from every sentence.
    ///
    /// Returns whether the cell was newly learned.
    pub fn mark_mine(&mut self, cell: Cell) -> Result<bool> {
        self.check_bounds(cell)?;
        Ok(self.set_mine(cell))
    }

    /// Records `cell` as safe and removes it from every sentence.
    ///
    /// Returns whether the cell was newly learned.
    pub fn mark_safe(&mut self, cell: Cell) -> Result<bool> {
        self.check_bounds(cell)?;
        Ok(self.set_safe(cell))
    }

    /// Folds in a revealed cell and the number of mines around it.
    ///
    /// # Panics
    ///
    /// Panics if the observation contradicts what is already known, e.g. the
    /// cell was proven to be a mine or `count` cannot fit in its neighborhood.
    pub fn add_observation(&mut self, cell: Cell, count: usize) -> Result<()> {
        // --- 1. Validate the revealed cell ---
        self.check_bounds(cell)?;
        assert!(
            self.states[cell.row][cell.col] != CellState::Mine,
            "revealed {cell} which is a known mine"
        );

        // --- 2. Record the move; a revealed cell is safe ---
        self.moves_made.insert(cell);
        self.set_safe(cell);

        // --- 3. Collect the unresolved neighborhood ---
        // Resolved neighbors carry no information; known mines still use up
        // part of the count.
        let mut unknown = Vec::new();
        let mut mines_around = 0;
        for neighbor in neighbors(cell, self.height, self.width) {
            match self.states[neighbor.row][neighbor.col] {
                CellState::Unknown => unknown.push(neighbor),
                CellState::Mine => mines_around += 1,
                CellState::Safe => {}
            }
        }
        assert!(
            count >= mines_around,
            "{cell} reports {count} mines but {mines_around} neighbors are known mines"
        );

        // --- 4. Assert the new sentence and run inference to a fixpoint ---
        let sentence = Sentence::new(unknown, count - mines_around);
        debug!(%cell, count, %sentence, "observation");
        self.sentences.push(sentence);
        self.infer();
        Ok(())
    }

    /// Asserts an arbitrary constraint and runs inference to a fixpoint.
    ///
    /// Cells already resolved are folded out first: known mines reduce the
    /// count, known safe cells are dropped.
    pub fn add_sentence(&mut self, mut sentence: Sentence) -> Result<()> {
        let resolved = sentence
            .cells()
            .iter()
            .map(|&cell| self.state(cell).map(|state| (cell, state)))
            .collect::<Result<Vec<_>>>()?;
        for (cell, state) in resolved {
            match state {
                CellState::Mine => sentence.mark_mine(cell),
                CellState::Safe => sentence.mark_safe(cell),
                CellState::Unknown => {}
            }
        }

        self.sentences.push(sentence);
        self.infer();
        Ok(())
    }

    /// Applies saturation, pruning and subset resolution until nothing changes.
    ///
    /// Returns whether any cell was resolved or any sentence derived. On
    /// converged knowledge this is a no-op and returns `false`.
    pub fn infer(&mut self) -> bool {
        let mut changed = false;
        for round in 1.. {
            let marked = self.saturate();
            self.prune();
            let derived = self.resolve_subsets();
            debug!(round, marked, derived, sentences = self.sentences.len(), "inference round");

            if marked == 0 && derived == 0 {
                break;
            }
            changed = true;
        }
        changed
    }

    /// Marks every cell some sentence forces, repeating while marks cascade.
    ///
    /// Returns the number of newly resolved cells.
    fn saturate(&mut self) -> usize {
        let mut marked = 0;
        loop {
            let mines: BTreeSet<Cell> = self
                .sentences
                .iter()
                .filter_map(Sentence::known_mines)
                .flatten()
                .copied()
                .collect();
            for &cell in &mines {
                self.set_mine(cell);
            }

            let safe: BTreeSet<Cell> = self
                .sentences
                .iter()
                .filter_map(Sentence::known_safe)
                .flatten()
                .copied()
                .collect();
            for &cell in &safe {
                self.set_safe(cell);
            }

            if mines.is_empty() && safe.is_empty() {
                return marked;
            }
            marked += mines.len() + safe.len();
        }
    }

    /// Rebuilds the sentence list without empty or duplicate sentences.
    fn prune(&mut self) {
        self.sentences = std::mem::take(&mut self.sentences)
            .into_iter()
            .filter(|s| !s.is_empty())
            .unique()
            .collect();
    }

    /// Derives `B - A` for every pair where `A` is strictly contained in `B`.
    ///
    /// Returns the number of sentences added.
    fn resolve_subsets(&mut self) -> usize {
        let derived: BTreeSet<Sentence> = {
            let existing: HashSet<&Sentence> = self.sentences.iter().collect();
            let mut derived = BTreeSet::new();
            for (a, b) in self.sentences.iter().tuple_combinations() {
                for (small, big) in [(a, b), (b, a)] {
                    if small.is_empty() || !small.is_subset_of(big) {
                        continue;
                    }
                    if small.len() == big.len() {
                        assert_eq!(
                            small.count(),
                            big.count(),
                            "contradiction: {small} and {big} disagree"
                        );
                        continue;
                    }
                    let sentence = big.subtract(small);
                    if !existing.contains(&sentence) {
                        derived.insert(sentence);
                    }
                }
            }
            derived
        };

        let added = derived.len();
        for sentence in derived {
            trace!(%sentence, "derived");
            self.sentences.push(sentence);
        }
        added
    }

    fn set_mine(&mut self, cell: Cell) -> bool {
        let state = &mut self.states[cell.row][cell.col];
        let learned = match *state {
            CellState::Mine => false,
            CellState::Unknown => true,
            CellState::Safe => {
                panic!("contradiction: {cell} is known safe but deduced to be a mine")
            }
        };
        *state = CellState::Mine;
        if learned {
            debug!(%cell, "deduced mine");
        }
        for sentence in &mut self.sentences {
            sentence.mark_mine(cell);
        }
        learned
    }

    fn set_safe(&mut self, cell: Cell) -> bool {
        let state = &mut self.states[cell.row][cell.col];
        let learned = match *state {
            CellState::Safe => false,
            CellState::Unknown => true,
            CellState::Mine => {
                panic!("contradiction: {cell} is a known mine but deduced to be safe")
            }
        };
        *state = CellState::Safe;
        if learned {
            debug!(%cell, "deduced safe");
        }
        for sentence in &mut self.sentences {
            sentence.mark_safe(cell);
        }
        learned
    }

    fn cells_in_state(&self, wanted: CellState) -> BTreeSet<Cell> {
        self.states
            .iter()
            .enumerate()
            .flat_map(|(row, states)| {
                states
                    .iter()
                    .enumerate()
                    .filter(move |&(_, &state)| state == wanted)
                    .map(move |(col, _)| Cell::new(row, col))
            })
            .collect()
    }

    fn check_bounds(&self, cell: Cell) -> Result<()> {
        if cell.row < self.height && cell.col < self.width {
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

#[cfg(test)]
mod tests {
    use super::*;

    const A: Cell = Cell::new(0, 0);
    const B: Cell = Cell::new(0, 1);
    const C: Cell = Cell::new(0, 2);
    const D: Cell = Cell::new(0, 3);

    fn line(width: usize) -> KnowledgeBase {
        KnowledgeBase::new(1, width)
    }

    #[test]
    fn test_mark_mine_cascades_to_sentences() {
        let mut kb = line(4);
        kb.sentences.push(Sentence::new([A, B, C], 2));
        kb.sentences.push(Sentence::new([C, D], 1));

        assert!(kb.mark_mine(C).unwrap());
        assert!(!kb.mark_mine(C).unwrap());
        assert_eq!(kb.sentences, vec![Sentence::new([A, B], 1), Sentence::new([D], 0)]);
        assert_eq!(kb.known_mines(), BTreeSet::from([C]));
        assert_eq!(kb.state(C).unwrap(), CellState::Mine);
    }

    #[test]
    fn test_mark_safe_cascades_to_sentences() {
        let mut kb = line(4);
        kb.sentences.push(Sentence::new([A, B, C], 1));

        assert!(kb.mark_safe(B).unwrap());
        assert_eq!(kb.sentences, vec![Sentence::new([A, C], 1)]);
        assert_eq!(kb.known_safe(), BTreeSet::from([B]));
    }

    #[test]
    fn test_out_of_bounds_is_rejected() {
        let mut kb = line(2);
        assert_eq!((kb.height(), kb.width()), (1, 2));
        assert!(matches!(kb.mark_mine(C), Err(Error::OutOfBounds { .. })));
        assert!(kb.add_observation(Cell::new(1, 0), 0).is_err());
        assert!(kb.add_sentence(Sentence::new([A, C], 1)).is_err());
        assert!(kb.sentences.is_empty());
    }

    #[test]
    fn test_subset_inference_marks_difference_safe() {
        let mut kb = line(3);
        kb.add_sentence(Sentence::new([A, B, C], 1)).unwrap();
        assert!(kb.known_safe().is_empty());

        kb.add_sentence(Sentence::new([A, B], 1)).unwrap();
        assert_eq!(kb.state(C).unwrap(), CellState::Safe);
        assert_eq!(kb.state(A).unwrap(), CellState::Unknown);
        assert_eq!(kb.sentences, vec![Sentence::new([A, B], 1)]);
    }

    #[test]
    fn test_chained_deduction_in_one_call() {
        // {A,B}=1 and {B,C}=1 leave everything open; {A,B,C}=1 forces
        // C safe, then A safe, then B mine.
        let mut kb = line(3);
        kb.add_sentence(Sentence::new([A, B], 1)).unwrap();
        kb.add_sentence(Sentence::new([B, C], 1)).unwrap();
        assert!(kb.known_mines().is_empty());
        assert!(kb.known_safe().is_empty());

        kb.add_sentence(Sentence::new([A, B, C], 1)).unwrap();
        assert_eq!(kb.known_mines(), BTreeSet::from([B]));
        assert_eq!(kb.known_safe(), BTreeSet::from([A, C]));
        assert!(kb.sentences.is_empty());
    }

    #[test]
    fn test_subset_chain_across_derived_sentences() {
        // {A,B,C,D}=2, {A,B}=1 derives {C,D}=1; with {D}=0 it resolves C.
        let mut kb = line(4);
        kb.add_sentence(Sentence::new([A, B, C, D], 2)).unwrap();
        kb.add_sentence(Sentence::new([A, B], 1)).unwrap();
        assert!(kb.sentences.contains(&Sentence::new([C, D], 1)));

        kb.add_sentence(Sentence::new([B, D], 1)).unwrap();
        kb.add_sentence(Sentence::new([D], 0)).unwrap();
        assert_eq!(kb.known_mines(), BTreeSet::from([B, C]));
        assert_eq!(kb.known_safe(), BTreeSet::from([A, D]));
    }

    #[test]
    fn test_infer_is_idempotent_after_convergence() {
        let mut kb = KnowledgeBase::new(3, 3);
        kb.add_observation(Cell::new(0, 0), 1).unwrap();
        kb.add_observation(Cell::new(0, 1), 1).unwrap();
        kb.add_observation(Cell::new(0, 2), 1).unwrap();

        let sentences = kb.sentences.clone();
        let mines = kb.known_mines();
        let safe = kb.known_safe();

        assert!(!kb.infer());
        assert!(!kb.infer());
        assert_eq!(kb.sentences, sentences);
        assert_eq!(kb.known_mines(), mines);
        assert_eq!(kb.known_safe(), safe);
    }

    #[test]
    fn test_observation_with_zero_marks_neighbors_safe() {
        let mut kb = KnowledgeBase::new(3, 3);
        kb.add_observation(Cell::new(0, 0), 0).unwrap();

        assert_eq!(kb.moves_made(), &BTreeSet::from([Cell::new(0, 0)]));
        assert_eq!(
            kb.known_safe(),
            BTreeSet::from([Cell::new(0, 0), Cell::new(0, 1), Cell::new(1, 0), Cell::new(1, 1)])
        );
        assert!(kb.sentences.is_empty());
    }

    #[test]
    fn test_observation_excludes_resolved_neighbors() {
        let mut kb = KnowledgeBase::new(2, 2);
        kb.mark_mine(Cell::new(1, 1)).unwrap();
        kb.mark_safe(Cell::new(0, 1)).unwrap();

        // Two mines around (0,0): one known, so (1,0) must be the other.
        kb.add_observation(Cell::new(0, 0), 2).unwrap();
        assert_eq!(kb.state(Cell::new(1, 0)).unwrap(), CellState::Mine);
    }

    #[test]
    fn test_known_sets_stay_disjoint() {
        let mut kb = KnowledgeBase::new(3, 3);
        kb.add_observation(Cell::new(1, 1), 1).unwrap();
        kb.add_observation(Cell::new(0, 0), 1).unwrap();
        kb.add_observation(Cell::new(0, 2), 0).unwrap();
        kb.add_observation(Cell::new(2, 2), 0).unwrap();
        assert!(kb.known_mines().is_disjoint(&kb.known_safe()));
        assert!(kb.sentences.iter().all(|s| !s.is_empty()));
    }

    #[test]
    #[should_panic(expected = "known mine")]
    fn test_revealing_known_mine_panics() {
        let mut kb = line(2);
        kb.mark_mine(A).unwrap();
        kb.add_observation(A, 0).unwrap();
    }

    #[test]
    #[should_panic(expected = "contradiction")]
    fn test_contradicting_sentences_panic() {
        let mut kb = line(3);
        kb.add_sentence(Sentence::new([A, B], 1)).unwrap();
        kb.add_sentence(Sentence::new([A, B], 2)).unwrap();
    }
}
