use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::Cell;

/// A logical constraint: exactly `count` of `cells` are mines.
///
/// Equality is structural and independent of the order in which the cells
/// were supplied.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Sentence {
    cells: BTreeSet<Cell>,
    count: usize,
}

impl Sentence {
    /// # Panics
    ///
    /// Panics if `count` exceeds the number of distinct cells.
    pub fn new(cells: impl IntoIterator<Item = Cell>, count: usize) -> Self {
        let cells: BTreeSet<Cell> = cells.into_iter().collect();
        assert!(
            count <= cells.len(),
            "sentence claims {count} mines among {} cells",
            cells.len()
        );
        Sentence { cells, count }
    }

    pub fn cells(&self) -> &BTreeSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Every cell, if every remaining cell must be a mine.
    ///
    /// `None` means nothing can be concluded, which is not the same as
    /// `Some` of an empty set.
    pub fn known_mines(&self) -> Option<&BTreeSet<Cell>> {
        (self.count == self.cells.len()).then_some(&self.cells)
    }

    /// Every cell, if the sentence has no mines left.
    pub fn known_safe(&self) -> Option<&BTreeSet<Cell>> {
        (self.count == 0).then_some(&self.cells)
    }

    /// Removes `cell` and accounts for its mine. No-op if the cell is absent.
    pub fn mark_mine(&mut self, cell: Cell) {
        if self.cells.remove(&cell) {
            assert!(
                self.count > 0,
                "contradiction: {cell} is a mine but the sentence has no mines left"
            );
            self.count -= 1;
        }
    }

    /// Removes `cell`, leaving the count unchanged. No-op if the cell is absent.
    pub fn mark_safe(&mut self, cell: Cell) {
        if self.cells.remove(&cell) {
            assert!(
                self.count <= self.cells.len(),
                "contradiction: {cell} is safe but every cell of the sentence must be a mine"
            );
        }
    }

    pub fn is_subset_of(&self, other: &Sentence) -> bool {
        self.cells.is_subset(&other.cells)
    }

    /// The sentence over `self`'s cells that `other` does not mention.
    ///
    /// Sound only when `other` is a subset of `self`: the difference must hold
    /// exactly `self.count - other.count` mines.
    ///
    /// # Panics
    ///
    /// Panics if `other` is not a subset or claims more mines than `self`.
    pub fn subtract(&self, other: &Sentence) -> Sentence {
        assert!(other.is_subset_of(self), "subtracting a sentence that is not a subset");
        assert!(
            other.count <= self.count,
            "contradiction: {other} is contained in {self} but claims more mines"
        );
        Sentence::new(
            self.cells.difference(&other.cells).copied(),
            self.count - other.count,
        )
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}} = {}", self.cells.iter().join(", "), self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Cell = Cell::new(0, 0);
    const B: Cell = Cell::new(0, 1);
    const C: Cell = Cell::new(1, 0);
    const D: Cell = Cell::new(1, 1);

    #[test]
    fn test_equality_ignores_order() {
        assert_eq!(Sentence::new([A, B, C], 1), Sentence::new([C, A, B], 1));
        assert_ne!(Sentence::new([A, B, C], 1), Sentence::new([A, B, C], 2));
        assert_ne!(Sentence::new([A, B, C], 1), Sentence::new([A, B, D], 1));
    }

    #[test]
    fn test_known_mines_and_safe() {
        let all = BTreeSet::from([A, B, C]);

        let full = Sentence::new([A, B, C], 3);
        assert_eq!(full.known_mines(), Some(&all));
        assert_eq!(full.known_safe(), None);

        let clear = Sentence::new([A, B, C], 0);
        assert_eq!(clear.known_safe(), Some(&all));
        assert_eq!(clear.known_mines(), None);

        let open = Sentence::new([A, B, C], 1);
        assert_eq!(open.known_mines(), None);
        assert_eq!(open.known_safe(), None);
    }

    #[test]
    fn test_mark_mine_is_idempotent() {
        let mut sentence = Sentence::new([A, B, C], 2);
        sentence.mark_mine(D);
        assert_eq!(sentence, Sentence::new([A, B, C], 2));

        sentence.mark_mine(A);
        sentence.mark_mine(A);
        assert_eq!(sentence, Sentence::new([B, C], 1));
    }

    #[test]
    fn test_mark_safe_is_idempotent() {
        let mut sentence = Sentence::new([A, B, C], 1);
        sentence.mark_safe(D);
        assert_eq!(sentence, Sentence::new([A, B, C], 1));

        sentence.mark_safe(B);
        sentence.mark_safe(B);
        assert_eq!(sentence, Sentence::new([A, C], 1));
    }

    #[test]
    fn test_subtract() {
        let big = Sentence::new([A, B, C], 2);
        let small = Sentence::new([A, B], 1);
        assert!(small.is_subset_of(&big));
        assert!(!big.is_subset_of(&small));
        assert_eq!(big.subtract(&small), Sentence::new([C], 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Sentence::new([B, A], 1).to_string(), "{(0, 0), (0, 1)} = 1");
    }

    #[test]
    #[should_panic(expected = "sentence claims 3 mines among 2 cells")]
    fn test_count_larger_than_cells_panics() {
        Sentence::new([A, B], 3);
    }

    #[test]
    #[should_panic(expected = "contradiction")]
    fn test_subtract_contradiction_panics() {
        Sentence::new([A, B, C], 1).subtract(&Sentence::new([A, B], 2));
    }

    #[test]
    #[should_panic(expected = "has no mines left")]
    fn test_mine_in_clear_sentence_panics() {
        Sentence::new([A, B], 0).mark_mine(A);
    }
}
