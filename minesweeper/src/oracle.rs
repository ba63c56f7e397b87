//! Exhaustive deduction over a set of sentences with a SAT solver.
//!
//! The knowledge base only applies the subset rule, which is sound but not
//! complete. This module answers the complete question, for every cell a
//! sentence mentions: is it a mine in all models, in none, or does it vary?

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

use crate::{Cell, Sentence};

/// The possible outcomes of the solver's analysis for a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deduction {
    /// Every model puts a mine here.
    ForcedMine,
    /// No model puts a mine here.
    ForcedSafe,
    /// Models exist either way.
    Undetermined,
}

/// Classifies every cell mentioned by `sentences`.
///
/// # Errors
///
/// Fails if the sentences admit no assignment of mines at all.
pub fn exact_deductions<'a>(
    sentences: impl IntoIterator<Item = &'a Sentence>,
) -> anyhow::Result<BTreeMap<Cell, Deduction>> {
    let sentences: Vec<&Sentence> = sentences.into_iter().collect();
    let cells: BTreeSet<Cell> = sentences.iter().flat_map(|s| s.cells()).copied().collect();

    let mut solver = Solver::new();
    let vars: BTreeMap<Cell, Var> = cells.iter().map(|&cell| (cell, solver.new_var())).collect();

    let mut formula = CnfFormula::new();
    for sentence in &sentences {
        let lits: Vec<Lit> = sentence
            .cells()
            .iter()
            .map(|cell| Lit::from_var(vars[cell], true))
            .collect();
        encode_exactly(&mut formula, &lits, sentence.count());
    }
    solver.add_formula(&formula);

    if !solver.solve()? {
        anyhow::bail!("sentences are unsatisfiable");
    }

    let mut deductions = BTreeMap::new();
    for (&cell, &var) in &vars {
        let mine_possible = satisfiable_with(&mut solver, Lit::from_var(var, true))?;
        let safe_possible = satisfiable_with(&mut solver, Lit::from_var(var, false))?;
        let deduction = match (mine_possible, safe_possible) {
            (true, true) => Deduction::Undetermined,
            (true, false) => Deduction::ForcedMine,
            (false, true) => Deduction::ForcedSafe,
            (false, false) => {
                anyhow::bail!("no model for {cell} although the formula is satisfiable")
            }
        };
        deductions.insert(cell, deduction);
    }
    Ok(deductions)
}

fn satisfiable_with(solver: &mut Solver, assumption: Lit) -> anyhow::Result<bool> {
    solver.assume(&[assumption]);
    let result = solver.solve();
    solver.assume(&[]);
    Ok(result?)
}

/// Encodes "exactly `k` of `lits` are true" naively.
///
/// Sentences cover at most one cell's neighborhood, so the combination
/// encoding stays small.
fn encode_exactly(formula: &mut CnfFormula, lits: &[Lit], k: usize) {
    // At most k: every (k+1)-subset has a false literal.
    if k < lits.len() {
        for combo in lits.iter().copied().combinations(k + 1) {
            let clause: Vec<Lit> = combo.iter().map(|&lit| !lit).collect();
            formula.add_clause(&clause);
        }
    }
    // At least k: every (n-k+1)-subset has a true literal.
    if k > 0 {
        for combo in lits.iter().copied().combinations(lits.len() - k + 1) {
            formula.add_clause(&combo);
        }
    }
}
