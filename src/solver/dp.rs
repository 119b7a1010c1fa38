use std::collections::HashSet;

use crate::formula::{Clause, Cnf, Literal, Variable};

use super::{Solution, Solver, Stats};

/// Outcome of eliminating one variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elimination {
    /// The variable is gone and no contradiction appeared.
    Eliminated,
    /// The empty clause was among the resolvents.
    Refuted,
}

/// Davis-Putnam variable elimination.
///
/// Variables are eliminated in increasing order of their identity.
#[derive(Debug)]
pub struct DpSolver {
    clauses: Vec<Clause>,
    stats: Stats,
}

impl DpSolver {
    /// Current working formula.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Lowest variable still mentioned by the working formula.
    pub fn next_variable(&self) -> Option<Variable> {
        self.clauses
            .iter()
            .filter_map(|clause| clause.iter().next())
            .map(|literal| literal.variable())
            .min()
    }

    /// Replaces every clause mentioning `variable` with all non-tautological
    /// resolvents on it. Afterwards no working clause mentions `variable`.
    pub fn eliminate(&mut self, variable: Variable) -> Elimination {
        let positive = Literal::new(variable, true);

        let (mentioning, mut remaining): (Vec<_>, Vec<_>) = std::mem::take(&mut self.clauses)
            .into_iter()
            .partition(|clause| clause.mentions(variable));
        let (positives, negatives): (Vec<_>, Vec<_>) = mentioning
            .into_iter()
            .partition(|clause| clause.contains(positive));

        let mut seen: HashSet<Clause> = remaining.iter().cloned().collect();
        let mut refuted = false;
        let mut added = 0;

        for first in &positives {
            for second in &negatives {
                let resolvent = match first.resolve(second, variable) {
                    Some(resolvent) if !resolvent.is_tautology() => resolvent,
                    _ => continue,
                };
                self.stats.resolvents += 1;

                refuted |= resolvent.is_empty();
                if seen.insert(resolvent.clone()) {
                    remaining.push(resolvent);
                    added += 1;
                }
            }
        }

        debug!(
            "eliminated {}: {} positive x {} negative -> {} resolvents, {} clauses left",
            variable,
            positives.len(),
            negatives.len(),
            added,
            remaining.len()
        );

        self.clauses = remaining;
        self.stats.eliminations += 1;

        if refuted {
            Elimination::Refuted
        } else {
            Elimination::Eliminated
        }
    }
}

impl Solver for DpSolver {
    fn new(formula: &Cnf) -> Self {
        let mut seen = HashSet::new();
        let clauses = formula
            .clauses()
            .iter()
            .filter(|clause| !clause.is_tautology())
            .filter(|clause| seen.insert((*clause).clone()))
            .cloned()
            .collect();

        DpSolver {
            clauses,
            stats: Stats::default(),
        }
    }

    fn solve(&mut self) -> Solution {
        if self.clauses.iter().any(Clause::is_empty) {
            return Solution::Unsat;
        }

        while let Some(variable) = self.next_variable() {
            if self.eliminate(variable) == Elimination::Refuted {
                return Solution::Unsat;
            }
        }

        Solution::Sat(None)
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{clause, cnf, var};

    #[test]
    fn eliminated_variable_disappears() {
        let formula = cnf(&[&[1, 2], &[-1, 3], &[-1, -2], &[2, 3, 4]]);
        let mut solver = DpSolver::new(&formula);

        assert_eq!(solver.next_variable(), Some(var(1)));
        assert_eq!(solver.eliminate(var(1)), Elimination::Eliminated);
        assert!(solver.clauses().iter().all(|clause| !clause.mentions(var(1))));

        // (x2 ∨ ¬x2) is dropped as a tautology
        assert_eq!(solver.clauses().len(), 2);
        assert!(solver.clauses().contains(&clause(&[2, 3])));
        assert!(solver.clauses().contains(&clause(&[2, 3, 4])));
    }

    #[test]
    fn elimination_produces_product_of_occurrences() {
        let formula = cnf(&[&[1, 2], &[1, 3], &[-1, 4], &[-1, 5]]);
        let mut solver = DpSolver::new(&formula);

        assert_eq!(solver.eliminate(var(1)), Elimination::Eliminated);
        assert_eq!(solver.stats().resolvents, 4);
        assert_eq!(solver.clauses().len(), 4);
    }

    #[test]
    fn pure_variable_removes_its_clauses() {
        let formula = cnf(&[&[1, 2], &[1, -3], &[2, 3]]);
        let mut solver = DpSolver::new(&formula);

        assert_eq!(solver.eliminate(var(1)), Elimination::Eliminated);
        assert_eq!(solver.clauses(), &[clause(&[2, 3])]);
    }

    #[test]
    fn complementary_units_are_refuted() {
        let formula = cnf(&[&[2], &[-2], &[1, 3]]);
        let mut solver = DpSolver::new(&formula);

        assert_eq!(solver.next_variable(), Some(var(1)));
        assert!(matches!(solver.solve(), Solution::Unsat));
        assert_eq!(solver.stats().eliminations, 2);
    }

    #[test]
    fn runs_once_per_variable() {
        let formula = cnf(&[&[1, 2, 3], &[-1, 2], &[-2, 3], &[-3, 1]]);
        let mut solver = DpSolver::new(&formula);

        assert!(solver.solve().is_sat());
        assert!(solver.clauses().is_empty());
        assert!(solver.stats().eliminations <= 3);
    }
}
