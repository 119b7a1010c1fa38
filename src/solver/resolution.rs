use std::collections::HashSet;

use crate::formula::{Clause, Cnf};

use super::{Solution, Solver, Stats};

/// Outcome of saturating a clause set under resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Saturation {
    /// The empty clause was derived.
    Refuted,
    /// No new non-tautological resolvent exists.
    Saturated,
}

/// Resolution refutation by exhaustive pairwise saturation.
#[derive(Debug)]
pub struct ResolutionSolver {
    /// Working set in insertion order.
    clauses: Vec<Clause>,
    /// Membership index over `clauses`.
    known: HashSet<Clause>,
    has_empty_clause: bool,
    stats: Stats,
}

impl ResolutionSolver {
    /// Current working set. After `Saturation::Saturated` it is closed under
    /// resolution.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Resolves every pair on every clashing variable and returns the
    /// resolvents that are new to the working set.
    ///
    /// Returns `None` as soon as the empty clause is derived.
    fn resolve_round(&mut self) -> Option<Vec<Clause>> {
        let mut fresh = HashSet::new();
        let mut new_clauses = Vec::new();

        for (i, first) in self.clauses.iter().enumerate() {
            for second in &self.clauses[i + 1..] {
                for variable in first.clashing_variables(second) {
                    let resolvent = match first.resolve(second, variable) {
                        Some(resolvent) if !resolvent.is_tautology() => resolvent,
                        _ => continue,
                    };
                    self.stats.resolvents += 1;

                    if resolvent.is_empty() {
                        debug!("derived the empty clause from {} and {}", first, second);
                        return None;
                    }
                    if !self.known.contains(&resolvent) && fresh.insert(resolvent.clone()) {
                        new_clauses.push(resolvent);
                    }
                }
            }
        }

        Some(new_clauses)
    }

    /// Adds resolvents to the working set until the empty clause appears or
    /// nothing new can be derived.
    pub fn saturate(&mut self) -> Saturation {
        if self.has_empty_clause {
            return Saturation::Refuted;
        }

        loop {
            self.stats.rounds += 1;

            let new_clauses = match self.resolve_round() {
                Some(new_clauses) => new_clauses,
                None => return Saturation::Refuted,
            };
            if new_clauses.is_empty() {
                debug!(
                    "saturated after {} rounds with {} clauses",
                    self.stats.rounds,
                    self.clauses.len()
                );
                return Saturation::Saturated;
            }

            debug!(
                "round {}: {} new clauses, {} known",
                self.stats.rounds,
                new_clauses.len(),
                self.clauses.len()
            );
            for clause in new_clauses {
                self.known.insert(clause.clone());
                self.clauses.push(clause);
            }
        }
    }
}

impl Solver for ResolutionSolver {
    fn new(formula: &Cnf) -> Self {
        let mut clauses = Vec::new();
        let mut known = HashSet::new();

        for clause in formula.clauses() {
            if clause.is_tautology() {
                continue;
            }
            if known.insert(clause.clone()) {
                clauses.push(clause.clone());
            }
        }

        ResolutionSolver {
            clauses,
            known,
            has_empty_clause: formula.contains_empty_clause(),
            stats: Stats::default(),
        }
    }

    fn solve(&mut self) -> Solution {
        match self.saturate() {
            Saturation::Refuted => Solution::Unsat,
            Saturation::Saturated => Solution::Sat(None),
        }
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}
