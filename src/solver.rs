use std::{fmt::Display, str::FromStr};

use crate::formula::{Cnf, Model};
use crate::prelude::*;

mod dp;
mod dpll;
mod resolution;

pub use dp::{DpSolver, Elimination};
pub use dpll::DpllSolver;
pub use resolution::{ResolutionSolver, Saturation};

pub trait Solver {
    /// Creates a new solver instance working on a private copy of `formula`.
    fn new(formula: &Cnf) -> Self;

    /// Solves a CNF SAT problem with the solver.
    fn solve(&mut self) -> Solution;

    /// Work counters collected while solving.
    fn stats(&self) -> &Stats;
}

/// Satisfiability of a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Sat,
    Unsat,
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Sat => write!(f, "SAT"),
            Verdict::Unsat => write!(f, "UNSAT"),
        }
    }
}

/// Result of a solver run.
#[derive(Debug)]
pub enum Solution {
    /// The formula is satisfiable. Carries a witness when the algorithm
    /// builds one.
    Sat(Option<Model>),
    Unsat,
}

impl Solution {
    pub fn verdict(&self) -> Verdict {
        match self {
            Solution::Sat(_) => Verdict::Sat,
            Solution::Unsat => Verdict::Unsat,
        }
    }

    pub fn is_sat(&self) -> bool {
        self.verdict() == Verdict::Sat
    }

    pub fn model(&self) -> Option<&Model> {
        match self {
            Solution::Sat(model) => model.as_ref(),
            Solution::Unsat => None,
        }
    }
}

/// Work counters a solver accumulates while solving.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Non-tautological resolvents computed (resolution and DP).
    pub resolvents: u64,
    /// Saturation rounds (resolution).
    pub rounds: u64,
    /// Variables eliminated (DP).
    pub eliminations: u64,
    /// Branching decisions (DPLL).
    pub decisions: u64,
    /// Literals forced by unit clauses (DPLL).
    pub propagations: u64,
    /// Literals set by the pure literal rule (DPLL).
    pub pure_literals: u64,
    /// Branches abandoned on a falsified clause (DPLL).
    pub conflicts: u64,
}

impl Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "resolvents={} rounds={} eliminations={} decisions={} propagations={} pure_literals={} conflicts={}",
            self.resolvents,
            self.rounds,
            self.eliminations,
            self.decisions,
            self.propagations,
            self.pure_literals,
            self.conflicts
        )
    }
}

#[derive(Debug, Snafu)]
pub enum AlgorithmError {
    #[snafu(display("Unknown algorithm '{}' (expected resolution, dp or dpll)", name))]
    UnknownAlgorithm { name: String },
}

/// The available satisfiability procedures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Resolution,
    Dp,
    Dpll,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Resolution, Algorithm::Dp, Algorithm::Dpll];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Resolution => "resolution",
            Algorithm::Dp => "dp",
            Algorithm::Dpll => "dpll",
        }
    }

    /// Runs the selected algorithm on `formula`.
    pub fn solve(&self, formula: &Cnf) -> (Solution, Stats) {
        fn run<T: Solver>(formula: &Cnf) -> (Solution, Stats) {
            let mut solver = T::new(formula);
            let solution = solver.solve();
            (solution, solver.stats().clone())
        }

        match self {
            Algorithm::Resolution => run::<ResolutionSolver>(formula),
            Algorithm::Dp => run::<DpSolver>(formula),
            Algorithm::Dpll => run::<DpllSolver>(formula),
        }
    }
}

impl FromStr for Algorithm {
    type Err = AlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .iter()
            .copied()
            .find(|algorithm| algorithm.name() == s)
            .context(UnknownAlgorithm { name: s })
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
