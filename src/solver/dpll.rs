use typed_index_collections::TiVec;

use crate::formula::{Clause, Cnf, Literal, Model, Variable};

use self::inner::{ClauseIdx, Occurrences};

use super::{Solution, Solver, Stats};

/// Internal modules whose implementation details are hidden from the solver.
mod inner {
    use std::ops::{Index, IndexMut};

    use crate::formula::{Clause, Literal};

    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
    pub struct ClauseIdx(usize);

    impl From<usize> for ClauseIdx {
        fn from(index: usize) -> Self {
            ClauseIdx(index)
        }
    }

    impl From<ClauseIdx> for usize {
        fn from(index: ClauseIdx) -> Self {
            index.0
        }
    }

    /// Literal -> clauses containing it.
    #[derive(Debug)]
    pub struct Occurrences {
        positive: Vec<Vec<ClauseIdx>>,
        negative: Vec<Vec<ClauseIdx>>,
    }

    impl Occurrences {
        pub fn new(num_variables: usize, clauses: &[Clause]) -> Self {
            let mut occurrences = Self {
                positive: vec![Vec::new(); num_variables],
                negative: vec![Vec::new(); num_variables],
            };

            for (idx, clause) in clauses.iter().enumerate() {
                for literal in clause.iter() {
                    occurrences[literal].push(ClauseIdx::from(idx));
                }
            }

            occurrences
        }
    }

    impl Index<Literal> for Occurrences {
        type Output = Vec<ClauseIdx>;

        fn index(&self, literal: Literal) -> &Self::Output {
            if literal.positive() {
                &self.positive[literal.variable().as_index()]
            } else {
                &self.negative[literal.variable().as_index()]
            }
        }
    }

    impl IndexMut<Literal> for Occurrences {
        fn index_mut(&mut self, literal: Literal) -> &mut Self::Output {
            if literal.positive() {
                &mut self.positive[literal.variable().as_index()]
            } else {
                &mut self.negative[literal.variable().as_index()]
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
struct ClauseStat {
    /// Satisfied literal count in the clause.
    satisfied: usize,
    /// Falsified literal count in the clause.
    falsified: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Status {
    /// Every clause has a satisfied literal.
    Satisfied,
    /// Some clause has all of its literals falsified.
    Conflict,
    Undecided,
}

/// Davis-Putnam-Logemann-Loveland search.
///
/// The simplified formula of the textbook presentation is kept implicit:
/// a clause with a satisfied literal counts as removed and falsified literals
/// count as deleted from their clause. Assignments are recorded on a trail and
/// undone when a branch fails.
///
/// Unit clauses are taken in clause order, pure literals in variable order,
/// and branching picks the lowest unassigned variable that still occurs in an
/// unsatisfied clause, trying `true` before `false`.
#[derive(Debug)]
pub struct DpllSolver {
    formula: Cnf,
    occurrences: Occurrences,
    /// Variable index -> assigned status
    assignment: Vec<Option<bool>>,
    /// Clause index -> clause stat
    clause_stats: TiVec<ClauseIdx, ClauseStat>,
    /// Cache for `clauses.count(satisfied > 0)`
    satisfied_clauses: usize,
    /// Cache for `clauses.count(falsified == clause.num_literals)`
    falsified_clauses: usize,
    trail: Vec<Literal>,
    stats: Stats,
}

impl DpllSolver {
    fn clause(&self, idx: ClauseIdx) -> &Clause {
        &self.formula.clauses()[usize::from(idx)]
    }

    fn literal_value(&self, literal: Literal) -> Option<bool> {
        self.assignment[literal.variable().as_index()].map(|value| value == literal.positive())
    }

    fn status(&self) -> Status {
        if self.falsified_clauses > 0 {
            Status::Conflict
        } else if self.satisfied_clauses == self.formula.clauses().len() {
            Status::Satisfied
        } else {
            Status::Undecided
        }
    }

    /// Clauses without a satisfied literal.
    fn open_clauses(&self) -> impl Iterator<Item = &Clause> + '_ {
        self.clause_stats
            .iter_enumerated()
            .filter(|(_, stat)| stat.satisfied == 0)
            .map(move |(idx, _)| self.clause(idx))
    }

    /// Returns the forced literal of the first unit clause, if any.
    fn unit_literal(&self) -> Option<Literal> {
        self.clause_stats
            .iter_enumerated()
            .find(|(idx, stat)| {
                stat.satisfied == 0 && stat.falsified + 1 == self.clause(*idx).num_literals()
            })
            .and_then(|(idx, _)| {
                self.clause(idx)
                    .iter()
                    .find(|&literal| self.literal_value(literal).is_none())
            })
    }

    /// Returns the pure literal with the lowest variable, if any.
    ///
    /// Only unassigned literals of unsatisfied clauses are considered.
    fn pure_literal(&self) -> Option<Literal> {
        // Variable index -> (occurs positively, occurs negatively)
        let mut polarities = vec![(false, false); self.assignment.len()];

        for clause in self.open_clauses() {
            for literal in clause.iter() {
                if self.literal_value(literal).is_some() {
                    continue;
                }
                let seen = &mut polarities[literal.variable().as_index()];
                if literal.positive() {
                    seen.0 = true;
                } else {
                    seen.1 = true;
                }
            }
        }

        polarities
            .iter()
            .position(|&(positive, negative)| positive != negative)
            .and_then(|index| {
                let (positive, _) = polarities[index];
                Variable::from_index(index).map(|variable| Literal::new(variable, positive))
            })
    }

    fn branching_variable(&self) -> Option<Variable> {
        self.open_clauses()
            .flat_map(|clause| clause.iter())
            .filter(|&literal| self.literal_value(literal).is_none())
            .map(|literal| literal.variable())
            .min()
    }

    fn assign_literal(&mut self, literal: Literal) {
        self.trail.push(literal);
        self.assignment[literal.variable().as_index()] = Some(literal.positive());

        for &clause_idx in &self.occurrences[literal] {
            let stat = &mut self.clause_stats[clause_idx];

            if stat.satisfied == 0 {
                self.satisfied_clauses += 1;
            }
            stat.satisfied += 1;
        }

        for &clause_idx in &self.occurrences[!literal] {
            let num_literals = self.formula.clauses()[usize::from(clause_idx)].num_literals();
            let stat = &mut self.clause_stats[clause_idx];

            stat.falsified += 1;
            if stat.falsified == num_literals {
                self.falsified_clauses += 1;
            }
        }
    }

    fn pop_assignment(&mut self) {
        let literal = match self.trail.pop() {
            Some(literal) => literal,
            None => return,
        };
        self.assignment[literal.variable().as_index()] = None;

        for &clause_idx in &self.occurrences[literal] {
            let stat = &mut self.clause_stats[clause_idx];

            if stat.satisfied == 1 {
                self.satisfied_clauses -= 1;
            }
            stat.satisfied -= 1;
        }

        for &clause_idx in &self.occurrences[!literal] {
            let num_literals = self.formula.clauses()[usize::from(clause_idx)].num_literals();
            let stat = &mut self.clause_stats[clause_idx];

            if stat.falsified == num_literals {
                self.falsified_clauses -= 1;
            }
            stat.falsified -= 1;
        }
    }

    /// Undoes assignments until the trail has `len` entries.
    fn backtrack(&mut self, len: usize) {
        while self.trail.len() > len {
            self.pop_assignment();
        }
    }

    /// Applies unit propagation and the pure literal rule until neither
    /// applies or the formula is decided.
    fn propagate(&mut self) -> Status {
        loop {
            let status = self.status();
            if status != Status::Undecided {
                return status;
            }

            if let Some(literal) = self.unit_literal() {
                trace!("unit {}", literal);
                self.stats.propagations += 1;
                self.assign_literal(literal);
            } else if let Some(literal) = self.pure_literal() {
                trace!("pure {}", literal);
                self.stats.pure_literals += 1;
                self.assign_literal(literal);
            } else {
                return Status::Undecided;
            }
        }
    }

    /// Searches for a satisfying extension of the current assignment.
    /// On failure the trail is restored to its length at entry.
    fn search(&mut self, depth: usize) -> bool {
        let checkpoint = self.trail.len();

        match self.propagate() {
            Status::Satisfied => return true,
            Status::Conflict => {
                self.stats.conflicts += 1;
                self.backtrack(checkpoint);
                return false;
            }
            Status::Undecided => {}
        }

        let variable = match self.branching_variable() {
            Some(variable) => variable,
            // an open clause without unassigned literals is unit or falsified
            None => unreachable!(),
        };

        for &value in &[true, false] {
            let decision = Literal::new(variable, value);
            debug!("decide {} at depth {}", decision, depth);
            self.stats.decisions += 1;

            let decision_point = self.trail.len();
            self.assign_literal(decision);
            if self.search(depth + 1) {
                return true;
            }
            self.backtrack(decision_point);
        }

        self.backtrack(checkpoint);
        false
    }
}

impl Solver for DpllSolver {
    fn new(formula: &Cnf) -> Self {
        let formula = formula.clone();
        // declared but unused variables get no table entries
        let num_variables = formula
            .clauses()
            .iter()
            .filter_map(Clause::max_variable)
            .max()
            .map_or(0, |variable| variable.as_index() + 1);

        let occurrences = Occurrences::new(num_variables, formula.clauses());
        let clause_stats: TiVec<ClauseIdx, ClauseStat> =
            vec![ClauseStat::default(); formula.clauses().len()].into();
        let falsified_clauses = formula
            .clauses()
            .iter()
            .filter(|clause| clause.is_empty())
            .count();

        DpllSolver {
            formula,
            occurrences,
            assignment: vec![None; num_variables],
            clause_stats,
            satisfied_clauses: 0,
            falsified_clauses,
            trail: Vec::with_capacity(num_variables),
            stats: Stats::default(),
        }
    }

    fn solve(&mut self) -> Solution {
        if self.search(0) {
            let model = Model::new(self.formula.clone(), self.assignment.clone());
            Solution::Sat(Some(model))
        } else {
            Solution::Unsat
        }
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}
