/*!
A module to represent conjunctive normal form formula.
*/

use std::{collections::BTreeSet, convert::TryFrom, fmt::Display, num::NonZeroU32, str::FromStr};

use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum VariableParseError {
    #[snafu(display("Failed to parse literal '{}'", literal))]
    ParseIntError {
        literal: String,
        source: std::num::ParseIntError,
    },
    #[snafu(display(
        "Variable ID {} is out of range (must be within 1 to {})",
        num,
        Variable::MAX_VARIABLE_ID
    ))]
    RangeError { num: u64 },
}

/// Newtype wrapper for variable ID.
/// Invariant: 0 < ID <= MAX_VARIABLE_ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Variable(NonZeroU32);

impl Variable {
    pub const MAX_VARIABLE_ID: usize = std::u32::MAX as usize;
}

impl Variable {
    /// Creates a variable from its DIMACS identity. Returns `None` for zero.
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Variable)
    }

    pub fn id(&self) -> u32 {
        self.0.get()
    }

    pub fn as_index(&self) -> usize {
        (self.0.get() - 1) as usize
    }

    /// Creates a variable from a raw index.
    /// Returns `None` if the index is invalid.
    pub fn from_index(index: usize) -> Option<Self> {
        let id = index.checked_add(1)?;
        if id > Variable::MAX_VARIABLE_ID {
            return None;
        }
        Some(Variable(NonZeroU32::new(u32::try_from(id).ok()?)?))
    }
}

impl FromStr for Variable {
    type Err = VariableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let num = s.parse::<u64>().context(ParseIntError { literal: s })?;
        u32::try_from(num)
            .ok()
            .and_then(Variable::new)
            .context(RangeError { num })
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// A variable together with its polarity.
///
/// Literals order by variable first and polarity second, so the negative and
/// positive literal of a variable are always adjacent in a sorted clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    id: Variable,
    positive: bool,
}

impl Literal {
    pub fn new(id: Variable, positive: bool) -> Self {
        Literal { id, positive }
    }

    /// Converts a signed DIMACS integer into a literal. Returns `None` for zero.
    pub fn from_dimacs(value: i64) -> Option<Self> {
        let id = u32::try_from(value.unsigned_abs()).ok()?;
        Some(Literal::new(Variable::new(id)?, value > 0))
    }

    pub fn variable(&self) -> Variable {
        self.id
    }

    pub fn positive(&self) -> bool {
        self.positive
    }

    /// Signed DIMACS representation of the literal.
    pub fn to_dimacs(&self) -> i64 {
        let id = i64::from(self.id.id());
        if self.positive {
            id
        } else {
            -id
        }
    }
}

impl FromStr for Literal {
    type Err = VariableParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (positive, id) = match s.strip_prefix('-') {
            Some(rest) => (false, rest.parse()?),
            None => (true, s.parse()?),
        };

        Ok(Literal { id, positive })
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", if self.positive { "" } else { "¬" }, self.id)
    }
}

impl std::ops::Not for Literal {
    type Output = Literal;

    fn not(self) -> Self::Output {
        Literal {
            id: self.id,
            positive: !self.positive,
        }
    }
}

/// Disjunction of literals.
///
/// Literals are kept sorted and free of duplicates, so two clauses compare
/// equal exactly when they contain the same set of literals.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(mut literals: Vec<Literal>) -> Self {
        literals.sort_unstable();
        literals.dedup();
        Self { literals }
    }

    /// The clause without literals, i.e. a contradiction.
    pub fn empty() -> Self {
        Self {
            literals: Vec::new(),
        }
    }

    pub fn num_literals(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Literal> + '_ {
        self.literals.iter().copied()
    }

    pub fn contains(&self, literal: Literal) -> bool {
        self.literals.binary_search(&literal).is_ok()
    }

    /// Returns true if some variable appears with both polarities.
    pub fn is_tautology(&self) -> bool {
        self.literals
            .windows(2)
            .any(|pair| pair[0].variable() == pair[1].variable())
    }

    /// Returns true if the clause mentions `variable` in either polarity.
    pub fn mentions(&self, variable: Variable) -> bool {
        self.contains(Literal::new(variable, true)) || self.contains(Literal::new(variable, false))
    }

    /// Variables on which `self` and `other` hold a complementary pair.
    pub fn clashing_variables(&self, other: &Clause) -> Vec<Variable> {
        let mut variables: Vec<_> = self
            .iter()
            .filter(|&literal| other.contains(!literal))
            .map(|literal| literal.variable())
            .collect();
        variables.dedup();
        variables
    }

    /// Resolves `self` with `other` on `variable`.
    ///
    /// Returns `None` unless one clause holds `variable` positively and the
    /// other negatively. The resolvent may be a tautology.
    pub fn resolve(&self, other: &Clause, variable: Variable) -> Option<Clause> {
        let positive = Literal::new(variable, true);
        let negative = !positive;

        let clashes = (self.contains(positive) && other.contains(negative))
            || (self.contains(negative) && other.contains(positive));
        if !clashes {
            return None;
        }

        let literals = self
            .iter()
            .chain(other.iter())
            .filter(|literal| literal.variable() != variable)
            .collect();

        Some(Clause::new(literals))
    }

    /// Largest variable mentioned by the clause.
    pub fn max_variable(&self) -> Option<Variable> {
        self.literals.iter().map(|literal| literal.variable()).max()
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;

        let mut iter = self.literals.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for variable in iter {
            write!(f, " ∨ {}", variable)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

/// Formula representation in Conjunctive Normal Form
#[derive(Debug, Clone, Default)]
pub struct Cnf {
    num_variables: usize,
    clauses: Vec<Clause>,
}

impl Cnf {
    pub fn new(num_variables: usize) -> Self {
        assert!(num_variables <= Variable::MAX_VARIABLE_ID);

        Cnf {
            num_variables,
            clauses: Vec::new(),
        }
    }

    /// Builds a formula whose variable count covers every clause.
    pub fn from_clauses(clauses: impl IntoIterator<Item = Clause>) -> Self {
        let mut cnf = Cnf::new(0);
        for clause in clauses {
            cnf.add_clause(clause);
        }
        cnf
    }

    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    pub fn clauses(&self) -> &Vec<Clause> {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Adds a clause, widening the variable range if the clause needs it.
    pub fn add_clause(&mut self, clause: Clause) {
        if let Some(variable) = clause.max_variable() {
            self.num_variables = self.num_variables.max(variable.as_index() + 1);
        }
        self.clauses.push(clause);
    }

    pub fn contains_empty_clause(&self) -> bool {
        self.clauses.iter().any(Clause::is_empty)
    }

    /// Variables that occur in at least one clause.
    pub fn variables(&self) -> BTreeSet<Variable> {
        self.clauses
            .iter()
            .flat_map(|clause| clause.iter().map(|literal| literal.variable()))
            .collect()
    }

    /// Returns a view that displays the formula in DIMACS CNF format.
    pub fn dimacs(&self) -> Dimacs<'_> {
        Dimacs(self)
    }
}

impl Display for Cnf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CNF with {} variables (", self.num_variables)?;

        let mut iter = self.clauses.iter();
        if let Some(first) = iter.next() {
            write!(f, "{}", first)?;
        }
        for variable in iter {
            write!(f, " ∧ {}", variable)?;
        }

        write!(f, ")")?;

        Ok(())
    }
}

pub struct Dimacs<'a>(&'a Cnf);

impl Display for Dimacs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "p cnf {} {}",
            self.0.num_variables(),
            self.0.clauses().len()
        )?;
        for clause in self.0.clauses() {
            for literal in clause.iter() {
                write!(f, "{} ", literal.to_dimacs())?;
            }
            writeln!(f, "0")?;
        }

        Ok(())
    }
}

/// Represents a satisfying assignment for a formula.
///
/// The assignment is partial: variables the search never had to decide stay
/// `None` and may take either value.
#[derive(Debug)]
pub struct Model {
    formula: Cnf,
    assignment: Vec<Option<bool>>,
}

impl Model {
    /// Creates a new model from a formula and an assignment.
    ///
    /// # Panics
    ///
    /// Panics when `assignment` is longer than the formula's variable range.
    /// Variables past its end are unassigned. Debug builds also panic when it
    /// leaves a clause unsatisfied.
    pub fn new(formula: Cnf, assignment: Vec<Option<bool>>) -> Self {
        assert!(assignment.len() <= formula.num_variables());

        let model = Model {
            formula,
            assignment,
        };
        debug_assert!(model.is_satisfying());

        model
    }

    pub fn formula(&self) -> &Cnf {
        &self.formula
    }

    /// Value the search assigned to `variable`, if any.
    pub fn value(&self, variable: Variable) -> Option<bool> {
        self.assignment.get(variable.as_index()).copied().flatten()
    }

    /// Total assignment over the formula's variable range; unassigned
    /// variables are set to `true`.
    pub fn assignment(&self) -> Vec<bool> {
        (0..self.formula.num_variables())
            .map(|index| self.assignment.get(index).copied().flatten().unwrap_or(true))
            .collect()
    }

    /// Checks that every clause of the formula has a literal made true by the
    /// partial assignment.
    pub fn is_satisfying(&self) -> bool {
        self.formula.clauses().iter().all(|clause| {
            clause
                .iter()
                .any(|literal| self.value(literal.variable()) == Some(literal.positive()))
        })
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Model for {}\nAssignment:", self.formula)?;
        for variable in self.formula.variables() {
            match self.value(variable) {
                Some(value) => write!(f, "\n  {}: {}", variable, value)?,
                None => write!(f, "\n  {}: any", variable)?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{clause, var};

    #[test]
    fn clause_is_a_set() {
        assert_eq!(clause(&[2, -1, 2]), clause(&[-1, 2]));
        assert_eq!(clause(&[2, -1, 2]).num_literals(), 2);
    }

    #[test]
    fn tautology_detection() {
        assert!(clause(&[1, 3, -1]).is_tautology());
        assert!(!clause(&[1, 3, -2]).is_tautology());
        assert!(!Clause::empty().is_tautology());
    }

    #[test]
    fn resolve_removes_pivot() {
        let resolvent = clause(&[1, 2]).resolve(&clause(&[-1, 3]), var(1));
        assert_eq!(resolvent, Some(clause(&[2, 3])));

        let resolvent = clause(&[-1, 3]).resolve(&clause(&[1, 2]), var(1));
        assert_eq!(resolvent, Some(clause(&[2, 3])));
    }

    #[test]
    fn resolve_unit_pair_gives_empty_clause() {
        assert_eq!(clause(&[1]).resolve(&clause(&[-1]), var(1)), Some(Clause::empty()));
    }

    #[test]
    fn resolve_without_clash_is_none() {
        assert_eq!(clause(&[1, 2]).resolve(&clause(&[1, 3]), var(1)), None);
        assert_eq!(clause(&[1, 2]).resolve(&clause(&[-1, 3]), var(2)), None);
        assert_eq!(clause(&[1, 2]).resolve(&clause(&[1, 2]), var(1)), None);
    }

    #[test]
    fn resolvent_can_be_tautology() {
        let resolvent = clause(&[1, 2]).resolve(&clause(&[-1, -2]), var(1)).unwrap();
        assert!(resolvent.is_tautology());
        assert_eq!(clause(&[1, 2]).clashing_variables(&clause(&[-1, -2])), vec![var(1), var(2)]);
    }

    #[test]
    fn literal_parsing() {
        let literal: Literal = "-7".parse().unwrap();
        assert_eq!(literal, Literal::new(var(7), false));
        assert_eq!(literal.to_dimacs(), -7);
        assert!("0".parse::<Literal>().is_err());
        assert!("x".parse::<Literal>().is_err());
    }

    #[test]
    fn cnf_tracks_variables() {
        let cnf = Cnf::from_clauses(vec![clause(&[1, -4]), Clause::empty()]);
        assert_eq!(cnf.num_variables(), 4);
        assert!(cnf.contains_empty_clause());
        assert_eq!(cnf.variables().into_iter().collect::<Vec<_>>(), vec![var(1), var(4)]);
        assert_eq!(cnf.dimacs().to_string(), "p cnf 4 2\n1 -4 0\n0\n");
    }
}
