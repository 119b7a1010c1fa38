use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::formula::{Clause, Cnf, Literal, Variable, VariableParseError};
use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("I/O error occurred while parsing CNF file '{}'", path.display()))]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to parse line {} '{}' as clause", line_number, clause))]
    MalformedClause { line_number: usize, clause: String },
    #[snafu(display("Invalid variable found in clause '{}'", clause))]
    MalformedVariable {
        clause: String,
        source: VariableParseError,
    },
    #[snafu(display(
        "Problem line '{}' is malformed, expected 'p cnf <num_variables> <num_clauses>'",
        line
    ))]
    MalformedProblemDefinition { line: String },
    #[snafu(display(
        "Problem line {} must appear once, before every clause",
        line_number
    ))]
    MisplacedProblemDefinition { line_number: usize },
    #[snafu(display(
        "Variable {} in clause '{}' exceeds the {} variables declared in the problem line",
        variable,
        clause,
        declared
    ))]
    UndeclaredVariable {
        variable: u32,
        declared: usize,
        clause: String,
    },
    #[snafu(display(
        "The number of clauses ({}) does not match the clauses number in the problem definition ({})",
        found,
        expected,
    ))]
    ClauseCountMismatch { expected: usize, found: usize },
}

/// Parse a line to a clause.
///
/// The terminating `0` is optional; a line holding only `0` is the empty clause.
fn parse_line(line_number: usize, line: &str) -> Result<Clause, Error> {
    let mut literals = Vec::new();
    let mut tokens = line.split_whitespace();

    while let Some(token) = tokens.next() {
        if token == "0" {
            ensure!(
                tokens.next().is_none(),
                MalformedClause {
                    line_number,
                    clause: line,
                }
            );
            break;
        }

        literals.push(
            token
                .parse::<Literal>()
                .context(MalformedVariable { clause: line })?,
        );
    }

    Ok(Clause::new(literals))
}

/// Parses `p cnf <num_variables> <num_clauses>`.
fn parse_problem_line(line: &str) -> Result<(usize, usize), Error> {
    let splitted = line.split_whitespace().collect::<Vec<_>>();

    // We only support CNF DIMACS format
    ensure!(
        splitted.len() == 4 && splitted[0] == "p" && splitted[1] == "cnf",
        MalformedProblemDefinition { line }
    );

    match (splitted[2].parse::<usize>(), splitted[3].parse::<usize>()) {
        (Ok(num_variables), Ok(num_clauses)) => {
            ensure!(
                num_variables <= Variable::MAX_VARIABLE_ID,
                MalformedProblemDefinition { line }
            );
            Ok((num_variables, num_clauses))
        }
        _ => MalformedProblemDefinition { line }.fail(),
    }
}

/// Parses a CNF formula from DIMACS-like text.
///
/// The problem line is optional. When it is present, it must come before the
/// first clause, every variable must be within the declared range and the
/// clause count must match. A line starting with `%` ends the formula.
pub fn parse_str(text: &str) -> Result<Cnf, Error> {
    let mut problem = None;
    let mut cnf = Cnf::new(0);

    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('c') {
            // empty line, comment
            continue;
        }
        if trimmed.starts_with('%') {
            break;
        }
        if trimmed.starts_with('p') {
            ensure!(
                problem.is_none() && cnf.is_empty(),
                MisplacedProblemDefinition {
                    line_number: index + 1
                }
            );
            let (num_variables, num_clauses) = parse_problem_line(trimmed)?;
            cnf = Cnf::new(num_variables);
            problem = Some((num_variables, num_clauses));
            continue;
        }

        let clause = parse_line(index + 1, trimmed)?;
        if let (Some((declared, _)), Some(variable)) = (problem, clause.max_variable()) {
            ensure!(
                variable.as_index() < declared,
                UndeclaredVariable {
                    variable: variable.id(),
                    declared,
                    clause: trimmed,
                }
            );
        }
        cnf.add_clause(clause);
    }

    if let Some((_, num_clauses)) = problem {
        ensure!(
            cnf.clauses().len() == num_clauses,
            ClauseCountMismatch {
                found: cnf.clauses().len(),
                expected: num_clauses,
            }
        );
    }

    debug!(
        "parsed formula with {} variables and {} clauses",
        cnf.num_variables(),
        cnf.clauses().len()
    );

    Ok(cnf)
}

/// Parses CNF formula from a file
pub fn parse_file(path: impl AsRef<Path>) -> Result<Cnf, Error> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).context(IoError {
        path: path.to_owned(),
    })?;

    parse_str(&text)
}
