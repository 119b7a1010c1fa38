/*!
Random k-CNF formulas for benchmark folders and cross-checking the solvers.
*/

use rand::{seq::index, Rng};

use crate::formula::{Clause, Cnf, Literal, Variable};
use crate::prelude::*;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display(
        "Clause width {} exceeds the number of variables ({})",
        clause_width,
        num_variables
    ))]
    WidthTooLarge {
        clause_width: usize,
        num_variables: usize,
    },
    #[snafu(display("Variable count {} is out of range", num_variables))]
    TooManyVariables { num_variables: usize },
}

/// Generates `num_clauses` clauses, each over `clause_width` distinct
/// variables drawn uniformly from `1..=num_variables` with random polarity.
pub fn random_cnf<R: Rng + ?Sized>(
    rng: &mut R,
    num_variables: usize,
    num_clauses: usize,
    clause_width: usize,
) -> Result<Cnf, Error> {
    ensure!(
        num_variables <= Variable::MAX_VARIABLE_ID,
        TooManyVariables { num_variables }
    );
    ensure!(
        clause_width <= num_variables,
        WidthTooLarge {
            clause_width,
            num_variables,
        }
    );

    let mut cnf = Cnf::new(num_variables);
    for _ in 0..num_clauses {
        let literals = index::sample(rng, num_variables, clause_width)
            .into_iter()
            .filter_map(Variable::from_index)
            .map(|variable| Literal::new(variable, rng.gen_bool(0.5)))
            .collect();
        cnf.add_clause(Clause::new(literals));
    }

    Ok(cnf)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn clauses_have_requested_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let cnf = random_cnf(&mut rng, 6, 20, 3).unwrap();

        assert_eq!(cnf.num_variables(), 6);
        assert_eq!(cnf.clauses().len(), 20);
        for clause in cnf.clauses() {
            assert_eq!(clause.num_literals(), 3);
            assert!(!clause.is_tautology());
        }
    }

    #[test]
    fn same_seed_same_formula() {
        let first = random_cnf(&mut StdRng::seed_from_u64(11), 8, 10, 3).unwrap();
        let second = random_cnf(&mut StdRng::seed_from_u64(11), 8, 10, 3).unwrap();
        assert_eq!(first.clauses(), second.clauses());
    }

    #[test]
    fn rejects_wide_clauses() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            random_cnf(&mut rng, 2, 1, 3),
            Err(Error::WidthTooLarge { .. })
        ));
    }
}
