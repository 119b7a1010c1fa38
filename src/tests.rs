use std::{fs, path::PathBuf};

use paste::paste;
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    bench::{self, Options},
    formula::{Clause, Cnf, Literal, Variable},
    generator::random_cnf,
    parser::parse_file,
    solver::{Algorithm, DpSolver, DpllSolver, ResolutionSolver, Solver, Verdict},
};

pub(crate) fn var(id: u32) -> Variable {
    Variable::new(id).unwrap()
}

pub(crate) fn clause(literals: &[i64]) -> Clause {
    Clause::new(
        literals
            .iter()
            .map(|&value| Literal::from_dimacs(value).unwrap())
            .collect(),
    )
}

pub(crate) fn cnf(clauses: &[&[i64]]) -> Cnf {
    Cnf::from_clauses(clauses.iter().map(|literals| clause(literals)))
}

fn verdicts(formula: &Cnf) -> Vec<Verdict> {
    Algorithm::ALL
        .iter()
        .map(|algorithm| algorithm.solve(formula).0.verdict())
        .collect()
}

macro_rules! sat_testcase_with_solver {
    ($solver:ident, $dir:ident, $name: ident) => {
        paste! {
            #[test]
            fn [< $solver:lower _ $dir _ $name >]() {
                let formula = parse_file(
                    concat!("testcases/", stringify!($dir), "/sat/", stringify!($name), ".cnf")
                ).unwrap();
                let mut solver = $solver::new(&formula);
                let solution = solver.solve();
                assert!(solution.is_sat());
                if let Some(model) = solution.model() {
                    assert!(model.is_satisfying());
                }
            }
        }
    };
}

macro_rules! unsat_testcase_with_solver {
    ($solver:ident, $dir:ident, $name:ident) => {
        paste! {
            #[test]
            fn [< $solver:lower _ $dir _ $name >]() {
                let formula = parse_file(
                    concat!("testcases/", stringify!($dir), "/unsat/", stringify!($name), ".cnf")
                ).unwrap();
                let mut solver = $solver::new(&formula);
                assert!(!solver.solve().is_sat());
            }
        }
    };
}

macro_rules! sat_testcase {
    ($dir:ident, $name:ident) => {
        sat_testcase_with_solver!(ResolutionSolver, $dir, $name);
        sat_testcase_with_solver!(DpSolver, $dir, $name);
        sat_testcase_with_solver!(DpllSolver, $dir, $name);
    };
}

macro_rules! unsat_testcase {
    ($dir:ident, $name:ident) => {
        unsat_testcase_with_solver!(ResolutionSolver, $dir, $name);
        unsat_testcase_with_solver!(DpSolver, $dir, $name);
        unsat_testcase_with_solver!(DpllSolver, $dir, $name);
    };
}

sat_testcase!(small, empty_formula);
sat_testcase!(small, exactly_one);
sat_testcase!(small, headerless);
sat_testcase!(small, implication_chain);
sat_testcase!(small, pure);
sat_testcase!(small, repeated_literals);
sat_testcase!(small, satlib_trailer);
sat_testcase!(small, tautology);
sat_testcase!(small, two_coloring_path);
sat_testcase!(small, unit);

unsat_testcase!(small, all_sign_patterns);
unsat_testcase!(small, contradiction);
unsat_testcase!(small, empty_clause);
unsat_testcase!(small, implication_cycle);
unsat_testcase!(small, pigeonhole_3_2);
unsat_testcase!(small, two_coloring_triangle);
unsat_testcase!(small, xor);

#[test]
fn empty_clause_is_unsat_for_every_solver() {
    let formulas = [
        cnf(&[&[]]),
        cnf(&[&[1, 2], &[], &[-1]]),
        cnf(&[&[1, -1], &[]]),
    ];
    for formula in &formulas {
        assert_eq!(verdicts(formula), vec![Verdict::Unsat; 3]);
    }
}

#[test]
fn empty_formula_is_sat_for_every_solver() {
    assert_eq!(verdicts(&Cnf::new(0)), vec![Verdict::Sat; 3]);
    // declared variables without clauses
    assert_eq!(verdicts(&Cnf::new(4)), vec![Verdict::Sat; 3]);
}

#[test]
fn single_unit() {
    let formula = cnf(&[&[1]]);
    assert_eq!(verdicts(&formula), vec![Verdict::Sat; 3]);

    let (solution, _) = Algorithm::Dpll.solve(&formula);
    assert_eq!(solution.model().unwrap().value(var(1)), Some(true));
}

#[test]
fn complementary_units() {
    assert_eq!(verdicts(&cnf(&[&[1], &[-1]])), vec![Verdict::Unsat; 3]);
}

#[test]
fn xor_contradiction() {
    let formula = cnf(&[&[1, 2], &[-1, 2], &[1, -2], &[-1, -2]]);
    assert_eq!(verdicts(&formula), vec![Verdict::Unsat; 3]);
}

#[test]
fn satisfiable_pair() {
    let formula = cnf(&[&[1, 2], &[-1, 3]]);
    assert_eq!(verdicts(&formula), vec![Verdict::Sat; 3]);

    let (solution, _) = Algorithm::Dpll.solve(&formula);
    assert!(solution.model().unwrap().is_satisfying());
}

#[test]
fn pure_literal_without_branching() {
    let formula = cnf(&[&[1, 2], &[1, -2]]);
    assert_eq!(verdicts(&formula), vec![Verdict::Sat; 3]);

    let mut solver = DpllSolver::new(&formula);
    let solution = solver.solve();
    assert_eq!(solution.model().unwrap().value(var(1)), Some(true));
    assert_eq!(solver.stats().decisions, 0);
    assert_eq!(solver.stats().pure_literals, 1);
}

#[test]
fn solvers_agree_on_random_formulas() {
    for seed in 0..40 {
        let mut rng = StdRng::seed_from_u64(seed);
        let num_clauses = 3 + (seed as usize % 22);
        let formula = random_cnf(&mut rng, 5, num_clauses, 3).unwrap();

        let found = verdicts(&formula);
        assert!(
            found.iter().all(|&verdict| verdict == found[0]),
            "disagreement {:?} on {}",
            found,
            formula
        );

        let (solution, _) = Algorithm::Dpll.solve(&formula);
        if let Some(model) = solution.model() {
            assert!(model.is_satisfying(), "bad witness for {}", formula);
            for clause in formula.clauses() {
                assert!(clause
                    .iter()
                    .any(|literal| model.assignment()[literal.variable().as_index()]
                        == literal.positive()));
            }
        }
    }
}

#[test]
fn solvers_agree_on_mixed_widths() {
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(1000 + seed);
        let mut formula = random_cnf(&mut rng, 4, 6, 2).unwrap();
        for clause in random_cnf(&mut rng, 4, 3, 1).unwrap().clauses() {
            formula.add_clause(clause.clone());
        }

        let found = verdicts(&formula);
        assert!(
            found.iter().all(|&verdict| verdict == found[0]),
            "disagreement {:?} on {}",
            found,
            formula
        );
    }
}

#[test]
fn resolution_is_idempotent_on_its_own_output() {
    let formula = cnf(&[&[1, 2], &[-2, 3], &[-3, 1]]);
    let mut solver = ResolutionSolver::new(&formula);
    solver.saturate();

    let saturated = Cnf::from_clauses(solver.clauses().iter().cloned());
    let mut again = ResolutionSolver::new(&saturated);
    again.saturate();
    assert_eq!(again.clauses().len(), saturated.clauses().len());
    assert_eq!(again.stats().rounds, 1);
}

#[test]
fn dp_never_reintroduces_eliminated_variables() {
    let mut rng = StdRng::seed_from_u64(99);
    let formula = random_cnf(&mut rng, 6, 14, 3).unwrap();

    let mut solver = DpSolver::new(&formula);
    let mut eliminated = Vec::new();
    while let Some(variable) = solver.next_variable() {
        solver.eliminate(variable);
        eliminated.push(variable);
        for &gone in &eliminated {
            assert!(solver.clauses().iter().all(|clause| !clause.mentions(gone)));
        }
    }
}

#[test]
fn stats_are_reported_through_the_algorithm() {
    let formula = cnf(&[&[1, 2], &[-1, 2], &[1, -2], &[-1, -2]]);

    let (_, stats) = Algorithm::Resolution.solve(&formula);
    assert!(stats.resolvents > 0);
    let (_, stats) = Algorithm::Dp.solve(&formula);
    assert!(stats.eliminations > 0);
    let (_, stats) = Algorithm::Dpll.solve(&formula);
    assert!(stats.decisions > 0);
}

#[test]
fn algorithm_names_round_trip() {
    for algorithm in Algorithm::ALL.iter() {
        assert_eq!(algorithm.name().parse::<Algorithm>().unwrap(), *algorithm);
    }
    assert!("cdcl".parse::<Algorithm>().is_err());
}

#[test]
fn bench_writes_one_row_per_formula() {
    let root = std::env::temp_dir().join(format!("satire-classic-bench-{}", std::process::id()));
    let folder: PathBuf = root.join("tiny");
    fs::create_dir_all(folder.join("sat")).unwrap();
    fs::create_dir_all(folder.join("unsat")).unwrap();
    fs::write(folder.join("sat/a.cnf"), "p cnf 2 1\n1 -2 0\n").unwrap();
    fs::write(folder.join("sat/b.cnf"), "1 2\n-1\n").unwrap();
    fs::write(folder.join("sat/ignored.txt"), "not a formula").unwrap();
    fs::write(folder.join("unsat/c.cnf"), "1 0\n-1 0\n").unwrap();
    fs::write(folder.join("unsat/broken.cnf"), "1 x 0\n").unwrap();

    let options = Options {
        results_dir: root.join("results"),
        file_limit: None,
    };
    let summary = bench::run(Algorithm::Dp, &folder, &options).unwrap();
    assert_eq!(summary.files, 4);
    assert_eq!(summary.correct, 3);
    assert_eq!(summary.errors, 1);

    let output = bench::output_path(Algorithm::Dp, &folder, &options);
    assert!(output.ends_with("tiny_results_dp.csv"));
    let csv = fs::read_to_string(&output).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines[0], "Filename,Expected,Solver Result,Correct?,Time (s)");
    assert_eq!(lines.len(), 5);
    assert!(lines[1].starts_with("a.cnf,SAT,SAT,Yes,"));
    assert!(lines[2].starts_with("b.cnf,SAT,SAT,Yes,"));
    assert_eq!(lines[3], "broken.cnf,UNSAT,Error,No,0.000000");
    assert!(lines[4].starts_with("c.cnf,UNSAT,UNSAT,Yes,"));

    let limited = Options {
        file_limit: Some(1),
        ..options
    };
    let summary = bench::run(Algorithm::Dpll, &folder, &limited).unwrap();
    assert_eq!(summary.files, 2);

    fs::remove_dir_all(&root).unwrap();
}
