use std::{env::args, path::PathBuf, time::Instant};

use log::info;
use pretty_env_logger::formatted_builder;
use rand::{rngs::StdRng, SeedableRng};
use satire_classic::{
    bench::{self, Options},
    generator,
    parser::{self, parse_file},
    prelude::*,
    report::Report,
    solver::{Algorithm, AlgorithmError, Solution},
};

fn usage_string() -> String {
    format!(
        "Usage: {0} <solver_name> <command>
       {0} generate <num_variables> <num_clauses> <clause_width> <seed>

solver_name: resolution, dp, dpll

command:
    check <file_name> - test the solver with given file
    bench <folder> [results_dir] [file_limit] - run the solver on <folder>/sat and <folder>/unsat",
        args().next().unwrap_or_else(|| "satire-classic".to_owned())
    )
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{}\n\n{}", source, usage_string()))]
    UnknownSolver { source: AlgorithmError },
    #[snafu(display("Unknown command '{}'\n\n{}", name, usage_string()))]
    UnknownCommand { name: String },
    #[snafu(display("Failed to parse CNF"))]
    ParserError { source: parser::Error },
    #[snafu(display("Benchmark run failed"))]
    BenchError { source: bench::Error },
    #[snafu(display("Failed to generate a formula"))]
    GeneratorError { source: generator::Error },
    #[snafu(display("Argument '{}' is not a valid number", argument))]
    InvalidNumber {
        argument: String,
        source: std::num::ParseIntError,
    },
    #[snafu(display("Required argument does not exist\n\n{}", usage_string()))]
    MissingArgument,
}

fn number_arg<T>(args: &[String], index: usize) -> Result<T, Error>
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    let argument = args.get(index).context(MissingArgument)?;
    argument.parse().context(InvalidNumber { argument })
}

fn check(algorithm: Algorithm, path: &str) -> Result<(), Error> {
    let formula = parse_file(path).context(ParserError)?;

    let start = Instant::now();
    let (solution, stats) = algorithm.solve(&formula);
    info!(
        "{} finished in {:.6}s: {}",
        algorithm,
        start.elapsed().as_secs_f64(),
        stats
    );

    match solution {
        Solution::Sat(Some(model)) => println!("SAT {}", model),
        Solution::Sat(None) => println!("SAT"),
        Solution::Unsat => println!("UNSAT"),
    }

    Ok(())
}

fn dispatch_command(algorithm: Algorithm, args: Vec<String>) -> Result<(), Error> {
    match args.get(0).map(|s| s.as_str()) {
        Some("check") => {
            let path = args.get(1).context(MissingArgument)?;
            check(algorithm, path)?;
        }
        Some("bench") => {
            let folder = PathBuf::from(args.get(1).context(MissingArgument)?);
            let mut options = Options::new(algorithm);
            if let Some(results_dir) = args.get(2) {
                options.results_dir = PathBuf::from(results_dir);
            }
            if args.len() > 3 {
                options.file_limit = Some(number_arg(&args, 3)?);
            }

            let summary = bench::run(algorithm, &folder, &options).context(BenchError)?;
            println!(
                "{}: {}/{} correct, {} errors ({})",
                algorithm,
                summary.correct,
                summary.files,
                summary.errors,
                bench::output_path(algorithm, &folder, &options).display()
            );
        }
        Some(name) => UnknownCommand {
            name: name.to_owned(),
        }
        .fail()?,
        None => MissingArgument.fail()?,
    }

    Ok(())
}

fn generate(args: Vec<String>) -> Result<(), Error> {
    let num_variables = number_arg(&args, 0)?;
    let num_clauses = number_arg(&args, 1)?;
    let clause_width = number_arg(&args, 2)?;
    let seed = number_arg(&args, 3)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let formula = generator::random_cnf(&mut rng, num_variables, num_clauses, clause_width)
        .context(GeneratorError)?;
    print!("{}", formula.dimacs());

    Ok(())
}

fn init_logger() {
    let mut builder = formatted_builder();

    if let Ok(s) = ::std::env::var("RUST_LOG") {
        builder.parse_filters(&s);
    } else if cfg!(debug_assertions) {
        builder.parse_filters("satire_classic=debug");
    } else {
        builder.parse_filters("satire_classic=warn");
    }

    if builder.try_init().is_err() {
        eprintln!("Logger was already initialized");
    }
}

fn main() -> Result<(), Report> {
    init_logger();

    let mut args = args();

    // drop arg[0]
    args.next();

    // solver name
    let solver_name = args.next();
    let remaining: Vec<_> = args.collect();

    match solver_name.as_deref() {
        Some("generate") => generate(remaining)?,
        Some(name) => {
            let algorithm = name.parse::<Algorithm>().context(UnknownSolver)?;
            dispatch_command(algorithm, remaining)?;
        }
        None => {
            println!("{}", usage_string());
        }
    }

    Ok(())
}
