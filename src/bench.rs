/*!
Benchmark driver: runs one algorithm over a folder of formulas with known
verdicts and records one CSV row per formula.

A benchmark folder holds a `sat` and an `unsat` subfolder of `.cnf` files.
*/

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use crate::parser::{self, parse_file};
use crate::prelude::*;
use crate::solver::{Algorithm, Stats, Verdict};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Failed to list benchmark folder '{}'", path.display()))]
    ListFolder { path: PathBuf, source: io::Error },
    #[snafu(display("Failed to write results to '{}'", path.display()))]
    WriteResults { path: PathBuf, source: io::Error },
}

const HEADER: &str = "Filename,Expected,Solver Result,Correct?,Time (s)";

#[derive(Debug, Clone)]
pub struct Options {
    /// Directory the CSV file is written to. Created if missing.
    pub results_dir: PathBuf,
    /// Maximum number of files taken from each subfolder.
    pub file_limit: Option<usize>,
}

impl Options {
    pub fn new(algorithm: Algorithm) -> Self {
        Options {
            results_dir: Path::new("results").join(algorithm.name()),
            file_limit: None,
        }
    }
}

/// A single timed solver run.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub verdict: Verdict,
    pub elapsed: Duration,
    pub stats: Stats,
}

/// Parses `path` and times `algorithm` on it. Parsing is not timed.
pub fn measure(algorithm: Algorithm, path: &Path) -> Result<Measurement, parser::Error> {
    let formula = parse_file(path)?;

    let start = Instant::now();
    let (solution, stats) = algorithm.solve(&formula);
    let elapsed = start.elapsed();

    Ok(Measurement {
        verdict: solution.verdict(),
        elapsed,
        stats,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub files: usize,
    pub correct: usize,
    pub errors: usize,
}

/// `.cnf` files directly inside `folder`, sorted by name.
fn cnf_files(folder: &Path, file_limit: Option<usize>) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for entry in fs::read_dir(folder).context(ListFolder { path: folder })? {
        let path = entry.context(ListFolder { path: folder })?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "cnf") {
            files.push(path);
        }
    }

    files.sort();
    if let Some(limit) = file_limit {
        files.truncate(limit);
    }

    Ok(files)
}

fn csv_field(field: &str) -> String {
    if field.contains(|c| c == ',' || c == '"' || c == '\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

/// Path of the CSV file written for `folder`.
pub fn output_path(algorithm: Algorithm, folder: &Path, options: &Options) -> PathBuf {
    let folder_name = folder
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("benchmark");

    options
        .results_dir
        .join(format!("{}_results_{}.csv", folder_name, algorithm.name()))
}

/// Runs `algorithm` on every formula in `folder/sat` and `folder/unsat`.
///
/// Formulas that fail to load are recorded as `Error` rows and do not stop
/// the run.
pub fn run(algorithm: Algorithm, folder: &Path, options: &Options) -> Result<Summary, Error> {
    let output = output_path(algorithm, folder, options);
    fs::create_dir_all(&options.results_dir).context(WriteResults { path: &output })?;

    let file = File::create(&output).context(WriteResults { path: &output })?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", HEADER).context(WriteResults { path: &output })?;

    let mut summary = Summary::default();

    for &expected in &[Verdict::Sat, Verdict::Unsat] {
        let subfolder = folder.join(expected.to_string().to_lowercase());
        if !subfolder.is_dir() {
            debug!("skipping missing folder '{}'", subfolder.display());
            continue;
        }

        for path in cnf_files(&subfolder, options.file_limit)? {
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            summary.files += 1;

            let row = match measure(algorithm, &path) {
                Ok(measurement) => {
                    let correct = measurement.verdict == expected;
                    if correct {
                        summary.correct += 1;
                    } else {
                        warn!(
                            "{}: expected {} but {} reported {}",
                            filename, expected, algorithm, measurement.verdict
                        );
                    }
                    info!(
                        "{}: {} in {:.6}s ({})",
                        filename,
                        measurement.verdict,
                        measurement.elapsed.as_secs_f64(),
                        measurement.stats
                    );

                    format!(
                        "{},{},{},{},{:.6}",
                        csv_field(&filename),
                        expected,
                        measurement.verdict,
                        if correct { "Yes" } else { "No" },
                        measurement.elapsed.as_secs_f64()
                    )
                }
                Err(e) => {
                    warn!("{}: {}", filename, e);
                    summary.errors += 1;

                    format!("{},{},Error,No,0.000000", csv_field(&filename), expected)
                }
            };

            writeln!(writer, "{}", row).context(WriteResults { path: &output })?;
        }
    }

    writer.flush().context(WriteResults { path: &output })?;

    info!(
        "{}: {} of {} formulas correct, {} errors, results in '{}'",
        algorithm,
        summary.correct,
        summary.files,
        summary.errors,
        output.display()
    );

    Ok(summary)
}
