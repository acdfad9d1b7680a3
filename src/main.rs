use std::fmt::Write as _;
use std::time::Instant;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tilecost_solver::{solve, Batch};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let input_path = args.next().context("Missing input file argument")?;
    let output_path = args.next();

    let start = Instant::now();
    let data = std::fs::read_to_string(&input_path).context("Failed to read the input")?;
    let Batch(queries) = data.parse::<Batch>().context("Failed to parse the input")?;

    let pb = ProgressBar::new(queries.len() as u64).with_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} queries [{elapsed_precise}]")
            .context("Invalid progress template")?,
    );
    let solutions = solve::solve_batch(&queries, || {
        #[cfg(feature = "coz")]
        coz::progress!("Query");
        pb.inc(1);
    });
    pb.finish_and_clear();

    let mut out = String::new();
    for (solution, i) in solutions.into_iter().zip(1..) {
        let solution = solution.with_context(|| format!("Failed to solve query {i}"))?;
        writeln!(out, "{solution}").unwrap();
    }

    match output_path {
        Some(path) => std::fs::write(path, out).context("Failed to write the output")?,
        None => print!("{out}"),
    }

    eprintln!(
        "{} {} queries in {:?}",
        style("Solved").green().bold(),
        queries.len(),
        start.elapsed(),
    );
    Ok(())
}
