//! CLI entry point for the tube-sort solver.
//!
//! Usage:
//!   tube-solver solve <puzzle.json> [options]
//!   tube-solver solve --stdin [options]
//!
//! The input is the JSON exported by the TypeScript puzzle editor:
//!   { "tubeCapacity": 4, "availableColors": [...], "tubes": [...] }
//!
//! Options:
//!   --max-steps <n>   Search budget in dequeued BFS nodes per possibility
//!                     (default: 2000)
//!   --limit <n>       Maximum number of wildcard expansions to attempt
//!                     (default: 1000000)

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tube_sort_solver::{
    possibility_count, run_batch, wildcard_positions, BatchReport, BatchStatus, Move, PuzzleFile,
    PuzzleState, SolverConfig,
};

#[derive(Parser)]
#[command(name = "tube-solver")]
#[command(about = "Bounded BFS solver for water-sort tube puzzles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve every wildcard expansion of a puzzle definition
    Solve {
        /// Path to puzzle JSON file (use --stdin to read from stdin)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Read puzzle from stdin instead of file
        #[arg(long)]
        stdin: bool,

        /// Search budget in dequeued BFS nodes per possibility
        #[arg(long, default_value = "2000")]
        max_steps: usize,

        /// Maximum number of wildcard expansions to attempt
        #[arg(long, default_value = "1000000")]
        limit: usize,
    },
}

/// Output format for a batch run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchOutput {
    cancelled: bool,
    total_possibilities: usize,
    tested_possibilities: usize,
    solutions_found: usize,
    solutions: Vec<SolutionOutput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SolutionOutput {
    possibility_index: usize,
    possibility: PuzzleState,
    moves: Vec<Move>,
    states: Vec<PuzzleState>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            file,
            stdin,
            max_steps,
            limit,
        } => {
            // Read definition JSON
            let json_content = if stdin {
                let mut buffer = String::new();
                if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                    eprintln!("Error reading from stdin: {}", e);
                    return ExitCode::FAILURE;
                }
                buffer
            } else if let Some(path) = file {
                match fs::read_to_string(&path) {
                    Ok(content) => content,
                    Err(e) => {
                        eprintln!("Error reading file {:?}: {}", path, e);
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                eprintln!("Error: must provide either a file path or --stdin");
                return ExitCode::FAILURE;
            };

            // Parse and validate the definition
            let puzzle_file: PuzzleFile = match serde_json::from_str(&json_content) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Error parsing puzzle JSON: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            let (definition, colors) = match puzzle_file.into_parts() {
                Ok(parts) => parts,
                Err(e) => {
                    eprintln!("Invalid puzzle definition: {}", e);
                    return ExitCode::FAILURE;
                }
            };

            // Refuse absurd expansions before allocating anything
            let wildcards = wildcard_positions(&definition).len();
            match possibility_count(wildcards, colors.len().max(1)) {
                Some(total) if total <= limit => {
                    info!(wildcards, total, "expanding definition");
                }
                _ => {
                    eprintln!(
                        "Error: {} wildcards over {} colors exceed the expansion limit of {}",
                        wildcards,
                        colors.len(),
                        limit
                    );
                    return ExitCode::FAILURE;
                }
            }

            let config = SolverConfig { max_steps };
            let report = run_batch(&definition, &colors, &config, |progress| {
                if progress.tested_possibilities % 100 == 0 {
                    info!(
                        tested = progress.tested_possibilities,
                        total = progress.total_possibilities,
                        solutions = progress.solutions_found,
                        "batch progress"
                    );
                }
            });

            let solutions_found = report.solutions.len();
            let output = format_report(report);
            match serde_json::to_string_pretty(&output) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error serializing report: {}", e);
                    return ExitCode::FAILURE;
                }
            }

            if solutions_found > 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn format_report(report: BatchReport) -> BatchOutput {
    BatchOutput {
        cancelled: report.status == BatchStatus::Cancelled,
        total_possibilities: report.total_possibilities,
        tested_possibilities: report.tested_possibilities,
        solutions_found: report.solutions.len(),
        solutions: report
            .solutions
            .into_iter()
            .map(|s| SolutionOutput {
                possibility_index: s.possibility_index,
                possibility: s.possibility,
                moves: s.moves,
                states: s.history.states,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tube_sort_solver::BatchSolution;

    #[test]
    fn test_format_report_camel_case_keys() {
        let report = BatchReport {
            status: BatchStatus::Completed,
            tested_possibilities: 1,
            total_possibilities: 1,
            solutions: Vec::<BatchSolution>::new(),
        };

        let json = serde_json::to_string(&format_report(report)).unwrap();
        assert!(json.contains("\"totalPossibilities\":1"));
        assert!(json.contains("\"testedPossibilities\":1"));
        assert!(json.contains("\"cancelled\":false"));
    }
}
