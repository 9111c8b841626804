//! Batch driver: solve every expanded possibility of a definition.
//!
//! The run is a single logical thread of control. Between possibilities
//! the runner checks a shared cancellation flag and invokes the caller's
//! progress callback; that callback is the only suspension point, so
//! cancellation has possibility-level granularity. A solve already in
//! progress always runs to completion before a cancellation request can
//! stop the batch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::engine::replay;
use crate::expand::expand_wildcards;
use crate::puzzle::{Color, History, Move, PuzzleState};
use crate::solver::{solve, SolverConfig};

/// Shared cancellation flag. Clones refer to the same flag, so a handle
/// can be moved to another thread (or stored by a UI) and observed by the
/// runner between possibilities.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect before the next possibility.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn rearm(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Lifecycle of the runner. `Running` is only observable from the progress
/// callback's point of view; both terminal states act as `Idle` for the
/// purpose of starting the next run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Progress counters reported after every processed possibility.
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress {
    pub tested_possibilities: usize,
    pub total_possibilities: usize,
    pub solutions_found: usize,
}

/// One solved possibility with its replayed step-by-step history.
#[derive(Debug, Clone)]
pub struct BatchSolution {
    pub possibility_index: usize,
    pub possibility: PuzzleState,
    pub moves: Vec<Move>,
    pub history: History,
}

/// Final outcome of a batch run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub status: BatchStatus,
    pub tested_possibilities: usize,
    pub total_possibilities: usize,
    pub solutions: Vec<BatchSolution>,
}

/// Drives the solver across all possibilities of one definition.
#[derive(Debug, Default)]
pub struct BatchRunner {
    status: BatchStatus,
    cancel: CancelHandle,
}

impl BatchRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> BatchStatus {
        self.status
    }

    /// Handle for requesting cancellation of the current (or next) run.
    /// Re-armed at the start of every run.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Expand the definition and solve every possibility in expansion
    /// order. `on_progress` is invoked after each possibility; a
    /// cancellation requested from it (or from another thread) is observed
    /// before the next possibility starts, preserving all solutions
    /// accumulated so far and the tested count already reached.
    ///
    /// Solutions are recorded only for possibilities that need at least
    /// one move; a possibility that fails to solve within the budget is
    /// excluded and the batch continues.
    pub fn run(
        &mut self,
        definition: &PuzzleState,
        colors: &[Color],
        config: &SolverConfig,
        mut on_progress: impl FnMut(&BatchProgress),
    ) -> BatchReport {
        // Terminal states return to Idle when the next run starts.
        self.status = BatchStatus::Running;
        self.cancel.rearm();

        let possibilities = expand_wildcards(definition, colors);
        let total_possibilities = possibilities.len();
        info!(total_possibilities, "batch run started");

        let mut tested_possibilities = 0usize;
        let mut solutions: Vec<BatchSolution> = Vec::new();
        let mut cancelled = false;

        for (index, possibility) in possibilities.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            tested_possibilities = index + 1;

            let result = solve(&possibility, config);
            match &result.moves {
                Some(moves) if !moves.is_empty() => {
                    let history = replay(&possibility, moves)
                        .expect("solver move sequence must replay cleanly");
                    debug!(index, moves = moves.len(), "possibility solved");
                    solutions.push(BatchSolution {
                        possibility_index: index,
                        possibility,
                        moves: moves.clone(),
                        history,
                    });
                }
                Some(_) => {
                    debug!(index, "possibility already solved, skipped");
                }
                None => {
                    debug!(
                        index,
                        search_exhausted = result.search_exhausted,
                        "possibility unsolved"
                    );
                }
            }

            on_progress(&BatchProgress {
                tested_possibilities,
                total_possibilities,
                solutions_found: solutions.len(),
            });
        }

        self.status = if cancelled {
            BatchStatus::Cancelled
        } else {
            BatchStatus::Completed
        };
        info!(
            status = ?self.status,
            tested_possibilities,
            solutions_found = solutions.len(),
            "batch run finished"
        );

        BatchReport {
            status: self.status,
            tested_possibilities,
            total_possibilities,
            solutions,
        }
    }
}

/// One-shot convenience wrapper around [`BatchRunner::run`].
pub fn run_batch(
    definition: &PuzzleState,
    colors: &[Color],
    config: &SolverConfig,
    on_progress: impl FnMut(&BatchProgress),
) -> BatchReport {
    BatchRunner::new().run(definition, colors, config, on_progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::is_solved;
    use crate::puzzle::{Layer, Tube};

    fn color(token: &str) -> Layer {
        Layer::Color(Color::new(token))
    }

    /// One wildcard, colors [A, B]: possibility 0 solves in one move,
    /// possibility 1 is unsolvable (one layer of each color, capacity 2).
    fn two_possibility_fixture() -> (PuzzleState, Vec<Color>) {
        let definition = PuzzleState::new(vec![
            Tube::with_layers(2, [color("A")]),
            Tube::with_layers(2, [Layer::Wildcard]),
            Tube::empty(2),
        ]);
        (definition, vec![Color::new("A"), Color::new("B")])
    }

    #[test]
    fn test_completed_run_collects_solutions() {
        let (definition, colors) = two_possibility_fixture();
        let mut runner = BatchRunner::new();

        let report = runner.run(&definition, &colors, &SolverConfig::default(), |_| {});

        assert_eq!(report.status, BatchStatus::Completed);
        assert_eq!(runner.status(), BatchStatus::Completed);
        assert_eq!(report.total_possibilities, 2);
        assert_eq!(report.tested_possibilities, 2);
        assert_eq!(report.solutions.len(), 1);

        let solution = &report.solutions[0];
        assert_eq!(solution.possibility_index, 0);
        assert!(is_solved(solution.history.states.last().unwrap()));
        assert_eq!(
            solution.history.states.len(),
            solution.moves.len() + 1
        );
    }

    #[test]
    fn test_already_solved_possibility_is_not_recorded() {
        // No wildcards, already sorted: one possibility, zero-move
        // solution, nothing to report.
        let definition = PuzzleState::new(vec![
            Tube::with_layers(2, [color("A"), color("A")]),
            Tube::empty(2),
        ]);

        let report = run_batch(&definition, &[], &SolverConfig::default(), |_| {});

        assert_eq!(report.status, BatchStatus::Completed);
        assert_eq!(report.tested_possibilities, 1);
        assert!(report.solutions.is_empty());
    }

    #[test]
    fn test_progress_counts_climb_in_order() {
        let (definition, colors) = two_possibility_fixture();
        let mut seen: Vec<(usize, usize, usize)> = Vec::new();

        run_batch(&definition, &colors, &SolverConfig::default(), |p| {
            seen.push((
                p.tested_possibilities,
                p.total_possibilities,
                p.solutions_found,
            ));
        });

        assert_eq!(seen, vec![(1, 2, 1), (2, 2, 1)]);
    }

    #[test]
    fn test_cancellation_between_possibilities() {
        let (definition, colors) = two_possibility_fixture();
        let mut runner = BatchRunner::new();
        let cancel = runner.cancel_handle();

        let report = runner.run(&definition, &colors, &SolverConfig::default(), |p| {
            // Request cancellation after the first possibility completes.
            if p.tested_possibilities == 1 {
                cancel.cancel();
            }
        });

        assert_eq!(report.status, BatchStatus::Cancelled);
        assert_eq!(report.tested_possibilities, 1);
        assert_eq!(report.total_possibilities, 2);
        assert_eq!(report.solutions.len(), 1, "earlier solutions preserved");
    }

    #[test]
    fn test_runner_rearms_after_cancelled_run() {
        let (definition, colors) = two_possibility_fixture();
        let mut runner = BatchRunner::new();
        let cancel = runner.cancel_handle();

        cancel.cancel();
        // Flag is re-armed at run start, so a stale request from before
        // the run does not apply to it.
        let report = runner.run(&definition, &colors, &SolverConfig::default(), |_| {});
        assert_eq!(report.status, BatchStatus::Completed);
        assert_eq!(report.tested_possibilities, 2);
    }

    #[test]
    fn test_new_runner_is_idle() {
        assert_eq!(BatchRunner::new().status(), BatchStatus::Idle);
    }
}
