//! Solver library for water-sort tube puzzles.
//!
//! This crate models capacity-bounded tubes of colored layers and finds
//! minimal pour sequences that sort them. Puzzle definitions may contain
//! wildcard layers; the expander resolves them into every concrete
//! possibility and the batch runner solves each one with cooperative
//! cancellation and progress reporting. It consumes the JSON format
//! exported by the TypeScript puzzle editor.

pub mod batch;
pub mod engine;
pub mod expand;
pub mod puzzle;
pub mod solver;

// Re-export main types
pub use batch::{
    run_batch, BatchProgress, BatchReport, BatchRunner, BatchSolution, BatchStatus, CancelHandle,
};
pub use engine::{can_pour, is_solved, pour_once, replay};
pub use expand::{expand_wildcards, possibility_count, wildcard_positions};
pub use puzzle::{
    Color, History, Layer, Move, PuzzleError, PuzzleFile, PuzzleState, StateKey, Tube,
};
pub use solver::{solve, SolveResult, SolverConfig};
