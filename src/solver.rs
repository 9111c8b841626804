//! Breadth-first solver over the pour-move transition graph.
//!
//! Every move costs 1, so BFS finds a minimal-length solution: the first
//! solved state dequeued (or generated) cannot be beaten by any path found
//! later. The search is bounded by a node budget rather than wall-clock
//! time, which keeps results deterministic.

use std::collections::{HashSet, VecDeque};
use std::time::Instant;

use tracing::debug;

use crate::engine::{is_solved, pour_once};
use crate::puzzle::{Move, PuzzleState, StateKey};

/// Configuration for one solve call.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Search budget, measured in dequeued search nodes (not generated
    /// moves).
    pub max_steps: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { max_steps: 2000 }
    }
}

/// Result of one solve call.
///
/// `moves` is `Some` with the minimal solving sequence (empty for an
/// already-solved input) or `None` when no solution was found.
/// `search_exhausted` disambiguates the `None` case: `true` means the
/// frontier emptied, proving the puzzle unsolvable under the move rules;
/// `false` means the node budget stopped the search first.
#[derive(Debug, Clone)]
pub struct SolveResult {
    pub moves: Option<Vec<Move>>,
    pub search_exhausted: bool,
    pub nodes_expanded: usize,
    pub time_elapsed_ms: u64,
}

/// One frontier entry: a reached state and the move path that produced it.
#[derive(Debug, Clone)]
struct SearchNode {
    state: PuzzleState,
    path: Vec<Move>,
}

/// Find a minimal-length solution for a wildcard-free puzzle state.
///
/// Wildcards in `initial` are a caller bug (resolve them through the
/// expander first) and trip the engine's debug assertions.
pub fn solve(initial: &PuzzleState, config: &SolverConfig) -> SolveResult {
    let start_time = Instant::now();

    if is_solved(initial) {
        return SolveResult {
            moves: Some(Vec::new()),
            search_exhausted: false,
            nodes_expanded: 0,
            time_elapsed_ms: elapsed_ms(start_time),
        };
    }

    let mut visited: HashSet<StateKey> = HashSet::new();
    visited.insert(initial.canonical_key());

    let mut frontier: VecDeque<SearchNode> = VecDeque::new();
    frontier.push_back(SearchNode {
        state: initial.clone(),
        path: Vec::new(),
    });

    let mut nodes_expanded = 0usize;

    while let Some(node) = frontier.pop_front() {
        if nodes_expanded >= config.max_steps {
            debug!(nodes_expanded, "solve budget reached without a solution");
            return SolveResult {
                moves: None,
                search_exhausted: false,
                nodes_expanded,
                time_elapsed_ms: elapsed_ms(start_time),
            };
        }
        nodes_expanded += 1;

        let n = node.state.tube_count();
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let Some(next_state) = pour_once(&node.state, i, j) else {
                    continue;
                };
                if !visited.insert(next_state.canonical_key()) {
                    continue;
                }

                let mut path = node.path.clone();
                path.push(Move::new(i, j));

                if is_solved(&next_state) {
                    debug!(
                        nodes_expanded,
                        solution_len = path.len(),
                        "solution found"
                    );
                    return SolveResult {
                        moves: Some(path),
                        search_exhausted: false,
                        nodes_expanded,
                        time_elapsed_ms: elapsed_ms(start_time),
                    };
                }

                frontier.push_back(SearchNode {
                    state: next_state,
                    path,
                });
            }
        }
    }

    debug!(nodes_expanded, "search space exhausted without a solution");
    SolveResult {
        moves: None,
        search_exhausted: true,
        nodes_expanded,
        time_elapsed_ms: elapsed_ms(start_time),
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
