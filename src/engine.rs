//! Pure pour-move transition engine.
//!
//! Every function here takes wildcard-free input: wildcards are a
//! definition-time construct and must be resolved by the expander before a
//! state reaches the engine. Illegal or no-op pours are normal occurrences
//! during search and are reported as `None`, never as errors.

use crate::puzzle::{History, Layer, Move, PuzzleState, Tube};

/// Check whether pouring from `from` into `to` is legal: `from` must be
/// non-empty, `to` must have free space, and `to` must be empty or share
/// `from`'s top color.
pub fn can_pour(from: &Tube, to: &Tube) -> bool {
    debug_assert!(
        !from.contains_wildcard() && !to.contains_wildcard(),
        "wildcard layer reached the move engine"
    );

    let Some(from_top) = from.top() else {
        return false;
    };
    if to.is_full() {
        return false;
    }
    match to.top() {
        None => true,
        Some(to_top) => from_top == to_top,
    }
}

/// Apply one pour move, transferring the top-color run of `from_idx` into
/// `to_idx` up to the destination's free space. Returns `None` (no effect,
/// no error) when `from_idx == to_idx` or the pour is illegal; otherwise a
/// new independent snapshot, leaving `state` untouched.
///
/// Tube indices out of range are a caller bug and panic.
pub fn pour_once(state: &PuzzleState, from_idx: usize, to_idx: usize) -> Option<PuzzleState> {
    if from_idx == to_idx {
        return None;
    }
    if !can_pour(&state.tubes[from_idx], &state.tubes[to_idx]) {
        return None;
    }

    let mut next = state.clone();
    let run = next.tubes[from_idx].top_run();
    let free = next.tubes[to_idx].free_space();
    let count = run.min(free);

    for _ in 0..count {
        let layer = next.tubes[from_idx]
            .layers
            .pop()
            .expect("top run counted on a non-empty tube");
        next.tubes[to_idx].layers.push(layer);
    }

    Some(next)
}

/// A state is solved when every tube is either empty or full of a single
/// concrete color. A tube containing a wildcard is never solved.
pub fn is_solved(state: &PuzzleState) -> bool {
    debug_assert!(
        !state.contains_wildcard(),
        "wildcard layer reached the move engine"
    );

    state.tubes.iter().all(|tube| {
        if tube.is_empty() {
            return true;
        }
        if !tube.is_full() {
            return false;
        }
        match &tube.layers[0] {
            Layer::Wildcard => false,
            bottom => tube.layers.iter().all(|layer| layer == bottom),
        }
    })
}

/// Reconstruct the full step-by-step history of a move sequence by folding
/// `pour_once` from a clone of `initial`. Returns `None` if any move in
/// the sequence is illegal for the state it is applied to.
pub fn replay(initial: &PuzzleState, moves: &[Move]) -> Option<History> {
    let mut states = Vec::with_capacity(moves.len() + 1);
    states.push(initial.clone());

    for mv in moves {
        let next = pour_once(states.last().unwrap(), mv.from, mv.to)?;
        states.push(next);
    }

    Some(History {
        states,
        moves: moves.to_vec(),
    })
}
