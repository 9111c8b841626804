//! Combinatorial wildcard expansion.
//!
//! A puzzle definition may leave layers as wildcards; before solving, each
//! wildcard must be assigned one of the available concrete colors. The
//! expander emits the full Cartesian product of assignments, so output
//! size is exactly `colors^wildcards` and grows fast: callers bound the
//! wildcard count and color list before invoking it (see
//! [`possibility_count`]).

use crate::puzzle::{Color, Layer, PuzzleState};

/// Positions of every wildcard layer as (tube index, layer index) pairs,
/// in tube-major scan order. This order fixes the meaning of possibility
/// indices reported downstream.
pub fn wildcard_positions(state: &PuzzleState) -> Vec<(usize, usize)> {
    let mut positions = Vec::new();
    for (tube_idx, tube) in state.tubes.iter().enumerate() {
        for (layer_idx, layer) in tube.layers.iter().enumerate() {
            if layer.is_wildcard() {
                positions.push((tube_idx, layer_idx));
            }
        }
    }
    positions
}

/// Checked `colors^wildcards`; `None` on overflow.
pub fn possibility_count(wildcards: usize, colors: usize) -> Option<usize> {
    let mut total = 1usize;
    for _ in 0..wildcards {
        total = total.checked_mul(colors)?;
    }
    Some(total)
}

/// Expand a definition into every fully concrete possibility.
///
/// Output ordering is lexicographic over (wildcard scan order, color list
/// order): the possibility at flat index `k` assigns each wildcard the
/// color whose list index is the corresponding base-`colors.len()` digit
/// of `k`, most significant digit first. A definition without wildcards
/// expands to a single independent clone.
pub fn expand_wildcards(definition: &PuzzleState, colors: &[Color]) -> Vec<PuzzleState> {
    let positions = wildcard_positions(definition);
    if positions.is_empty() {
        return vec![definition.clone()];
    }
    assert!(
        !colors.is_empty(),
        "wildcard expansion requires at least one available color"
    );

    let mut possibilities =
        Vec::with_capacity(possibility_count(positions.len(), colors.len()).unwrap_or(0));
    assign_from(definition.clone(), &positions, colors, &mut possibilities);
    possibilities
}

/// Branch on the next unassigned wildcard. Each branch receives its own
/// clone of the partially assigned state, so no backtracking reset is
/// needed and branches cannot alias each other.
fn assign_from(
    state: PuzzleState,
    remaining: &[(usize, usize)],
    colors: &[Color],
    out: &mut Vec<PuzzleState>,
) {
    let Some(&(tube_idx, layer_idx)) = remaining.first() else {
        out.push(state);
        return;
    };

    for color in colors {
        let mut branch = state.clone();
        branch.tubes[tube_idx].layers[layer_idx] = Layer::Color(color.clone());
        assign_from(branch, &remaining[1..], colors, out);
    }
}
