//! Puzzle representation types that match the TypeScript JSON format.
//!
//! These types deserialize directly from the JSON exported by the
//! TypeScript puzzle editor: layers are plain strings (a color token such
//! as `"#28CF99"`, or `"?"` for a wildcard slot).

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Wildcard token used in the JSON layer encoding.
pub const WILDCARD_TOKEN: &str = "?";

/// A concrete color identifier. The original editor uses CSS hex strings;
/// the solver treats the token as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One layer slot in a tube: either a concrete color or the wildcard
/// placeholder. Wildcards are only valid in a puzzle definition; they must
/// be resolved by the expander before a state reaches the move engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Layer {
    Color(Color),
    Wildcard,
}

impl Layer {
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Layer::Wildcard)
    }

    pub fn color(&self) -> Option<&Color> {
        match self {
            Layer::Color(c) => Some(c),
            Layer::Wildcard => None,
        }
    }
}

impl From<String> for Layer {
    fn from(token: String) -> Self {
        if token == WILDCARD_TOKEN {
            Layer::Wildcard
        } else {
            Layer::Color(Color(token))
        }
    }
}

impl From<Layer> for String {
    fn from(layer: Layer) -> Self {
        match layer {
            Layer::Color(c) => c.0,
            Layer::Wildcard => WILDCARD_TOKEN.to_string(),
        }
    }
}

impl From<Color> for Layer {
    fn from(color: Color) -> Self {
        Layer::Color(color)
    }
}

/// Layer stacks are short (capacity 4 in the original game), so they live
/// inline unless a puzzle uses unusually tall tubes.
pub type LayerStack = SmallVec<[Layer; 8]>;

/// A capacity-bounded stack of color layers. Index 0 is the bottom of the
/// tube, the last index is the top.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tube {
    pub capacity: usize,
    pub layers: LayerStack,
}

impl Tube {
    /// Create an empty tube with the given capacity.
    pub fn empty(capacity: usize) -> Self {
        Self {
            capacity,
            layers: SmallVec::new(),
        }
    }

    /// Create a tube from bottom-to-top layers.
    pub fn with_layers(capacity: usize, layers: impl IntoIterator<Item = Layer>) -> Self {
        Self {
            capacity,
            layers: layers.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.layers.len() == self.capacity
    }

    /// Number of additional layers this tube can hold.
    pub fn free_space(&self) -> usize {
        self.capacity - self.layers.len()
    }

    /// The topmost layer, if any.
    pub fn top(&self) -> Option<&Layer> {
        self.layers.last()
    }

    /// Length of the maximal run of the top layer's color, scanning
    /// downward until a different layer or the bottom is reached.
    pub fn top_run(&self) -> usize {
        match self.top() {
            None => 0,
            Some(top) => self
                .layers
                .iter()
                .rev()
                .take_while(|layer| *layer == top)
                .count(),
        }
    }

    pub fn contains_wildcard(&self) -> bool {
        self.layers.iter().any(Layer::is_wildcard)
    }
}

/// A snapshot of the whole puzzle. Tube identity is positional: index order
/// is fixed for a given puzzle and defines the move address space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PuzzleState {
    pub tubes: Vec<Tube>,
}

impl PuzzleState {
    pub fn new(tubes: Vec<Tube>) -> Self {
        Self { tubes }
    }

    pub fn tube_count(&self) -> usize {
        self.tubes.len()
    }

    pub fn contains_wildcard(&self) -> bool {
        self.tubes.iter().any(Tube::contains_wildcard)
    }

    /// Canonical deduplication key: equal for two states iff they have the
    /// same tube count and, per tube in index order, the same capacity and
    /// layer sequence.
    pub fn canonical_key(&self) -> StateKey {
        StateKey(self.tubes.clone().into_boxed_slice())
    }
}

/// Structural state key used by the solver's visited set. Hash and equality
/// cover exactly what `canonical_key` promises: tube order, capacities and
/// full layer sequences.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey(Box<[Tube]>);

/// One pour action: an ordered (source, destination) pair of tube indices
/// into a specific state's tube sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: usize,
    pub to: usize,
}

impl Move {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }
}

/// Replay record for a solved possibility: state 0 is the initial state,
/// state k the result of applying moves 0..k-1. Used for inspection only;
/// the solver never consumes it.
#[derive(Debug, Clone, Serialize)]
pub struct History {
    pub states: Vec<PuzzleState>,
    pub moves: Vec<Move>,
}

/// Errors raised while loading or validating a puzzle definition.
#[derive(Debug, Error)]
pub enum PuzzleError {
    #[error("tube {index} has zero capacity")]
    ZeroCapacity { index: usize },

    #[error("tube {index} holds {len} layers but its capacity is {capacity}")]
    Overfilled {
        index: usize,
        len: usize,
        capacity: usize,
    },

    #[error("definition contains wildcards but no available colors were given")]
    NoColorsForWildcards,

    #[error("color \"{color}\" is used {count} times but the maximum is {max}")]
    ColorOverused { color: Color, count: usize, max: usize },

    #[error(
        "color \"{color}\" is used {count} times but needs {max}; \
         {missing} wildcards required, only {available} left"
    )]
    WildcardShortfall {
        color: Color,
        count: usize,
        max: usize,
        missing: usize,
        available: usize,
    },
}

/// On-disk puzzle definition, matching the TypeScript editor's export
/// format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuzzleFile {
    pub tube_capacity: usize,
    pub available_colors: Vec<Color>,
    pub tubes: Vec<Tube>,
}

impl PuzzleFile {
    /// Validate the definition and split it into the state to expand and
    /// the color list to expand with.
    pub fn into_parts(self) -> Result<(PuzzleState, Vec<Color>), PuzzleError> {
        let state = PuzzleState::new(self.tubes);

        for (index, tube) in state.tubes.iter().enumerate() {
            if tube.capacity == 0 {
                return Err(PuzzleError::ZeroCapacity { index });
            }
            if tube.layers.len() > tube.capacity {
                return Err(PuzzleError::Overfilled {
                    index,
                    len: tube.layers.len(),
                    capacity: tube.capacity,
                });
            }
        }

        if state.contains_wildcard() && self.available_colors.is_empty() {
            return Err(PuzzleError::NoColorsForWildcards);
        }

        check_color_counts(&state, self.tube_capacity)?;

        Ok((state, self.available_colors))
    }
}

/// Satisfiability check mirroring the original editor: every concrete color
/// must be completable to a full tube. A color used more than
/// `tube_capacity` times can never form a single uniform tube; one used
/// fewer times consumes wildcards from the shared budget, checked in
/// first-appearance order.
///
/// The check assumes uniform tube capacities and measures every color
/// against the file-level `tube_capacity`, as the editor does. Definitions
/// with heterogeneous per-tube capacities (which the engine and solver
/// handle fine) may be mis-judged here; build those through `PuzzleState`
/// directly.
fn check_color_counts(state: &PuzzleState, tube_capacity: usize) -> Result<(), PuzzleError> {
    let mut counts: Vec<(&Color, usize)> = Vec::new();
    let mut wildcards = 0usize;

    for tube in &state.tubes {
        for layer in &tube.layers {
            match layer {
                Layer::Wildcard => wildcards += 1,
                Layer::Color(color) => match counts.iter_mut().find(|(c, _)| *c == color) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((color, 1)),
                },
            }
        }
    }

    for (color, count) in counts {
        if count > tube_capacity {
            return Err(PuzzleError::ColorOverused {
                color: color.clone(),
                count,
                max: tube_capacity,
            });
        }
        let missing = tube_capacity - count;
        if missing > 0 {
            if wildcards < missing {
                return Err(PuzzleError::WildcardShortfall {
                    color: color.clone(),
                    count,
                    max: tube_capacity,
                    missing,
                    available: wildcards,
                });
            }
            wildcards -= missing;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(token: &str) -> Layer {
        Layer::Color(Color::new(token))
    }

    #[test]
    fn test_layer_roundtrip_through_strings() {
        assert_eq!(Layer::from("?".to_string()), Layer::Wildcard);
        assert_eq!(Layer::from("#FF0000".to_string()), color("#FF0000"));
        assert_eq!(String::from(Layer::Wildcard), "?");
        assert_eq!(String::from(color("#FF0000")), "#FF0000");
    }

    #[test]
    fn test_top_run() {
        let tube = Tube::with_layers(4, [color("A"), color("B"), color("B"), color("B")]);
        assert_eq!(tube.top_run(), 3);

        let uniform = Tube::with_layers(4, [color("A"), color("A")]);
        assert_eq!(uniform.top_run(), 2);

        assert_eq!(Tube::empty(4).top_run(), 0);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = PuzzleState::new(vec![Tube::with_layers(4, [color("A"), color("B")])]);
        let mut cloned = original.clone();
        cloned.tubes[0].layers.pop();

        assert_eq!(original.tubes[0].layers.len(), 2);
        assert_eq!(cloned.tubes[0].layers.len(), 1);
    }

    #[test]
    fn test_canonical_key_distinguishes_capacity() {
        let a = PuzzleState::new(vec![Tube::with_layers(4, [color("A")])]);
        let b = PuzzleState::new(vec![Tube::with_layers(5, [color("A")])]);

        assert_ne!(a.canonical_key(), b.canonical_key());
        assert_eq!(a.canonical_key(), a.clone().canonical_key());
    }

    #[test]
    fn test_puzzle_file_json_shape() {
        let json = r##"{
            "tubeCapacity": 4,
            "availableColors": ["#CFCECD", "#28CF99"],
            "tubes": [
                { "capacity": 4, "layers": ["#CFCECD", "?"] },
                { "capacity": 4, "layers": [] }
            ]
        }"##;

        let file: PuzzleFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.tube_capacity, 4);
        assert_eq!(file.available_colors.len(), 2);
        assert_eq!(file.available_colors[0].as_str(), "#CFCECD");
        assert_eq!(file.tubes[0].layers[0], color("#CFCECD"));
        assert_eq!(file.tubes[0].layers[1], Layer::Wildcard);
    }

    #[test]
    fn test_into_parts_rejects_overfilled_tube() {
        let file = PuzzleFile {
            tube_capacity: 4,
            available_colors: vec![],
            tubes: vec![Tube::with_layers(1, [color("A"), color("A")])],
        };

        assert!(matches!(
            file.into_parts(),
            Err(PuzzleError::Overfilled {
                index: 0,
                len: 2,
                capacity: 1
            })
        ));
    }

    #[test]
    fn test_into_parts_rejects_wildcards_without_colors() {
        let file = PuzzleFile {
            tube_capacity: 4,
            available_colors: vec![],
            tubes: vec![Tube::with_layers(4, [Layer::Wildcard])],
        };

        assert!(matches!(
            file.into_parts(),
            Err(PuzzleError::NoColorsForWildcards)
        ));
    }

    #[test]
    fn test_into_parts_checks_wildcard_budget() {
        // Color "A" appears once, so 3 wildcards are needed to complete it,
        // but only 1 is present.
        let file = PuzzleFile {
            tube_capacity: 4,
            available_colors: vec![Color::new("A")],
            tubes: vec![Tube::with_layers(4, [color("A"), Layer::Wildcard])],
        };

        assert!(matches!(
            file.into_parts(),
            Err(PuzzleError::WildcardShortfall {
                missing: 3,
                available: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_into_parts_accepts_satisfiable_definition() {
        let file = PuzzleFile {
            tube_capacity: 2,
            available_colors: vec![Color::new("A"), Color::new("B")],
            tubes: vec![
                Tube::with_layers(2, [color("A"), color("A")]),
                Tube::with_layers(2, [color("B"), Layer::Wildcard]),
                Tube::empty(2),
            ],
        };

        let (state, colors) = file.into_parts().unwrap();
        assert_eq!(state.tube_count(), 3);
        assert_eq!(colors.len(), 2);
    }
}
