// ---------------------------------------------------------------------------
// GrammarError: typed errors for grammar construction and derivation
// ---------------------------------------------------------------------------

use std::fmt;

use bevy::math::Vec3;

use crate::shape::ShapeId;

/// Errors surfaced by catalog lookup, table construction, node seeding,
/// and the derivation driver.
///
/// Every variant is a configuration or invariant violation; there is no
/// retry path. The residual no-match case of rule selection is *not* an
/// error (it is resolved by the table's `NoMatchPolicy`).
#[derive(Debug, Clone, PartialEq)]
pub enum GrammarError {
    /// A shape has no entry in the geometry catalog. Never silently
    /// defaulted: a zero-size bbox would corrupt all stacking math.
    UnknownShape(ShapeId),
    /// An active node's shape has no rule list in the grammar table.
    NoRulesForShape(ShapeId),
    /// A rule was authored with a probability outside `[0, 1]`.
    InvalidProbability { shape: ShapeId, probability: f64 },
    /// A shape's rule probabilities sum to more than 1: the grammar is
    /// ambiguous and is rejected at table construction.
    ProbabilitySumExceeded { shape: ShapeId, sum: f64 },
    /// A seed node was constructed with a non-positive or non-finite
    /// maximum height.
    InvalidMaxHeight(f32),
    /// A catalog entry was authored with a non-positive bbox dimension.
    InvalidBoundingBox { shape: ShapeId, size: Vec3 },
    /// A catalog entry's growth ratio is outside `[0, 1]`.
    InvalidHeightRatio { shape: ShapeId, ratio: f32 },
    /// Derivation still held active nodes after the configured iteration
    /// ceiling: runaway growth.
    IterationLimitExceeded { limit: u32, active: usize },
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::UnknownShape(shape) => {
                write!(f, "no geometry catalog entry for shape {shape:?}")
            }
            GrammarError::NoRulesForShape(shape) => {
                write!(f, "no production rules registered for shape {shape:?}")
            }
            GrammarError::InvalidProbability { shape, probability } => {
                write!(
                    f,
                    "rule probability {probability} for shape {shape:?} is outside [0, 1]"
                )
            }
            GrammarError::ProbabilitySumExceeded { shape, sum } => {
                write!(
                    f,
                    "rule probabilities for shape {shape:?} sum to {sum}, which exceeds 1"
                )
            }
            GrammarError::InvalidMaxHeight(h) => {
                write!(f, "seed max height must be positive and finite, got {h}")
            }
            GrammarError::InvalidBoundingBox { shape, size } => {
                write!(
                    f,
                    "bbox size {size} for shape {shape:?} has a non-positive dimension"
                )
            }
            GrammarError::InvalidHeightRatio { shape, ratio } => {
                write!(
                    f,
                    "height ratio {ratio} for shape {shape:?} is outside [0, 1]"
                )
            }
            GrammarError::IterationLimitExceeded { limit, active } => {
                write!(
                    f,
                    "derivation exceeded {limit} iterations with {active} nodes still active"
                )
            }
        }
    }
}

impl std::error::Error for GrammarError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_unknown_shape() {
        let err = GrammarError::UnknownShape(ShapeId::Tree);
        let msg = format!("{err}");
        assert!(msg.contains("Tree"), "got: {msg}");
        assert!(msg.contains("catalog"), "got: {msg}");
    }

    #[test]
    fn test_display_probability_sum() {
        let err = GrammarError::ProbabilitySumExceeded {
            shape: ShapeId::Park,
            sum: 1.25,
        };
        let msg = format!("{err}");
        assert!(msg.contains("1.25"), "got: {msg}");
        assert!(msg.contains("Park"), "got: {msg}");
    }

    #[test]
    fn test_display_iteration_limit() {
        let err = GrammarError::IterationLimitExceeded {
            limit: 256,
            active: 3,
        };
        let msg = format!("{err}");
        assert!(msg.contains("256"), "got: {msg}");
        assert!(msg.contains("3 nodes"), "got: {msg}");
    }

    #[test]
    fn test_is_error_trait() {
        let err = GrammarError::InvalidMaxHeight(-1.0);
        let _: &dyn std::error::Error = &err;
        assert!(format!("{err}").contains("-1"));
    }
}
