//! Numeric policy constants for the production library and driver.
//!
//! These are the knobs that decide how generated blocks look. They are
//! deliberately plain constants rather than runtime configuration: the
//! grammar is a fixed, hand-authored table and its geometry only makes
//! sense with these values tuned together.

/// A lineage's canonical footprint is `max_height / FOOTPRINT_HEIGHT_DIVISOR`
/// on both horizontal axes. Taller buildings get proportionally wider bases.
pub const FOOTPRINT_HEIGHT_DIVISOR: f32 = 3.0;

/// Lower bound of the footprint subdivision split ratio.
pub const SPLIT_RATIO_MIN: f32 = 0.2;

/// Upper bound of the footprint subdivision split ratio. The range is
/// symmetric around 0.5 so neither partition degenerates to a sliver.
pub const SPLIT_RATIO_MAX: f32 = 0.8;

/// Fraction of the parent extent kept clear between the two subdivision
/// partitions so they never sit exactly edge to edge.
pub const SUBDIVIDE_INSET: f32 = 0.1;

/// Horizontal shrink factor applied by the skyscraper taper production.
pub const TAPER_FACTOR: f32 = 0.9;

/// Magnitude bound for per-node color offsets; each component is drawn
/// uniformly from `[-COLOR_OFFSET_MAX, COLOR_OFFSET_MAX]`.
pub const COLOR_OFFSET_MAX: f32 = 0.25;

/// Default ceiling on derivation iterations. A derivation still holding
/// active nodes past this count is treated as runaway growth and surfaced
/// as an error, never silently truncated.
pub const MAX_DERIVATION_ITERATIONS: u32 = 256;

/// Slack allowed when validating that a shape's rule probabilities sum to
/// at most 1. An authored list intending exactly 1.0 (e.g. 0.95 + 0.05)
/// can land one ulp above it in floating point; anything further over is a
/// misauthored grammar.
pub const PROBABILITY_SUM_EPSILON: f64 = 1e-9;
