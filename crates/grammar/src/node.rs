//! The geometric production unit the rule engine rewrites.

use bevy::math::Vec3;
use rand::Rng;

use crate::config::COLOR_OFFSET_MAX;
use crate::error::GrammarError;
use crate::shape::ShapeId;

/// One geometric production unit: a shape symbol plus the transform and
/// lineage bookkeeping the productions read and write.
///
/// `terminated` is private so the flag is one-way: once a production
/// retires a node it can never be handed back to the rule engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Key into the geometry catalog (and the grammar table while active).
    pub shape: ShapeId,
    pub position: Vec3,
    /// Euler angles in radians; yaw is the Y component.
    pub rotation: Vec3,
    pub scale: Vec3,
    /// Ceiling on the lineage's vertical growth. Fixed at the lineage root
    /// and copied unchanged to every descendant.
    pub max_height: f32,
    /// Derivation step at which this node was produced (0 for seeds).
    pub iteration: u32,
    /// Per-node render tint variation; carried through derivation, only
    /// regenerated when a production asks for fresh variation.
    pub color_offset: Vec3,
    terminated: bool,
}

impl Node {
    /// Create a lineage root at `position` with unit scale.
    ///
    /// A malformed seed must not propagate through derivation, so a
    /// non-positive or non-finite `max_height` is rejected here.
    pub fn seed(shape: ShapeId, position: Vec3, max_height: f32) -> Result<Self, GrammarError> {
        if !max_height.is_finite() || max_height <= 0.0 {
            return Err(GrammarError::InvalidMaxHeight(max_height));
        }
        Ok(Self {
            shape,
            position,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            max_height,
            iteration: 0,
            color_offset: Vec3::ZERO,
            terminated: false,
        })
    }

    /// Whether this node has been retired from derivation. Terminated
    /// nodes stay in the final scene but are never rewritten again.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Retire this node from derivation. One-way.
    pub fn terminate(&mut self) {
        self.terminated = true;
    }

    /// Draw a fresh color offset, one uniform component per channel in
    /// `[-COLOR_OFFSET_MAX, COLOR_OFFSET_MAX]`.
    pub fn regenerate_color_offset<R: Rng>(&mut self, rng: &mut R) {
        self.color_offset = Vec3::new(
            rng.gen_range(-COLOR_OFFSET_MAX..COLOR_OFFSET_MAX),
            rng.gen_range(-COLOR_OFFSET_MAX..COLOR_OFFSET_MAX),
            rng.gen_range(-COLOR_OFFSET_MAX..COLOR_OFFSET_MAX),
        );
    }
}
