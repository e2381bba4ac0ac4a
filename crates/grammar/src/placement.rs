//! Geometric placement primitives shared by every production.

use bevy::math::Vec3;

use crate::catalog::ShapeCatalog;
use crate::error::GrammarError;
use crate::node::Node;
use crate::shape::ShapeId;

/// A node's world-space bounding box size: the catalog's unscaled bbox for
/// its shape, component-wise multiplied by the node's scale.
pub fn effective_bbox(node: &Node, catalog: &ShapeCatalog) -> Result<Vec3, GrammarError> {
    Ok(catalog.size(node.shape)? * node.scale)
}

/// The single construction path for every successor node in the
/// production library.
///
/// Position, rotation, and scale are copied by value; `max_height` and
/// `color_offset` carry through unchanged; `iteration` is the step the
/// production is running at, never derived from the parent's stored value.
/// The result is active; productions adjust its transform (and possibly
/// terminate it) afterwards.
pub fn derive_node(parent: &Node, shape: ShapeId, iteration: u32) -> Node {
    let mut child = parent.clone();
    child.shape = shape;
    child.iteration = iteration;
    child
}
