//! The production library: every rewrite the grammar can apply to a node.
//!
//! Each production consumes its input node and returns a [`Successors`]
//! value whose arity and roles are fixed by the variant, so the driver
//! never sees an untyped bag of nodes. All stochastic draws come from the
//! caller-supplied RNG; there is no ambient randomness.

use std::f32::consts::{FRAC_PI_2, TAU};

use rand::Rng;

use crate::catalog::ShapeCatalog;
use crate::config::{
    FOOTPRINT_HEIGHT_DIVISOR, SPLIT_RATIO_MAX, SPLIT_RATIO_MIN, SUBDIVIDE_INSET,
};
use crate::error::GrammarError;
use crate::node::Node;
use crate::placement::{derive_node, effective_bbox};
use crate::shape::ShapeId;

// ---------------------------------------------------------------------------
// Successors
// ---------------------------------------------------------------------------

/// Typed result of applying one production to one node.
///
/// A successor set only ever contains the input node and/or freshly
/// derived siblings; the variant makes the arity and the fate of the
/// input explicit.
#[derive(Debug, Clone, PartialEq)]
pub enum Successors {
    /// The input node, terminated in place, with no new growth.
    Terminal(Node),
    /// The input node was consumed; one fresh successor replaces it.
    Replaced(Node),
    /// The input node (kept active or retired) plus one new sibling.
    Pair(Node, Node),
    /// The input node was consumed; two fresh siblings partition it.
    Split(Node, Node),
}

impl Successors {
    /// The contained nodes, in production order.
    pub fn into_nodes(self) -> impl Iterator<Item = Node> {
        let (first, second) = match self {
            Successors::Terminal(n) | Successors::Replaced(n) => (n, None),
            Successors::Pair(a, b) | Successors::Split(a, b) => (a, Some(b)),
        };
        std::iter::once(first).chain(second)
    }

    /// Number of nodes in the set (1 or 2).
    pub fn len(&self) -> usize {
        match self {
            Successors::Terminal(_) | Successors::Replaced(_) => 1,
            Successors::Pair(..) | Successors::Split(..) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// ProductionKind
// ---------------------------------------------------------------------------

/// The concrete productions the grammar table can reference.
///
/// Shape parameters live here rather than in per-archetype function
/// clones, so apartment and skyscraper share one grow/cap implementation
/// and only their rule tables differ.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProductionKind {
    /// Retire the node with no successors.
    Terminate,
    /// Stack another floor, or cap with a roof once the lineage has
    /// reached its growth threshold.
    GrowOrCap { floor: ShapeId, roof: ShapeId },
    /// Partition an apartment ground floor into two footprints.
    SubdivideFootprint { floor: ShapeId },
    /// Swap a skyscraper ground floor for the scaled-up tower base.
    RescaleBase { floor: ShapeId },
    /// Stack a floor shrunk horizontally by `factor`, stepping the tower
    /// profile inwards.
    Taper { floor: ShapeId, factor: f32 },
    /// Drop a prop somewhere on the node's top surface; the node itself
    /// stays active for further scattering.
    Scatter { prop: ShapeId },
}

impl ProductionKind {
    /// Apply this production to `node` at derivation step `iteration`.
    ///
    /// The caller must never hand in a terminated node.
    pub fn apply<R: Rng>(
        &self,
        node: Node,
        iteration: u32,
        catalog: &ShapeCatalog,
        rng: &mut R,
    ) -> Result<Successors, GrammarError> {
        debug_assert!(
            !node.is_terminated(),
            "terminated node {:?} handed to a production",
            node.shape
        );
        match *self {
            ProductionKind::Terminate => terminate(node),
            ProductionKind::GrowOrCap { floor, roof } => {
                grow_or_cap(node, iteration, catalog, floor, roof)
            }
            ProductionKind::SubdivideFootprint { floor } => {
                subdivide_footprint(node, iteration, catalog, rng, floor)
            }
            ProductionKind::RescaleBase { floor } => rescale_base(node, iteration, floor),
            ProductionKind::Taper { floor, factor } => {
                taper(node, iteration, catalog, floor, factor)
            }
            ProductionKind::Scatter { prop } => scatter(node, iteration, catalog, rng, prop),
        }
    }
}

// ---------------------------------------------------------------------------
// Production bodies
// ---------------------------------------------------------------------------

fn terminate(mut node: Node) -> Result<Successors, GrammarError> {
    node.terminate();
    Ok(Successors::Terminal(node))
}

/// Vertical growth with capping. The threshold reads the *pre-growth*
/// position: a floor whose top will pass `max_height` still grows one more
/// step, and capping fires on the next iteration.
fn grow_or_cap(
    mut node: Node,
    iteration: u32,
    catalog: &ShapeCatalog,
    floor: ShapeId,
    roof: ShapeId,
) -> Result<Successors, GrammarError> {
    let ratio = catalog.height_ratio(node.shape)?;
    node.terminate();
    let node_box = effective_bbox(&node, catalog)?;

    if node.position.y > node.max_height * ratio {
        // Cap: the roof's base sits flush on the floor's top face.
        let mut cap = derive_node(&node, roof, iteration);
        let roof_box = effective_bbox(&cap, catalog)?;
        cap.position.y += node_box.y / 2.0 + roof_box.y / 2.0;
        cap.terminate();
        Ok(Successors::Pair(node, cap))
    } else {
        // Grow: stack the next floor with no gap and no overlap.
        let mut next = derive_node(&node, floor, iteration);
        next.position.y += node_box.y;
        Ok(Successors::Pair(node, next))
    }
}

/// Horizontal axes a footprint can be split along.
#[derive(Clone, Copy)]
enum SplitAxis {
    X,
    Z,
}

impl SplitAxis {
    fn index(self) -> usize {
        match self {
            SplitAxis::X => 0,
            SplitAxis::Z => 2,
        }
    }

    fn other(self) -> SplitAxis {
        match self {
            SplitAxis::X => SplitAxis::Z,
            SplitAxis::Z => SplitAxis::X,
        }
    }
}

/// Partition a ground floor into a "big" and a "little" footprint.
///
/// The footprint is first rescaled to the lineage's canonical size and
/// given a random cardinal yaw (inherited by both children), then split at
/// a random ratio along a random horizontal axis. The little partition is
/// jittered along the other axis and pulled back by a small inset so the
/// two volumes never coincide edge to edge. The input node is consumed.
fn subdivide_footprint<R: Rng>(
    mut node: Node,
    iteration: u32,
    catalog: &ShapeCatalog,
    rng: &mut R,
    floor: ShapeId,
) -> Result<Successors, GrammarError> {
    let footprint = node.max_height / FOOTPRINT_HEIGHT_DIVISOR;
    node.scale.x = footprint;
    node.scale.z = footprint;

    let quarter_turns = rng.gen_range(0..4);
    node.rotation.y += quarter_turns as f32 * FRAC_PI_2;

    let mut big = derive_node(&node, floor, iteration);
    let mut little = derive_node(&node, floor, iteration);
    let node_box = effective_bbox(&node, catalog)?;

    let a = if rng.gen::<f32>() > 0.5 {
        SplitAxis::X
    } else {
        SplitAxis::Z
    };
    let b = a.other();
    let (ai, bi) = (a.index(), b.index());

    let s = rng.gen_range(SPLIT_RATIO_MIN..SPLIT_RATIO_MAX);

    big.scale[bi] *= s;
    big.position[bi] += node_box[bi] / 2.0 * s;

    little.scale[ai] *= s;
    little.scale[bi] *= 1.0 - s;
    little.position[ai] += node_box[ai] / 2.0 * (1.0 - s) * rng.gen::<f32>();
    little.position[bi] -= node_box[bi] / 2.0 * (1.0 - s - SUBDIVIDE_INSET);

    Ok(Successors::Split(big, little))
}

/// Swap the skyscraper seed marker for the tower base, scaled out to the
/// lineage's canonical footprint. The input node is consumed.
fn rescale_base(node: Node, iteration: u32, floor: ShapeId) -> Result<Successors, GrammarError> {
    let mut base = derive_node(&node, floor, iteration);
    let footprint = node.max_height / FOOTPRINT_HEIGHT_DIVISOR;
    base.scale.x *= footprint;
    base.scale.z *= footprint;
    Ok(Successors::Replaced(base))
}

/// Stack the next floor shrunk horizontally, stepping the tower inwards.
fn taper(
    mut node: Node,
    iteration: u32,
    catalog: &ShapeCatalog,
    floor: ShapeId,
    factor: f32,
) -> Result<Successors, GrammarError> {
    node.terminate();
    let node_box = effective_bbox(&node, catalog)?;
    let mut next = derive_node(&node, floor, iteration);
    next.position.y += node_box.y;
    next.scale.x *= factor;
    next.scale.z *= factor;
    Ok(Successors::Pair(node, next))
}

/// Drop a unit-scale prop on the node's surface, offset by at most half
/// the node's horizontal extents on each axis, with a random yaw and a
/// fresh color offset. The prop is terminal; the node stays active so
/// scattering repeats across iterations.
fn scatter<R: Rng>(
    node: Node,
    iteration: u32,
    catalog: &ShapeCatalog,
    rng: &mut R,
    prop: ShapeId,
) -> Result<Successors, GrammarError> {
    let mut placed = derive_node(&node, prop, iteration);
    placed.scale = bevy::math::Vec3::ONE;
    placed.regenerate_color_offset(rng);

    let node_box = effective_bbox(&node, catalog)?;
    let prop_box = effective_bbox(&placed, catalog)?;

    placed.position.y += prop_box.y / 2.0;
    placed.position.x += (rng.gen::<f32>() * 2.0 - 1.0) * node_box.x / 2.0;
    placed.position.z += (rng.gen::<f32>() * 2.0 - 1.0) * node_box.z / 2.0;
    placed.rotation.y += rng.gen::<f32>() * TAU;
    placed.terminate();

    Ok(Successors::Pair(node, placed))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
