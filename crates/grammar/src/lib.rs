//! Shape-grammar engine for generative architecture.
//!
//! Grows a scene of architectural building blocks (stacked floors, roofs,
//! subdivided footprints, scattered props) by repeatedly applying
//! stochastic production rules to active geometric nodes. Three authored
//! archetypes ship in [`GrammarTable::standard`]: apartment blocks,
//! skyscrapers, and parks.
//!
//! The engine is pure with respect to shared state: productions read the
//! immutable grammar table and geometry catalog and write only freshly
//! allocated nodes, with all randomness drawn from a caller-supplied
//! stream.

use bevy::prelude::*;

pub mod catalog;
pub mod config;
pub mod derivation;
pub mod error;
pub mod grammar_rng;
pub mod node;
pub mod placement;
pub mod productions;
pub mod rules;
pub mod shape;

pub use catalog::{ShapeCatalog, ShapeEntry};
pub use derivation::{Derivation, DerivationConfig, DerivedScene};
pub use error::GrammarError;
pub use grammar_rng::GrammarRng;
pub use node::Node;
pub use placement::{derive_node, effective_bbox};
pub use productions::{ProductionKind, Successors};
pub use rules::{GrammarTable, NoMatchPolicy, Rule};
pub use shape::{Archetype, ShapeId};

/// Registers the standard grammar, catalog, and RNG as resources.
///
/// No systems are added: drivers decide when and how to step a
/// [`Derivation`] (the demo app steps one iteration per frame).
pub struct GrammarPlugin;

impl Plugin for GrammarPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GrammarRng>();
        app.insert_resource(ShapeCatalog::standard());
        app.insert_resource(GrammarTable::standard());
    }
}
