//! Shape symbols and archetypes.
//!
//! `ShapeId` is the closed set of symbols the grammar and the geometry
//! catalog are keyed by. Adding a shape means adding a catalog entry and
//! (for non-terminal shapes) a rule list; the enum keeps both lookups
//! exhaustive at the type level.

use serde::{Deserialize, Serialize};

/// Symbol identifying a node's mesh/bbox/growth-ratio catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShapeId {
    /// Apartment lineage root; subdivides into two footprints.
    GroundFloorApt,
    /// Apartment floor; grows upward until capped.
    FloorApt,
    /// Apartment roof; terminal.
    RoofApt,
    /// Skyscraper lineage root; rescaled into the tower base.
    GroundFloorSky,
    /// Skyscraper floor; grows, tapers, or gets capped.
    FloorSky,
    /// Skyscraper roof; terminal.
    RoofSky,
    /// Park slab; scatters props across its surface.
    Park,
    /// Scattered park prop; terminal.
    Tree,
}

/// One of the three authored generative families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Archetype {
    Apartment,
    Skyscraper,
    Park,
}

impl Archetype {
    /// The shape a lineage of this archetype is seeded with.
    pub fn seed_shape(self) -> ShapeId {
        match self {
            Archetype::Apartment => ShapeId::GroundFloorApt,
            Archetype::Skyscraper => ShapeId::GroundFloorSky,
            Archetype::Park => ShapeId::Park,
        }
    }
}
