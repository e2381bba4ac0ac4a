//! Geometry catalog: per-shape bounding boxes and growth thresholds.
//!
//! The catalog is constructed once, validated, and then read-only for the
//! whole derivation. Lookups for shapes without an entry fail fast: a
//! silently defaulted zero-size bbox would corrupt every downstream
//! stacking computation.

use std::collections::BTreeMap;

use bevy::math::Vec3;
use bevy::prelude::Resource;

use crate::error::GrammarError;
use crate::shape::ShapeId;

/// Catalog entry for one shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeEntry {
    /// Bounding box size in unscaled local units (width, height, depth).
    pub size: Vec3,
    /// Fraction of a lineage's `max_height` at which vertical growth must
    /// stop and capping fires instead. Irrelevant (0.0) for shapes that
    /// never grow.
    pub height_ratio: f32,
}

impl ShapeEntry {
    pub fn new(size: Vec3, height_ratio: f32) -> Self {
        Self { size, height_ratio }
    }
}

/// Immutable mapping from shape symbol to its geometry entry.
#[derive(Debug, Clone, Resource)]
pub struct ShapeCatalog {
    entries: BTreeMap<ShapeId, ShapeEntry>,
}

impl ShapeCatalog {
    /// Build a catalog from `(shape, entry)` pairs, rejecting malformed
    /// entries (non-positive bbox dimension, ratio outside `[0, 1]`).
    pub fn from_entries(
        entries: impl IntoIterator<Item = (ShapeId, ShapeEntry)>,
    ) -> Result<Self, GrammarError> {
        let mut map = BTreeMap::new();
        for (shape, entry) in entries {
            validate_entry(shape, &entry)?;
            map.insert(shape, entry);
        }
        Ok(Self { entries: map })
    }

    /// The authored catalog for the eight standard shapes.
    pub fn standard() -> Self {
        let catalog = Self {
            entries: BTreeMap::from([
                (
                    ShapeId::GroundFloorApt,
                    ShapeEntry::new(Vec3::new(1.0, 1.0, 1.0), 0.66),
                ),
                (
                    ShapeId::FloorApt,
                    ShapeEntry::new(Vec3::new(1.0, 1.0, 1.0), 0.66),
                ),
                (
                    ShapeId::RoofApt,
                    ShapeEntry::new(Vec3::new(1.0, 0.4, 1.0), 0.0),
                ),
                (
                    ShapeId::GroundFloorSky,
                    ShapeEntry::new(Vec3::new(1.0, 1.0, 1.0), 0.85),
                ),
                (
                    ShapeId::FloorSky,
                    ShapeEntry::new(Vec3::new(1.0, 1.0, 1.0), 0.85),
                ),
                (
                    ShapeId::RoofSky,
                    ShapeEntry::new(Vec3::new(1.0, 0.6, 1.0), 0.0),
                ),
                (
                    ShapeId::Park,
                    ShapeEntry::new(Vec3::new(6.0, 0.2, 6.0), 0.0),
                ),
                (
                    ShapeId::Tree,
                    ShapeEntry::new(Vec3::new(0.5, 1.4, 0.5), 0.0),
                ),
            ]),
        };
        debug_assert!(
            catalog
                .entries
                .iter()
                .all(|(s, e)| validate_entry(*s, e).is_ok()),
            "standard catalog must be valid"
        );
        catalog
    }

    /// Look up a shape's entry. Unknown shapes are a fatal configuration
    /// error.
    pub fn entry(&self, shape: ShapeId) -> Result<&ShapeEntry, GrammarError> {
        self.entries
            .get(&shape)
            .ok_or(GrammarError::UnknownShape(shape))
    }

    /// Unscaled bbox size for a shape.
    pub fn size(&self, shape: ShapeId) -> Result<Vec3, GrammarError> {
        self.entry(shape).map(|e| e.size)
    }

    /// Growth-to-capping threshold fraction for a shape.
    pub fn height_ratio(&self, shape: ShapeId) -> Result<f32, GrammarError> {
        self.entry(shape).map(|e| e.height_ratio)
    }
}

fn validate_entry(shape: ShapeId, entry: &ShapeEntry) -> Result<(), GrammarError> {
    let size = entry.size;
    if !size.is_finite() || size.x <= 0.0 || size.y <= 0.0 || size.z <= 0.0 {
        return Err(GrammarError::InvalidBoundingBox { shape, size });
    }
    if !entry.height_ratio.is_finite() || !(0.0..=1.0).contains(&entry.height_ratio) {
        return Err(GrammarError::InvalidHeightRatio {
            shape,
            ratio: entry.height_ratio,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_covers_all_shapes() {
        let catalog = ShapeCatalog::standard();
        for shape in [
            ShapeId::GroundFloorApt,
            ShapeId::FloorApt,
            ShapeId::RoofApt,
            ShapeId::GroundFloorSky,
            ShapeId::FloorSky,
            ShapeId::RoofSky,
            ShapeId::Park,
            ShapeId::Tree,
        ] {
            assert!(catalog.entry(shape).is_ok(), "missing entry for {shape:?}");
        }
    }

    #[test]
    fn test_unknown_shape_fails_fast() {
        let catalog = ShapeCatalog::from_entries([(
            ShapeId::Park,
            ShapeEntry::new(Vec3::new(6.0, 0.2, 6.0), 0.0),
        )])
        .expect("valid entries");
        let err = catalog.size(ShapeId::Tree).unwrap_err();
        assert_eq!(err, GrammarError::UnknownShape(ShapeId::Tree));
    }

    #[test]
    fn test_rejects_non_positive_bbox() {
        let result = ShapeCatalog::from_entries([(
            ShapeId::Tree,
            ShapeEntry::new(Vec3::new(0.5, 0.0, 0.5), 0.0),
        )]);
        assert!(matches!(
            result,
            Err(GrammarError::InvalidBoundingBox { shape: ShapeId::Tree, .. })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_ratio() {
        let result = ShapeCatalog::from_entries([(
            ShapeId::FloorApt,
            ShapeEntry::new(Vec3::ONE, 1.5),
        )]);
        assert!(matches!(
            result,
            Err(GrammarError::InvalidHeightRatio { shape: ShapeId::FloorApt, .. })
        ));
    }

    #[test]
    fn test_growth_thresholds() {
        let catalog = ShapeCatalog::standard();
        let apt = catalog.height_ratio(ShapeId::FloorApt).expect("entry");
        let sky = catalog.height_ratio(ShapeId::FloorSky).expect("entry");
        assert!((apt - 0.66).abs() < f32::EPSILON);
        assert!((sky - 0.85).abs() < f32::EPSILON);
        assert!(sky > apt, "towers should run closer to their ceiling");
    }
}
