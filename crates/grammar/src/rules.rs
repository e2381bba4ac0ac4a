//! Weighted production rules and the grammar table.
//!
//! A shape's rules are stored in their declared order; selection draws one
//! uniform variate and returns the first rule whose cumulative probability
//! exceeds it. Lists may deliberately sum to less than 1 (the skyscraper
//! floor does), leaving a residual chance that no rule fires; what happens
//! then is an explicit table-level policy, never an implicit guess.

use std::collections::BTreeMap;

use bevy::prelude::Resource;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{PROBABILITY_SUM_EPSILON, TAPER_FACTOR};
use crate::error::GrammarError;
use crate::productions::ProductionKind;
use crate::shape::ShapeId;

/// A weighted production: fires with `probability` when its shape is
/// derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub probability: f64,
    pub production: ProductionKind,
}

/// What the driver does with an active node whose random draw missed
/// every rule of its shape (possible only when the probabilities sum to
/// less than 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoMatchPolicy {
    /// Leave the node active and unmodified; it is retried next iteration.
    #[default]
    KeepActive,
    /// Retire the node into the scene with no successors.
    Terminate,
}

/// Immutable mapping from shape symbol to its ordered rule list.
///
/// Shared read-only by all derivations; construction validates the
/// probability tables so a misauthored grammar is rejected before any node
/// is rewritten.
#[derive(Debug, Clone, Resource)]
pub struct GrammarTable {
    rules: BTreeMap<ShapeId, Vec<Rule>>,
    no_match: NoMatchPolicy,
}

impl GrammarTable {
    pub fn builder() -> GrammarTableBuilder {
        GrammarTableBuilder {
            rules: BTreeMap::new(),
            no_match: NoMatchPolicy::default(),
        }
    }

    /// The authored three-archetype grammar (apartment block, skyscraper,
    /// park).
    pub fn standard() -> Self {
        let table = Self {
            rules: BTreeMap::from([
                (
                    ShapeId::GroundFloorApt,
                    vec![Rule {
                        probability: 1.0,
                        production: ProductionKind::SubdivideFootprint {
                            floor: ShapeId::FloorApt,
                        },
                    }],
                ),
                (
                    ShapeId::FloorApt,
                    vec![Rule {
                        probability: 0.8,
                        production: ProductionKind::GrowOrCap {
                            floor: ShapeId::FloorApt,
                            roof: ShapeId::RoofApt,
                        },
                    }],
                ),
                (
                    ShapeId::GroundFloorSky,
                    vec![Rule {
                        probability: 1.0,
                        production: ProductionKind::RescaleBase {
                            floor: ShapeId::FloorSky,
                        },
                    }],
                ),
                (
                    ShapeId::FloorSky,
                    vec![
                        Rule {
                            probability: 0.8,
                            production: ProductionKind::GrowOrCap {
                                floor: ShapeId::FloorSky,
                                roof: ShapeId::RoofSky,
                            },
                        },
                        Rule {
                            probability: 0.07,
                            production: ProductionKind::Taper {
                                floor: ShapeId::FloorSky,
                                factor: TAPER_FACTOR,
                            },
                        },
                    ],
                ),
                (
                    ShapeId::Park,
                    vec![
                        Rule {
                            probability: 0.95,
                            production: ProductionKind::Scatter {
                                prop: ShapeId::Tree,
                            },
                        },
                        Rule {
                            probability: 0.05,
                            production: ProductionKind::Terminate,
                        },
                    ],
                ),
            ]),
            no_match: NoMatchPolicy::KeepActive,
        };
        debug_assert!(
            validate_rules(&table.rules).is_ok(),
            "standard grammar must be valid"
        );
        table
    }

    /// Ordered rule list for a shape, if it has one. Terminal shapes
    /// (roofs, props) have none.
    pub fn rules_for(&self, shape: ShapeId) -> Option<&[Rule]> {
        self.rules.get(&shape).map(Vec::as_slice)
    }

    pub fn no_match_policy(&self) -> NoMatchPolicy {
        self.no_match
    }

    /// Select one rule for `shape` by a single uniform draw.
    ///
    /// Scans the shape's list in declared order, accumulating probability,
    /// and returns the first rule whose cumulative probability exceeds the
    /// variate. `Ok(None)` is the residual no-match case; a shape with no
    /// rule list at all is a fatal configuration error.
    pub fn select<R: Rng>(
        &self,
        shape: ShapeId,
        rng: &mut R,
    ) -> Result<Option<&Rule>, GrammarError> {
        let rules = self
            .rules
            .get(&shape)
            .ok_or(GrammarError::NoRulesForShape(shape))?;
        let draw: f64 = rng.gen();
        let mut cumulative = 0.0;
        for rule in rules {
            cumulative += rule.probability;
            if cumulative > draw {
                return Ok(Some(rule));
            }
        }
        Ok(None)
    }
}

/// Builder for custom grammar tables; `build` runs the same validation the
/// standard table is checked against.
pub struct GrammarTableBuilder {
    rules: BTreeMap<ShapeId, Vec<Rule>>,
    no_match: NoMatchPolicy,
}

impl GrammarTableBuilder {
    /// Append a rule to `shape`'s list. Declaration order is selection
    /// order.
    pub fn rule(mut self, shape: ShapeId, probability: f64, production: ProductionKind) -> Self {
        self.rules.entry(shape).or_default().push(Rule {
            probability,
            production,
        });
        self
    }

    pub fn no_match_policy(mut self, policy: NoMatchPolicy) -> Self {
        self.no_match = policy;
        self
    }

    pub fn build(self) -> Result<GrammarTable, GrammarError> {
        validate_rules(&self.rules)?;
        Ok(GrammarTable {
            rules: self.rules,
            no_match: self.no_match,
        })
    }
}

fn validate_rules(rules: &BTreeMap<ShapeId, Vec<Rule>>) -> Result<(), GrammarError> {
    for (&shape, list) in rules {
        let mut sum = 0.0f64;
        for rule in list {
            if !rule.probability.is_finite() || !(0.0..=1.0).contains(&rule.probability) {
                return Err(GrammarError::InvalidProbability {
                    shape,
                    probability: rule.probability,
                });
            }
            sum += rule.probability;
        }
        // An intended sum of exactly 1.0 may land an ulp above it; a
        // grammar authored past that is ambiguous and rejected.
        if sum > 1.0 + PROBABILITY_SUM_EPSILON {
            return Err(GrammarError::ProbabilitySumExceeded { shape, sum });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    /// A mock RNG whose first `f64` draw is `value` (rand's standard f64
    /// sampling keeps the top 53 bits).
    fn rng_drawing(value: f64) -> StepRng {
        StepRng::new(((value * (1u64 << 53) as f64) as u64) << 11, 0)
    }

    fn max_draw_rng() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    #[test]
    fn test_standard_table_shapes() {
        let table = GrammarTable::standard();
        for shape in [
            ShapeId::GroundFloorApt,
            ShapeId::FloorApt,
            ShapeId::GroundFloorSky,
            ShapeId::FloorSky,
            ShapeId::Park,
        ] {
            assert!(table.rules_for(shape).is_some(), "no rules for {shape:?}");
        }
        for terminal in [ShapeId::RoofApt, ShapeId::RoofSky, ShapeId::Tree] {
            assert!(table.rules_for(terminal).is_none(), "{terminal:?} is terminal");
        }
    }

    #[test]
    fn test_selection_is_cumulative_first_match() {
        // A zero-probability rule can never fire: cumulative probability
        // must strictly exceed the draw.
        let table = GrammarTable::builder()
            .rule(ShapeId::Park, 0.0, ProductionKind::Terminate)
            .rule(
                ShapeId::Park,
                1.0,
                ProductionKind::Scatter {
                    prop: ShapeId::Tree,
                },
            )
            .build()
            .expect("valid table");
        let rule = table
            .select(ShapeId::Park, &mut rng_drawing(0.0))
            .expect("select")
            .expect("some rule");
        assert!(matches!(rule.production, ProductionKind::Scatter { .. }));
    }

    #[test]
    fn test_selection_honors_declared_order() {
        let table = GrammarTable::builder()
            .rule(ShapeId::Park, 0.3, ProductionKind::Terminate)
            .rule(
                ShapeId::Park,
                0.4,
                ProductionKind::Scatter {
                    prop: ShapeId::Tree,
                },
            )
            .build()
            .expect("valid table");
        let first = table
            .select(ShapeId::Park, &mut rng_drawing(0.1))
            .expect("select")
            .expect("some rule");
        assert!(matches!(first.production, ProductionKind::Terminate));
        let second = table
            .select(ShapeId::Park, &mut rng_drawing(0.35))
            .expect("select")
            .expect("some rule");
        assert!(matches!(second.production, ProductionKind::Scatter { .. }));
        // Past the 0.7 total: residual no-match.
        let miss = table
            .select(ShapeId::Park, &mut rng_drawing(0.9))
            .expect("select");
        assert!(miss.is_none());
    }

    #[test]
    fn test_sum_one_never_misses() {
        // Park probabilities sum to exactly 1: even the maximal draw must
        // land on a rule.
        let table = GrammarTable::standard();
        let rule = table
            .select(ShapeId::Park, &mut max_draw_rng())
            .expect("select");
        assert!(rule.is_some(), "sum-1 shape hit the no-match branch");
    }

    #[test]
    fn test_residual_miss_on_undersummed_shape() {
        // FloorSky sums to 0.87; the maximal draw falls in the residual.
        let table = GrammarTable::standard();
        let rule = table
            .select(ShapeId::FloorSky, &mut max_draw_rng())
            .expect("select");
        assert!(rule.is_none());
    }

    #[test]
    fn test_select_unknown_shape_is_config_error() {
        let table = GrammarTable::standard();
        let err = table
            .select(ShapeId::RoofApt, &mut max_draw_rng())
            .unwrap_err();
        assert_eq!(err, GrammarError::NoRulesForShape(ShapeId::RoofApt));
    }

    #[test]
    fn test_build_rejects_sum_above_one() {
        let result = GrammarTable::builder()
            .rule(ShapeId::Park, 0.8, ProductionKind::Terminate)
            .rule(ShapeId::Park, 0.3, ProductionKind::Terminate)
            .build();
        assert!(matches!(
            result,
            Err(GrammarError::ProbabilitySumExceeded {
                shape: ShapeId::Park,
                ..
            })
        ));
    }

    #[test]
    fn test_build_sum_boundary() {
        // Exactly 1.0 is valid.
        let ok = GrammarTable::builder()
            .rule(ShapeId::Park, 0.5, ProductionKind::Terminate)
            .rule(ShapeId::Park, 0.5, ProductionKind::Terminate)
            .build();
        assert!(ok.is_ok());
        // A hair above is not.
        let overshoot = GrammarTable::builder()
            .rule(ShapeId::Park, 0.5, ProductionKind::Terminate)
            .rule(ShapeId::Park, 0.500_000_1, ProductionKind::Terminate)
            .build();
        assert!(overshoot.is_err());
    }

    #[test]
    fn test_build_rejects_out_of_range_probability() {
        for bad in [-0.1, 1.000_000_1, f64::NAN] {
            let result = GrammarTable::builder()
                .rule(ShapeId::Park, bad, ProductionKind::Terminate)
                .build();
            assert!(
                matches!(result, Err(GrammarError::InvalidProbability { .. })),
                "probability {bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_no_match_policy_default_and_override() {
        assert_eq!(
            GrammarTable::standard().no_match_policy(),
            NoMatchPolicy::KeepActive
        );
        let table = GrammarTable::builder()
            .no_match_policy(NoMatchPolicy::Terminate)
            .build()
            .expect("valid table");
        assert_eq!(table.no_match_policy(), NoMatchPolicy::Terminate);
    }
}
