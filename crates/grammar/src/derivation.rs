//! Active-set derivation driver.
//!
//! Holds the set of nodes still eligible for rewriting and the scene of
//! retired nodes. One `step` is one derivation iteration: every active
//! node gets one rule selection and one production application, and all
//! successor sets are collected before the next active set is assembled,
//! so no production ever observes a peer's output from the same round.

use std::collections::BTreeMap;

use bevy::prelude::Resource;
use rand::Rng;

use crate::catalog::ShapeCatalog;
use crate::config::MAX_DERIVATION_ITERATIONS;
use crate::error::GrammarError;
use crate::node::Node;
use crate::rules::{GrammarTable, NoMatchPolicy};
use crate::shape::ShapeId;

/// Driver limits.
#[derive(Debug, Clone, Copy)]
pub struct DerivationConfig {
    /// Ceiling on derivation iterations; exceeding it with active nodes
    /// remaining is runaway growth and surfaces as an error.
    pub max_iterations: u32,
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_DERIVATION_ITERATIONS,
        }
    }
}

/// A finished derivation: every node ever retired into the scene, plus
/// the number of iterations it took.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedScene {
    pub nodes: Vec<Node>,
    pub iterations: u32,
}

impl DerivedScene {
    /// Node count per shape, for summaries and assertions.
    pub fn shape_counts(&self) -> BTreeMap<ShapeId, usize> {
        let mut counts = BTreeMap::new();
        for node in &self.nodes {
            *counts.entry(node.shape).or_insert(0) += 1;
        }
        counts
    }
}

/// In-flight derivation state.
///
/// A failed `step` is fatal (configuration error); the state is not
/// meaningful afterwards.
#[derive(Debug, Resource)]
pub struct Derivation {
    active: Vec<Node>,
    scene: Vec<Node>,
    iteration: u32,
}

impl Derivation {
    /// Start a derivation from seed nodes. Seeds that are already
    /// terminated go straight into the scene; the rest form the active
    /// set at iteration 0.
    pub fn new(seeds: Vec<Node>) -> Self {
        let (scene, active): (Vec<Node>, Vec<Node>) =
            seeds.into_iter().partition(Node::is_terminated);
        Self {
            active,
            scene,
            iteration: 0,
        }
    }

    /// No active nodes remain.
    pub fn is_complete(&self) -> bool {
        self.active.is_empty()
    }

    /// Iterations run so far.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Nodes retired into the scene so far.
    pub fn scene_nodes(&self) -> &[Node] {
        &self.scene
    }

    /// Run one derivation iteration over the whole active set.
    pub fn step<R: Rng>(
        &mut self,
        table: &GrammarTable,
        catalog: &ShapeCatalog,
        rng: &mut R,
    ) -> Result<(), GrammarError> {
        if self.active.is_empty() {
            return Ok(());
        }
        let iteration = self.iteration + 1;
        let current = std::mem::take(&mut self.active);
        let mut next_active = Vec::with_capacity(current.len());

        for node in current {
            match table.select(node.shape, rng)? {
                Some(rule) => {
                    let successors = rule.production.apply(node, iteration, catalog, rng)?;
                    for successor in successors.into_nodes() {
                        if successor.is_terminated() {
                            self.scene.push(successor);
                        } else {
                            next_active.push(successor);
                        }
                    }
                }
                None => match table.no_match_policy() {
                    NoMatchPolicy::KeepActive => next_active.push(node),
                    NoMatchPolicy::Terminate => {
                        let mut node = node;
                        node.terminate();
                        self.scene.push(node);
                    }
                },
            }
        }

        self.active = next_active;
        self.iteration = iteration;
        Ok(())
    }

    /// Step until every node is terminated, or fail once `max_iterations`
    /// is reached with work remaining.
    pub fn run<R: Rng>(
        mut self,
        table: &GrammarTable,
        catalog: &ShapeCatalog,
        rng: &mut R,
        config: &DerivationConfig,
    ) -> Result<DerivedScene, GrammarError> {
        while !self.is_complete() {
            if self.iteration >= config.max_iterations {
                return Err(GrammarError::IterationLimitExceeded {
                    limit: config.max_iterations,
                    active: self.active.len(),
                });
            }
            self.step(table, catalog, rng)?;
        }
        Ok(self.into_scene())
    }

    /// Finish bookkeeping: any still-active nodes are retired as-is.
    pub fn into_scene(mut self) -> DerivedScene {
        for mut node in self.active.drain(..) {
            node.terminate();
            self.scene.push(node);
        }
        DerivedScene {
            nodes: self.scene,
            iterations: self.iteration,
        }
    }
}
