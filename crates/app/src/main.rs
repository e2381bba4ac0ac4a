//! Headless city-block derivation demo.
//!
//! Seeds a grid of lots with random archetypes, steps the derivation one
//! iteration per frame, then logs a summary and exits. Set `CITYSEED_SEED`
//! to pick the RNG stream and `CITYSEED_EXPORT` to dump the derived scene
//! as JSON.

use std::collections::BTreeMap;

use bevy::app::AppExit;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use rand::Rng;
use serde::Serialize;

use grammar::{
    Archetype, Derivation, DerivationConfig, GrammarRng, GrammarTable, Node, ShapeCatalog,
    ShapeId,
};

/// Lots per side of the seeded block.
const LOTS_X: usize = 4;
const LOTS_Z: usize = 4;
/// World-space distance between lot centers.
const LOT_SPACING: f32 = 10.0;

fn main() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(LogPlugin::default())
        .add_plugins(grammar::GrammarPlugin)
        .add_systems(Startup, seed_city_block)
        .add_systems(Update, step_derivation);

    if let Ok(raw) = std::env::var("CITYSEED_SEED") {
        match raw.parse::<u64>() {
            Ok(seed) => {
                app.insert_resource(GrammarRng::from_seed_u64(seed));
            }
            Err(_) => {
                warn!("CITYSEED_SEED {raw:?} is not a u64, using the default seed");
            }
        }
    }

    let exit = app.run();
    if let AppExit::Error(code) = exit {
        std::process::exit(code.get() as i32);
    }
}

/// Lay out the lot grid and start the derivation.
fn seed_city_block(
    mut commands: Commands,
    mut rng: ResMut<GrammarRng>,
    mut exit: EventWriter<AppExit>,
) {
    let mut seeds = Vec::with_capacity(LOTS_X * LOTS_Z);
    for ix in 0..LOTS_X {
        for iz in 0..LOTS_Z {
            let position = Vec3::new(ix as f32 * LOT_SPACING, 0.0, iz as f32 * LOT_SPACING);
            let (archetype, max_height) = roll_lot(&mut rng.0);
            match Node::seed(archetype.seed_shape(), position, max_height) {
                Ok(mut node) => {
                    node.regenerate_color_offset(&mut rng.0);
                    seeds.push(node);
                }
                Err(e) => {
                    error!("failed to seed lot ({ix}, {iz}): {e}");
                    exit.send(AppExit::error());
                    return;
                }
            }
        }
    }
    info!("seeded {} lots ({LOTS_X}x{LOTS_Z})", seeds.len());
    commands.insert_resource(Derivation::new(seeds));
}

/// Weighted archetype pick plus an archetype-appropriate height budget.
fn roll_lot<R: Rng>(rng: &mut R) -> (Archetype, f32) {
    let roll: f32 = rng.gen();
    if roll < 0.5 {
        (Archetype::Apartment, rng.gen_range(6.0..12.0))
    } else if roll < 0.8 {
        (Archetype::Skyscraper, rng.gen_range(12.0..24.0))
    } else {
        // Parks never grow vertically; the height budget only has to be
        // positive.
        (Archetype::Park, 1.0)
    }
}

/// One derivation iteration per frame; summary, export, and exit once the
/// active set drains.
fn step_derivation(
    derivation: Option<ResMut<Derivation>>,
    table: Res<GrammarTable>,
    catalog: Res<ShapeCatalog>,
    mut rng: ResMut<GrammarRng>,
    mut exit: EventWriter<AppExit>,
) {
    let Some(mut derivation) = derivation else {
        return;
    };

    if !derivation.is_complete() {
        let limit = DerivationConfig::default().max_iterations;
        if derivation.iteration() >= limit {
            error!(
                "runaway growth: {} nodes still active after {limit} iterations",
                derivation.active_count()
            );
            exit.send(AppExit::error());
            return;
        }
        if let Err(e) = derivation.step(&table, &catalog, &mut rng.0) {
            error!("derivation failed: {e}");
            exit.send(AppExit::error());
        }
        return;
    }

    log_summary(&derivation);

    if let Ok(path) = std::env::var("CITYSEED_EXPORT") {
        match export_scene(derivation.scene_nodes(), &path) {
            Ok(()) => info!("scene written to {path}"),
            Err(e) => {
                error!("failed to export scene to {path}: {e}");
                exit.send(AppExit::error());
                return;
            }
        }
    }

    exit.send(AppExit::Success);
}

fn log_summary(derivation: &Derivation) {
    let nodes = derivation.scene_nodes();
    let mut counts: BTreeMap<ShapeId, usize> = BTreeMap::new();
    let mut tallest = 0.0f32;
    for node in nodes {
        *counts.entry(node.shape).or_insert(0) += 1;
        tallest = tallest.max(node.position.y);
    }
    info!(
        "derivation complete: {} nodes in {} iterations, tallest point {tallest:.2}",
        nodes.len(),
        derivation.iteration()
    );
    for (shape, count) in counts {
        info!("  {shape:?}: {count}");
    }
}

/// Flat record shape for the JSON debugging export.
#[derive(Serialize)]
struct NodeRecord {
    shape: ShapeId,
    position: [f32; 3],
    rotation: [f32; 3],
    scale: [f32; 3],
    color_offset: [f32; 3],
    iteration: u32,
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        Self {
            shape: node.shape,
            position: node.position.to_array(),
            rotation: node.rotation.to_array(),
            scale: node.scale.to_array(),
            color_offset: node.color_offset.to_array(),
            iteration: node.iteration,
        }
    }
}

fn export_scene(nodes: &[Node], path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let records: Vec<NodeRecord> = nodes.iter().map(NodeRecord::from).collect();
    let json = serde_json::to_string_pretty(&records)?;
    std::fs::write(path, json)?;
    Ok(())
}
