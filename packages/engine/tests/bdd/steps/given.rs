//! Given step definitions
//!
//! Steps that build the model a scenario splits.

use cucumber::{gherkin::Step, given};
use layersplit_engine::types::{HostFace, HostedKind, LayerDefinition, LayerFunction};

use crate::world::SplitWorld;

/// Parse a `| thickness | function | material |` table, skipping the header.
fn parse_layers(step: &Step) -> Vec<LayerDefinition> {
    let table = step.table.as_ref().expect("Step requires a layer table");
    table
        .rows
        .iter()
        .skip(1)
        .map(|row| {
            let thickness: f64 = row[0]
                .trim()
                .parse()
                .unwrap_or_else(|e| panic!("Invalid thickness '{}': {}", row[0], e));
            let function: LayerFunction = serde_yaml_ng::from_str(row[1].trim())
                .unwrap_or_else(|e| panic!("Invalid layer function '{}': {}", row[1], e));
            let layer = LayerDefinition::new(thickness, function);
            match row.get(2).map(|m| m.trim()) {
                Some(material) if !material.is_empty() => layer.with_material(material),
                _ => layer,
            }
        })
        .collect()
}

fn parse_mm(value: &str) -> f64 {
    value
        .parse()
        .unwrap_or_else(|e| panic!("Invalid length '{value}': {e}"))
}

// =============================================================================
// Catalog and walls
// =============================================================================

#[given(expr = "a wall type {string} with layers:")]
fn add_wall_type(world: &mut SplitWorld, name: String, step: &Step) {
    let layers = parse_layers(step);
    world.add_wall_type(&name, layers);
}

#[given(regex = r#"^a straight wall (\d+) mm long of type "([^"]+)"$"#)]
fn add_straight_wall(world: &mut SplitWorld, length: String, type_name: String) {
    world.add_wall(&type_name, parse_mm(&length));
}

// =============================================================================
// Hosted elements
// =============================================================================

fn parse_kind(kind: &str) -> HostedKind {
    match kind {
        "window" => HostedKind::Window,
        _ => HostedKind::Door,
    }
}

#[given(regex = r"^a (window|door) at host-face offset (\d+(?:\.\d+)?) mm$")]
fn add_hosted_element(world: &mut SplitWorld, kind: String, offset: String) {
    world.add_hosted(parse_kind(&kind), parse_mm(&offset), HostFace::Exterior, false);
}

#[given(regex = r"^a (window|door) at host-face offset (\d+(?:\.\d+)?) mm on the interior face$")]
fn add_interior_element(world: &mut SplitWorld, kind: String, offset: String) {
    world.add_hosted(parse_kind(&kind), parse_mm(&offset), HostFace::Interior, false);
}

#[given(regex = r"^a pinned (window|door) at host-face offset (\d+(?:\.\d+)?) mm$")]
fn add_pinned_element(world: &mut SplitWorld, kind: String, offset: String) {
    world.add_hosted(parse_kind(&kind), parse_mm(&offset), HostFace::Exterior, true);
}
