//! Then step definitions
//!
//! Steps that check the model after a split.

use approx::assert_relative_eq;
use cucumber::then;
use layersplit_engine::model::BimModel;
use layersplit_engine::types::{ElementId, HostedKind, LayerFunction};

use crate::world::SplitWorld;

/// Parse a comma-separated list of millimetre values.
fn parse_list(values: &str) -> Vec<f64> {
    values
        .split(',')
        .map(|v| {
            v.trim()
                .parse()
                .unwrap_or_else(|e| panic!("Invalid number '{v}': {e}"))
        })
        .collect()
}

/// The created wall whose single layer has the given function.
fn wall_with_function(world: &SplitWorld, function: LayerFunction) -> ElementId {
    let model = world.model();
    world
        .outcome()
        .new_walls
        .iter()
        .copied()
        .find(|&id| {
            model
                .wall(id)
                .and_then(|w| model.wall_type(w.type_id))
                .map(|t| t.layers.first().map(|l| l.function) == Some(function))
                .unwrap_or(false)
        })
        .unwrap_or_else(|| panic!("No new wall with a {function:?} layer"))
}

fn parse_function(name: &str) -> LayerFunction {
    serde_yaml_ng::from_str(name).unwrap_or_else(|e| panic!("Invalid layer function '{name}': {e}"))
}

// =============================================================================
// Outcome
// =============================================================================

#[then("the split succeeds")]
fn assert_success(world: &mut SplitWorld) {
    let outcome = world.outcome();
    assert!(!outcome.new_walls.is_empty(), "Split created no walls");
}

#[then(expr = "the split fails with {string}")]
fn assert_failure(world: &mut SplitWorld, kind: String) {
    let error = world
        .error
        .as_ref()
        .unwrap_or_else(|| panic!("Expected the split to fail with {kind}, but it succeeded"));
    let debug = format!("{error:?}");
    assert!(
        debug.starts_with(&kind),
        "Expected a {kind} error, got: {debug}"
    );
}

#[then(expr = "the split ends in state {string}")]
fn assert_final_state(world: &mut SplitWorld, state: String) {
    let actual = world.final_state.expect("No split has been run");
    assert_eq!(actual.to_string(), state);
}

#[then(regex = r"^(\d+) new walls are created$")]
fn assert_wall_count(world: &mut SplitWorld, count: String) {
    let expected: usize = count.parse().expect("Invalid count");
    assert_eq!(world.outcome().new_walls.len(), expected);
}

#[then(regex = r"^(\d+) new wall types are created$")]
fn assert_type_count(world: &mut SplitWorld, count: String) {
    let expected: usize = count.parse().expect("Invalid count");
    assert_eq!(world.outcome().created_types.len(), expected);
}

// =============================================================================
// Geometry
// =============================================================================

#[then(regex = r"^the new walls are ([\d., ]+) mm thick$")]
fn assert_thicknesses(world: &mut SplitWorld, values: String) {
    let model = world.model();
    let actual: Vec<f64> = world
        .outcome()
        .new_walls
        .iter()
        .map(|&id| {
            let wall = model.wall(id).expect("created wall exists");
            model
                .wall_type(wall.type_id)
                .expect("created type exists")
                .total_thickness()
        })
        .collect();
    assert_eq!(actual, parse_list(&values));
}

#[then(regex = r"^the centerline offsets are ([-\d., ]+) mm$")]
fn assert_centerline_offsets(world: &mut SplitWorld, values: String) {
    let model = world.model();
    let expected = parse_list(&values);
    let walls = &world.outcome().new_walls;
    assert_eq!(walls.len(), expected.len());

    // The source wall runs along the x axis, so the offset is the y coordinate.
    for (&id, offset) in walls.iter().zip(expected) {
        let wall = model.wall(id).expect("created wall exists");
        assert_relative_eq!(wall.curve.start_point().y, offset, epsilon = 1e-9);
    }
}

#[then("the original wall no longer exists")]
fn assert_source_deleted(world: &mut SplitWorld) {
    let source = world.wall_id();
    assert!(world.model().wall(source).is_err(), "Wall {source} still exists");
}

// =============================================================================
// Hosted elements and types
// =============================================================================

#[then(regex = r"^the (window|door) is hosted on the (\w+) wall$")]
fn assert_host(world: &mut SplitWorld, kind: String, function: String) {
    let kind = match kind.as_str() {
        "window" => HostedKind::Window,
        _ => HostedKind::Door,
    };
    let element = world.hosted_id(kind);
    let expected = wall_with_function(world, parse_function(&function));
    let actual = world
        .model()
        .hosted_element(element)
        .expect("hosted element exists")
        .host;
    assert_eq!(actual, expected);
}

#[then(regex = r#"^the (\w+) wall uses type "([^"]+)"$"#)]
fn assert_wall_type(world: &mut SplitWorld, function: String, type_name: String) {
    let wall = wall_with_function(world, parse_function(&function));
    let type_id = world.model().wall(wall).expect("created wall exists").type_id;
    assert_eq!(type_id, world.wall_type_id(&type_name));
}

#[then("the model is unchanged")]
fn assert_model_unchanged(world: &mut SplitWorld) {
    assert_eq!(world.model().document(), &world.document);
}

#[then(regex = r"^the plan has (\d+) walls$")]
fn assert_plan_size(world: &mut SplitWorld, count: String) {
    let plan = world.plan.as_ref().expect("No plan has been made");
    let expected: usize = count.parse().expect("Invalid count");
    assert_eq!(plan.specs.len(), expected);
    assert!(plan.covers_footprint(1e-9));
}
