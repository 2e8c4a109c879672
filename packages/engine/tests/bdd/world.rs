//! World struct for Cucumber BDD tests
//!
//! Holds the model being built by the `Given` steps and the result of the
//! split performed by the `When` steps.

use cucumber::World;
use layersplit_engine::geometry::Curve;
use layersplit_engine::memory::{InMemoryModel, ModelDocument};
use layersplit_engine::splitting::{SplitOutcome, SplitPlan, SplitState};
use layersplit_engine::types::{
    ElementId, HostFace, HostedElement, HostedKind, LayerDefinition, LocationLine,
    VerticalConstraints, Wall, WallKind, WallType,
};
use layersplit_engine::SplitError;
use std::fmt;

/// Test world that holds state across steps in a Cucumber scenario.
#[derive(World)]
#[world(init = Self::new)]
pub struct SplitWorld {
    /// Document assembled by the `Given` steps
    pub document: ModelDocument,
    /// Wall the scenario splits (the most recently added one)
    pub wall: Option<ElementId>,
    /// Model the split ran against
    pub model: Option<InMemoryModel>,
    /// Last successful split
    pub outcome: Option<SplitOutcome>,
    /// Last plan
    pub plan: Option<SplitPlan>,
    /// Last error (if the split failed)
    pub error: Option<SplitError>,
    /// Orchestrator state after the last run
    pub final_state: Option<SplitState>,
    next_id: u64,
}

impl fmt::Debug for SplitWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitWorld")
            .field("wall", &self.wall)
            .field("wall_types", &self.document.wall_types.len())
            .field("walls", &self.document.walls.len())
            .field("outcome", &self.outcome)
            .field("error", &self.error.as_ref().map(|e| e.to_string()))
            .field("final_state", &self.final_state)
            .finish()
    }
}

impl Default for SplitWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitWorld {
    /// Create a world with an empty model.
    pub fn new() -> Self {
        Self {
            document: ModelDocument::default(),
            wall: None,
            model: None,
            outcome: None,
            plan: None,
            error: None,
            final_state: None,
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a basic wall type to the catalog.
    pub fn add_wall_type(&mut self, name: &str, layers: Vec<LayerDefinition>) -> ElementId {
        let id = self.allocate_id();
        self.document.wall_types.push(WallType {
            id,
            name: name.to_string(),
            kind: WallKind::Basic,
            layers,
            parameters: Vec::new(),
        });
        id
    }

    /// Find a wall type by name, in the model once it exists.
    pub fn wall_type_id(&self, name: &str) -> ElementId {
        let types = match &self.model {
            Some(model) => &model.document().wall_types,
            None => &self.document.wall_types,
        };
        types
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.id)
            .unwrap_or_else(|| panic!("Wall type '{name}' not found"))
    }

    /// Add a straight wall along the x axis and make it the wall under test.
    pub fn add_wall(&mut self, type_name: &str, length: f64) -> ElementId {
        let type_id = self.wall_type_id(type_name);
        let id = self.allocate_id();
        self.document.walls.push(Wall {
            id,
            type_id,
            curve: Curve::line((0.0, 0.0), (length, 0.0)),
            location_line: LocationLine::WallCenterline,
            constraints: VerticalConstraints::unconnected("Level 1", 3000.0),
            flipped: false,
            structural: false,
            parameters: Vec::new(),
        });
        self.wall = Some(id);
        id
    }

    /// Host an element on the wall under test, halfway along it.
    pub fn add_hosted(&mut self, kind: HostedKind, offset: f64, face: HostFace, pinned: bool) {
        let host = self.wall_id();
        let station = self
            .document
            .walls
            .iter()
            .find(|w| w.id == host)
            .map(|w| w.curve.length() / 2.0)
            .unwrap_or_default();
        let id = self.allocate_id();
        self.document.hosted_elements.push(HostedElement {
            id,
            kind,
            host,
            station,
            sill_height: if kind == HostedKind::Window { 900.0 } else { 0.0 },
            host_face_offset: offset,
            host_face: face,
            pinned,
        });
    }

    /// The wall under test.
    pub fn wall_id(&self) -> ElementId {
        self.wall.expect("No wall has been added to the scenario")
    }

    /// The first hosted element of the given kind.
    pub fn hosted_id(&self, kind: HostedKind) -> ElementId {
        self.document
            .hosted_elements
            .iter()
            .find(|h| h.kind == kind)
            .map(|h| h.id)
            .unwrap_or_else(|| panic!("No {kind:?} in the scenario"))
    }

    /// The model after the `When` step ran.
    pub fn model(&self) -> &InMemoryModel {
        self.model.as_ref().expect("No split has been run")
    }

    /// The successful split, failing the scenario with the error otherwise.
    pub fn outcome(&self) -> &SplitOutcome {
        match (&self.outcome, &self.error) {
            (Some(outcome), _) => outcome,
            (None, Some(error)) => panic!("Expected a successful split, got: {error}"),
            (None, None) => panic!("No split has been run"),
        }
    }
}
