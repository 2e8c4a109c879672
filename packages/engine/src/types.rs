//! Core data types for walls, wall types and hosted elements.
//!
//! These are read snapshots of the host model's objects. The engine never
//! mutates them in place; changes go through [`crate::model::BimModel`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Curve;

/// Identifier of any element in the host model (wall, wall type, window...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a layer inside a compound structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerFunction {
    /// Load-bearing layer.
    Structure,
    /// Substrate such as plywood or gypsum board behind a finish.
    Substrate,
    /// Thermal or air layer.
    Insulation,
    /// Vapor or water barrier (usually zero thickness).
    Membrane,
    /// Primary finish.
    Finish1,
    /// Secondary finish.
    Finish2,
}

impl LayerFunction {
    /// Get the string value used in names and reports.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Substrate => "substrate",
            Self::Insulation => "insulation",
            Self::Membrane => "membrane",
            Self::Finish1 => "finish1",
            Self::Finish2 => "finish2",
        }
    }
}

/// One layer of a wall type's compound structure, exterior first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDefinition {
    /// Layer thickness in millimetres.
    pub thickness: f64,

    /// Function of the layer.
    pub function: LayerFunction,

    /// Material name, if any is assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,

    /// Whether the layer lies inside the core boundaries.
    #[serde(default)]
    pub is_core: bool,
}

impl LayerDefinition {
    /// Create a layer without material.
    #[must_use]
    pub fn new(thickness: f64, function: LayerFunction) -> Self {
        Self {
            thickness,
            function,
            material: None,
            is_core: false,
        }
    }

    /// Assign a material.
    #[must_use]
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    /// Mark the layer as part of the core.
    #[must_use]
    pub fn with_core(mut self, is_core: bool) -> Self {
        self.is_core = is_core;
        self
    }
}

/// Wall system family of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallKind {
    /// Layered wall with a compound structure.
    #[default]
    Basic,
    /// Curtain wall (panels and mullions, no layers).
    Curtain,
    /// Vertically stacked sub-walls.
    Stacked,
}

/// A wall type from the model's type catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallType {
    pub id: ElementId,
    pub name: String,
    #[serde(default)]
    pub kind: WallKind,
    #[serde(default)]
    pub layers: Vec<LayerDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
}

impl WallType {
    /// Whether this is a basic type with exactly one layer.
    #[must_use]
    pub fn is_single_layer(&self) -> bool {
        self.kind == WallKind::Basic && self.layers.len() == 1
    }

    /// Sum of all layer thicknesses.
    #[must_use]
    pub fn total_thickness(&self) -> f64 {
        self.layers.iter().map(|l| l.thickness).sum()
    }
}

/// Definition of a wall type that does not exist yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallTypeDefinition {
    pub name: String,
    pub layers: Vec<LayerDefinition>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// The plane of the wall that its location curve describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationLine {
    /// Middle of the full wall thickness.
    #[default]
    WallCenterline,
    /// Middle of the core.
    CoreCenterline,
    /// Outer face of the exterior finish.
    FinishFaceExterior,
    /// Outer face of the interior finish.
    FinishFaceInterior,
    /// Exterior boundary of the core.
    CoreFaceExterior,
    /// Interior boundary of the core.
    CoreFaceInterior,
}

/// How the top of a wall is defined.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TopConstraint {
    /// Fixed height above the base.
    #[default]
    Unconnected,
    /// Attached to a level, with an offset from it.
    UpToLevel { level: String, offset: f64 },
}

/// Base and top constraints of a wall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalConstraints {
    pub base_level: String,
    #[serde(default)]
    pub base_offset: f64,
    #[serde(default)]
    pub top: TopConstraint,
    /// Resolved height of the wall.
    pub height: f64,
}

impl VerticalConstraints {
    /// Unconnected wall of the given height on a level.
    #[must_use]
    pub fn unconnected(base_level: impl Into<String>, height: f64) -> Self {
        Self {
            base_level: base_level.into(),
            base_offset: 0.0,
            top: TopConstraint::Unconnected,
            height,
        }
    }
}

/// A wall instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub id: ElementId,
    pub type_id: ElementId,
    pub curve: Curve,
    #[serde(default)]
    pub location_line: LocationLine,
    pub constraints: VerticalConstraints,
    /// Exterior side is on the right of the curve instead of the left.
    #[serde(default)]
    pub flipped: bool,
    #[serde(default)]
    pub structural: bool,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Wall {
    /// Look up an instance parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Category of a hosted element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostedKind {
    Window,
    Door,
    Opening,
    Other,
}

/// The wall face a hosted element was placed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostFace {
    /// The reference face (offset 0).
    #[default]
    Exterior,
    /// The opposite face (offset = total thickness).
    Interior,
}

/// An element hosted by a wall (window, door, opening...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostedElement {
    pub id: ElementId,
    pub kind: HostedKind,
    pub host: ElementId,
    /// Distance along the host's location curve.
    pub station: f64,
    /// Sill elevation above the host's base.
    #[serde(default)]
    pub sill_height: f64,
    /// Distance of the attachment point from the host's reference face.
    pub host_face_offset: f64,
    #[serde(default)]
    pub host_face: HostFace,
    /// Pinned elements refuse to change host.
    #[serde(default)]
    pub pinned: bool,
}

/// Storage type of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    Double,
    Integer,
    Text,
    ElementId,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Double => "double",
            Self::Integer => "integer",
            Self::Text => "text",
            Self::ElementId => "element id",
        };
        f.write_str(name)
    }
}

/// Value of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParameterValue {
    Double(f64),
    Integer(i64),
    Text(String),
    ElementId(ElementId),
}

impl ParameterValue {
    /// Storage type of this value.
    #[must_use]
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::Double(_) => StorageType::Double,
            Self::Integer(_) => StorageType::Integer,
            Self::Text(_) => StorageType::Text,
            Self::ElementId(_) => StorageType::ElementId,
        }
    }
}

/// A named parameter on a wall or wall type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: ParameterValue,
    #[serde(default)]
    pub read_only: bool,
}

impl Parameter {
    /// Create a writable parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, value: ParameterValue) -> Self {
        Self {
            name: name.into(),
            value,
            read_only: false,
        }
    }

    /// Mark the parameter as read-only.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}
