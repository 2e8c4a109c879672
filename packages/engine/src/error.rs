//! Error and warning types for the layer split engine.
//!
//! Fatal conditions are `SplitError` variants and abort the current split
//! (with rollback once the model has been touched). Non-fatal conditions are
//! collected as `SplitWarning`s and returned next to a successful result.

use serde::Serialize;
use thiserror::Error;

use crate::geometry::GeometryError;
use crate::model::ModelError;
use crate::splitting::SplitState;
use crate::types::ElementId;

/// Main error type for split operations.
#[derive(Error, Debug)]
pub enum SplitError {
    /// The wall is not a composite wall, so there is nothing to split.
    #[error("Wall {wall} is not a composite wall: {reason}")]
    InvalidWallType { wall: ElementId, reason: String },

    /// The host model rejected a synthesized wall type.
    #[error("Failed to create wall type '{name}': {source}")]
    TypeCreation {
        name: String,
        #[source]
        source: ModelError,
    },

    /// The source location curve cannot be offset.
    #[error("Unsupported geometry: {0}")]
    UnsupportedGeometry(#[from] GeometryError),

    /// A hosted element does not fall inside any output layer.
    #[error("Hosted element {element} at offset {offset:.3} mm lies outside every extracted layer")]
    UnassignableHost { element: ElementId, offset: f64 },

    /// The caller's layer selection does not fit the wall's layer stack.
    #[error("Invalid layer selection: {0}")]
    InvalidSelection(String),

    /// An explicitly requested target type cannot hold the layer.
    #[error("Wall type {type_id} cannot be used for layer {layer}: {reason}")]
    InvalidTargetType {
        type_id: ElementId,
        layer: usize,
        reason: String,
    },

    /// The host model refused an operation.
    #[error("Model operation failed while {stage}: {source}")]
    Model {
        stage: SplitState,
        #[source]
        source: ModelError,
    },

    /// The caller cancelled the split before it reached the commit step.
    #[error("Split cancelled while {0}")]
    Cancelled(SplitState),

    /// Configuration values are out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl SplitError {
    /// Wrap a model error with the stage in which it happened.
    pub fn model(stage: SplitState, source: ModelError) -> Self {
        Self::Model { stage, source }
    }
}

/// Non-fatal problems surfaced alongside a successful split.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SplitWarning {
    /// A parameter could not be copied onto an output wall.
    #[error("Parameter '{parameter}' was not copied to wall {wall}: {reason}")]
    PartialParameterCopy {
        wall: ElementId,
        parameter: String,
        reason: String,
    },

    /// Two output walls could not be joined, or a wall end could not be
    /// opened for joining (`second` is `None` in that case).
    #[error("Join failed for wall {first}{}: {reason}", .second.map(|s| format!(" and {s}")).unwrap_or_default())]
    Join {
        first: ElementId,
        second: Option<ElementId>,
        reason: String,
    },
}

/// Result type alias for split operations.
pub type Result<T> = std::result::Result<T, SplitError>;
