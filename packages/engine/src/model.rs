//! The boundary to the host BIM model.
//!
//! The engine never owns walls or types. It reads snapshots and asks the
//! host to mutate through [`BimModel`]. Hosts without transactions can keep
//! the default no-op transaction methods; the engine still undoes its own
//! artifacts explicitly on failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Curve;
use crate::types::{
    ElementId, HostedElement, LocationLine, Parameter, ParameterValue, StorageType,
    VerticalConstraints, Wall, WallType, WallTypeDefinition,
};

/// Errors reported by the host model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// No element with this id exists.
    #[error("Element {0} not found")]
    NotFound(ElementId),

    /// Type names must be unique.
    #[error("A wall type named '{0}' already exists")]
    NameCollision(String),

    /// The parameter does not exist on the element.
    #[error("Parameter '{parameter}' not found on element {element}")]
    ParameterNotFound { element: ElementId, parameter: String },

    /// The parameter cannot be written.
    #[error("Parameter '{parameter}' on element {element} is read-only")]
    ReadOnlyParameter { element: ElementId, parameter: String },

    /// The value has the wrong storage type.
    #[error("Parameter '{parameter}' expects a {expected} value, got {actual}")]
    StorageMismatch {
        parameter: String,
        expected: StorageType,
        actual: StorageType,
    },

    /// Pinned elements cannot be moved to another host.
    #[error("Element {0} is pinned")]
    Pinned(ElementId),

    /// A wall type cannot be deleted while walls use it.
    #[error("Wall type {0} is still used by walls")]
    TypeInUse(ElementId),

    /// Two walls were expected to be joined.
    #[error("Walls {0} and {1} are not joined")]
    NotJoined(ElementId, ElementId),

    /// The host refused the operation for its own reasons.
    #[error("Rejected by the model: {0}")]
    Rejected(String),

    /// Transaction calls out of order.
    #[error("Transaction error: {0}")]
    Transaction(String),
}

/// Result type alias for host model calls.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Everything the host needs to create a wall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallPlacement {
    pub type_id: ElementId,
    pub curve: Curve,
    pub constraints: VerticalConstraints,
    pub location_line: LocationLine,
    pub flipped: bool,
    pub structural: bool,
}

/// Where a hosted element sits on its host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostPosition {
    /// Distance along the host's location curve.
    pub station: f64,
    /// Sill elevation above the host's base.
    pub sill_height: f64,
    /// Distance of the attachment point from the host's reference face.
    pub host_face_offset: f64,
}

impl HostPosition {
    /// Current position of a hosted element.
    #[must_use]
    pub fn of(element: &HostedElement) -> Self {
        Self {
            station: element.station,
            sill_height: element.sill_height,
            host_face_offset: element.host_face_offset,
        }
    }
}

/// One end of a wall's location curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallEnd {
    Start,
    End,
}

/// Query and mutation interface of a host BIM model.
///
/// Mutations are expected to be revertible inside the transaction opened
/// with [`BimModel::begin_transaction`].
pub trait BimModel {
    /// Snapshot of a wall.
    fn wall(&self, id: ElementId) -> ModelResult<Wall>;

    /// Snapshot of a wall type.
    fn wall_type(&self, id: ElementId) -> ModelResult<WallType>;

    /// All wall types in the catalog.
    fn wall_types(&self) -> Vec<WallType>;

    /// Elements hosted by a wall.
    fn hosted_elements(&self, wall: ElementId) -> ModelResult<Vec<HostedElement>>;

    /// Current instance parameters of a wall.
    fn wall_parameters(&self, wall: ElementId) -> ModelResult<Vec<Parameter>>;

    /// Number of walls in the model.
    fn wall_count(&self) -> usize;

    /// Number of wall types in the model.
    fn wall_type_count(&self) -> usize;

    /// Register a new wall type.
    fn create_wall_type(&mut self, definition: &WallTypeDefinition) -> ModelResult<ElementId>;

    /// Remove an unused wall type.
    fn delete_wall_type(&mut self, id: ElementId) -> ModelResult<()>;

    /// Create a wall.
    fn create_wall(&mut self, placement: &WallPlacement) -> ModelResult<ElementId>;

    /// Delete a wall together with whatever it still hosts.
    fn delete_wall(&mut self, id: ElementId) -> ModelResult<()>;

    /// Move a hosted element onto another wall.
    fn rehost(
        &mut self,
        element: ElementId,
        new_host: ElementId,
        position: HostPosition,
    ) -> ModelResult<()>;

    /// Write an instance parameter of a wall.
    fn set_parameter(
        &mut self,
        wall: ElementId,
        name: &str,
        value: ParameterValue,
    ) -> ModelResult<()>;

    /// Merge the geometry of two walls.
    fn join_geometry(&mut self, first: ElementId, second: ElementId) -> ModelResult<()>;

    /// Undo [`BimModel::join_geometry`].
    fn unjoin_geometry(&mut self, first: ElementId, second: ElementId) -> ModelResult<()>;

    /// Let a wall end join with neighbouring walls.
    fn allow_join_at_end(&mut self, wall: ElementId, end: WallEnd) -> ModelResult<()>;

    /// Open a transaction grouping all following mutations.
    fn begin_transaction(&mut self, _name: &str) -> ModelResult<()> {
        Ok(())
    }

    /// Make the transaction's mutations permanent.
    fn commit_transaction(&mut self) -> ModelResult<()> {
        Ok(())
    }

    /// Discard the transaction's mutations.
    fn rollback_transaction(&mut self) -> ModelResult<()> {
        Ok(())
    }
}
