//! In-memory implementation of [`BimModel`].
//!
//! Holds a whole model document (types, walls, hosted elements, joins) and
//! supports snapshot transactions. Used by the CLI, which reads and writes
//! the document as YAML, and by the tests, which can inject faults to drive
//! the rollback paths.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{BimModel, HostPosition, ModelError, ModelResult, WallEnd, WallPlacement};
use crate::types::{
    ElementId, HostedElement, Parameter, ParameterValue, Wall, WallKind, WallType,
    WallTypeDefinition,
};

/// Two walls whose geometry is joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRecord {
    pub first: ElementId,
    pub second: ElementId,
}

impl JoinRecord {
    fn connects(&self, a: ElementId, b: ElementId) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }

    fn involves(&self, wall: ElementId) -> bool {
        self.first == wall || self.second == wall
    }
}

/// A wall end that may join with its neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndJoin {
    pub wall: ElementId,
    pub end: WallEnd,
}

/// Serializable content of a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    #[serde(default)]
    pub wall_types: Vec<WallType>,
    #[serde(default)]
    pub walls: Vec<Wall>,
    #[serde(default)]
    pub hosted_elements: Vec<HostedElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joins: Vec<JoinRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub end_joins: Vec<EndJoin>,
    /// Instance parameters every newly created wall starts with.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wall_parameter_schema: Vec<Parameter>,
}

impl ModelDocument {
    /// Parse a document from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Serialize the document to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    fn max_id(&self) -> u64 {
        let type_ids = self.wall_types.iter().map(|t| t.id.0);
        let wall_ids = self.walls.iter().map(|w| w.id.0);
        let hosted_ids = self.hosted_elements.iter().map(|h| h.id.0);
        type_ids.chain(wall_ids).chain(hosted_ids).max().unwrap_or(0)
    }
}

/// Operations an [`InMemoryModel`] can be told to refuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Every wall type creation is rejected.
    CreateWallType,
    /// Wall creation is rejected once this many walls were created.
    CreateWall { after: usize },
    /// Rehosting this element is rejected.
    Rehost(ElementId),
    /// Writing this parameter is rejected.
    SetParameter(String),
    /// Every geometry join is rejected.
    JoinGeometry,
    /// Every end join request is rejected.
    AllowEndJoin,
    /// Deleting this wall is rejected.
    DeleteWall(ElementId),
}

#[derive(Debug, Clone)]
struct Snapshot {
    document: ModelDocument,
    next_id: u64,
    walls_created: usize,
}

/// A model kept entirely in memory.
#[derive(Debug, Clone)]
pub struct InMemoryModel {
    document: ModelDocument,
    next_id: u64,
    walls_created: usize,
    transactions_enabled: bool,
    transaction: Option<Snapshot>,
    faults: Vec<Fault>,
}

impl InMemoryModel {
    /// Create an empty model.
    #[must_use]
    pub fn new() -> Self {
        Self::from_document(ModelDocument::default())
    }

    /// Wrap an existing document. New ids continue after the largest one.
    #[must_use]
    pub fn from_document(document: ModelDocument) -> Self {
        let next_id = document.max_id() + 1;
        Self {
            document,
            next_id,
            walls_created: 0,
            transactions_enabled: true,
            transaction: None,
            faults: Vec::new(),
        }
    }

    /// Load a model from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(Self::from_document(ModelDocument::from_yaml(yaml)?))
    }

    /// Enable or disable snapshot transactions.
    ///
    /// Without transactions, `begin`/`commit`/`rollback` do nothing and every
    /// mutation takes effect immediately.
    #[must_use]
    pub fn with_transactions(mut self, enabled: bool) -> Self {
        self.transactions_enabled = enabled;
        self
    }

    /// Make the model refuse an operation.
    #[must_use]
    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.faults.push(fault);
        self
    }

    /// The current document.
    #[must_use]
    pub fn document(&self) -> &ModelDocument {
        &self.document
    }

    /// Consume the model, returning its document.
    #[must_use]
    pub fn into_document(self) -> ModelDocument {
        self.document
    }

    /// Whether a transaction is open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Look up a hosted element.
    #[must_use]
    pub fn hosted_element(&self, id: ElementId) -> Option<&HostedElement> {
        self.document.hosted_elements.iter().find(|h| h.id == id)
    }

    /// Look up a wall type by name.
    #[must_use]
    pub fn wall_type_by_name(&self, name: &str) -> Option<&WallType> {
        self.document.wall_types.iter().find(|t| t.name == name)
    }

    /// Whether two walls are joined.
    #[must_use]
    pub fn is_joined(&self, a: ElementId, b: ElementId) -> bool {
        self.document.joins.iter().any(|j| j.connects(a, b))
    }

    /// Whether a wall end was opened for joining.
    #[must_use]
    pub fn end_join_allowed(&self, wall: ElementId, end: WallEnd) -> bool {
        self.document
            .end_joins
            .iter()
            .any(|e| e.wall == wall && e.end == end)
    }

    fn allocate_id(&mut self) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        id
    }

    fn has_fault(&self, fault: &Fault) -> bool {
        self.faults.contains(fault)
    }

    fn wall_ref(&self, id: ElementId) -> ModelResult<&Wall> {
        self.document
            .walls
            .iter()
            .find(|w| w.id == id)
            .ok_or(ModelError::NotFound(id))
    }

    fn wall_mut(&mut self, id: ElementId) -> ModelResult<&mut Wall> {
        self.document
            .walls
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or(ModelError::NotFound(id))
    }
}

impl Default for InMemoryModel {
    fn default() -> Self {
        Self::new()
    }
}

impl BimModel for InMemoryModel {
    fn wall(&self, id: ElementId) -> ModelResult<Wall> {
        self.wall_ref(id).cloned()
    }

    fn wall_type(&self, id: ElementId) -> ModelResult<WallType> {
        self.document
            .wall_types
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(ModelError::NotFound(id))
    }

    fn wall_types(&self) -> Vec<WallType> {
        self.document.wall_types.clone()
    }

    fn hosted_elements(&self, wall: ElementId) -> ModelResult<Vec<HostedElement>> {
        self.wall_ref(wall)?;
        Ok(self
            .document
            .hosted_elements
            .iter()
            .filter(|h| h.host == wall)
            .cloned()
            .collect())
    }

    fn wall_parameters(&self, wall: ElementId) -> ModelResult<Vec<Parameter>> {
        Ok(self.wall_ref(wall)?.parameters.clone())
    }

    fn wall_count(&self) -> usize {
        self.document.walls.len()
    }

    fn wall_type_count(&self) -> usize {
        self.document.wall_types.len()
    }

    fn create_wall_type(&mut self, definition: &WallTypeDefinition) -> ModelResult<ElementId> {
        if self.has_fault(&Fault::CreateWallType) {
            return Err(ModelError::Rejected(format!(
                "wall type '{}' was refused",
                definition.name
            )));
        }
        if self.wall_type_by_name(&definition.name).is_some() {
            return Err(ModelError::NameCollision(definition.name.clone()));
        }

        let id = self.allocate_id();
        self.document.wall_types.push(WallType {
            id,
            name: definition.name.clone(),
            kind: WallKind::Basic,
            layers: definition.layers.clone(),
            parameters: definition.parameters.clone(),
        });
        Ok(id)
    }

    fn delete_wall_type(&mut self, id: ElementId) -> ModelResult<()> {
        if self.document.walls.iter().any(|w| w.type_id == id) {
            return Err(ModelError::TypeInUse(id));
        }
        let before = self.document.wall_types.len();
        self.document.wall_types.retain(|t| t.id != id);
        if self.document.wall_types.len() == before {
            return Err(ModelError::NotFound(id));
        }
        Ok(())
    }

    fn create_wall(&mut self, placement: &WallPlacement) -> ModelResult<ElementId> {
        if let Some(Fault::CreateWall { after }) = self
            .faults
            .iter()
            .find(|f| matches!(f, Fault::CreateWall { .. }))
        {
            if self.walls_created >= *after {
                return Err(ModelError::Rejected("wall creation was refused".to_string()));
            }
        }
        self.wall_type(placement.type_id)?;
        placement
            .curve
            .validate()
            .map_err(|e| ModelError::Rejected(e.to_string()))?;

        let id = self.allocate_id();
        let parameters = self.document.wall_parameter_schema.clone();
        self.document.walls.push(Wall {
            id,
            type_id: placement.type_id,
            curve: placement.curve.clone(),
            location_line: placement.location_line,
            constraints: placement.constraints.clone(),
            flipped: placement.flipped,
            structural: placement.structural,
            parameters,
        });
        self.walls_created += 1;
        Ok(id)
    }

    fn delete_wall(&mut self, id: ElementId) -> ModelResult<()> {
        if self.has_fault(&Fault::DeleteWall(id)) {
            return Err(ModelError::Rejected(format!("wall {id} cannot be deleted")));
        }
        self.wall_ref(id)?;
        self.document.walls.retain(|w| w.id != id);
        self.document.hosted_elements.retain(|h| h.host != id);
        self.document.joins.retain(|j| !j.involves(id));
        self.document.end_joins.retain(|e| e.wall != id);
        Ok(())
    }

    fn rehost(
        &mut self,
        element: ElementId,
        new_host: ElementId,
        position: HostPosition,
    ) -> ModelResult<()> {
        self.wall_ref(new_host)?;
        if self.has_fault(&Fault::Rehost(element)) {
            return Err(ModelError::Rejected(format!(
                "element {element} cannot be rehosted"
            )));
        }
        let hosted = self
            .document
            .hosted_elements
            .iter_mut()
            .find(|h| h.id == element)
            .ok_or(ModelError::NotFound(element))?;
        if hosted.pinned {
            return Err(ModelError::Pinned(element));
        }

        hosted.host = new_host;
        hosted.station = position.station;
        hosted.sill_height = position.sill_height;
        hosted.host_face_offset = position.host_face_offset;
        Ok(())
    }

    fn set_parameter(
        &mut self,
        wall: ElementId,
        name: &str,
        value: ParameterValue,
    ) -> ModelResult<()> {
        if self.has_fault(&Fault::SetParameter(name.to_string())) {
            return Err(ModelError::Rejected(format!(
                "parameter '{name}' is locked"
            )));
        }
        let target = self.wall_mut(wall)?;
        let parameter = target
            .parameters
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| ModelError::ParameterNotFound {
                element: wall,
                parameter: name.to_string(),
            })?;

        if parameter.read_only {
            return Err(ModelError::ReadOnlyParameter {
                element: wall,
                parameter: name.to_string(),
            });
        }
        let expected = parameter.value.storage_type();
        let actual = value.storage_type();
        if expected != actual {
            return Err(ModelError::StorageMismatch {
                parameter: name.to_string(),
                expected,
                actual,
            });
        }

        parameter.value = value;
        Ok(())
    }

    fn join_geometry(&mut self, first: ElementId, second: ElementId) -> ModelResult<()> {
        self.wall_ref(first)?;
        self.wall_ref(second)?;
        if first == second {
            return Err(ModelError::Rejected("a wall cannot join itself".to_string()));
        }
        if self.has_fault(&Fault::JoinGeometry) {
            return Err(ModelError::Rejected(format!(
                "walls {first} and {second} cannot be joined"
            )));
        }
        if self.is_joined(first, second) {
            return Err(ModelError::Rejected(format!(
                "walls {first} and {second} are already joined"
            )));
        }
        self.document.joins.push(JoinRecord { first, second });
        Ok(())
    }

    fn unjoin_geometry(&mut self, first: ElementId, second: ElementId) -> ModelResult<()> {
        let before = self.document.joins.len();
        self.document.joins.retain(|j| !j.connects(first, second));
        if self.document.joins.len() == before {
            return Err(ModelError::NotJoined(first, second));
        }
        Ok(())
    }

    fn allow_join_at_end(&mut self, wall: ElementId, end: WallEnd) -> ModelResult<()> {
        self.wall_ref(wall)?;
        if self.has_fault(&Fault::AllowEndJoin) {
            return Err(ModelError::Rejected(format!(
                "wall {wall} end cannot be joined"
            )));
        }
        if !self.end_join_allowed(wall, end) {
            self.document.end_joins.push(EndJoin { wall, end });
        }
        Ok(())
    }

    fn begin_transaction(&mut self, name: &str) -> ModelResult<()> {
        if !self.transactions_enabled {
            return Ok(());
        }
        if self.transaction.is_some() {
            return Err(ModelError::Transaction(format!(
                "cannot start '{name}' while another transaction is open"
            )));
        }
        tracing::trace!(transaction = %name, "Opening model transaction");
        self.transaction = Some(Snapshot {
            document: self.document.clone(),
            next_id: self.next_id,
            walls_created: self.walls_created,
        });
        Ok(())
    }

    fn commit_transaction(&mut self) -> ModelResult<()> {
        if !self.transactions_enabled {
            return Ok(());
        }
        self.transaction
            .take()
            .map(|_| ())
            .ok_or_else(|| ModelError::Transaction("no open transaction to commit".to_string()))
    }

    fn rollback_transaction(&mut self) -> ModelResult<()> {
        if !self.transactions_enabled {
            return Ok(());
        }
        let snapshot = self.transaction.take().ok_or_else(|| {
            ModelError::Transaction("no open transaction to roll back".to_string())
        })?;
        self.document = snapshot.document;
        self.next_id = snapshot.next_id;
        self.walls_created = snapshot.walls_created;
        Ok(())
    }
}
