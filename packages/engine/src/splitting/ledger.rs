//! Record of model mutations made by a split, for explicit undo.

use crate::model::{BimModel, HostPosition, ModelError};
use crate::types::ElementId;

/// One mutation made by a split.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    /// A created wall type.
    WallType(ElementId),
    /// A created wall.
    Wall(ElementId),
    /// A hosted element moved off its original host.
    Rehost {
        element: ElementId,
        previous_host: ElementId,
        previous: HostPosition,
    },
    /// Two walls joined together.
    Join { first: ElementId, second: ElementId },
}

impl Artifact {
    fn undo<M: BimModel + ?Sized>(&self, model: &mut M) -> Result<(), ModelError> {
        match self {
            Self::WallType(id) => model.delete_wall_type(*id),
            Self::Wall(id) => model.delete_wall(*id),
            Self::Rehost {
                element,
                previous_host,
                previous,
            } => model.rehost(*element, *previous_host, *previous),
            Self::Join { first, second } => model.unjoin_geometry(*first, *second),
        }
    }
}

/// Ordered list of artifacts, undone last-first.
#[derive(Debug, Default)]
pub struct RollbackLedger {
    artifacts: Vec<Artifact>,
}

impl RollbackLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mutation that succeeded.
    pub fn record(&mut self, artifact: Artifact) {
        self.artifacts.push(artifact);
    }

    #[must_use]
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Undo every recorded artifact in reverse order.
    ///
    /// A failed undo step is logged and skipped; the remaining steps still
    /// run. Returns the number of failed steps.
    pub fn undo<M: BimModel + ?Sized>(&mut self, model: &mut M) -> usize {
        let mut failures = 0;
        while let Some(artifact) = self.artifacts.pop() {
            if let Err(e) = artifact.undo(model) {
                failures += 1;
                tracing::error!(artifact = ?artifact, error = %e, "Failed to undo split artifact");
            }
        }
        failures
    }
}
