//! Re-hosting of windows, doors and openings onto the output walls.

use super::ledger::{Artifact, RollbackLedger};
use super::orchestrator::SplitState;
use super::strategy::{strategy_for, RelocationStrategy};
use super::types::{HostedElementAssignment, SingleLayerWallSpec};
use crate::config::SplitConfig;
use crate::error::{Result, SplitError};
use crate::model::{BimModel, HostPosition, ModelError};
use crate::types::{ElementId, HostedElement, Wall};

/// Assigns hosted elements to output walls and moves them there.
pub struct HostedElementRelocator {
    strategy: Box<dyn RelocationStrategy>,
    tolerance: f64,
}

impl HostedElementRelocator {
    /// Create a relocator using the configured strategy.
    #[must_use]
    pub fn new(config: &SplitConfig) -> Self {
        Self {
            strategy: strategy_for(config.relocation),
            tolerance: config.boundary_tolerance,
        }
    }

    /// Use a custom strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl RelocationStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// Decide the new host of every element.
    ///
    /// The element keeps its point along the wall: its position on the
    /// source curve is projected onto the target curve. Each output wall's `hosted`
    /// list is filled in.
    pub fn plan(
        &self,
        source: &Wall,
        elements: &[HostedElement],
        specs: &mut [SingleLayerWallSpec],
    ) -> Result<Vec<HostedElementAssignment>> {
        let mut assignments = Vec::with_capacity(elements.len());
        for element in elements {
            let unassignable = || SplitError::UnassignableHost {
                element: element.id,
                offset: element.host_face_offset,
            };
            let spec_index = self
                .strategy
                .choose(element, specs, self.tolerance)
                .ok_or_else(unassignable)?;
            let spec = specs.get_mut(spec_index).ok_or_else(unassignable)?;

            let point = source.curve.point_at(element.station);
            let station = spec.curve.project(&point);
            let host_face_offset =
                (element.host_face_offset - spec.range.start).clamp(0.0, spec.thickness);

            tracing::debug!(
                element = %element.id,
                layer = spec.layer_index,
                station,
                "Assigned hosted element"
            );
            spec.hosted.push(element.id);
            assignments.push(HostedElementAssignment {
                element: element.id,
                kind: element.kind,
                spec_index,
                layer_index: spec.layer_index,
                station,
                sill_height: element.sill_height,
                host_face_offset,
            });
        }
        Ok(assignments)
    }

    /// Move the elements onto the created walls.
    ///
    /// `walls[i]` is the wall created for `specs[i]`. Each successful move is
    /// recorded with the element's previous host and position.
    pub fn apply<M: BimModel + ?Sized>(
        &self,
        model: &mut M,
        assignments: &[HostedElementAssignment],
        elements: &[HostedElement],
        walls: &[ElementId],
        ledger: &mut RollbackLedger,
    ) -> Result<()> {
        let failed = |source: ModelError| SplitError::model(SplitState::Relocating, source);

        for assignment in assignments {
            let element = elements
                .iter()
                .find(|e| e.id == assignment.element)
                .ok_or_else(|| failed(ModelError::NotFound(assignment.element)))?;
            let target = *walls
                .get(assignment.spec_index)
                .ok_or_else(|| {
                    failed(ModelError::Rejected(format!(
                        "no wall was created for layer {}",
                        assignment.layer_index
                    )))
                })?;

            let position = HostPosition {
                station: assignment.station,
                sill_height: assignment.sill_height,
                host_face_offset: assignment.host_face_offset,
            };
            model
                .rehost(element.id, target, position)
                .map_err(failed)?;
            ledger.record(Artifact::Rehost {
                element: element.id,
                previous_host: element.host,
                previous: HostPosition::of(element),
            });
            tracing::info!(element = %element.id, host = %target, "Re-hosted element");
        }
        Ok(())
    }
}
