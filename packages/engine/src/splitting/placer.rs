//! Placement of the output walls.

use super::types::{Layer, LayerRange, LayerStack, SingleLayerWallSpec, TypeResolution};
use crate::config::SplitConfig;
use crate::error::Result;
use crate::types::{LocationLine, Wall};

/// Computes the location curve of every output wall.
///
/// Each layer's centerline sits at `offset + thickness / 2` from the exterior
/// face; the output curve is the source curve moved by that distance minus
/// the reference offset, toward the interior.
pub struct GeometryPlacer {
    reference_line: Option<LocationLine>,
}

impl GeometryPlacer {
    #[must_use]
    pub fn new(config: &SplitConfig) -> Self {
        Self {
            reference_line: config.reference_line,
        }
    }

    /// Location line the source curve is taken to describe.
    #[must_use]
    pub fn reference_line(&self, wall: &Wall) -> LocationLine {
        self.reference_line.unwrap_or(wall.location_line)
    }

    /// Build one output wall per resolved layer, in the order given.
    pub fn place(
        &self,
        wall: &Wall,
        stack: &LayerStack,
        layers: &[(Layer, TypeResolution)],
    ) -> Result<Vec<SingleLayerWallSpec>> {
        let reference = stack.reference_offset(self.reference_line(wall));
        // Exterior to interior is the left of the run direction unless flipped.
        let direction = if wall.flipped { -1.0 } else { 1.0 };

        layers
            .iter()
            .map(|(layer, resolution)| -> Result<SingleLayerWallSpec> {
                let centerline_offset = layer.offset + layer.thickness / 2.0 - reference;
                let curve = wall.curve.offset(direction * centerline_offset)?;
                tracing::trace!(
                    wall = %wall.id,
                    layer = layer.index,
                    centerline_offset,
                    "Placed layer wall"
                );
                Ok(SingleLayerWallSpec {
                    layer_index: layer.index,
                    thickness: layer.thickness,
                    function: layer.function,
                    material: layer.material.clone(),
                    is_core: layer.is_core,
                    type_ref: *resolution,
                    range: LayerRange {
                        start: layer.offset,
                        end: layer.end(),
                    },
                    centerline_offset,
                    curve,
                    constraints: wall.constraints.clone(),
                    flipped: wall.flipped,
                    structural: wall.structural,
                    hosted: Vec::new(),
                })
            })
            .collect()
    }
}
