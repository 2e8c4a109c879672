//! Layer analysis of composite walls.

use super::types::{Layer, LayerStack};
use crate::config::SplitConfig;
use crate::error::{Result, SplitError};
use crate::types::{Wall, WallKind, WallType};

/// Reads a wall type's compound structure into a positioned layer stack.
pub struct LayerAnalyzer {
    zero_thickness_tolerance: f64,
}

impl LayerAnalyzer {
    /// Create an analyzer using the configured tolerances.
    #[must_use]
    pub fn new(config: &SplitConfig) -> Self {
        Self {
            zero_thickness_tolerance: config.zero_thickness_tolerance,
        }
    }

    /// Analyze a wall and its type.
    ///
    /// Layers are ordered exterior to interior; each offset is the sum of
    /// the thicknesses before it. Fails with `InvalidWallType` when the type
    /// has fewer than two non-empty layers or is not a layered wall.
    pub fn analyze(&self, wall: &Wall, wall_type: &WallType) -> Result<LayerStack> {
        let invalid = |reason: String| SplitError::InvalidWallType {
            wall: wall.id,
            reason,
        };

        if wall.type_id != wall_type.id {
            return Err(invalid(format!(
                "wall uses type {} but type {} was supplied",
                wall.type_id, wall_type.id
            )));
        }
        match wall_type.kind {
            WallKind::Basic => {}
            WallKind::Curtain => {
                return Err(invalid("curtain walls have no layer structure".to_string()))
            }
            WallKind::Stacked => {
                return Err(invalid("stacked walls have no layer structure".to_string()))
            }
        }
        if wall_type.layers.is_empty() {
            return Err(invalid(format!("type '{}' has no layers", wall_type.name)));
        }

        let mut layers = Vec::with_capacity(wall_type.layers.len());
        let mut offset = 0.0;
        for (index, definition) in wall_type.layers.iter().enumerate() {
            if !definition.thickness.is_finite() || definition.thickness < 0.0 {
                return Err(invalid(format!(
                    "layer {index} has invalid thickness {}",
                    definition.thickness
                )));
            }
            layers.push(Layer {
                index,
                thickness: definition.thickness,
                function: definition.function,
                material: definition.material.clone(),
                offset,
                is_core: definition.is_core,
            });
            offset += definition.thickness;
        }

        let non_empty = layers
            .iter()
            .filter(|l| !l.is_empty(self.zero_thickness_tolerance))
            .count();
        if non_empty < 2 {
            return Err(invalid(format!(
                "type '{}' has a single layer, nothing to split",
                wall_type.name
            )));
        }

        let total_thickness = offset;
        let first_core = layers.iter().find(|l| l.is_core);
        let last_core = layers.iter().rev().find(|l| l.is_core);
        let (core_start, core_end) = match (first_core, last_core) {
            (Some(first), Some(last)) => (first.offset, last.end()),
            _ => (0.0, total_thickness),
        };

        tracing::debug!(
            wall = %wall.id,
            wall_type = %wall_type.name,
            layers = layers.len(),
            total_thickness,
            "Analyzed layer stack"
        );

        Ok(LayerStack {
            wall: wall.id,
            type_id: wall_type.id,
            type_name: wall_type.name.clone(),
            layers,
            total_thickness,
            core_start,
            core_end,
        })
    }
}
