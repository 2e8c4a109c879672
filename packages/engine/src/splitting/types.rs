//! Types for the layer splitting system.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Result, SplitError};
use crate::geometry::Curve;
use crate::types::{
    ElementId, HostedKind, LayerFunction, LocationLine, VerticalConstraints, WallTypeDefinition,
};

/// One layer of an analyzed wall, positioned in the stack.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    /// Position in the type's layer list (exterior first, zero-based).
    pub index: usize,
    pub thickness: f64,
    pub function: LayerFunction,
    pub material: Option<String>,
    /// Distance of the layer's exterior side from the exterior finish face.
    pub offset: f64,
    pub is_core: bool,
}

impl Layer {
    /// Distance of the layer's interior side from the exterior finish face.
    #[must_use]
    pub fn end(&self) -> f64 {
        self.offset + self.thickness
    }

    /// Whether the layer has a usable thickness.
    #[must_use]
    pub fn is_empty(&self, tolerance: f64) -> bool {
        self.thickness <= tolerance
    }
}

/// The analyzed layer structure of one wall.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerStack {
    pub wall: ElementId,
    pub type_id: ElementId,
    pub type_name: String,
    /// All layers of the type, zero-thickness ones included.
    pub layers: Vec<Layer>,
    pub total_thickness: f64,
    /// Offset of the exterior core boundary.
    pub core_start: f64,
    /// Offset of the interior core boundary.
    pub core_end: f64,
}

impl LayerStack {
    /// Distance of a location line from the exterior finish face.
    #[must_use]
    pub fn reference_offset(&self, line: LocationLine) -> f64 {
        match line {
            LocationLine::WallCenterline => self.total_thickness / 2.0,
            LocationLine::CoreCenterline => (self.core_start + self.core_end) / 2.0,
            LocationLine::FinishFaceExterior => 0.0,
            LocationLine::FinishFaceInterior => self.total_thickness,
            LocationLine::CoreFaceExterior => self.core_start,
            LocationLine::CoreFaceInterior => self.core_end,
        }
    }

    /// Look up a layer by index.
    #[must_use]
    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    /// Layers thicker than the tolerance, in stack order.
    pub fn non_empty(&self, tolerance: f64) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(move |l| !l.is_empty(tolerance))
    }
}

/// Which type a selected layer should end up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", content = "type_id", rename_all = "snake_case")]
pub enum TypeTarget {
    /// Reuse a matching single-layer type, or create one.
    #[default]
    Auto,
    /// Always create a type for this split.
    CreateNew,
    /// Use this type.
    Existing(ElementId),
}

/// The caller's choice of layers to extract.
///
/// # Examples
/// ```
/// use layersplit_engine::splitting::{LayerSelection, TypeTarget};
/// use layersplit_engine::types::ElementId;
///
/// let selection = LayerSelection::only([0, 2])
///     .with_target(2, TypeTarget::Existing(ElementId(40)));
/// assert_eq!(selection.layers, Some(vec![0, 2]));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerSelection {
    /// Layer indices to extract; `None` extracts every non-empty layer.
    pub layers: Option<Vec<usize>>,
    /// Per-layer type targets; missing entries are `Auto`.
    pub targets: BTreeMap<usize, TypeTarget>,
}

impl LayerSelection {
    /// Extract every non-empty layer.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Extract only the given layers.
    #[must_use]
    pub fn only(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            layers: Some(indices.into_iter().collect()),
            targets: BTreeMap::new(),
        }
    }

    /// Set the type target of one layer.
    #[must_use]
    pub fn with_target(mut self, index: usize, target: TypeTarget) -> Self {
        self.targets.insert(index, target);
        self
    }

    /// Whether every non-empty layer is extracted.
    #[must_use]
    pub fn is_complete(&self, stack: &LayerStack, tolerance: f64) -> bool {
        match &self.layers {
            None => true,
            Some(indices) => stack
                .non_empty(tolerance)
                .all(|layer| indices.contains(&layer.index)),
        }
    }

    /// Resolve the selection against a stack, in stack order.
    pub fn choices(&self, stack: &LayerStack, tolerance: f64) -> Result<Vec<LayerChoice>> {
        let indices: Vec<usize> = match &self.layers {
            None => stack.non_empty(tolerance).map(|l| l.index).collect(),
            Some(indices) => {
                if indices.is_empty() {
                    return Err(SplitError::InvalidSelection(
                        "no layers selected".to_string(),
                    ));
                }
                let mut sorted = indices.clone();
                sorted.sort_unstable();
                if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
                    return Err(SplitError::InvalidSelection(format!(
                        "layer {} selected twice",
                        pair[0]
                    )));
                }
                sorted
            }
        };

        for index in self.targets.keys() {
            if !indices.contains(index) {
                return Err(SplitError::InvalidSelection(format!(
                    "type target given for unselected layer {index}"
                )));
            }
        }

        indices
            .into_iter()
            .map(|index| -> Result<LayerChoice> {
                let layer = stack.layer(index).ok_or_else(|| {
                    SplitError::InvalidSelection(format!(
                        "layer {index} does not exist, the wall has {} layers",
                        stack.layers.len()
                    ))
                })?;
                if layer.is_empty(tolerance) {
                    return Err(SplitError::InvalidSelection(format!(
                        "layer {index} has no thickness"
                    )));
                }
                Ok(LayerChoice {
                    layer: layer.clone(),
                    target: self.targets.get(&index).copied().unwrap_or_default(),
                })
            })
            .collect()
    }
}

/// A selected layer paired with its type target.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerChoice {
    pub layer: Layer,
    pub target: TypeTarget,
}

/// Outcome of type resolution for one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TypeResolution {
    /// The type already exists in the model.
    Existing(ElementId),
    /// The type will be created; index into the resolver's pending list.
    Pending(usize),
}

/// A type the resolver will create once the model may be mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingType {
    /// Layer the type was synthesized for.
    pub layer_index: usize,
    /// Definition with the preferred name.
    pub definition: WallTypeDefinition,
    /// Id assigned by the model once created.
    pub created: Option<ElementId>,
}

/// Interval of a layer measured from the exterior finish face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerRange {
    pub start: f64,
    pub end: f64,
}

impl LayerRange {
    /// Width of the interval.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `offset` lies inside the range, boundaries widened by `tolerance`.
    #[must_use]
    pub fn contains(&self, offset: f64, tolerance: f64) -> bool {
        offset >= self.start - tolerance && offset <= self.end + tolerance
    }
}

/// Computed plan for one output wall.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SingleLayerWallSpec {
    pub layer_index: usize,
    pub thickness: f64,
    pub function: LayerFunction,
    pub material: Option<String>,
    pub is_core: bool,
    /// Resolved type.
    pub type_ref: TypeResolution,
    /// Interval of the layer in the source wall.
    pub range: LayerRange,
    /// Signed distance of the layer centerline from the source location line.
    pub centerline_offset: f64,
    /// Location curve of the output wall (its centerline).
    pub curve: Curve,
    pub constraints: VerticalConstraints,
    pub flipped: bool,
    pub structural: bool,
    /// Hosted elements assigned to this wall.
    pub hosted: Vec<ElementId>,
}

/// Where a hosted element goes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostedElementAssignment {
    pub element: ElementId,
    pub kind: HostedKind,
    /// Index into the plan's specs.
    pub spec_index: usize,
    pub layer_index: usize,
    /// Station on the target wall's curve.
    pub station: f64,
    pub sill_height: f64,
    /// Offset from the target wall's exterior face.
    pub host_face_offset: f64,
}

/// Everything a split will do, computed before any model mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitPlan {
    pub wall: ElementId,
    pub stack: LayerStack,
    /// Location line the offsets are measured from.
    pub reference_line: LocationLine,
    pub reference_offset: f64,
    /// Whether every non-empty layer is extracted.
    pub complete: bool,
    pub specs: Vec<SingleLayerWallSpec>,
    pub assignments: Vec<HostedElementAssignment>,
    /// Types to be created, with their preferred names.
    pub pending_types: Vec<PendingType>,
}

impl SplitPlan {
    /// Ranges are in stack order and do not overlap.
    #[must_use]
    pub fn is_disjoint(&self, tolerance: f64) -> bool {
        self.specs
            .windows(2)
            .all(|pair| pair[1].range.start >= pair[0].range.end - tolerance)
    }

    /// Ranges are contiguous and cover the whole wall thickness.
    #[must_use]
    pub fn covers_footprint(&self, tolerance: f64) -> bool {
        let (Some(first), Some(last)) = (self.specs.first(), self.specs.last()) else {
            return false;
        };
        let contiguous = self
            .specs
            .windows(2)
            .all(|pair| (pair[1].range.start - pair[0].range.end).abs() <= tolerance);
        contiguous
            && first.range.start.abs() <= tolerance
            && (last.range.end - self.stack.total_thickness).abs() <= tolerance
    }

    /// Output walls tile the source footprint.
    ///
    /// Partial selections only need to be disjoint; complete ones must also
    /// cover the full thickness.
    #[must_use]
    pub fn verify_tiling(&self, tolerance: f64) -> bool {
        self.is_disjoint(tolerance) && (!self.complete || self.covers_footprint(tolerance))
    }

    /// Hosted elements assigned to the output wall at `index`.
    pub fn assignments_for(&self, index: usize) -> impl Iterator<Item = &HostedElementAssignment> {
        self.assignments
            .iter()
            .filter(move |a| a.spec_index == index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(index: usize, thickness: f64, offset: f64) -> Layer {
        Layer {
            index,
            thickness,
            function: LayerFunction::Structure,
            material: None,
            offset,
            is_core: false,
        }
    }

    fn stack() -> LayerStack {
        LayerStack {
            wall: ElementId(1),
            type_id: ElementId(2),
            type_name: "Cavity".to_string(),
            layers: vec![
                layer(0, 100.0, 0.0),
                layer(1, 0.0, 100.0),
                layer(2, 50.0, 100.0),
                layer(3, 12.0, 150.0),
            ],
            total_thickness: 162.0,
            core_start: 0.0,
            core_end: 100.0,
        }
    }

    #[test]
    fn test_reference_offsets() {
        let stack = stack();
        assert_eq!(stack.reference_offset(LocationLine::WallCenterline), 81.0);
        assert_eq!(stack.reference_offset(LocationLine::CoreCenterline), 50.0);
        assert_eq!(stack.reference_offset(LocationLine::FinishFaceInterior), 162.0);
        assert_eq!(stack.reference_offset(LocationLine::CoreFaceInterior), 100.0);
    }

    #[test]
    fn test_all_skips_empty_layers() {
        let choices = LayerSelection::all().choices(&stack(), 1e-6).unwrap();
        let indices: Vec<usize> = choices.iter().map(|c| c.layer.index).collect();
        assert_eq!(indices, vec![0, 2, 3]);
        assert!(choices.iter().all(|c| c.target == TypeTarget::Auto));
    }

    #[test]
    fn test_selection_is_sorted_into_stack_order() {
        let selection = LayerSelection::only([3, 0]).with_target(3, TypeTarget::CreateNew);
        let choices = selection.choices(&stack(), 1e-6).unwrap();
        assert_eq!(choices[0].layer.index, 0);
        assert_eq!(choices[1].target, TypeTarget::CreateNew);
        assert!(!selection.is_complete(&stack(), 1e-6));
    }

    #[test]
    fn test_invalid_selections() {
        let stack = stack();
        let cases = [
            LayerSelection::only([]),
            LayerSelection::only([0, 0]),
            LayerSelection::only([7]),
            LayerSelection::only([1]),
            LayerSelection::only([0]).with_target(2, TypeTarget::CreateNew),
        ];
        for selection in cases {
            assert!(
                matches!(
                    selection.choices(&stack, 1e-6),
                    Err(SplitError::InvalidSelection(_))
                ),
                "{selection:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_range_contains_with_tolerance() {
        let range = LayerRange {
            start: 100.0,
            end: 150.0,
        };
        assert!(range.contains(125.0, 0.0));
        assert!(range.contains(150.00005, 1e-4));
        assert!(!range.contains(150.1, 1e-4));
        assert_eq!(range.width(), 50.0);
    }
}
