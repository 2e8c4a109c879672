//! Strategies for choosing the new host of a hosted element.

use super::types::SingleLayerWallSpec;
use crate::config::RelocationMode;
use crate::types::{HostFace, HostedElement, LayerFunction};

/// Trait for configurable relocation strategies.
///
/// Implementations pick the output wall (an index into `specs`, which are
/// in stack order) that receives a hosted element.
pub trait RelocationStrategy {
    /// Choose the output wall index for `element`, or `None` if no wall fits.
    fn choose(
        &self,
        element: &HostedElement,
        specs: &[SingleLayerWallSpec],
        tolerance: f64,
    ) -> Option<usize>;
}

/// Strategy that hosts each element on the layer containing its offset.
///
/// This is the default strategy. An offset on a shared boundary goes to the
/// layer on the side of the element's host face.
pub struct OffsetContainmentStrategy;

impl RelocationStrategy for OffsetContainmentStrategy {
    fn choose(
        &self,
        element: &HostedElement,
        specs: &[SingleLayerWallSpec],
        tolerance: f64,
    ) -> Option<usize> {
        let mut containing = specs
            .iter()
            .enumerate()
            .filter(|(_, spec)| spec.range.contains(element.host_face_offset, tolerance))
            .map(|(index, _)| index);

        match element.host_face {
            HostFace::Exterior => containing.next(),
            HostFace::Interior => containing.last(),
        }
    }
}

/// Strategy that hosts everything on the load-bearing layer.
///
/// Picks the first structure layer, then the first core layer, then the
/// first extracted layer.
pub struct StructuralLayerStrategy;

impl RelocationStrategy for StructuralLayerStrategy {
    fn choose(
        &self,
        _element: &HostedElement,
        specs: &[SingleLayerWallSpec],
        _tolerance: f64,
    ) -> Option<usize> {
        specs
            .iter()
            .position(|s| s.function == LayerFunction::Structure)
            .or_else(|| specs.iter().position(|s| s.is_core))
            .or_else(|| (!specs.is_empty()).then_some(0))
    }
}

/// Strategy that hosts everything on the thickest layer.
pub struct ThickestLayerStrategy;

impl RelocationStrategy for ThickestLayerStrategy {
    fn choose(
        &self,
        _element: &HostedElement,
        specs: &[SingleLayerWallSpec],
        _tolerance: f64,
    ) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, spec) in specs.iter().enumerate() {
            match best {
                Some((_, thickness)) if spec.thickness <= thickness => {}
                _ => best = Some((index, spec.thickness)),
            }
        }
        best.map(|(index, _)| index)
    }
}

/// Strategy matching a configured mode.
#[must_use]
pub fn strategy_for(mode: RelocationMode) -> Box<dyn RelocationStrategy> {
    match mode {
        RelocationMode::ByOffset => Box::new(OffsetContainmentStrategy),
        RelocationMode::StructuralLayer => Box::new(StructuralLayerStrategy),
        RelocationMode::ThickestLayer => Box::new(ThickestLayerStrategy),
    }
}
