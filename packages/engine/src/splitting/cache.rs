//! Per-operation cache of resolved wall types.

use std::collections::HashMap;

use super::types::{Layer, TypeResolution};
use crate::types::{ElementId, LayerFunction};

/// Identity of a single-layer type for deduplication.
///
/// Thickness is quantized to micrometres so that layers read from the same
/// type hash equally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeSignature {
    thickness_um: i64,
    material: Option<String>,
    function: Option<LayerFunction>,
    /// Signatures of `CreateNew` targets never match catalog lookups.
    fresh: bool,
}

impl TypeSignature {
    /// Signature of a layer. `function` is left out when functions are not matched.
    #[must_use]
    pub fn of(layer: &Layer, match_function: bool, fresh: bool) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let thickness_um = (layer.thickness * 1000.0).round() as i64;
        Self {
            thickness_um,
            material: layer.material.clone(),
            function: match_function.then_some(layer.function),
            fresh,
        }
    }
}

/// Cache of type resolutions owned by one split.
pub struct TypeCache {
    entries: HashMap<TypeSignature, TypeResolution>,
}

impl TypeCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Remember a resolution.
    pub fn insert(&mut self, signature: TypeSignature, resolution: TypeResolution) {
        self.entries.insert(signature, resolution);
    }

    /// Get the resolution for a signature.
    #[must_use]
    pub fn get(&self, signature: &TypeSignature) -> Option<TypeResolution> {
        self.entries.get(signature).copied()
    }

    /// Replace a pending entry with the id it was created as.
    pub fn realize(&mut self, pending: usize, id: ElementId) {
        for resolution in self.entries.values_mut() {
            if *resolution == TypeResolution::Pending(pending) {
                *resolution = TypeResolution::Existing(id);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TypeCache {
    fn default() -> Self {
        Self::new()
    }
}
