//! Resolve-or-create of single-layer wall types.
//!
//! Resolution runs while planning and never touches the model: layers
//! without a matching type get a [`TypeResolution::Pending`] entry. The
//! pending types are created by [`WallTypeResolver::realize_pending`] once
//! the split starts mutating the model.

use std::sync::LazyLock;

use regex::Regex;

use super::cache::{TypeCache, TypeSignature};
use super::ledger::{Artifact, RollbackLedger};
use super::parameters::ParameterCopier;
use super::types::{Layer, PendingType, TypeResolution, TypeTarget};
use crate::config::SplitConfig;
use crate::error::{Result, SplitError};
use crate::model::{BimModel, ModelError};
use crate::types::{ElementId, LayerDefinition, Parameter, WallKind, WallType, WallTypeDefinition};

/// Characters the host does not accept in type names.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FORBIDDEN_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\n\r<>:"/\\|?*]"#).expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Make a string usable as a type name.
#[must_use]
pub fn sanitize_type_name(name: &str) -> String {
    let cleaned = FORBIDDEN_NAME_CHARS.replace_all(name, "_");
    WHITESPACE_RUN.replace_all(&cleaned, " ").trim().to_string()
}

/// Finds or plans a single-layer type for each extracted layer.
pub struct WallTypeResolver {
    source_name: String,
    type_parameters: Vec<Parameter>,
    catalog: Vec<WallType>,
    tolerance: f64,
    match_function: bool,
    max_name_attempts: usize,
    cache: TypeCache,
    pending: Vec<PendingType>,
    /// Parallel to `pending`: whether the entry was planned for a `CreateNew` target.
    pending_fresh: Vec<bool>,
}

impl WallTypeResolver {
    /// Create a resolver for layers of `source`, searching `catalog`.
    #[must_use]
    pub fn new(source: &WallType, catalog: Vec<WallType>, config: &SplitConfig) -> Self {
        let copier = ParameterCopier::new(config);
        Self {
            source_name: source.name.clone(),
            type_parameters: copier.type_parameters(&source.parameters),
            catalog,
            tolerance: config.type_match_tolerance,
            match_function: config.match_layer_function,
            max_name_attempts: config.max_type_name_attempts,
            cache: TypeCache::new(),
            pending: Vec::new(),
            pending_fresh: Vec::new(),
        }
    }

    /// Resolve the type for one layer.
    pub fn resolve(&mut self, layer: &Layer, target: TypeTarget) -> Result<TypeResolution> {
        match target {
            TypeTarget::Existing(type_id) => self.check_target(layer, type_id),
            TypeTarget::Auto => {
                let signature = TypeSignature::of(layer, self.match_function, false);
                if let Some(resolution) = self.cache.get(&signature) {
                    return Ok(resolution);
                }
                let resolution = match self.find_match(layer) {
                    Some(id) => {
                        tracing::debug!(layer = layer.index, wall_type = %id, "Reusing existing wall type");
                        TypeResolution::Existing(id)
                    }
                    None => self
                        .find_pending(layer, false)
                        .unwrap_or_else(|| self.plan_new(layer, false)),
                };
                self.cache.insert(signature, resolution);
                Ok(resolution)
            }
            TypeTarget::CreateNew => {
                let signature = TypeSignature::of(layer, self.match_function, true);
                if let Some(resolution) = self.cache.get(&signature) {
                    return Ok(resolution);
                }
                let resolution = self
                    .find_pending(layer, true)
                    .unwrap_or_else(|| self.plan_new(layer, true));
                self.cache.insert(signature, resolution);
                Ok(resolution)
            }
        }
    }

    /// Types that still have to be created.
    #[must_use]
    pub fn pending(&self) -> &[PendingType] {
        &self.pending
    }

    /// Id of a resolved type, once it exists.
    #[must_use]
    pub fn type_id(&self, resolution: TypeResolution) -> Option<ElementId> {
        match resolution {
            TypeResolution::Existing(id) => Some(id),
            TypeResolution::Pending(index) => self.pending.get(index).and_then(|p| p.created),
        }
    }

    /// Create every pending type in the model.
    ///
    /// Name collisions are retried with `" #2"`, `" #3"`... suffixes. Every
    /// created type is recorded in `ledger`.
    pub fn realize_pending<M: BimModel + ?Sized>(
        &mut self,
        model: &mut M,
        ledger: &mut RollbackLedger,
    ) -> Result<Vec<ElementId>> {
        let mut created = Vec::new();
        for index in 0..self.pending.len() {
            if self.pending[index].created.is_some() {
                continue;
            }
            let id = self.create_with_unique_name(model, index)?;
            ledger.record(Artifact::WallType(id));
            self.pending[index].created = Some(id);
            self.cache.realize(index, id);
            created.push(id);
        }
        Ok(created)
    }

    fn create_with_unique_name<M: BimModel + ?Sized>(
        &self,
        model: &mut M,
        index: usize,
    ) -> Result<ElementId> {
        let base = &self.pending[index].definition;
        let mut definition = base.clone();
        let mut last_error = ModelError::NameCollision(base.name.clone());

        for attempt in 1..=self.max_name_attempts {
            if attempt > 1 {
                definition.name = sanitize_type_name(&format!("{} #{attempt}", base.name));
            }
            match model.create_wall_type(&definition) {
                Ok(id) => {
                    tracing::info!(
                        wall_type = %id,
                        name = %definition.name,
                        layer = self.pending[index].layer_index,
                        "Created single-layer wall type"
                    );
                    return Ok(id);
                }
                Err(ModelError::NameCollision(name)) => {
                    tracing::debug!(name = %name, attempt, "Type name taken, retrying");
                    last_error = ModelError::NameCollision(name);
                }
                Err(source) => {
                    return Err(SplitError::TypeCreation {
                        name: definition.name,
                        source,
                    });
                }
            }
        }

        Err(SplitError::TypeCreation {
            name: base.name.clone(),
            source: last_error,
        })
    }

    fn check_target(&self, layer: &Layer, type_id: ElementId) -> Result<TypeResolution> {
        let invalid = |reason: String| SplitError::InvalidTargetType {
            type_id,
            layer: layer.index,
            reason,
        };
        let wall_type = self
            .catalog
            .iter()
            .find(|t| t.id == type_id)
            .ok_or_else(|| invalid("type does not exist".to_string()))?;
        if !wall_type.is_single_layer() {
            return Err(invalid(format!(
                "'{}' is not a single-layer type",
                wall_type.name
            )));
        }
        let thickness = wall_type.total_thickness();
        if (thickness - layer.thickness).abs() > self.tolerance {
            return Err(invalid(format!(
                "type is {thickness:.1} mm thick, layer is {:.1} mm",
                layer.thickness
            )));
        }
        Ok(TypeResolution::Existing(type_id))
    }

    /// Whether a type layer can stand in for `layer`.
    fn fits(&self, candidate: &LayerDefinition, layer: &Layer) -> bool {
        (candidate.thickness - layer.thickness).abs() <= self.tolerance
            && candidate.material == layer.material
            && (!self.match_function || candidate.function == layer.function)
    }

    fn find_match(&self, layer: &Layer) -> Option<ElementId> {
        self.catalog
            .iter()
            .filter(|t| t.kind == WallKind::Basic)
            .find(|t| match t.layers.as_slice() {
                [only] => self.fits(only, layer),
                _ => false,
            })
            .map(|t| t.id)
    }

    /// A type already planned in this split that fits `layer`.
    fn find_pending(&self, layer: &Layer, fresh: bool) -> Option<TypeResolution> {
        let index = self
            .pending
            .iter()
            .zip(&self.pending_fresh)
            .position(|(pending, &planned_fresh)| {
                planned_fresh == fresh
                    && pending
                        .definition
                        .layers
                        .first()
                        .is_some_and(|only| self.fits(only, layer))
            })?;
        tracing::debug!(layer = layer.index, pending = index, "Reusing planned wall type");
        Some(TypeResolution::Pending(index))
    }

    fn plan_new(&mut self, layer: &Layer, fresh: bool) -> TypeResolution {
        let label = format!(
            "{} layer {} {:.1} mm",
            self.source_name,
            layer.index + 1,
            layer.thickness
        );
        let mut name = sanitize_type_name(&label);
        if name.is_empty() {
            name = format!("Layer_{}", layer.index + 1);
        }

        let definition = WallTypeDefinition {
            name,
            layers: vec![LayerDefinition {
                thickness: layer.thickness,
                function: layer.function,
                material: layer.material.clone(),
                is_core: layer.is_core,
            }],
            parameters: self.type_parameters.clone(),
        };
        tracing::debug!(layer = layer.index, name = %definition.name, "Planned new wall type");

        self.pending.push(PendingType {
            layer_index: layer.index,
            definition,
            created: None,
        });
        self.pending_fresh.push(fresh);
        TypeResolution::Pending(self.pending.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Fault, InMemoryModel, ModelDocument};
    use crate::types::{LayerFunction, ParameterValue};

    fn single(id: u64, name: &str, thickness: f64, function: LayerFunction, material: Option<&str>) -> WallType {
        let mut layer = LayerDefinition::new(thickness, function);
        layer.material = material.map(str::to_string);
        WallType {
            id: ElementId(id),
            name: name.to_string(),
            kind: WallKind::Basic,
            layers: vec![layer],
            parameters: Vec::new(),
        }
    }

    fn source() -> WallType {
        WallType {
            id: ElementId(1),
            name: "Cavity 162".to_string(),
            kind: WallKind::Basic,
            layers: Vec::new(),
            parameters: vec![
                Parameter::new("Fire Rating", ParameterValue::Text("EI 60".to_string())),
                Parameter::new("Width", ParameterValue::Double(162.0)),
            ],
        }
    }

    fn layer(index: usize, thickness: f64, function: LayerFunction, material: Option<&str>) -> Layer {
        Layer {
            index,
            thickness,
            function,
            material: material.map(str::to_string),
            offset: 0.0,
            is_core: false,
        }
    }

    #[test]
    fn test_sanitize_type_name() {
        assert_eq!(sanitize_type_name("A/B: \"x\"  \n y"), "A_B_ _x_ _ y");
        assert_eq!(sanitize_type_name("  plain   name "), "plain name");
    }

    #[test]
    fn test_reuses_matching_type_within_tolerance() {
        let catalog = vec![single(5, "Brick 100", 100.004, LayerFunction::Structure, Some("Brick"))];
        let mut resolver = WallTypeResolver::new(&source(), catalog, &SplitConfig::default());

        let brick = layer(0, 100.0, LayerFunction::Structure, Some("Brick"));
        assert_eq!(
            resolver.resolve(&brick, TypeTarget::Auto).unwrap(),
            TypeResolution::Existing(ElementId(5))
        );
        assert!(resolver.pending().is_empty());
    }

    #[test]
    fn test_function_must_match_unless_disabled() {
        let catalog = vec![single(5, "Brick 100", 100.0, LayerFunction::Finish1, Some("Brick"))];
        let brick = layer(0, 100.0, LayerFunction::Structure, Some("Brick"));

        let mut strict = WallTypeResolver::new(&source(), catalog.clone(), &SplitConfig::default());
        assert_eq!(
            strict.resolve(&brick, TypeTarget::Auto).unwrap(),
            TypeResolution::Pending(0)
        );

        let config = SplitConfig {
            match_layer_function: false,
            ..SplitConfig::default()
        };
        let mut relaxed = WallTypeResolver::new(&source(), catalog, &config);
        assert_eq!(
            relaxed.resolve(&brick, TypeTarget::Auto).unwrap(),
            TypeResolution::Existing(ElementId(5))
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut resolver = WallTypeResolver::new(&source(), Vec::new(), &SplitConfig::default());
        let board = layer(0, 12.5, LayerFunction::Finish2, Some("Gypsum"));
        let again = layer(3, 12.5, LayerFunction::Finish2, Some("Gypsum"));

        let first = resolver.resolve(&board, TypeTarget::Auto).unwrap();
        let second = resolver.resolve(&again, TypeTarget::Auto).unwrap();
        assert_eq!(first, second);
        assert_eq!(resolver.pending().len(), 1);

        let fresh = resolver.resolve(&board, TypeTarget::CreateNew).unwrap();
        assert_ne!(fresh, first);
        assert_eq!(resolver.pending().len(), 2);
    }

    #[test]
    fn test_planned_types_match_within_tolerance() {
        let mut resolver = WallTypeResolver::new(&source(), Vec::new(), &SplitConfig::default());
        let wool = layer(1, 50.0, LayerFunction::Insulation, Some("Mineral wool"));
        let close = layer(3, 50.004, LayerFunction::Insulation, Some("Mineral wool"));
        let far = layer(4, 50.5, LayerFunction::Insulation, Some("Mineral wool"));

        let first = resolver.resolve(&wool, TypeTarget::Auto).unwrap();
        assert_eq!(resolver.resolve(&close, TypeTarget::Auto).unwrap(), first);
        assert_ne!(resolver.resolve(&far, TypeTarget::Auto).unwrap(), first);
        assert_eq!(resolver.pending().len(), 2);

        // Fresh targets are matched among themselves only.
        let fresh = resolver.resolve(&wool, TypeTarget::CreateNew).unwrap();
        assert_ne!(fresh, first);
        assert_eq!(resolver.resolve(&close, TypeTarget::CreateNew).unwrap(), fresh);
        assert_eq!(resolver.pending().len(), 3);
    }

    #[test]
    fn test_pending_definition() {
        let mut resolver = WallTypeResolver::new(&source(), Vec::new(), &SplitConfig::default());
        resolver
            .resolve(&layer(1, 50.0, LayerFunction::Insulation, None), TypeTarget::Auto)
            .unwrap();

        let pending = &resolver.pending()[0];
        assert_eq!(pending.definition.name, "Cavity 162 layer 2 50.0 mm");
        assert_eq!(pending.definition.layers[0].thickness, 50.0);
        assert_eq!(pending.definition.parameters.len(), 1, "Width is derived");
    }

    #[test]
    fn test_existing_target_is_checked() {
        let catalog = vec![
            single(5, "Brick 100", 100.0, LayerFunction::Structure, None),
            source(),
        ];
        let mut resolver = WallTypeResolver::new(&source(), catalog, &SplitConfig::default());
        let insulation = layer(1, 50.0, LayerFunction::Insulation, None);

        let err = resolver
            .resolve(&insulation, TypeTarget::Existing(ElementId(5)))
            .unwrap_err();
        assert!(err.to_string().contains("100.0 mm thick"));
        assert!(resolver
            .resolve(&insulation, TypeTarget::Existing(ElementId(1)))
            .is_err());
        assert!(resolver
            .resolve(&insulation, TypeTarget::Existing(ElementId(77)))
            .is_err());
    }

    #[test]
    fn test_realize_retries_name_collisions() {
        let taken = vec![
            single(5, "Cavity 162 layer 2 50.0 mm", 80.0, LayerFunction::Structure, None),
            single(6, "Cavity 162 layer 2 50.0 mm #2", 80.0, LayerFunction::Structure, None),
        ];
        let mut model = InMemoryModel::from_document(ModelDocument {
            wall_types: taken.clone(),
            ..ModelDocument::default()
        });
        let mut resolver = WallTypeResolver::new(&source(), taken, &SplitConfig::default());
        let resolution = resolver
            .resolve(&layer(1, 50.0, LayerFunction::Insulation, None), TypeTarget::Auto)
            .unwrap();

        let mut ledger = RollbackLedger::new();
        let created = resolver.realize_pending(&mut model, &mut ledger).unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(resolver.type_id(resolution), Some(created[0]));
        assert!(model
            .wall_type_by_name("Cavity 162 layer 2 50.0 mm #3")
            .is_some());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_realize_gives_up_after_attempt_limit() {
        let config = SplitConfig {
            max_type_name_attempts: 1,
            ..SplitConfig::default()
        };
        let taken = vec![single(5, "Cavity 162 layer 1 20.0 mm", 80.0, LayerFunction::Structure, None)];
        let mut model = InMemoryModel::from_document(ModelDocument {
            wall_types: taken.clone(),
            ..ModelDocument::default()
        });
        let mut resolver = WallTypeResolver::new(&source(), taken, &config);
        resolver
            .resolve(&layer(0, 20.0, LayerFunction::Finish1, None), TypeTarget::Auto)
            .unwrap();

        let err = resolver
            .realize_pending(&mut model, &mut RollbackLedger::new())
            .unwrap_err();
        assert!(matches!(
            err,
            SplitError::TypeCreation {
                source: ModelError::NameCollision(_),
                ..
            }
        ));
    }

    #[test]
    fn test_realize_stops_on_rejection() {
        let mut model = InMemoryModel::new().with_fault(Fault::CreateWallType);
        let mut resolver = WallTypeResolver::new(&source(), Vec::new(), &SplitConfig::default());
        resolver
            .resolve(&layer(0, 20.0, LayerFunction::Finish1, None), TypeTarget::Auto)
            .unwrap();

        let mut ledger = RollbackLedger::new();
        let err = resolver.realize_pending(&mut model, &mut ledger).unwrap_err();
        assert!(matches!(
            err,
            SplitError::TypeCreation {
                source: ModelError::Rejected(_),
                ..
            }
        ));
        assert!(ledger.is_empty());
    }
}
