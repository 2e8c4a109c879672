//! Parameter propagation from the source wall onto output walls.

use crate::config::SplitConfig;
use crate::error::SplitWarning;
use crate::model::{BimModel, ModelResult};
use crate::types::{ElementId, Parameter, Wall};

/// Copies parameters that are not derived from geometry.
pub struct ParameterCopier {
    derived: Vec<String>,
}

impl ParameterCopier {
    #[must_use]
    pub fn new(config: &SplitConfig) -> Self {
        Self {
            derived: config.derived_parameters.clone(),
        }
    }

    /// Whether the host recomputes this parameter from geometry.
    #[must_use]
    pub fn is_derived(&self, name: &str) -> bool {
        self.derived.iter().any(|d| d.eq_ignore_ascii_case(name))
    }

    /// Type parameters a synthesized single-layer type inherits.
    #[must_use]
    pub fn type_parameters(&self, source: &[Parameter]) -> Vec<Parameter> {
        source
            .iter()
            .filter(|p| !self.is_derived(&p.name))
            .cloned()
            .collect()
    }

    /// Copy instance parameters from `source` onto the wall `target`.
    ///
    /// Only parameters present on both walls are considered. Each one that
    /// cannot be written becomes a warning; the copy continues.
    pub fn copy_instance<M: BimModel + ?Sized>(
        &self,
        model: &mut M,
        source: &Wall,
        target: ElementId,
    ) -> ModelResult<Vec<SplitWarning>> {
        let target_parameters = model.wall_parameters(target)?;
        let mut warnings = Vec::new();
        let mut copied = 0usize;

        for parameter in &source.parameters {
            if self.is_derived(&parameter.name) {
                continue;
            }
            let Some(existing) = target_parameters.iter().find(|p| p.name == parameter.name)
            else {
                continue;
            };
            if existing.value == parameter.value {
                continue;
            }

            let warn = |reason: String| SplitWarning::PartialParameterCopy {
                wall: target,
                parameter: parameter.name.clone(),
                reason,
            };
            if existing.read_only {
                warnings.push(warn("parameter is read-only".to_string()));
                continue;
            }
            let (expected, actual) = (existing.value.storage_type(), parameter.value.storage_type());
            if expected != actual {
                warnings.push(warn(format!("expects {expected}, source holds {actual}")));
                continue;
            }

            match model.set_parameter(target, &parameter.name, parameter.value.clone()) {
                Ok(()) => copied += 1,
                Err(e) => warnings.push(warn(e.to_string())),
            }
        }

        tracing::debug!(
            source = %source.id,
            target = %target,
            copied,
            skipped = warnings.len(),
            "Copied instance parameters"
        );
        Ok(warnings)
    }
}
