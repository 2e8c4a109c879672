//! Configuration for the layer split engine.
//!
//! Default tolerances and limits live in constants; `SplitConfig` bundles
//! them with the behavioral switches a caller may override, and can be
//! loaded from YAML.
//!
//! All lengths are millimetres.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SplitError};
use crate::types::LocationLine;

/// Tolerance for matching a layer against an existing single-layer type.
///
/// Absorbs rounding from unit conversion in the host (imperial internal
/// units round-tripped through millimetres).
pub const DEFAULT_TYPE_MATCH_TOLERANCE: f64 = 0.01;

/// Tolerance for deciding that a hosted element sits on a layer boundary.
pub const DEFAULT_BOUNDARY_TOLERANCE: f64 = 1e-4;

/// Layers thinner than this are treated as empty and never extracted.
pub const DEFAULT_ZERO_THICKNESS_TOLERANCE: f64 = 1e-6;

/// Maximum number of names tried when a synthesized type name collides
/// with an existing type (`"name"`, `"name #2"`, ... `"name #50"`).
pub const MAX_TYPE_NAME_ATTEMPTS: usize = 50;

/// Name of the host transaction wrapping a split.
pub const TRANSACTION_NAME: &str = "Split wall into layers";

/// Instance parameters recomputed by the host from geometry.
pub const DEFAULT_DERIVED_PARAMETERS: &[&str] = &["Length", "Area", "Volume", "Width"];

/// How hosted elements pick their new host wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelocationMode {
    /// The layer whose offset range contains the element's host-face offset.
    #[default]
    ByOffset,
    /// The first structure layer (or first core layer) receives everything.
    StructuralLayer,
    /// The thickest layer receives everything.
    ThickestLayer,
}

/// Behavioral settings for one split operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Thickness tolerance when reusing an existing type.
    pub type_match_tolerance: f64,

    /// Tolerance for layer-boundary containment of hosted elements.
    pub boundary_tolerance: f64,

    /// Layers at or below this thickness are skipped.
    pub zero_thickness_tolerance: f64,

    /// Location line the offsets are centered on.
    ///
    /// `None` uses the source wall's own location line.
    pub reference_line: Option<LocationLine>,

    /// Strategy for re-hosting windows, doors and openings.
    pub relocation: RelocationMode,

    /// Require the layer function to match when reusing a type.
    pub match_layer_function: bool,

    /// Join consecutive output walls.
    pub join_adjacent: bool,

    /// Allow joins at both ends of every output wall.
    pub allow_end_joins: bool,

    /// Attempts at finding a free name for a synthesized type.
    pub max_type_name_attempts: usize,

    /// Parameters that are never copied.
    pub derived_parameters: Vec<String>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            type_match_tolerance: DEFAULT_TYPE_MATCH_TOLERANCE,
            boundary_tolerance: DEFAULT_BOUNDARY_TOLERANCE,
            zero_thickness_tolerance: DEFAULT_ZERO_THICKNESS_TOLERANCE,
            reference_line: None,
            relocation: RelocationMode::default(),
            match_layer_function: true,
            join_adjacent: true,
            allow_end_joins: true,
            max_type_name_attempts: MAX_TYPE_NAME_ATTEMPTS,
            derived_parameters: DEFAULT_DERIVED_PARAMETERS
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
        }
    }
}

impl SplitConfig {
    /// Parse a configuration from YAML and validate it.
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Examples
    /// ```
    /// use layersplit_engine::config::{RelocationMode, SplitConfig};
    ///
    /// let config = SplitConfig::from_yaml("relocation: thickest_layer\n").unwrap();
    /// assert_eq!(config.relocation, RelocationMode::ThickestLayer);
    /// assert!(config.join_adjacent);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that tolerances and limits are usable.
    pub fn validate(&self) -> Result<()> {
        let tolerances = [
            ("type_match_tolerance", self.type_match_tolerance),
            ("boundary_tolerance", self.boundary_tolerance),
            ("zero_thickness_tolerance", self.zero_thickness_tolerance),
        ];
        for (name, value) in tolerances {
            if !value.is_finite() || value < 0.0 {
                return Err(SplitError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if self.max_type_name_attempts == 0 {
            return Err(SplitError::InvalidConfig(
                "max_type_name_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Set the reference location line.
    #[must_use]
    pub fn with_reference_line(mut self, line: LocationLine) -> Self {
        self.reference_line = Some(line);
        self
    }

    /// Set the relocation strategy.
    #[must_use]
    pub fn with_relocation(mut self, mode: RelocationMode) -> Self {
        self.relocation = mode;
        self
    }
}
