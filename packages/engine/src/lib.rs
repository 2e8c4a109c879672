//! LayerSplit Engine
//!
//! Splits a multi-layer composite wall into independent single-layer walls.
//! This library provides functionality for:
//! - Analyzing a wall type's layer stack
//! - Reusing or synthesizing single-layer wall types
//! - Placing one wall per layer so that together they fill the original footprint
//! - Moving windows, doors and openings onto the new walls
//! - Replacing the original wall atomically, with rollback on failure
//!
//! The host BIM model sits behind the [`BimModel`] trait; [`InMemoryModel`]
//! is a complete implementation backed by a YAML document.
//!
//! # Example
//!
//! ```ignore
//! use layersplit_engine::{InMemoryModel, SplitConfig, SplitOrchestrator, SplitRequest};
//! use layersplit_engine::types::ElementId;
//!
//! let mut model = InMemoryModel::from_yaml(&std::fs::read_to_string("model.yaml")?)?;
//! let mut orchestrator = SplitOrchestrator::new(SplitConfig::default())?;
//! let outcome = orchestrator.split(&mut model, &SplitRequest::new(ElementId(10)))?;
//! println!("created {} walls", outcome.new_walls.len());
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod memory;
pub mod model;
pub mod splitting;
pub mod types;

// Re-export commonly used items
pub use config::{RelocationMode, SplitConfig};
pub use error::{Result, SplitError, SplitWarning};
pub use geometry::{Curve, GeometryError};
pub use memory::{Fault, InMemoryModel, ModelDocument};
pub use model::{BimModel, HostPosition, ModelError, ModelResult, WallEnd, WallPlacement};
pub use splitting::{
    CancelFlag, LayerAnalyzer, LayerSelection, LayerStack, SplitOrchestrator, SplitOutcome,
    SplitPlan, SplitRequest, SplitState, TypeTarget,
};
pub use types::{ElementId, LayerFunction, LocationLine};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
