//! Layer splitting of composite walls.
//!
//! This module turns one layered wall into one wall per layer: it analyzes
//! the layer stack, resolves a single-layer type for every extracted layer,
//! places the new walls, moves hosted elements onto them, copies
//! parameters, joins the result and finally replaces the source wall.

mod analyzer;
mod cache;
mod joiner;
mod ledger;
mod orchestrator;
mod parameters;
mod placer;
mod relocator;
mod resolver;
mod strategy;
mod types;

pub use analyzer::LayerAnalyzer;
pub use cache::{TypeCache, TypeSignature};
pub use joiner::GeometryJoiner;
pub use ledger::{Artifact, RollbackLedger};
pub use orchestrator::{CancelFlag, SplitOrchestrator, SplitOutcome, SplitRequest, SplitState};
pub use parameters::ParameterCopier;
pub use placer::GeometryPlacer;
pub use relocator::HostedElementRelocator;
pub use resolver::{sanitize_type_name, WallTypeResolver};
pub use strategy::{
    strategy_for, OffsetContainmentStrategy, RelocationStrategy, StructuralLayerStrategy,
    ThickestLayerStrategy,
};
pub use types::{
    HostedElementAssignment, Layer, LayerChoice, LayerRange, LayerSelection, LayerStack,
    PendingType, SingleLayerWallSpec, SplitPlan, TypeResolution, TypeTarget,
};
