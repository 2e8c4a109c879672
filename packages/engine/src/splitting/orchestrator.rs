//! Split orchestrator: sequences analysis, planning and model mutation.
//!
//! Planning (`Analyzing`, `Resolving`, `Placing`) only reads the model. A
//! failure there ends in `Aborted` with the model untouched. From `Creating`
//! on, every mutation is recorded in a [`RollbackLedger`]; a failure undoes
//! the ledger, rolls back the host transaction and ends in `RolledBack`. The
//! source wall is deleted in `Committing`, as the last mutation.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use super::analyzer::LayerAnalyzer;
use super::joiner::GeometryJoiner;
use super::ledger::{Artifact, RollbackLedger};
use super::parameters::ParameterCopier;
use super::placer::GeometryPlacer;
use super::relocator::HostedElementRelocator;
use super::resolver::WallTypeResolver;
use super::types::{HostedElementAssignment, LayerSelection, SplitPlan};
use crate::config::{SplitConfig, TRANSACTION_NAME};
use crate::error::{Result, SplitError, SplitWarning};
use crate::model::{BimModel, ModelError, WallPlacement};
use crate::types::{ElementId, HostedElement, LocationLine, Wall};

/// Stage of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitState {
    Idle,
    Analyzing,
    Resolving,
    Placing,
    Creating,
    Relocating,
    Joining,
    Committing,
    Done,
    RolledBack,
    Aborted,
}

impl SplitState {
    /// Whether the split has finished, successfully or not.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::RolledBack | Self::Aborted)
    }
}

impl fmt::Display for SplitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Idle => "idle",
            Self::Analyzing => "analyzing the wall",
            Self::Resolving => "resolving wall types",
            Self::Placing => "placing layer walls",
            Self::Creating => "creating walls",
            Self::Relocating => "relocating hosted elements",
            Self::Joining => "joining walls",
            Self::Committing => "committing",
            Self::Done => "done",
            Self::RolledBack => "rolled back",
            Self::Aborted => "aborted",
        };
        f.write_str(text)
    }
}

/// Shared flag for cancelling a running split from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect at the next stage boundary before
    /// `Committing`.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What to split and how.
#[derive(Debug, Clone)]
pub struct SplitRequest {
    pub wall: ElementId,
    pub selection: LayerSelection,
    pub cancel: CancelFlag,
}

impl SplitRequest {
    /// Split every layer of a wall.
    #[must_use]
    pub fn new(wall: ElementId) -> Self {
        Self {
            wall,
            selection: LayerSelection::all(),
            cancel: CancelFlag::new(),
        }
    }

    #[must_use]
    pub fn with_selection(mut self, selection: LayerSelection) -> Self {
        self.selection = selection;
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Result of a successful split.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitOutcome {
    pub source_wall: ElementId,
    /// Created walls in stack order.
    pub new_walls: Vec<ElementId>,
    pub created_types: Vec<ElementId>,
    pub assignments: Vec<HostedElementAssignment>,
    pub warnings: Vec<SplitWarning>,
    /// Stages visited, ending with `Done`.
    pub states: Vec<SplitState>,
}

/// A plan together with what is needed to carry it out.
struct Planned {
    plan: SplitPlan,
    resolver: WallTypeResolver,
    source: Wall,
    elements: Vec<HostedElement>,
}

/// Runs splits against a model.
pub struct SplitOrchestrator {
    config: SplitConfig,
    state: SplitState,
    history: Vec<SplitState>,
}

impl SplitOrchestrator {
    /// Create an orchestrator, validating the configuration.
    pub fn new(config: SplitConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: SplitState::Idle,
            history: Vec::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Current stage.
    #[must_use]
    pub fn state(&self) -> SplitState {
        self.state
    }

    /// Stages visited by the last run.
    #[must_use]
    pub fn history(&self) -> &[SplitState] {
        &self.history
    }

    /// Compute the split without changing the model.
    pub fn plan_split<M: BimModel + ?Sized>(
        &mut self,
        model: &M,
        request: &SplitRequest,
    ) -> Result<SplitPlan> {
        self.reset();
        match self.plan(model, request) {
            Ok(planned) => {
                self.state = SplitState::Idle;
                Ok(planned.plan)
            }
            Err(e) => {
                self.transition(SplitState::Aborted);
                Err(e)
            }
        }
    }

    /// Split a wall into single-layer walls.
    ///
    /// Either every output wall is created, every hosted element moved and
    /// the source wall deleted, or the model is left as it was.
    pub fn split<M: BimModel + ?Sized>(
        &mut self,
        model: &mut M,
        request: &SplitRequest,
    ) -> Result<SplitOutcome> {
        self.reset();
        tracing::info!(wall = %request.wall, "Splitting wall into layers");

        let planned = match self.plan(&*model, request) {
            Ok(planned) => planned,
            Err(e) => {
                tracing::warn!(wall = %request.wall, error = %e, "Split aborted before any change");
                self.transition(SplitState::Aborted);
                return Err(e);
            }
        };

        if let Err(e) = self.begin(model, request) {
            self.transition(SplitState::Aborted);
            return Err(e);
        }

        let mut ledger = RollbackLedger::new();
        match self.execute(model, request, planned, &mut ledger) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::warn!(
                    wall = %request.wall,
                    stage = %self.state,
                    error = %e,
                    artifacts = ledger.len(),
                    "Split failed, rolling back"
                );
                let failures = ledger.undo(model);
                if let Err(rollback_error) = model.rollback_transaction() {
                    tracing::error!(error = %rollback_error, "Host transaction rollback failed");
                }
                if failures > 0 {
                    tracing::error!(failures, "Some split artifacts could not be undone");
                }
                self.transition(SplitState::RolledBack);
                Err(e)
            }
        }
    }

    fn reset(&mut self) {
        self.state = SplitState::Idle;
        self.history.clear();
    }

    fn transition(&mut self, next: SplitState) {
        tracing::debug!(from = %self.state, to = %next, "Split stage");
        self.state = next;
        self.history.push(next);
    }

    /// Enter a stage unless cancellation was requested.
    fn advance(&mut self, next: SplitState, request: &SplitRequest) -> Result<()> {
        if request.cancel.is_cancelled() {
            return Err(SplitError::Cancelled(next));
        }
        self.transition(next);
        Ok(())
    }

    fn plan<M: BimModel + ?Sized>(&mut self, model: &M, request: &SplitRequest) -> Result<Planned> {
        self.advance(SplitState::Analyzing, request)?;
        let read_failed = |source: ModelError| SplitError::model(SplitState::Analyzing, source);
        let source = model.wall(request.wall).map_err(read_failed)?;
        let source_type = model.wall_type(source.type_id).map_err(read_failed)?;
        let stack = LayerAnalyzer::new(&self.config).analyze(&source, &source_type)?;

        self.advance(SplitState::Resolving, request)?;
        let choices = request
            .selection
            .choices(&stack, self.config.zero_thickness_tolerance)?;
        let mut resolver = WallTypeResolver::new(&source_type, model.wall_types(), &self.config);
        let mut resolved = Vec::with_capacity(choices.len());
        for choice in choices {
            let resolution = resolver.resolve(&choice.layer, choice.target)?;
            resolved.push((choice.layer, resolution));
        }

        self.advance(SplitState::Placing, request)?;
        let placer = GeometryPlacer::new(&self.config);
        let reference_line: LocationLine = placer.reference_line(&source);
        let mut specs = placer.place(&source, &stack, &resolved)?;
        let elements = model
            .hosted_elements(source.id)
            .map_err(|e| SplitError::model(SplitState::Placing, e))?;
        let assignments =
            HostedElementRelocator::new(&self.config).plan(&source, &elements, &mut specs)?;

        let plan = SplitPlan {
            wall: source.id,
            reference_line,
            reference_offset: stack.reference_offset(reference_line),
            complete: request
                .selection
                .is_complete(&stack, self.config.zero_thickness_tolerance),
            stack,
            specs,
            assignments,
            pending_types: resolver.pending().to_vec(),
        };
        if !plan.verify_tiling(self.config.boundary_tolerance) {
            tracing::warn!(wall = %source.id, "Layer walls do not tile the source footprint");
        }
        tracing::debug!(
            wall = %source.id,
            walls = plan.specs.len(),
            new_types = plan.pending_types.len(),
            hosted = plan.assignments.len(),
            "Split planned"
        );

        Ok(Planned {
            plan,
            resolver,
            source,
            elements,
        })
    }

    /// Open the host transaction. Nothing has been mutated yet.
    fn begin<M: BimModel + ?Sized>(&mut self, model: &mut M, request: &SplitRequest) -> Result<()> {
        if request.cancel.is_cancelled() {
            return Err(SplitError::Cancelled(SplitState::Creating));
        }
        model
            .begin_transaction(TRANSACTION_NAME)
            .map_err(|e| SplitError::model(SplitState::Creating, e))
    }

    fn execute<M: BimModel + ?Sized>(
        &mut self,
        model: &mut M,
        request: &SplitRequest,
        planned: Planned,
        ledger: &mut RollbackLedger,
    ) -> Result<SplitOutcome> {
        let Planned {
            plan,
            mut resolver,
            source,
            elements,
        } = planned;

        self.advance(SplitState::Creating, request)?;
        let created_types = resolver.realize_pending(model, ledger)?;
        let mut new_walls = Vec::with_capacity(plan.specs.len());
        for spec in &plan.specs {
            let type_id = resolver.type_id(spec.type_ref).ok_or_else(|| {
                SplitError::model(
                    SplitState::Creating,
                    ModelError::Rejected(format!(
                        "no wall type was created for layer {}",
                        spec.layer_index
                    )),
                )
            })?;
            let placement = WallPlacement {
                type_id,
                curve: spec.curve.clone(),
                constraints: spec.constraints.clone(),
                location_line: LocationLine::WallCenterline,
                flipped: spec.flipped,
                structural: spec.structural,
            };
            let wall = model
                .create_wall(&placement)
                .map_err(|e| SplitError::model(SplitState::Creating, e))?;
            ledger.record(Artifact::Wall(wall));
            tracing::info!(
                wall = %wall,
                layer = spec.layer_index,
                wall_type = %type_id,
                offset = spec.centerline_offset,
                "Created layer wall"
            );
            new_walls.push(wall);
        }

        self.advance(SplitState::Relocating, request)?;
        HostedElementRelocator::new(&self.config).apply(
            model,
            &plan.assignments,
            &elements,
            &new_walls,
            ledger,
        )?;
        let copier = ParameterCopier::new(&self.config);
        let mut warnings = Vec::new();
        for &wall in &new_walls {
            let copied = copier
                .copy_instance(model, &source, wall)
                .map_err(|e| SplitError::model(SplitState::Relocating, e))?;
            warnings.extend(copied);
        }

        self.advance(SplitState::Joining, request)?;
        warnings.extend(GeometryJoiner::new(&self.config).join(model, &new_walls, ledger));

        self.advance(SplitState::Committing, request)?;
        model
            .delete_wall(source.id)
            .map_err(|e| SplitError::model(SplitState::Committing, e))?;
        model
            .commit_transaction()
            .map_err(|e| SplitError::model(SplitState::Committing, e))?;

        self.transition(SplitState::Done);
        for warning in &warnings {
            tracing::warn!(warning = %warning, "Split completed with warning");
        }
        tracing::info!(
            wall = %source.id,
            new_walls = new_walls.len(),
            warnings = warnings.len(),
            "Split committed"
        );

        Ok(SplitOutcome {
            source_wall: source.id,
            new_walls,
            created_types,
            assignments: plan.assignments,
            warnings,
            states: self.history.clone(),
        })
    }
}
