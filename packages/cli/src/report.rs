//! Human-readable reports for the terminal.
//!
//! Each report is a [`fmt::Display`] wrapper, printed with `print!`.

use std::fmt;

use console::style;
use layersplit_engine::model::BimModel;
use layersplit_engine::splitting::{LayerStack, SplitOutcome, SplitPlan, TypeResolution};

/// An analyzed layer stack, one line per layer (numbered from 1).
pub struct StackReport<'a>(pub &'a LayerStack);

impl fmt::Display for StackReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stack = self.0;
        writeln!(
            f,
            "{} {} of type {} ({:.1} mm)",
            style("Wall").bold(),
            style(stack.wall).cyan(),
            style(&stack.type_name).green(),
            stack.total_thickness
        )?;
        for layer in &stack.layers {
            writeln!(
                f,
                "  {:>2}  {:<10} {:>7.1} mm  at {:>7.1}  {}{}",
                layer.index + 1,
                layer.function.as_str(),
                layer.thickness,
                layer.offset,
                layer.material.as_deref().unwrap_or("-"),
                if layer.is_core { "  [core]" } else { "" }
            )?;
        }
        Ok(())
    }
}

/// What a split would do.
pub struct PlanReport<'a>(pub &'a SplitPlan);

impl fmt::Display for PlanReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plan = self.0;
        writeln!(
            f,
            "{} wall {} into {} walls (offsets from {:?})",
            style("Plan:").bold(),
            style(plan.wall).cyan(),
            plan.specs.len(),
            plan.reference_line
        )?;
        for spec in &plan.specs {
            let type_name = match spec.type_ref {
                TypeResolution::Existing(id) => format!("type {id}"),
                TypeResolution::Pending(index) => plan
                    .pending_types
                    .get(index)
                    .map(|p| format!("new type \"{}\"", p.definition.name))
                    .unwrap_or_else(|| "new type".to_string()),
            };
            writeln!(
                f,
                "  layer {:>2}  {:<10} {:>7.1} mm  offset {:>8.1}  {}  hosts {}",
                spec.layer_index + 1,
                spec.function.as_str(),
                spec.thickness,
                spec.centerline_offset,
                type_name,
                spec.hosted.len()
            )?;
        }
        if !plan.complete {
            writeln!(f, "  {} unselected layers are dropped", style("note:").yellow())?;
        }
        Ok(())
    }
}

/// A finished split; created walls are looked up in `model`.
pub struct OutcomeReport<'a, M: BimModel + ?Sized> {
    pub outcome: &'a SplitOutcome,
    pub model: &'a M,
}

impl<M: BimModel + ?Sized> fmt::Display for OutcomeReport<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (outcome, model) = (self.outcome, self.model);
        writeln!(
            f,
            "{} wall {} into {} walls ({} new types)",
            style("Split").green().bold(),
            style(outcome.source_wall).cyan(),
            outcome.new_walls.len(),
            outcome.created_types.len()
        )?;
        for &id in &outcome.new_walls {
            let type_name = model
                .wall(id)
                .and_then(|w| model.wall_type(w.type_id))
                .map(|t| t.name)
                .unwrap_or_else(|_| "?".to_string());
            writeln!(f, "  wall {id:<6} {type_name}")?;
        }
        for assignment in &outcome.assignments {
            let host = outcome
                .new_walls
                .get(assignment.spec_index)
                .map(ToString::to_string)
                .unwrap_or_else(|| "?".to_string());
            writeln!(
                f,
                "  {:?} {} -> wall {} at {:.1}",
                assignment.kind, assignment.element, host, assignment.station
            )?;
        }
        for warning in &outcome.warnings {
            writeln!(f, "  {} {warning}", style("warning:").yellow())?;
        }
        Ok(())
    }
}
