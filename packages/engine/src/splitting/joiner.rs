//! Geometry joins between output walls.

use super::ledger::{Artifact, RollbackLedger};
use crate::config::SplitConfig;
use crate::error::SplitWarning;
use crate::model::{BimModel, WallEnd};
use crate::types::ElementId;

/// Joins consecutive output walls so they behave as one assembly.
///
/// Join failures never abort a split; they are returned as warnings.
pub struct GeometryJoiner {
    join_adjacent: bool,
    allow_end_joins: bool,
}

impl GeometryJoiner {
    #[must_use]
    pub fn new(config: &SplitConfig) -> Self {
        Self {
            join_adjacent: config.join_adjacent,
            allow_end_joins: config.allow_end_joins,
        }
    }

    /// Join each pair of walls adjacent in `walls` (stack order), then open
    /// both ends of every wall for joining.
    pub fn join<M: BimModel + ?Sized>(
        &self,
        model: &mut M,
        walls: &[ElementId],
        ledger: &mut RollbackLedger,
    ) -> Vec<SplitWarning> {
        let mut warnings = Vec::new();

        if self.join_adjacent {
            for pair in walls.windows(2) {
                let (first, second) = (pair[0], pair[1]);
                match model.join_geometry(first, second) {
                    Ok(()) => ledger.record(Artifact::Join { first, second }),
                    Err(e) => {
                        tracing::warn!(first = %first, second = %second, error = %e, "Could not join walls");
                        warnings.push(SplitWarning::Join {
                            first,
                            second: Some(second),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        if self.allow_end_joins {
            for &wall in walls {
                for end in [WallEnd::Start, WallEnd::End] {
                    if let Err(e) = model.allow_join_at_end(wall, end) {
                        warnings.push(SplitWarning::Join {
                            first: wall,
                            second: None,
                            reason: format!("{end:?} end: {e}"),
                        });
                    }
                }
            }
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Curve;
    use crate::memory::{Fault, InMemoryModel};
    use crate::model::WallPlacement;
    use crate::types::{
        LayerDefinition, LayerFunction, LocationLine, VerticalConstraints, WallTypeDefinition,
    };

    fn model_with_walls(model: InMemoryModel, count: usize) -> (InMemoryModel, Vec<ElementId>) {
        let mut model = model;
        let type_id = model
            .create_wall_type(&WallTypeDefinition {
                name: "Layer".to_string(),
                layers: vec![LayerDefinition::new(50.0, LayerFunction::Insulation)],
                parameters: Vec::new(),
            })
            .unwrap();
        let walls = (0..count)
            .map(|i| {
                let y = i as f64 * 50.0;
                model
                    .create_wall(&WallPlacement {
                        type_id,
                        curve: Curve::line((0.0, y), (3000.0, y)),
                        constraints: VerticalConstraints::unconnected("Level 1", 2700.0),
                        location_line: LocationLine::WallCenterline,
                        flipped: false,
                        structural: false,
                    })
                    .unwrap()
            })
            .collect();
        (model, walls)
    }

    #[test]
    fn test_joins_consecutive_pairs() {
        let (mut model, walls) = model_with_walls(InMemoryModel::new(), 3);
        let mut ledger = RollbackLedger::new();
        let warnings = GeometryJoiner::new(&SplitConfig::default()).join(&mut model, &walls, &mut ledger);

        assert!(warnings.is_empty());
        assert!(model.is_joined(walls[0], walls[1]));
        assert!(model.is_joined(walls[1], walls[2]));
        assert!(!model.is_joined(walls[0], walls[2]));
        assert!(model.end_join_allowed(walls[2], WallEnd::End));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_join_failures_are_warnings() {
        let faulty = InMemoryModel::new()
            .with_fault(Fault::JoinGeometry)
            .with_fault(Fault::AllowEndJoin);
        let (mut model, walls) = model_with_walls(faulty, 2);
        let mut ledger = RollbackLedger::new();
        let warnings = GeometryJoiner::new(&SplitConfig::default()).join(&mut model, &walls, &mut ledger);

        // One pair plus two ends on each of the two walls.
        assert_eq!(warnings.len(), 5);
        assert!(matches!(
            warnings[0],
            SplitWarning::Join { second: Some(_), .. }
        ));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_joining_can_be_disabled() {
        let (mut model, walls) = model_with_walls(InMemoryModel::new(), 2);
        let config = SplitConfig {
            join_adjacent: false,
            allow_end_joins: false,
            ..SplitConfig::default()
        };
        let warnings = GeometryJoiner::new(&config).join(&mut model, &walls, &mut RollbackLedger::new());
        assert!(warnings.is_empty());
        assert!(!model.is_joined(walls[0], walls[1]));
    }
}
