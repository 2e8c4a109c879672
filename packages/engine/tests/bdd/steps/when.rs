//! When step definitions
//!
//! Steps that run the split against the assembled model.

use cucumber::when;
use layersplit_engine::memory::InMemoryModel;
use layersplit_engine::splitting::{SplitOrchestrator, SplitRequest};
use layersplit_engine::SplitConfig;

use crate::world::SplitWorld;

fn orchestrator() -> SplitOrchestrator {
    SplitOrchestrator::new(SplitConfig::default()).expect("default config is valid")
}

#[when("the wall is split")]
fn split_wall(world: &mut SplitWorld) {
    let mut model = InMemoryModel::from_document(world.document.clone());
    let request = SplitRequest::new(world.wall_id());
    let mut orchestrator = orchestrator();

    match orchestrator.split(&mut model, &request) {
        Ok(outcome) => {
            world.outcome = Some(outcome);
            world.error = None;
        }
        Err(e) => {
            world.outcome = None;
            world.error = Some(e);
        }
    }
    world.final_state = Some(orchestrator.state());
    world.model = Some(model);
}

#[when("the split is planned")]
fn plan_split(world: &mut SplitWorld) {
    let model = InMemoryModel::from_document(world.document.clone());
    let request = SplitRequest::new(world.wall_id());
    let mut orchestrator = orchestrator();

    match orchestrator.plan_split(&model, &request) {
        Ok(plan) => world.plan = Some(plan),
        Err(e) => world.error = Some(e),
    }
    world.final_state = Some(orchestrator.state());
    world.model = Some(model);
}
