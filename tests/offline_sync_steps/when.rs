//! When steps for offline sync BDD scenarios.

use super::world::{OfflineWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use todosync::task::domain::NewTask;
use todosync::task::services::FetchRequest;

#[when(r#"the user creates a task titled "{title}""#)]
fn create_task(world: &mut OfflineWorld, title: String) {
    world.last_mutation = Some(run_async(world.tasks.create(NewTask::new(title))));
}

#[when("the server becomes reachable")]
fn server_reachable(world: &mut OfflineWorld) -> Result<(), eyre::Report> {
    world
        .remote
        .set_offline(false)
        .wrap_err("bring fake server online")
}

#[when("pending operations are replayed")]
fn replay(world: &mut OfflineWorld) -> Result<(), eyre::Report> {
    let report = run_async(world.tasks.replay_pending()).wrap_err("replay offline queue")?;
    world.last_report = Some(report);
    Ok(())
}

#[when("the task list is fetched")]
fn fetch(world: &mut OfflineWorld) {
    world.last_fetch = Some(run_async(world.tasks.fetch(FetchRequest::new())));
}
