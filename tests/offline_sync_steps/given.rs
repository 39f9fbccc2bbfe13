//! Given steps for offline sync BDD scenarios.

use super::world::{OfflineWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use todosync::session::domain::SignupRequest;
use todosync::task::domain::NewTask;
use todosync::task::services::FetchRequest;

#[given("a signed-in user")]
fn signed_in_user(world: &mut OfflineWorld) -> Result<(), eyre::Report> {
    let request = SignupRequest::new("Ada Lovelace", "ada@example.com", "analytical");
    run_async(world.session.signup(&request)).wrap_err("sign up scenario user")?;
    Ok(())
}

#[given("the server is unreachable")]
fn server_unreachable(world: &mut OfflineWorld) -> Result<(), eyre::Report> {
    world
        .remote
        .set_offline(true)
        .wrap_err("take fake server offline")
}

#[given(r#"the user has created a task titled "{title}""#)]
fn task_created(world: &mut OfflineWorld, title: String) -> Result<(), eyre::Report> {
    run_async(world.tasks.create(NewTask::new(title))).wrap_err("create scenario task")?;
    Ok(())
}

#[given("the task list has been fetched")]
fn list_fetched(world: &mut OfflineWorld) -> Result<(), eyre::Report> {
    run_async(world.tasks.fetch(FetchRequest::new())).wrap_err("prime task listing")?;
    Ok(())
}

#[given("the session has expired on the server")]
fn session_expired(world: &mut OfflineWorld) -> Result<(), eyre::Report> {
    world
        .remote
        .expire_session()
        .wrap_err("expire fake server session")
}
