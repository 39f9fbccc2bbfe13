//! Then steps for offline sync BDD scenarios.

use super::world::{OfflineWorld, run_async};
use rstest_bdd_macros::then;
use todosync::storage::StorageKey;
use todosync::task::services::{DataSource, FetchOutcome};

fn fetched(world: &OfflineWorld) -> Result<&FetchOutcome, eyre::Report> {
    world
        .last_fetch
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing fetch result in scenario world"))?
        .as_ref()
        .map_err(|err| eyre::eyre!("unexpected fetch failure: {err}"))
}

#[then("the change is reported as queued")]
fn change_queued(world: &OfflineWorld) -> Result<(), eyre::Report> {
    let mutation = world
        .last_mutation
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing mutation result in scenario world"))?
        .as_ref()
        .map_err(|err| eyre::eyre!("unexpected mutation failure: {err}"))?;
    if !mutation.is_queued() {
        return Err(eyre::eyre!("expected the mutation to be queued"));
    }
    if world.tasks.snapshot().status_message().is_none() {
        return Err(eyre::eyre!("expected an offline status message"));
    }
    Ok(())
}

#[then("the offline queue length is {count:usize}")]
fn queue_length(world: &OfflineWorld, count: usize) -> Result<(), eyre::Report> {
    let pending = run_async(world.tasks.pending_operations())?;
    if pending.len() != count {
        return Err(eyre::eyre!(
            "expected {count} queued operations, found {}",
            pending.len()
        ));
    }
    Ok(())
}

#[then(r#"the server holds a task titled "{title}""#)]
fn server_holds_task(world: &OfflineWorld, title: String) -> Result<(), eyre::Report> {
    let tasks = world.remote.tasks()?;
    if !tasks.iter().any(|task| task.title() == title) {
        return Err(eyre::eyre!("server has no task titled {title:?}"));
    }
    Ok(())
}

#[then("the listing is served from the cache")]
fn served_from_cache(world: &OfflineWorld) -> Result<(), eyre::Report> {
    let outcome = fetched(world)?;
    if outcome.source != DataSource::Cache {
        return Err(eyre::eyre!("expected cached listing, got {:?}", outcome.source));
    }
    if outcome.cached_at.is_none() {
        return Err(eyre::eyre!("cached listing should carry its sync time"));
    }
    Ok(())
}

#[then(r#"the listing contains a task titled "{title}""#)]
fn listing_contains(world: &OfflineWorld, title: String) -> Result<(), eyre::Report> {
    let outcome = fetched(world)?;
    if !outcome.page.todos.iter().any(|task| task.title() == title) {
        return Err(eyre::eyre!("listing has no task titled {title:?}"));
    }
    Ok(())
}

#[then("replay halted with {count:usize} operations retained")]
fn replay_halted(world: &OfflineWorld, count: usize) -> Result<(), eyre::Report> {
    let report = world
        .last_report
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing replay report in scenario world"))?;
    if report.halted_by.is_none() {
        return Err(eyre::eyre!("expected replay to halt"));
    }
    if report.retained != count {
        return Err(eyre::eyre!(
            "expected {count} retained operations, found {}",
            report.retained
        ));
    }
    Ok(())
}

#[then("the fetch is rejected as unauthorised")]
fn fetch_unauthorised(world: &OfflineWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_fetch
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing fetch result in scenario world"))?;
    match result {
        Err(err) if err.is_unauthorized() => Ok(()),
        Err(err) => Err(eyre::eyre!("expected an unauthorised error, got {err}")),
        Ok(_) => Err(eyre::eyre!("expected the fetch to be rejected")),
    }
}

#[then("no local state remains")]
fn no_local_state(world: &OfflineWorld) -> Result<(), eyre::Report> {
    for key in StorageKey::ALL {
        let value: Option<serde_json::Value> = run_async(world.local.load(key))?;
        if value.is_some() {
            return Err(eyre::eyre!("{key:?} should have been cleared"));
        }
    }
    Ok(())
}
