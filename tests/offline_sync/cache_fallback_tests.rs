//! Serving the cached snapshot when the server is unreachable.

use super::helpers::{Client, client, signed_in};
use rstest::rstest;
use todosync::task::domain::NewTask;
use todosync::task::services::{DataSource, FetchRequest};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreachable_fetch_serves_last_snapshot(client: Client) -> eyre::Result<()> {
    signed_in(&client).await?;
    client.tasks.create(NewTask::new("Water plants")).await?;
    client.tasks.create(NewTask::new("Call plumber")).await?;
    let live = client.tasks.fetch(FetchRequest::new()).await?;
    assert_eq!(live.source, DataSource::Live);

    client.remote.set_offline(true)?;
    let cached = client.tasks.fetch(FetchRequest::new()).await?;

    assert_eq!(cached.source, DataSource::Cache);
    assert!(cached.cached_at.is_some());
    assert_eq!(cached.page.todos, live.page.todos);
    let state = client.tasks.snapshot();
    assert_eq!(state.source, DataSource::Cache);
    assert!(!state.loading);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn first_fetch_offline_yields_an_empty_page(client: Client) -> eyre::Result<()> {
    client.remote.set_offline(true)?;

    let outcome = client.tasks.fetch(FetchRequest::new()).await?;

    assert_eq!(outcome.source, DataSource::Cache);
    assert!(outcome.page.todos.is_empty());
    assert!(outcome.cached_at.is_none());
    Ok(())
}
