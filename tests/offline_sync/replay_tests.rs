//! Queueing mutations while offline and replaying them on reconnect.

use super::helpers::{Client, client, signed_in};
use rstest::rstest;
use todosync::task::domain::{NewTask, OperationKind, Priority, TaskPatch};
use todosync::task::services::{FetchRequest, MutationOutcome};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn offline_create_is_replayed_after_reconnect(client: Client) -> eyre::Result<()> {
    signed_in(&client).await?;
    client.remote.set_offline(true)?;

    let result = client
        .tasks
        .create(NewTask::new("Buy milk").with_priority(Priority::High))
        .await?;

    assert!(result.is_queued());
    let state = client.tasks.snapshot();
    assert!(state.error.is_none());
    assert_eq!(
        state.last_mutation.map(|record| record.outcome),
        Some(MutationOutcome::OfflineQueued)
    );
    assert!(state.status_message().is_some());
    let pending = client.tasks.pending_operations().await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending.first().map(|op| op.kind()), Some(OperationKind::Create));

    client.remote.set_offline(false)?;
    let report = client.tasks.replay_pending().await?;

    assert_eq!(report.applied, 1);
    assert!(report.is_complete());
    assert!(client.tasks.pending_operations().await?.is_empty());
    let remote_tasks = client.remote.tasks()?;
    assert_eq!(remote_tasks.len(), 1);
    assert_eq!(remote_tasks.first().map(|task| task.title()), Some("Buy milk"));

    let outcome = client.tasks.fetch(FetchRequest::new()).await?;
    assert_eq!(outcome.page.todos.len(), 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn queued_operations_replay_in_order(client: Client) -> eyre::Result<()> {
    signed_in(&client).await?;
    let created = client.tasks.create(NewTask::new("Draft report")).await?;
    let Some(task) = created.into_applied() else {
        return Err(eyre::eyre!("online create should apply immediately"));
    };
    client.remote.set_offline(true)?;

    client
        .tasks
        .update(task.id(), TaskPatch::new().with_title("Final report"))
        .await?;
    client.tasks.toggle_complete(task.id(), true).await?;
    client.tasks.delete(task.id()).await?;

    let kinds: Vec<_> = client
        .tasks
        .pending_operations()
        .await?
        .iter()
        .map(|op| op.kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            OperationKind::Update,
            OperationKind::Update,
            OperationKind::Delete
        ]
    );

    client.remote.set_offline(false)?;
    let report = client.tasks.replay_pending().await?;

    assert_eq!(report.applied, 3);
    assert!(client.remote.tasks()?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn replay_while_still_offline_keeps_the_queue(client: Client) -> eyre::Result<()> {
    signed_in(&client).await?;
    client.remote.set_offline(true)?;
    client.tasks.create(NewTask::new("First")).await?;
    client.tasks.create(NewTask::new("Second")).await?;

    let report = client.tasks.replay_pending().await?;

    assert_eq!(report.applied, 0);
    assert_eq!(report.retained, 2);
    assert!(report.halted_by.is_some_and(|err| err.is_connectivity()));
    assert_eq!(client.tasks.pending_operations().await?.len(), 2);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn replayed_delete_of_a_vanished_task_is_dropped(client: Client) -> eyre::Result<()> {
    signed_in(&client).await?;
    let created = client.tasks.create(NewTask::new("Ephemeral")).await?;
    let Some(task) = created.into_applied() else {
        return Err(eyre::eyre!("online create should apply immediately"));
    };
    client.remote.set_offline(true)?;
    client.tasks.delete(task.id()).await?;
    client.remote.set_offline(false)?;
    client.remote.seed(Vec::new())?;

    let report = client.tasks.replay_pending().await?;

    assert_eq!(report.dropped, 1);
    assert!(client.tasks.pending_operations().await?.is_empty());
    Ok(())
}
