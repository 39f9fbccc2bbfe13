//! Clearing local state when the server rejects the session.

use super::helpers::{Client, client, signed_in};
use rstest::rstest;
use todosync::storage::StorageKey;
use todosync::task::domain::NewTask;
use todosync::task::services::FetchRequest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn expired_session_wipes_every_key(client: Client) -> eyre::Result<()> {
    signed_in(&client).await?;
    client.tasks.fetch(FetchRequest::new()).await?;
    client.remote.set_offline(true)?;
    client.tasks.create(NewTask::new("Queued before expiry")).await?;
    client.remote.set_offline(false)?;
    client.remote.expire_session()?;

    let err = client
        .tasks
        .fetch(FetchRequest::new())
        .await
        .expect_err("expired session should be rejected");

    assert!(err.is_unauthorized());
    for key in StorageKey::ALL {
        let value: Option<serde_json::Value> = client.local.load(key).await?;
        assert!(value.is_none(), "{key:?} should be cleared");
    }
    assert!(client.session.restore().await?.is_none());
    assert!(client.tasks.snapshot().tasks.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restore_returns_the_signed_in_session(client: Client) -> eyre::Result<()> {
    signed_in(&client).await?;

    let restored = client.session.restore().await?;

    let session = restored.ok_or_else(|| eyre::eyre!("session should be restored"))?;
    assert_eq!(session.user.email, "ada@example.com");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn logout_clears_queue_and_cache(client: Client) -> eyre::Result<()> {
    signed_in(&client).await?;
    client.tasks.fetch(FetchRequest::new()).await?;
    client.remote.set_offline(true)?;
    client.tasks.create(NewTask::new("Never sent")).await?;

    client.session.logout().await?;

    assert!(client.tasks.pending_operations().await?.is_empty());
    assert!(client.tasks.cache().snapshot().await?.is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn session_logout_empties_the_task_list(client: Client) -> eyre::Result<()> {
    signed_in(&client).await?;
    client.tasks.create(NewTask::new("Visible before logout")).await?;
    assert_eq!(client.tasks.snapshot().tasks.len(), 1);

    client.session.logout().await?;

    assert!(client.tasks.snapshot().tasks.is_empty());
    assert_eq!(client.tasks.analytics().total, 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn profile_rejection_empties_the_task_list(client: Client) -> eyre::Result<()> {
    signed_in(&client).await?;
    client.tasks.create(NewTask::new("Visible before expiry")).await?;
    client.remote.expire_session()?;

    let err = client
        .session
        .refresh_profile()
        .await
        .expect_err("expired session should be rejected");

    assert!(err.is_unauthorized());
    assert!(client.tasks.snapshot().tasks.is_empty());
    Ok(())
}
