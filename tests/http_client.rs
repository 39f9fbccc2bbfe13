//! HTTP adapter tests against a local axum server.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use rstest::rstest;
use serde_json::{Value, json};
use todosync::remote::{HttpApiClient, TransportError};
use todosync::session::domain::Credentials;
use todosync::session::services::SessionService;
use todosync::storage::LocalState;
use todosync::storage::adapters::InMemoryKeyValueStore;
use todosync::task::domain::{Category, NewTask, PageSize, Task, TaskFilter, TaskId, TaskQuery};
use todosync::task::ports::TaskApi;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

const TOKEN: &str = "token-abc";

type Reply = (StatusCode, Json<Value>);

fn user_json() -> Value {
    json!({
        "id": "user-1",
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "created_at": "2025-03-14T09:30:00",
    })
}

fn task_json(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "completed": false,
        "category": "work",
        "priority": "medium",
        "created_at": "2025-03-14T09:30:00Z",
        "updated_at": "2025-03-14T09:30:00Z",
        "user_id": "user-1",
    })
}

fn authorised(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {TOKEN}"))
}

fn unauthorised() -> Reply {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Could not validate credentials" })),
    )
}

#[expect(clippy::unused_async, reason = "axum handlers are async functions")]
async fn login(Json(body): Json<Value>) -> Reply {
    if body.get("password").and_then(Value::as_str) == Some("analytical") {
        (StatusCode::OK, Json(json!({ "token": TOKEN, "user": user_json() })))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Incorrect email or password" })),
        )
    }
}

#[expect(clippy::unused_async, reason = "axum handlers are async functions")]
async fn list(headers: HeaderMap, Query(params): Query<HashMap<String, String>>) -> Reply {
    if !authorised(&headers) {
        return unauthorised();
    }
    let number = |key: &str| {
        params
            .get(key)
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or_default()
    };
    let title = params
        .get("category")
        .map_or_else(|| "any".to_owned(), |category| format!("only {category}"));
    (
        StatusCode::OK,
        Json(json!({
            "todos": [task_json("7", &title)],
            "total": 1,
            "skip": number("skip"),
            "limit": number("limit"),
        })),
    )
}

#[expect(clippy::unused_async, reason = "axum handlers are async functions")]
async fn show(headers: HeaderMap, Path(id): Path<String>) -> Reply {
    if !authorised(&headers) {
        return unauthorised();
    }
    match id.as_str() {
        "7" => (StatusCode::OK, Json(task_json("7", "Seven"))),
        "garbled" => (StatusCode::OK, Json(json!({ "id": 7 }))),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Todo not found" })),
        ),
    }
}

#[expect(clippy::unused_async, reason = "axum handlers are async functions")]
async fn remove(headers: HeaderMap, Path(_id): Path<String>) -> StatusCode {
    if authorised(&headers) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::UNAUTHORIZED
    }
}

async fn spawn_server() -> eyre::Result<Url> {
    let app = Router::new()
        .route("/auth/login", post(login))
        .route("/todos", get(list))
        .route("/todos/{id}", get(show).delete(remove));
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            tracing::error!(error = %err, "test server stopped");
        }
    });
    Ok(Url::parse(&format!("http://{address}/"))?)
}

struct Harness {
    api: Arc<HttpApiClient<InMemoryKeyValueStore>>,
    session: SessionService<HttpApiClient<InMemoryKeyValueStore>, InMemoryKeyValueStore>,
}

async fn harness() -> eyre::Result<Harness> {
    let base_url = spawn_server().await?;
    let local = LocalState::new(Arc::new(InMemoryKeyValueStore::new()));
    let api = Arc::new(HttpApiClient::new(
        base_url,
        Duration::from_secs(5),
        local.clone(),
    )?);
    Ok(Harness {
        session: SessionService::new(Arc::clone(&api), local),
        api,
    })
}

async fn signed_in() -> eyre::Result<Harness> {
    let harness = harness().await?;
    harness
        .session
        .login(&Credentials::new("ada@example.com", "analytical"))
        .await?;
    Ok(harness)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn login_stores_token_used_by_later_requests() -> eyre::Result<()> {
    let harness = signed_in().await?;

    let task = harness.api.get(&TaskId::new("7")?).await?;

    assert_eq!(task.title(), "Seven");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn requests_without_a_token_are_unauthorised() -> eyre::Result<()> {
    let harness = harness().await?;

    let err = harness
        .api
        .get(&TaskId::new("7")?)
        .await
        .expect_err("request without token should fail");

    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Could not validate credentials");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_login_reports_server_message() -> eyre::Result<()> {
    let harness = harness().await?;

    let err = harness
        .session
        .login(&Credentials::new("ada@example.com", "wrong-password"))
        .await
        .expect_err("bad password should be rejected");

    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Incorrect email or password");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_sends_paging_and_filter_parameters() -> eyre::Result<()> {
    let harness = signed_in().await?;
    let query = TaskQuery::new()
        .with_filter(TaskFilter::new().with_category(Category::Work))
        .with_skip(20)
        .with_limit(PageSize::new(5)?);

    let page = harness.api.list(&query).await?;

    assert_eq!(page.skip, 20);
    assert_eq!(page.limit, 5);
    assert_eq!(
        page.todos.first().map(Task::title),
        Some("only work")
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_task_maps_to_not_found() -> eyre::Result<()> {
    let harness = signed_in().await?;

    let err = harness
        .api
        .get(&TaskId::new("99")?)
        .await
        .expect_err("unknown task should be missing");

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Todo not found");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_accepts_an_empty_response() -> eyre::Result<()> {
    let harness = signed_in().await?;

    harness.api.delete(&TaskId::new("7")?).await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_body_is_a_decode_error() -> eyre::Result<()> {
    let harness = signed_in().await?;

    let err = harness
        .api
        .get(&TaskId::new("garbled")?)
        .await
        .expect_err("garbled body should not decode");

    assert!(matches!(err, TransportError::Decode { .. }));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn closed_port_is_a_connectivity_error() -> eyre::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    drop(listener);
    let local = LocalState::new(Arc::new(InMemoryKeyValueStore::new()));
    let api = HttpApiClient::new(
        Url::parse(&format!("http://{address}/"))?,
        Duration::from_secs(2),
        local,
    )?;

    let err = api
        .list(&TaskQuery::new())
        .await
        .expect_err("closed port should be unreachable");

    assert!(err.is_connectivity());
    Ok(())
}

/// Reads one request (headers plus a `Content-Length` body) off `stream`.
async fn read_request(stream: &mut TcpStream) -> std::io::Result<()> {
    let mut received = Vec::new();
    let mut chunk = [0_u8; 1024];
    loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        received.extend(chunk.iter().take(read));
        let text = String::from_utf8_lossy(&received);
        if let Some((head, body)) = text.split_once("\r\n\r\n") {
            let length = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or_default();
            if body.len() >= length {
                return Ok(());
            }
        }
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn truncated_success_body_is_a_decode_error() -> eyre::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        if read_request(&mut stream).await.is_err() {
            return;
        }
        let head = "HTTP/1.1 201 Created\r\ncontent-type: application/json\r\ncontent-length: 200\r\n\r\n{\"id\":";
        if let Err(err) = stream.write_all(head.as_bytes()).await {
            tracing::error!(error = %err, "test server could not reply");
            return;
        }
        if let Err(err) = stream.shutdown().await {
            tracing::debug!(error = %err, "test server shutdown failed");
        }
    });
    let local = LocalState::new(Arc::new(InMemoryKeyValueStore::new()));
    let api = HttpApiClient::new(
        Url::parse(&format!("http://{address}/"))?,
        Duration::from_secs(5),
        local,
    )?;

    let err = api
        .create(&NewTask::new("Accepted but cut off"))
        .await
        .expect_err("truncated body should not decode");

    assert!(err.is_decode(), "expected a decode error, got {err:?}");
    assert!(!err.is_connectivity());
    Ok(())
}
