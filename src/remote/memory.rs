//! In-memory stand-in for the remote service.
//!
//! Used by tests and offline demos. Connectivity loss, expired sessions and
//! arbitrary failures can be injected to exercise the client's recovery
//! paths.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use uuid::Uuid;

use super::{STATUS_NOT_FOUND, STATUS_UNAUTHORIZED, TransportError, TransportResult};
use crate::session::domain::{AuthToken, Credentials, ProfileUpdate, Session, SignupRequest, User};
use crate::session::ports::AuthApi;
use crate::task::domain::{
    NewTask, Task, TaskData, TaskId, TaskPage, TaskPatch, TaskQuery, UserId,
};
use crate::task::ports::TaskApi;

const STATUS_BAD_REQUEST: u16 = 400;
const STATUS_UNPROCESSABLE: u16 = 422;
const STATUS_INTERNAL: u16 = 500;

/// Thread-safe fake of the remote task and authentication service.
#[derive(Clone)]
pub struct InMemoryRemote {
    state: Arc<RwLock<ServerState>>,
    clock: Arc<dyn Clock + Send + Sync>,
}

#[derive(Debug, Default)]
struct ServerState {
    tasks: Vec<Task>,
    next_task_id: u64,
    accounts: HashMap<String, Account>,
    active_email: Option<String>,
    default_owner: Option<UserId>,
    offline: bool,
    session_expired: bool,
    scripted: VecDeque<Option<TransportError>>,
    requests: usize,
}

#[derive(Debug)]
struct Account {
    user: User,
    password: String,
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}

impl InMemoryRemote {
    /// Creates an empty, reachable server stamping records with `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            state: Arc::new(RwLock::new(ServerState {
                next_task_id: 1,
                ..ServerState::default()
            })),
            clock,
        }
    }

    /// Attributes tasks created without a signed-in user to `owner`.
    #[must_use]
    pub fn with_owner(self, owner: UserId) -> Self {
        if let Ok(mut state) = self.state.write() {
            state.default_owner = Some(owner);
        }
        self
    }

    /// Replaces the stored tasks. `tasks` are taken newest first; new
    /// identifiers continue after the largest numeric identifier seeded.
    ///
    /// # Errors
    ///
    /// Returns a server error when the state lock is poisoned.
    pub fn seed(&self, tasks: Vec<Task>) -> TransportResult<()> {
        let mut state = self.write_state()?;
        let highest = tasks
            .iter()
            .filter_map(|task| task.id().as_str().parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        state.next_task_id = highest.saturating_add(1);
        state.tasks = tasks;
        Ok(())
    }

    /// Returns a copy of the stored tasks, newest first.
    ///
    /// # Errors
    ///
    /// Returns a server error when the state lock is poisoned.
    pub fn tasks(&self) -> TransportResult<Vec<Task>> {
        let state = self
            .state
            .read()
            .map_err(|err| TransportError::server(STATUS_INTERNAL, err.to_string()))?;
        Ok(state.tasks.clone())
    }

    /// Makes every following request fail with a connectivity error until
    /// switched back.
    ///
    /// # Errors
    ///
    /// Returns a server error when the state lock is poisoned.
    pub fn set_offline(&self, offline: bool) -> TransportResult<()> {
        self.write_state()?.offline = offline;
        Ok(())
    }

    /// Rejects the current token: authenticated requests answer HTTP 401
    /// until the next login or signup.
    ///
    /// # Errors
    ///
    /// Returns a server error when the state lock is poisoned.
    pub fn expire_session(&self) -> TransportResult<()> {
        self.write_state()?.session_expired = true;
        Ok(())
    }

    /// Queues `error` as the response to the next request.
    ///
    /// # Errors
    ///
    /// Returns a server error when the state lock is poisoned.
    pub fn fail_next(&self, error: TransportError) -> TransportResult<()> {
        self.fail_after(0, error)
    }

    /// Lets `successes` requests through untouched, then answers the next
    /// one with `error`.
    ///
    /// # Errors
    ///
    /// Returns a server error when the state lock is poisoned.
    pub fn fail_after(&self, successes: usize, error: TransportError) -> TransportResult<()> {
        let mut state = self.write_state()?;
        state
            .scripted
            .extend(std::iter::repeat_n(None, successes).chain(std::iter::once(Some(error))));
        Ok(())
    }

    /// Returns the number of requests attempted, including failed ones.
    ///
    /// # Errors
    ///
    /// Returns a server error when the state lock is poisoned.
    pub fn request_count(&self) -> TransportResult<usize> {
        let state = self
            .state
            .read()
            .map_err(|err| TransportError::server(STATUS_INTERNAL, err.to_string()))?;
        Ok(state.requests)
    }

    fn write_state(&self) -> TransportResult<RwLockWriteGuard<'_, ServerState>> {
        self.state
            .write()
            .map_err(|err| TransportError::server(STATUS_INTERNAL, err.to_string()))
    }

    /// Records the attempt and applies injected failures.
    fn begin(&self) -> TransportResult<RwLockWriteGuard<'_, ServerState>> {
        let mut state = self.write_state()?;
        state.requests = state.requests.saturating_add(1);
        if state.offline {
            return Err(TransportError::connectivity("server unreachable"));
        }
        if let Some(Some(error)) = state.scripted.pop_front() {
            return Err(error);
        }
        Ok(state)
    }

    /// Like [`Self::begin`], additionally rejecting expired sessions.
    fn begin_authenticated(&self) -> TransportResult<RwLockWriteGuard<'_, ServerState>> {
        let state = self.begin()?;
        if state.session_expired {
            return Err(unauthorized());
        }
        Ok(state)
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }
}

fn unauthorized() -> TransportError {
    TransportError::server(STATUS_UNAUTHORIZED, "Could not validate credentials")
}

fn todo_not_found() -> TransportError {
    TransportError::server(STATUS_NOT_FOUND, "Todo not found")
}

fn owner_of(state: &ServerState) -> TransportResult<UserId> {
    state
        .active_email
        .as_ref()
        .and_then(|email| state.accounts.get(email))
        .map(|account| account.user.id.clone())
        .or_else(|| state.default_owner.clone())
        .ok_or_else(unauthorized)
}

fn active_account(state: &mut ServerState) -> TransportResult<&mut Account> {
    let email = state.active_email.clone().ok_or_else(unauthorized)?;
    state.accounts.get_mut(&email).ok_or_else(unauthorized)
}

fn issue_session(state: &mut ServerState, user: User) -> TransportResult<Session> {
    let token = AuthToken::new(format!("token-{}", Uuid::new_v4()))
        .map_err(|err| TransportError::server(STATUS_INTERNAL, err.to_string()))?;
    state.active_email = Some(user.email.clone());
    state.session_expired = false;
    Ok(Session { token, user })
}

fn apply_patch(task: Task, patch: &TaskPatch, now: DateTime<Utc>) -> Task {
    let mut data = task.into_data();
    if let Some(title) = patch.title() {
        title.clone_into(&mut data.title);
    }
    if let Some(description) = patch.description() {
        data.description = Some(description.to_owned());
    }
    if let Some(completed) = patch.completed() {
        data.completed = completed;
    }
    if let Some(category) = patch.category() {
        data.category = category;
    }
    if let Some(priority) = patch.priority() {
        data.priority = priority;
    }
    if let Some(due_date) = patch.due_date() {
        data.due_date = Some(due_date);
    }
    data.updated_at = now;
    Task::from_data(data)
}

fn count(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[async_trait]
impl TaskApi for InMemoryRemote {
    async fn list(&self, query: &TaskQuery) -> TransportResult<TaskPage> {
        let state = self.begin_authenticated()?;
        let mut matching: Vec<&Task> = state
            .tasks
            .iter()
            .filter(|task| query.filter.matches(task))
            .collect();
        matching.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
        let total = count(matching.len());
        let todos = matching
            .into_iter()
            .skip(usize::try_from(query.skip).unwrap_or(usize::MAX))
            .take(usize::try_from(query.limit.value()).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(TaskPage {
            todos,
            total,
            skip: query.skip,
            limit: query.limit.value(),
        })
    }

    async fn get(&self, id: &TaskId) -> TransportResult<Task> {
        let state = self.begin_authenticated()?;
        state
            .tasks
            .iter()
            .find(|task| task.id() == id)
            .cloned()
            .ok_or_else(todo_not_found)
    }

    async fn create(&self, task: &NewTask) -> TransportResult<Task> {
        let mut state = self.begin_authenticated()?;
        task.validate()
            .map_err(|err| TransportError::server(STATUS_UNPROCESSABLE, err.to_string()))?;
        let user_id = owner_of(&state)?;
        let id = TaskId::new(state.next_task_id.to_string())
            .map_err(|err| TransportError::server(STATUS_INTERNAL, err.to_string()))?;
        state.next_task_id = state.next_task_id.saturating_add(1);
        let now = self.now();
        let created = Task::from_data(TaskData {
            id,
            title: task.title().to_owned(),
            description: task.description().map(str::to_owned),
            completed: false,
            category: task.category(),
            priority: task.priority(),
            due_date: task.due_date(),
            created_at: now,
            updated_at: now,
            user_id,
        });
        state.tasks.insert(0, created.clone());
        Ok(created)
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> TransportResult<Task> {
        let mut state = self.begin_authenticated()?;
        patch
            .validate()
            .map_err(|err| TransportError::server(STATUS_UNPROCESSABLE, err.to_string()))?;
        let position = state
            .tasks
            .iter()
            .position(|task| task.id() == id)
            .ok_or_else(todo_not_found)?;
        let current = state.tasks.remove(position);
        let updated = apply_patch(current, patch, self.now());
        state.tasks.insert(position, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: &TaskId) -> TransportResult<()> {
        let mut state = self.begin_authenticated()?;
        let position = state
            .tasks
            .iter()
            .position(|task| task.id() == id)
            .ok_or_else(todo_not_found)?;
        state.tasks.remove(position);
        Ok(())
    }
}

#[async_trait]
impl AuthApi for InMemoryRemote {
    async fn login(&self, credentials: &Credentials) -> TransportResult<Session> {
        let mut state = self.begin()?;
        let user = state
            .accounts
            .get(credentials.email())
            .filter(|account| account.password == credentials.password())
            .map(|account| account.user.clone())
            .ok_or_else(|| {
                TransportError::server(STATUS_UNAUTHORIZED, "Incorrect email or password")
            })?;
        issue_session(&mut state, user)
    }

    async fn signup(&self, request: &SignupRequest) -> TransportResult<Session> {
        let mut state = self.begin()?;
        if state.accounts.contains_key(request.email()) {
            return Err(TransportError::server(
                STATUS_BAD_REQUEST,
                "Email already registered",
            ));
        }
        let ordinal = state.accounts.len().saturating_add(1);
        let id = UserId::new(format!("user-{ordinal}"))
            .map_err(|err| TransportError::server(STATUS_INTERNAL, err.to_string()))?;
        let user = User {
            id,
            name: request.name().to_owned(),
            email: request.email().to_owned(),
            created_at: self.now(),
        };
        let password = request.credentials().password().to_owned();
        state.accounts.insert(
            user.email.clone(),
            Account {
                user: user.clone(),
                password,
            },
        );
        issue_session(&mut state, user)
    }

    async fn me(&self) -> TransportResult<User> {
        let mut state = self.begin_authenticated()?;
        Ok(active_account(&mut state)?.user.clone())
    }

    async fn update_me(&self, update: &ProfileUpdate) -> TransportResult<User> {
        let mut state = self.begin_authenticated()?;
        let account = active_account(&mut state)?;
        update.name().clone_into(&mut account.user.name);
        Ok(account.user.clone())
    }
}
