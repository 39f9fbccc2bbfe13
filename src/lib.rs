//! Todosync: offline-tolerant client for a remote to-do service.
//!
//! The crate keeps a local projection of the user's tasks in step with a
//! REST backend. Mutations made while the backend is unreachable are queued
//! durably and replayed later; reads fall back to the last cached snapshot.
//!
//! # Architecture
//!
//! Todosync follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (HTTP, filesystem,
//!   in-memory fakes)
//!
//! # Modules
//!
//! - [`storage`]: Durable key-value state (token, profile, cache, queue)
//! - [`remote`]: Transport error taxonomy and the HTTP and in-memory servers
//! - [`session`]: Authentication and profile management
//! - [`task`]: Task domain, offline queue, cache fallback and the task store
//! - [`config`]: Layered configuration
//! - [`client`]: Wiring configuration to services
//! - [`telemetry`]: Tracing subscriber setup

pub mod client;
pub mod config;
pub mod remote;
pub mod session;
pub mod storage;
pub mod task;
pub mod telemetry;

#[cfg(test)]
mod test_support;
