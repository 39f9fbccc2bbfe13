//! Task collection: domain model, remote port and the offline-capable
//! services built on them.
//!
//! [`services::TaskStore`] is the entry point. It validates input, calls the
//! remote service through [`ports::TaskApi`], queues mutations in
//! [`services::SyncQueue`] when the service is unreachable and serves reads
//! from [`services::CacheReconciler`] in the meantime.

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
