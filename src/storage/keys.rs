//! Fixed key namespace for persisted client state.

use std::fmt;

/// Prefix shared by every persisted key.
pub const KEY_NAMESPACE: &str = "todosync";

/// Keys of the values persisted by the client.
///
/// All keys are cleared together on logout or forced session invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Opaque bearer token of the active session.
    Token,
    /// Serialized profile of the signed-in user.
    User,
    /// Last successfully fetched task listing.
    CachedTasks,
    /// Mutations waiting for connectivity.
    OfflineQueue,
}

impl StorageKey {
    /// Every key in the namespace, in a stable order.
    pub const ALL: [Self; 4] = [Self::Token, Self::User, Self::CachedTasks, Self::OfflineQueue];

    /// Returns the fully qualified storage key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Token => "todosync.token",
            Self::User => "todosync.user",
            Self::CachedTasks => "todosync.cached_todos",
            Self::OfflineQueue => "todosync.offline_queue",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
