//! Failure taxonomy reported by remote service transports.

use thiserror::Error;

/// Result type for remote service calls.
pub type TransportResult<T> = Result<T, TransportError>;

/// HTTP status that forces local session invalidation.
pub const STATUS_UNAUTHORIZED: u16 = 401;

/// HTTP status reported when a mutation targets a missing task.
pub const STATUS_NOT_FOUND: u16 = 404;

const GENERIC_SERVER_MESSAGE: &str = "An error occurred";

/// Errors returned by remote service adapters.
///
/// `Connectivity` is the only recoverable kind: callers queue mutations or
/// serve cached data. Every other kind is terminal for the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No response was received from the server.
    #[error("network error - please check your internet connection ({reason})")]
    Connectivity {
        /// Transport-level diagnostic.
        reason: String,
    },

    /// The server answered with an error status.
    #[error("{message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// A success response carried a body that could not be decoded.
    #[error("unexpected response from server: {reason}")]
    Decode {
        /// Decoder diagnostic.
        reason: String,
    },
}

impl TransportError {
    /// Creates a connectivity failure.
    pub fn connectivity(reason: impl Into<String>) -> Self {
        Self::Connectivity {
            reason: reason.into(),
        }
    }

    /// Creates a server failure. A blank message is replaced with a generic
    /// one so the surfaced error is never empty.
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        let raw = message.into();
        let message = if raw.trim().is_empty() {
            GENERIC_SERVER_MESSAGE.to_owned()
        } else {
            raw
        };
        Self::Server { status, message }
    }

    /// Creates a decode failure.
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    /// Returns `true` when a response arrived but its body could not be
    /// read or decoded.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Returns `true` when no response was received.
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }

    /// Returns the HTTP status of a server failure.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Connectivity { .. } | Self::Decode { .. } => None,
        }
    }

    /// Returns `true` for a 401 response.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(STATUS_UNAUTHORIZED))
    }

    /// Returns `true` for a 404 response.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(STATUS_NOT_FOUND))
    }

    /// Returns `true` for a 5xx response.
    #[must_use]
    pub const fn is_server_fault(&self) -> bool {
        matches!(self.status(), Some(500..=599))
    }
}
