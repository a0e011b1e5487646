//! Boundary to the network session that negotiated a lock.

use super::types::{Deadline, LockDescriptor};
use std::sync::Arc;
use thiserror::Error;

/// Why a lease refresh did not go through.
///
/// The store treats both variants the same way and drops the lease; the
/// distinction is kept for logging and for sessions that want to report it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// The server no longer knows the lock (expired, stolen, or released).
    #[error("lock lost: {0}")]
    Lost(String),

    /// Network error, timeout, or unexpected server response.
    #[error("refresh failed: {0}")]
    Transient(String),
}

impl RefreshError {
    pub fn is_lost(&self) -> bool {
        matches!(self, RefreshError::Lost(_))
    }
}

/// A network session able to send lock refresh requests.
///
/// Implementations own the wire protocol and their own request timeouts.
/// `refresh_lock` may block for a full network round trip; the store never
/// calls it while holding its table lock.
pub trait RemoteSession: Send + Sync {
    /// Extend the lock identified by `token` on `resource_id`.
    ///
    /// Returns the new deadline granted by the server.
    fn refresh_lock(
        &self,
        resource_id: &str,
        token: &str,
        descriptor: &LockDescriptor,
    ) -> Result<Deadline, RefreshError>;
}

/// Shared handle to a session. The store never owns a session exclusively.
pub type SessionHandle = Arc<dyn RemoteSession>;
