//! Lease records held by the store and their public snapshots.

use super::session::SessionHandle;
use super::types::{Deadline, LockDescriptor};
use crate::error::{LeaseKeeperError, Result};
use serde::Serialize;

/// One held remote lock.
pub(crate) struct Lease {
    /// Token issued by the server. Never changes once the lease exists.
    pub(crate) token: String,
    pub(crate) descriptor: LockDescriptor,
    pub(crate) session: SessionHandle,
    pub(crate) deadline: Deadline,

    /// Store-assigned instance number. A refresh result is only applied to
    /// the instance it was issued for.
    pub(crate) generation: u64,

    pub(crate) refresh_count: u32,
}

impl Lease {
    pub(crate) fn new(
        token: String,
        descriptor: LockDescriptor,
        session: SessionHandle,
        deadline: Deadline,
        generation: u64,
    ) -> Self {
        Self {
            token,
            descriptor,
            session,
            deadline,
            generation,
            refresh_count: 0,
        }
    }

    pub(crate) fn info(&self, resource_id: &str) -> LeaseInfo {
        LeaseInfo {
            resource_id: resource_id.to_string(),
            token: self.token.clone(),
            descriptor: self.descriptor.clone(),
            deadline: self.deadline,
            refresh_count: self.refresh_count,
        }
    }
}

/// Read-only snapshot of a lease, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaseInfo {
    pub resource_id: String,
    pub token: String,
    pub descriptor: LockDescriptor,
    pub deadline: Deadline,

    /// Number of successful refreshes since the lease was added.
    pub refresh_count: u32,
}

impl LeaseInfo {
    /// Serialize the snapshot to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            LeaseKeeperError::Serialization(format!("failed to serialize lease info: {}", e))
        })
    }
}

impl std::fmt::Display for LeaseInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (token: {}, scope: {:?}, deadline: {}, refreshed: {})",
            self.resource_id,
            self.token,
            self.descriptor.scope,
            self.deadline,
            self.refresh_count
        )
    }
}
