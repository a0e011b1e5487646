//! Leasekeeper: client-side manager for leases on remote resource locks.
//!
//! Servers speaking a stateless request/response protocol grant locks that
//! expire unless refreshed. [`locks::LockStore`] records the locks this
//! process holds and refreshes them in the background until they are
//! released or the store is torn down.

pub mod config;
pub mod error;
pub mod locks;

#[cfg(test)]
mod test_support;

pub use config::StoreConfig;
pub use error::{LeaseKeeperError, Result};
pub use locks::{
    Deadline, LeaseInfo, LockDepth, LockDescriptor, LockKind, LockScope, LockStore, LockTimeout,
    RefreshError, RemoteSession, SessionHandle,
};
