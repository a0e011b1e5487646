//! Remote lock lease management.
//!
//! This module keeps track of locks the client holds on remote resources and
//! keeps them alive:
//! - [`LockStore`]: table of held leases, one per resource id
//! - a background ticker that refreshes leases nearing their deadline
//! - [`RemoteSession`]: the boundary to the network session that sends the
//!   actual refresh requests
//!
//! # Lease Lifecycle
//!
//! A lease is added after the remote LOCK succeeded and removed after the
//! remote UNLOCK succeeded. In between, the ticker refreshes it whenever its
//! deadline falls within the configured lead window. A lease whose refresh
//! fails, for whatever reason, is dropped from the table and not retried.
//!
//! # Teardown
//!
//! Dropping the store stops the ticker, waits for a refresh already in
//! flight, and forgets all leases. No UNLOCK is sent.

mod lease;
mod session;
mod store;
mod ticker;
mod types;


// Re-export public API
pub use lease::LeaseInfo;
pub use session::{RefreshError, RemoteSession, SessionHandle};
pub use store::LockStore;
pub use types::{Deadline, LockDepth, LockDescriptor, LockKind, LockScope, LockTimeout};
