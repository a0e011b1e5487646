//! The lock store: a thread-safe table of held leases.
//!
//! All table access and the ticker handle are guarded by a single mutex.
//! The refresh pass never holds that mutex across a network call: it
//! snapshots the due leases, then for each one re-checks under the lock,
//! releases it for the session call, and re-acquires it to commit the result.

use super::lease::{Lease, LeaseInfo};
use super::session::{RefreshError, SessionHandle};
use super::ticker::{Ticker, panic_message};
use super::types::{Deadline, LockDescriptor};
use crate::config::StoreConfig;
use crate::error::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

/// Table of remote locks held by this process, kept alive in the background.
///
/// Register a lease with [`LockStore::add`] once a remote LOCK succeeded and
/// drop it with [`LockStore::remove`] once the remote UNLOCK succeeded. While
/// the table is non-empty a background ticker refreshes every lease that is
/// about to expire.
///
/// Dropping the store (or calling [`LockStore::shutdown`]) stops the ticker,
/// waits for an in-flight refresh, and forgets all leases without sending
/// any UNLOCK.
pub struct LockStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    config: StoreConfig,
    state: Mutex<StoreState>,
}

struct StoreState {
    leases: HashMap<String, Lease>,
    ticker: Option<Ticker>,
    next_generation: u64,
    shut_down: bool,
}

/// Everything a refresh call needs, copied out of the table.
struct RefreshRequest {
    resource_id: String,
    generation: u64,
    token: String,
    descriptor: LockDescriptor,
    session: SessionHandle,
}

impl LockStore {
    /// Create an empty store with the default refresh timing.
    pub fn new() -> Self {
        Self::from_valid_config(StoreConfig::default())
    }

    /// Create an empty store with custom refresh timing.
    ///
    /// # Returns
    ///
    /// * `Ok(LockStore)` - Config is valid
    /// * `Err(LeaseKeeperError::Config)` - Config failed validation
    pub fn with_config(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                config,
                state: Mutex::new(StoreState {
                    leases: HashMap::new(),
                    ticker: None,
                    next_generation: 0,
                    shut_down: false,
                }),
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Register a lease for `resource_id`, replacing any previous one.
    ///
    /// A replaced lease is forgotten without an UNLOCK; the caller is expected
    /// to have released it already. Starts the ticker if it is not running.
    /// After [`LockStore::shutdown`] the lease is ignored.
    pub fn add(
        &self,
        resource_id: impl Into<String>,
        descriptor: LockDescriptor,
        token: impl Into<String>,
        session: SessionHandle,
        deadline: Deadline,
    ) {
        let resource_id = resource_id.into();
        let mut state = self.inner.lock_state();

        if state.shut_down {
            tracing::warn!(resource_id = %resource_id, "lock store is shut down, lease not recorded");
            return;
        }

        state.next_generation += 1;
        let generation = state.next_generation;
        let lease = Lease::new(token.into(), descriptor, session, deadline, generation);

        if state.leases.insert(resource_id.clone(), lease).is_some() {
            tracing::debug!(resource_id = %resource_id, %deadline, "lease replaced");
        } else {
            tracing::debug!(resource_id = %resource_id, %deadline, "lease added");
        }

        self.start_ticker(&mut state);
    }

    /// Token of the lease held on `resource_id`.
    ///
    /// With a `filter`, the token is only returned if the held lock satisfies
    /// the requested descriptor (see [`LockDescriptor::satisfies`]).
    pub fn lookup_token(
        &self,
        resource_id: &str,
        filter: Option<&LockDescriptor>,
    ) -> Option<String> {
        let state = self.inner.lock_state();
        let lease = state.leases.get(resource_id)?;

        match filter {
            Some(requested) if !lease.descriptor.satisfies(requested) => None,
            _ => Some(lease.token.clone()),
        }
    }

    /// Forget the lease for `resource_id`, if any.
    ///
    /// Stops the ticker when the table becomes empty, waiting for a refresh
    /// pass in progress to finish.
    pub fn remove(&self, resource_id: &str) {
        let stopped = {
            let mut state = self.inner.lock_state();
            self.inner.remove_locked(&mut state, resource_id)
        };

        if let Some(ticker) = stopped {
            ticker.stop();
        }
    }

    /// Refresh every lease whose deadline is within the configured lead
    /// window. Driven by the ticker; exposed to the crate for tests.
    ///
    /// Leases whose refresh fails are removed; they are not retried.
    pub(crate) fn refresh_all(&self) {
        self.inner.refresh_all();
    }

    /// Stop the ticker and forget all leases without any network call.
    ///
    /// Waits for a refresh already in flight; no refresh starts once this
    /// has begun. Idempotent.
    pub fn shutdown(&self) {
        let stopped = {
            let mut state = self.inner.lock_state();
            state.shut_down = true;
            state.ticker.take()
        };

        if let Some(ticker) = stopped {
            ticker.stop();
        }

        let mut state = self.inner.lock_state();
        if !state.leases.is_empty() {
            tracing::debug!(count = state.leases.len(), "dropping leases on shutdown");
            state.leases.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock_state().leases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock_state().leases.is_empty()
    }

    pub fn contains(&self, resource_id: &str) -> bool {
        self.inner.lock_state().leases.contains_key(resource_id)
    }

    /// Snapshot of all leases, sorted by resource id.
    pub fn leases(&self) -> Vec<LeaseInfo> {
        let state = self.inner.lock_state();
        let mut leases: Vec<LeaseInfo> = state
            .leases
            .iter()
            .map(|(resource_id, lease)| lease.info(resource_id))
            .collect();

        leases.sort_by(|a, b| a.resource_id.cmp(&b.resource_id));
        leases
    }

    pub fn is_ticker_running(&self) -> bool {
        self.inner.lock_state().ticker.is_some()
    }

    fn start_ticker(&self, state: &mut StoreState) {
        if state.ticker.is_some() {
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let started = Ticker::start(self.inner.config.refresh_interval(), move || {
            match weak.upgrade() {
                Some(inner) => {
                    inner.refresh_all();
                    true
                }
                None => false,
            }
        });

        match started {
            Ok(ticker) => state.ticker = Some(ticker),
            // Leases stay recorded; the next add tries again.
            Err(e) => tracing::error!("failed to start lease refresher: {}", e),
        }
    }
}

impl Default for LockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LockStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for LockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock_state();
        f.debug_struct("LockStore")
            .field("config", &self.inner.config)
            .field("leases", &state.leases.len())
            .field("ticker_running", &state.ticker.is_some())
            .field("shut_down", &state.shut_down)
            .finish()
    }
}

impl StoreInner {
    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        // A panic elsewhere never leaves the table half-updated.
        self.state
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    /// Remove a lease and hand back the ticker if the table became empty.
    ///
    /// The caller must stop the returned ticker after releasing the lock.
    fn remove_locked(&self, state: &mut StoreState, resource_id: &str) -> Option<Ticker> {
        if state.leases.remove(resource_id).is_some() {
            tracing::debug!(resource_id = %resource_id, "lease removed");
        }

        if state.leases.is_empty() {
            state.ticker.take()
        } else {
            None
        }
    }

    fn refresh_all(&self) {
        let now = Utc::now();
        let lead = self.config.refresh_lead();

        let due: Vec<RefreshRequest> = {
            let state = self.lock_state();
            if state.shut_down {
                return;
            }
            state
                .leases
                .iter()
                .filter(|(_, lease)| lease.deadline.is_due(now, lead))
                .map(|(resource_id, lease)| RefreshRequest {
                    resource_id: resource_id.clone(),
                    generation: lease.generation,
                    token: lease.token.clone(),
                    descriptor: lease.descriptor.clone(),
                    session: Arc::clone(&lease.session),
                })
                .collect()
        };

        for request in due {
            {
                let state = self.lock_state();
                if state.shut_down {
                    return;
                }
                // Removed or replaced since the snapshot.
                if !state.is_current(&request.resource_id, request.generation) {
                    continue;
                }
            }

            // A panicking session counts as a failed refresh.
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                request.session.refresh_lock(
                    &request.resource_id,
                    &request.token,
                    &request.descriptor,
                )
            }))
            .unwrap_or_else(|payload| {
                Err(RefreshError::Transient(format!(
                    "session panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });

            let stopped = {
                let mut state = self.lock_state();
                self.commit_refresh(&mut state, &request, result)
            };

            if let Some(ticker) = stopped {
                ticker.stop();
            }
        }
    }

    fn commit_refresh(
        &self,
        state: &mut StoreState,
        request: &RefreshRequest,
        result: std::result::Result<Deadline, RefreshError>,
    ) -> Option<Ticker> {
        if state.shut_down || !state.is_current(&request.resource_id, request.generation) {
            tracing::debug!(
                resource_id = %request.resource_id,
                "discarding refresh result for a lease that is gone"
            );
            return None;
        }

        match result {
            Ok(deadline) => {
                if let Some(lease) = state.leases.get_mut(&request.resource_id) {
                    lease.deadline = deadline;
                    lease.refresh_count += 1;
                }
                tracing::debug!(resource_id = %request.resource_id, %deadline, "lease refreshed");
                None
            }
            Err(e) => {
                tracing::warn!(
                    resource_id = %request.resource_id,
                    lost = e.is_lost(),
                    "dropping lease after failed refresh: {}",
                    e
                );
                self.remove_locked(state, &request.resource_id)
            }
        }
    }
}

impl StoreState {
    fn is_current(&self, resource_id: &str, generation: u64) -> bool {
        self.leases
            .get(resource_id)
            .is_some_and(|lease| lease.generation == generation)
    }
}
