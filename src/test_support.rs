use crate::locks::{Deadline, LockDescriptor, RefreshError, RemoteSession};
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// One recorded `refresh_lock` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RefreshCall {
    pub(crate) resource_id: String,
    pub(crate) token: String,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<RefreshCall>,
    script: VecDeque<Result<Deadline, RefreshError>>,
    blocked: bool,
    in_flight: usize,
    completed: usize,
}

/// Scriptable session for store tests.
///
/// Answers refreshes from a queue of scripted results, falling back to a
/// deadline one hour out. While blocked, refresh calls park until
/// [`FakeSession::unblock`] is called.
#[derive(Default)]
pub(crate) struct FakeSession {
    state: Mutex<FakeState>,
    changed: Condvar,
}

impl FakeSession {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    /// Queue the result of the next unanswered refresh.
    pub(crate) fn push_result(&self, result: Result<Deadline, RefreshError>) {
        self.lock().script.push_back(result);
        self.changed.notify_all();
    }

    pub(crate) fn block(&self) {
        self.lock().blocked = true;
    }

    pub(crate) fn unblock(&self) {
        self.lock().blocked = false;
        self.changed.notify_all();
    }

    pub(crate) fn calls(&self) -> Vec<RefreshCall> {
        self.lock().calls.clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    pub(crate) fn completed(&self) -> usize {
        self.lock().completed
    }

    /// Wait until a refresh call is parked inside the session.
    pub(crate) fn wait_for_in_flight(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        while state.in_flight == 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|poison| poison.into_inner())
                .0;
        }
        true
    }
}

impl RemoteSession for FakeSession {
    fn refresh_lock(
        &self,
        resource_id: &str,
        token: &str,
        _descriptor: &LockDescriptor,
    ) -> Result<Deadline, RefreshError> {
        let mut state = self.lock();
        state.calls.push(RefreshCall {
            resource_id: resource_id.to_string(),
            token: token.to_string(),
        });
        state.in_flight += 1;
        self.changed.notify_all();

        while state.blocked {
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(|poison| poison.into_inner());
        }

        let result = state
            .script
            .pop_front()
            .unwrap_or_else(|| Ok(Deadline::after(chrono::Duration::hours(1))));

        state.in_flight -= 1;
        state.completed += 1;
        self.changed.notify_all();
        result
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
pub(crate) fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
