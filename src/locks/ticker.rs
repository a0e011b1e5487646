//! Background thread that periodically triggers a refresh pass.
//!
//! The ticker holds no lease data. It runs a caller-supplied pass every
//! interval until it is stopped or the pass reports that its target is gone.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const THREAD_NAME: &str = "lease-refresher";

/// Handle to a running ticker thread.
///
/// Owning a `Ticker` means the thread is running. Dropping it without
/// calling [`Ticker::stop`] disconnects the stop channel, so the thread still
/// exits after its current pass, but nobody waits for it.
#[derive(Debug)]
pub(crate) struct Ticker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawn the ticker thread.
    ///
    /// `pass` is invoked once per `interval`; returning `false` ends the loop.
    pub(crate) fn start<F>(interval: Duration, pass: F) -> io::Result<Self>
    where
        F: Fn() -> bool + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            match panic::catch_unwind(AssertUnwindSafe(&pass)) {
                                Ok(true) => {}
                                Ok(false) => {
                                    tracing::debug!("lease refresher target is gone, exiting");
                                    break;
                                }
                                Err(payload) => tracing::error!(
                                    "refresh pass panicked: {}",
                                    panic_message(payload.as_ref())
                                ),
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        tracing::info!(?interval, "lease refresher started");
        Ok(Self { stop_tx, handle })
    }

    /// Stop the ticker.
    ///
    /// Blocks until a pass already in progress has finished, so no pass runs
    /// after this returns. When called from the ticker thread itself (a pass
    /// that removed the last lease), the thread is only signalled; it exits
    /// once the current pass returns.
    pub(crate) fn stop(self) {
        let Ticker { stop_tx, handle } = self;
        drop(stop_tx);

        if handle.thread().id() == thread::current().id() {
            tracing::info!("lease refresher stopping from its own pass");
            return;
        }

        if handle.join().is_err() {
            tracing::error!("lease refresher thread panicked");
        } else {
            tracing::info!("lease refresher stopped");
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
