//! Realm pinned to its own thread, with a host-side watchdog on every call.
//!
//! The interrupt handler only fires while the engine executes bytecode. Native
//! work such as regex backtracking never polls it, so a call can outlive its
//! deadline indefinitely. The worker bounds the caller instead: each call waits
//! for `timeout + grace`, and on expiry the thread and its realm are abandoned.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{RealmLimits, SandboxError, SandboxRealm};

/// Slack on top of the engine deadline before the watchdog gives up.
pub const DEFAULT_GRACE: Duration = Duration::from_millis(500);

type Job = Box<dyn FnOnce(&SandboxRealm) + Send>;

/// Handle to a [`SandboxRealm`] living on a dedicated thread.
///
/// Once a call stalls the worker is poisoned: every later call returns
/// [`SandboxError::Stalled`] without touching the realm.
pub struct RealmWorker {
    jobs: Option<mpsc::Sender<Job>>,
    thread: Option<JoinHandle<()>>,
    grace: Duration,
}

impl RealmWorker {
    /// Spawns the thread and creates the realm on it.
    pub fn spawn(limits: RealmLimits, grace: Duration) -> Result<Self, SandboxError> {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("linkx-realm".to_string())
            .spawn(move || {
                let realm = match SandboxRealm::create(limits) {
                    Ok(realm) => realm,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if ready_tx.send(Ok(())).is_err() {
                    return;
                }
                for job in job_rx {
                    job(&realm);
                }
            })
            .map_err(|e| SandboxError::Isolation(format!("spawn realm thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                jobs: Some(job_tx),
                thread: Some(thread),
                grace,
            }),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => Err(SandboxError::Isolation(
                "realm thread exited during creation".to_string(),
            )),
        }
    }

    /// Runs `f` against the realm and waits at most `timeout + grace` for it.
    ///
    /// `timeout` should be the deadline `f` hands to the realm itself; the
    /// watchdog only matters when the engine fails to honor it.
    pub fn call<R, F>(&mut self, timeout: Duration, f: F) -> Result<R, SandboxError>
    where
        R: Send + 'static,
        F: FnOnce(&SandboxRealm) -> R + Send + 'static,
    {
        let jobs = self.jobs.as_ref().ok_or(SandboxError::Stalled)?;
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        let job: Job = Box::new(move |realm: &SandboxRealm| {
            let _ = reply_tx.send(f(realm));
        });
        if jobs.send(job).is_err() {
            self.abandon();
            return Err(SandboxError::Stalled);
        }

        let budget = timeout.saturating_add(self.grace);
        match reply_rx.recv_timeout(budget) {
            Ok(value) => Ok(value),
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!("realm call still running after {:?}; abandoning realm thread", budget);
                self.abandon();
                Err(SandboxError::Stalled)
            }
            Err(RecvTimeoutError::Disconnected) => {
                tracing::warn!("realm thread exited mid-call");
                self.abandon();
                Err(SandboxError::Stalled)
            }
        }
    }

    /// True once a call has stalled and the realm is gone.
    pub fn is_stalled(&self) -> bool {
        self.jobs.is_none()
    }

    /// Detaches the thread. It exits on its own if the stuck call ever returns.
    fn abandon(&mut self) {
        self.jobs = None;
        self.thread = None;
    }
}

impl Drop for RealmWorker {
    fn drop(&mut self) {
        // Closing the queue ends the job loop; joining frees the realm before
        // the call that owned it returns.
        self.jobs = None;
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
