//! RAII wall-clock deadline for one realm call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rquickjs::Runtime;

/// Arms the runtime's interrupt handler for `timeout` and disarms it when dropped.
///
/// The engine polls the handler while executing bytecode; once it returns true
/// the running code gets an uncatchable exception, so a script cannot swallow
/// its own termination with `try`/`catch`.
pub(super) struct DeadlineGuard<'a> {
    runtime: &'a Runtime,
    fired: Arc<AtomicBool>,
    started: Instant,
}

impl<'a> DeadlineGuard<'a> {
    pub(super) fn arm(runtime: &'a Runtime, timeout: Duration) -> Self {
        let started = Instant::now();
        let deadline = started.checked_add(timeout);
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        runtime.set_interrupt_handler(Some(Box::new(move || {
            let expired = deadline.map_or(false, |d| Instant::now() >= d);
            if expired {
                flag.store(true, Ordering::Relaxed);
            }
            expired
        })));
        Self {
            runtime,
            fired,
            started,
        }
    }

    /// True once the handler has interrupted execution.
    pub(super) fn fired(&self) -> bool {
        self.fired.load(Ordering::Relaxed)
    }

    pub(super) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for DeadlineGuard<'_> {
    fn drop(&mut self) {
        self.runtime.set_interrupt_handler(None);
    }
}
