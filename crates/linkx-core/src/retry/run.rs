//! Retry loop: run a closure until success or policy says stop.

use std::fmt::Display;

use super::policy::{ErrorKind, RetryDecision, RetryPolicy};

/// Runs a closure until it succeeds or the retry policy says to stop.
/// On retryable failure, sleeps for the backoff duration then tries again.
///
/// Blocking; wrap in `spawn_blocking` from async code.
pub fn run_with_retry<T, E, F, C>(policy: &RetryPolicy, classify: C, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    C: Fn(&E) -> ErrorKind,
    E: Display,
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        tracing::warn!(
                            "attempt {} failed ({:?}): {}; retrying in {:?}",
                            attempt,
                            kind,
                            e,
                            d
                        );
                        std::thread::sleep(d);
                        attempt += 1;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Duration;

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[test]
    fn retries_transient_until_success() {
        let calls = Cell::new(0);
        let r: Result<u32, String> = run_with_retry(
            &quick(5),
            |_| ErrorKind::Connection,
            || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Err("reset".to_string())
                } else {
                    Ok(calls.get())
                }
            },
        );
        assert_eq!(r, Ok(3));
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let r: Result<(), String> = run_with_retry(
            &quick(3),
            |_| ErrorKind::Timeout,
            || {
                calls.set(calls.get() + 1);
                Err("timeout".to_string())
            },
        );
        assert!(r.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn permanent_error_is_not_retried() {
        let calls = Cell::new(0);
        let r: Result<(), String> = run_with_retry(
            &quick(5),
            |_| ErrorKind::Other,
            || {
                calls.set(calls.get() + 1);
                Err("no link".to_string())
            },
        );
        assert_eq!(r, Err("no link".to_string()));
        assert_eq!(calls.get(), 1);
    }
}
