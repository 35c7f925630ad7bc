//! Caller-side retry and backoff.
//!
//! Extraction itself never retries. Callers (the CLI, embedding services)
//! classify the terminal error and let [`RetryPolicy`] decide whether another
//! attempt is worth it.

mod classify;
mod policy;
mod run;

pub use classify::{
    classify, classify_anyhow, classify_curl_error, classify_http_status, classify_transport_error,
};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
