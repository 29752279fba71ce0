//! Retry and backoff policy.
//!
//! Decorrelated-jitter backoff plus the two predicates the request executor
//! uses to decide whether an attempt is worth repeating.

mod backoff;
mod classify;

pub use backoff::Backoff;
pub use classify::{is_timeout, should_retry_status};
