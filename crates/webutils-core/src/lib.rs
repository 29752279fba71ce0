//! Resilient outbound HTTP: a retrying request executor with
//! decorrelated-jitter backoff and a bounded-concurrency semaphore.

pub mod client;
pub mod config;
pub mod logging;
pub mod request;
pub mod retry;
pub mod semaphore;
pub mod transport;

pub use client::{std_client, RetryClient, RetryOutcome};
pub use request::{RequestHook, RequestTemplate};
pub use retry::Backoff;
pub use semaphore::{CancelToken, Cancellation, Semaphore};
pub use transport::{Method, Request, Response, Transport, TransportError};
