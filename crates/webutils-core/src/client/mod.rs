//! Retrying request executor.
//!
//! A `RetryClient` composes a transport, a `Backoff` and the `timeout_only`
//! switch. It holds no mutable state, so one client can serve any number of
//! threads; each `execute` call keeps its own wait/attempt counters.

mod execute;
mod outcome;

pub use outcome::RetryOutcome;

use crate::config::{ClientConfig, ConfigError};
use crate::request::{form_post, json_post, RequestError, RequestHook, RequestTemplate};
use crate::retry::Backoff;
use crate::transport::{CurlTransport, Method, Request, Transport};
use serde::Serialize;
use std::time::Duration;

/// HTTP client that retries timeouts, 408 and 5xx with decorrelated-jitter backoff.
#[derive(Debug, Clone)]
pub struct RetryClient<T: Transport = CurlTransport> {
    transport: T,
    backoff: Backoff,
    timeout_only: bool,
}

impl<T: Transport> RetryClient<T> {
    /// `timeout_only = true` makes non-timeout transport errors fatal.
    pub fn new(transport: T, backoff: Backoff, timeout_only: bool) -> Self {
        Self {
            transport,
            backoff,
            timeout_only,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    pub fn timeout_only(&self) -> bool {
        self.timeout_only
    }

    /// Retry an already-built request. Each attempt sends a fresh copy of it.
    pub fn request_with_retry(&self, request: &Request, max_tries: u32) -> RetryOutcome {
        self.execute(&RequestTemplate::from(request.clone()), max_tries)
    }

    /// Build a request from method, URL and optional content on every attempt.
    pub fn do_request(
        &self,
        method: Method,
        url: &str,
        content: &[u8],
        max_tries: u32,
        hook: Option<RequestHook>,
    ) -> RetryOutcome {
        let mut template = RequestTemplate::new(method, url).with_body(content);
        if let Some(h) = hook {
            template = template.with_hook(h);
        }
        self.execute(&template, max_tries)
    }

    /// JSON POST with retries. Serialization failures are returned before any send.
    pub fn post_json_with_retry<V: Serialize + ?Sized>(
        &self,
        url: &str,
        value: &V,
        max_tries: u32,
        hook: Option<RequestHook>,
    ) -> Result<RetryOutcome, RequestError> {
        let template = json_post(url, value, hook)?;
        Ok(self.execute(&template, max_tries))
    }

    /// Form POST with retries.
    pub fn post_form_with_retry<K, V>(
        &self,
        url: &str,
        pairs: &[(K, V)],
        max_tries: u32,
        hook: Option<RequestHook>,
    ) -> RetryOutcome
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.execute(&form_post(url, pairs, hook), max_tries)
    }
}

impl RetryClient<CurlTransport> {
    /// Curl-backed client from a loaded config. Rejects invalid backoff or timeout values.
    pub fn from_config(cfg: &ClientConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let transport = CurlTransport {
            timeout: cfg.timeout(),
            connect_timeout: cfg.connect_timeout(),
            ..CurlTransport::default()
        };
        Ok(Self::new(transport, cfg.backoff()?, cfg.timeout_only))
    }
}

/// Ready-to-use client: 5s timeout, 100ms..5000ms backoff, only timeouts retried.
pub fn std_client() -> RetryClient<CurlTransport> {
    RetryClient::new(
        CurlTransport::with_timeout(Duration::from_secs(5)),
        Backoff::default(),
        true,
    )
}
