//! Cooperative cancellation for blocking `obtain`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How often a waiter re-checks a token. Deadlines are waited on exactly.
const TOKEN_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Fire-once flag shared by every clone.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the token. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// When an `obtain` should give up: a deadline, a token, both, or never.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    deadline: Option<Instant>,
    token: Option<CancelToken>,
}

impl Cancellation {
    /// Wait as long as it takes.
    pub fn never() -> Self {
        Self::default()
    }

    /// Give up once `timeout` has elapsed from now.
    pub fn after(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::at(deadline),
            None => Self::never(),
        }
    }

    pub fn at(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            token: None,
        }
    }

    /// Give up when `token` fires.
    pub fn token(token: CancelToken) -> Self {
        Self {
            deadline: None,
            token: Some(token),
        }
    }

    /// Add a deadline; the earlier of the two wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.as_ref().is_some_and(CancelToken::is_cancelled)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Longest a waiter may park before re-checking. `None` = park until notified.
    pub(crate) fn next_wait(&self) -> Option<Duration> {
        let until_deadline = self
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()));
        match (&self.token, until_deadline) {
            (None, None) => None,
            (None, Some(left)) => Some(left),
            (Some(_), None) => Some(TOKEN_POLL_INTERVAL),
            (Some(_), Some(left)) => Some(left.min(TOKEN_POLL_INTERVAL)),
        }
    }
}

impl From<CancelToken> for Cancellation {
    fn from(token: CancelToken) -> Self {
        Self::token(token)
    }
}
