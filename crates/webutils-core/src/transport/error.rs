//! Transport-level error type.

use thiserror::Error;

/// Connection-level failure from sending a request.
///
/// HTTP error statuses are never represented here; they come back as a
/// normal response so the caller can classify them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connect or transfer did not finish within the configured timeout.
    #[error("timed out: {0}")]
    Timeout(String),
    /// DNS resolution, connect, send or receive failed.
    #[error("connection failed: {0}")]
    Connection(String),
    /// The request could not be built or was rejected before sending (bad URL, protocol).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Anything else the transport reported (TLS, protocol errors, ...).
    #[error("transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

impl From<curl::Error> for TransportError {
    fn from(e: curl::Error) -> Self {
        let msg = e.to_string();
        if e.is_operation_timedout() {
            return TransportError::Timeout(msg);
        }
        if e.is_url_malformed() || e.is_unsupported_protocol() {
            return TransportError::InvalidRequest(msg);
        }
        if e.is_couldnt_connect()
            || e.is_couldnt_resolve_host()
            || e.is_couldnt_resolve_proxy()
            || e.is_read_error()
            || e.is_recv_error()
            || e.is_send_error()
            || e.is_got_nothing()
        {
            return TransportError::Connection(msg);
        }
        TransportError::Other(msg)
    }
}
