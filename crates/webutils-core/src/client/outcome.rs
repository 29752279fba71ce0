use crate::transport::{Response, TransportError};

/// Final result of `RetryClient::execute`.
///
/// `result` is the last attempt's response or transport error. A retryable
/// status that survived every attempt is still `Ok`; check `status()` rather
/// than assuming success means 2xx.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome {
    /// Attempts retried before the returned one (0 = first attempt was final).
    pub retries: u32,
    pub result: Result<Response, TransportError>,
}

impl RetryOutcome {
    pub fn status(&self) -> Option<u16> {
        self.result.as_ref().ok().map(|r| r.status)
    }

    /// Body of the final response; empty when the final attempt failed in transport.
    pub fn body(&self) -> &[u8] {
        self.result.as_ref().map(|r| r.body.as_slice()).unwrap_or(&[])
    }

    pub fn error(&self) -> Option<&TransportError> {
        self.result.as_ref().err()
    }

    /// True only for a 2xx final response.
    pub fn is_success(&self) -> bool {
        self.result.as_ref().is_ok_and(Response::is_success)
    }

    pub fn into_result(self) -> Result<Response, TransportError> {
        self.result
    }
}
