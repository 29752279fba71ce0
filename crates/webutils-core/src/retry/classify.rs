//! Classify HTTP statuses and transport errors for retry decisions.

use crate::transport::TransportError;
use std::error::Error;
use std::io;

/// True for 408 Request Timeout and every 5xx.
///
/// 501, 505 and 511 are retried too even though they rarely clear up on their own.
pub fn should_retry_status(status: u16) -> bool {
    status == 408 || (500..=599).contains(&status)
}

/// True when the error (or anything in its source chain) reports a timeout.
///
/// Recognizes `TransportError::Timeout`, curl's operation-timed-out code and
/// `io::ErrorKind::TimedOut`. Anything else is not a timeout.
pub fn is_timeout(err: &(dyn Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(te) = e.downcast_ref::<TransportError>() {
            if te.is_timeout() {
                return true;
            }
        } else if let Some(ce) = e.downcast_ref::<curl::Error>() {
            if ce.is_operation_timedout() {
                return true;
            }
        } else if let Some(ioe) = e.downcast_ref::<io::Error>() {
            if ioe.kind() == io::ErrorKind::TimedOut {
                return true;
            }
        }
        current = e.source();
    }
    false
}
