//! libcurl-backed transport.
//!
//! One `Easy` handle per send. The body is collected inside the transfer
//! scope and the handle is dropped before `send` returns, whatever the outcome.

use super::{Method, Request, Response, Transport, TransportError};
use std::time::Duration;

/// Blocking HTTP transport using the curl crate.
///
/// Safe to share across threads: no handle outlives a single `send`.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    /// Whole-transfer timeout (connect + headers + body).
    pub timeout: Duration,
    /// Connect phase timeout; `None` leaves libcurl's default.
    pub connect_timeout: Option<Duration>,
    /// Maximum redirects to follow (0 disables following).
    pub max_redirections: u32,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            connect_timeout: None,
            max_redirections: 10,
        }
    }
}

impl CurlTransport {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    fn configure(&self, easy: &mut curl::easy::Easy, request: &Request) -> Result<(), curl::Error> {
        easy.url(&request.url)?;
        easy.timeout(self.timeout)?;
        if let Some(ct) = self.connect_timeout {
            easy.connect_timeout(ct)?;
        }
        if self.max_redirections > 0 {
            easy.follow_location(true)?;
            easy.max_redirections(self.max_redirections)?;
        }
        // Timeouts are signalled through curl errors, not SIGALRM.
        easy.signal(false)?;

        // POST goes through libcurl's own POST mode so redirects follow its rules
        // (301/302/303 switch to a bodiless GET). Other methods keep their verb.
        match request.method {
            Method::Get => easy.get(true)?,
            Method::Head => easy.nobody(true)?,
            Method::Post => easy.post(true)?,
            other => easy.custom_request(other.as_str())?,
        }

        let mut list = curl::easy::List::new();
        for (k, v) in &request.headers {
            list.append(&format!("{}: {}", k.trim(), v.trim()))?;
        }
        let sends_body = match &request.body {
            Some(body) => {
                easy.post_fields_copy(body)?;
                if request.method == Method::Get {
                    easy.custom_request("GET")?;
                }
                true
            }
            None if carries_body(request.method) => {
                // Content-Length: 0 rather than a GET-shaped request.
                easy.post(true)?;
                easy.post_field_size(0)?;
                if request.method != Method::Post {
                    easy.custom_request(request.method.as_str())?;
                }
                true
            }
            None => false,
        };
        if sends_body {
            // libcurl would otherwise add a form content type and Expect: 100-continue.
            if request.header("content-type").is_none() {
                list.append("Content-Type:")?;
            }
            list.append("Expect:")?;
        }
        easy.http_headers(list)?;
        Ok(())
    }
}

/// Methods that send a length even when there is nothing to send.
fn carries_body(method: Method) -> bool {
    matches!(method, Method::Post | Method::Put | Method::Patch)
}

impl Transport for CurlTransport {
    fn send(&self, request: &Request) -> Result<Response, TransportError> {
        let mut easy = curl::easy::Easy::new();
        self.configure(&mut easy, request)?;

        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        let status = u16::try_from(code)
            .map_err(|_| TransportError::Other(format!("invalid status code {}", code)))?;
        tracing::trace!(
            "{} {} -> {} ({} bytes)",
            request.method,
            request.url,
            status,
            body.len()
        );
        Ok(Response { status, body })
    }
}
