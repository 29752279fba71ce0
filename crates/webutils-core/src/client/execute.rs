//! The retry loop: send, classify, sleep and resend, or return.

use super::{RetryClient, RetryOutcome};
use crate::request::RequestTemplate;
use crate::retry::{is_timeout, should_retry_status};
use crate::transport::{Response, Transport, TransportError};
use std::time::Duration;

/// What to do after one attempt.
enum Step {
    Retry,
    Done,
}

impl<T: Transport> RetryClient<T> {
    /// Sends `template` up to `max_tries` times (0 is treated as 1).
    ///
    /// Retries transport errors (only timeouts when `timeout_only`) and
    /// 408/5xx statuses, sleeping a decorrelated-jitter backoff after each
    /// retryable attempt. Returns the first non-retryable outcome, or the last
    /// one once the budget is spent. Blocks the calling thread while sleeping.
    pub fn execute(&self, template: &RequestTemplate, max_tries: u32) -> RetryOutcome {
        let max_tries = max_tries.max(1);
        let mut wait = Duration::ZERO;
        let mut attempt = 0u32;

        loop {
            wait = self.backoff.next(wait);

            // Rebuild every attempt so a body is never reused after being sent.
            let request = match template.build() {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("{} {}: {}", template.method(), template.url(), e);
                    return RetryOutcome {
                        retries: attempt,
                        result: Err(e),
                    };
                }
            };

            let result = self.transport.send(&request);
            if let Step::Done = self.step(&result) {
                if let Err(e) = &result {
                    tracing::warn!(
                        "{} {} failed after {} retries, not retrying: {}",
                        request.method,
                        request.url,
                        attempt,
                        e
                    );
                }
                return RetryOutcome {
                    retries: attempt,
                    result,
                };
            }

            tracing::debug!(
                "{} {} attempt {}/{} retryable ({}), sleeping {:?}",
                request.method,
                request.url,
                attempt + 1,
                max_tries,
                describe(&result),
                wait
            );
            std::thread::sleep(wait);
            attempt += 1;

            if attempt >= max_tries {
                let retries = attempt - 1;
                tracing::warn!(
                    "{} {} gave up after {} retries",
                    request.method,
                    request.url,
                    retries
                );
                return RetryOutcome { retries, result };
            }
        }
    }

    fn step(&self, result: &Result<Response, TransportError>) -> Step {
        match result {
            Err(e) if !self.timeout_only || is_timeout(e) => Step::Retry,
            Err(_) => Step::Done,
            Ok(resp) if should_retry_status(resp.status) => Step::Retry,
            Ok(_) => Step::Done,
        }
    }
}

fn describe(result: &Result<Response, TransportError>) -> String {
    match result {
        Ok(resp) => format!("HTTP {}", resp.status),
        Err(e) => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::Backoff;
    use crate::transport::{Method, Request};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport that replays a script and records what it was sent.
    struct Scripted {
        replies: Mutex<VecDeque<Result<Response, TransportError>>>,
        fallback: Result<Response, TransportError>,
        seen: Mutex<Vec<Request>>,
    }

    impl Scripted {
        fn always(reply: Result<Response, TransportError>) -> Self {
            Self::script(Vec::new(), reply)
        }

        fn script(
            replies: Vec<Result<Response, TransportError>>,
            fallback: Result<Response, TransportError>,
        ) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                fallback,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<Request> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Transport for Scripted {
        fn send(&self, request: &Request) -> Result<Response, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone())
        }
    }

    fn status(code: u16) -> Result<Response, TransportError> {
        Ok(Response {
            status: code,
            body: format!("status {code}").into_bytes(),
        })
    }

    fn client(transport: Scripted, timeout_only: bool) -> RetryClient<Scripted> {
        RetryClient::new(transport, Backoff::from_millis(1, 2).unwrap(), timeout_only)
    }

    fn template() -> RequestTemplate {
        RequestTemplate::get("http://127.0.0.1:9/")
    }

    #[test]
    fn success_on_first_attempt() {
        let c = client(Scripted::always(status(200)), true);
        let out = c.execute(&template(), 3);
        assert_eq!(out.retries, 0);
        assert_eq!(out.status(), Some(200));
        assert_eq!(out.body(), b"status 200");
        assert_eq!(c.transport().sent().len(), 1);
    }

    #[test]
    fn retryable_status_exhausts_budget() {
        let c = client(Scripted::always(status(500)), true);
        let out = c.execute(&template(), 5);
        assert_eq!(out.retries, 4);
        assert_eq!(out.status(), Some(500));
        assert!(!out.is_success());
        assert_eq!(c.transport().sent().len(), 5);
    }

    #[test]
    fn non_retryable_status_returns_immediately() {
        let c = client(Scripted::always(status(403)), true);
        let out = c.execute(&template(), 5);
        assert_eq!(out.retries, 0);
        assert_eq!(out.status(), Some(403));
        assert_eq!(c.transport().sent().len(), 1);
    }

    #[test]
    fn recovers_after_transient_failures() {
        let t = Scripted::script(
            vec![status(503), Err(TransportError::Timeout("slow".into())), status(408)],
            status(201),
        );
        let c = client(t, true);
        let out = c.execute(&template(), 5);
        assert_eq!(out.retries, 3);
        assert_eq!(out.status(), Some(201));
        assert!(out.is_success());
    }

    #[test]
    fn timeout_only_makes_other_errors_fatal() {
        let t = Scripted::script(
            vec![status(502)],
            Err(TransportError::Connection("refused".into())),
        );
        let c = client(t, true);
        let out = c.execute(&template(), 5);
        assert_eq!(out.retries, 1);
        assert!(matches!(out.error(), Some(TransportError::Connection(_))));
        assert!(out.body().is_empty());
        assert_eq!(c.transport().sent().len(), 2);
    }

    #[test]
    fn any_transport_error_retried_without_timeout_only() {
        let c = client(
            Scripted::always(Err(TransportError::Connection("refused".into()))),
            false,
        );
        let out = c.execute(&template(), 3);
        assert_eq!(out.retries, 2);
        assert!(matches!(out.error(), Some(TransportError::Connection(_))));
        assert_eq!(c.transport().sent().len(), 3);
    }

    #[test]
    fn timeouts_exhaust_and_surface_last_error() {
        let c = client(
            Scripted::always(Err(TransportError::Timeout("read".into()))),
            true,
        );
        let out = c.execute(&template(), 3);
        assert_eq!(out.retries, 2);
        assert!(out.error().is_some_and(TransportError::is_timeout));
    }

    #[test]
    fn sleeps_after_every_retryable_attempt() {
        let t = Scripted::always(status(500));
        let c = RetryClient::new(t, Backoff::from_millis(20, 20).unwrap(), true);
        let start = std::time::Instant::now();
        let out = c.execute(&template(), 2);
        assert_eq!(out.retries, 1);
        assert_eq!(out.status(), Some(500));
        // One wait between the attempts and one after the last.
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn no_sleep_when_first_attempt_is_final() {
        let t = Scripted::always(status(404));
        let c = RetryClient::new(t, Backoff::from_millis(500, 500).unwrap(), true);
        let start = std::time::Instant::now();
        let out = c.execute(&template(), 5);
        assert_eq!(out.retries, 0);
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn zero_max_tries_sends_once() {
        let c = client(Scripted::always(status(500)), true);
        let out = c.execute(&template(), 0);
        assert_eq!(out.retries, 0);
        assert_eq!(out.status(), Some(500));
        assert_eq!(c.transport().sent().len(), 1);
    }

    #[test]
    fn invalid_template_is_fatal_without_sending() {
        let c = client(Scripted::always(status(200)), false);
        let out = c.execute(&RequestTemplate::get("::not a url::"), 3);
        assert_eq!(out.retries, 0);
        assert!(matches!(out.error(), Some(TransportError::InvalidRequest(_))));
        assert!(c.transport().sent().is_empty());
    }

    #[test]
    fn body_is_rebuilt_for_every_attempt() {
        let c = client(Scripted::always(status(500)), true);
        let out = c.do_request(Method::Put, "http://127.0.0.1:9/item", b"payload", 3, None);
        assert_eq!(out.retries, 2);
        let sent = c.transport().sent();
        assert_eq!(sent.len(), 3);
        for req in sent {
            assert_eq!(req.method, Method::Put);
            assert_eq!(req.body.as_deref(), Some(&b"payload"[..]));
        }
    }

    #[test]
    fn prebuilt_request_is_replayed_on_every_attempt() {
        let c = client(Scripted::script(vec![status(502), status(503)], status(200)), true);
        let mut req = Request::new(Method::Post, "http://127.0.0.1:9/submit");
        req.add_header("x-test", "test");
        req.body = Some(b"a=1".to_vec());
        let out = c.request_with_retry(&req, 5);
        assert_eq!(out.retries, 2);
        assert_eq!(out.status(), Some(200));
        assert_eq!(c.transport().sent(), vec![req.clone(), req.clone(), req]);
    }

    #[test]
    fn post_json_sets_content_type_on_each_attempt() {
        let c = client(Scripted::script(vec![status(500)], status(200)), true);
        let payload = serde_json::json!({"data": "hello"});
        let out = c
            .post_json_with_retry("http://127.0.0.1:9/", &payload, 3, None)
            .unwrap();
        assert_eq!(out.retries, 1);
        for req in c.transport().sent() {
            assert_eq!(req.header("Content-Type"), Some(crate::request::JSON_CONTENT_TYPE));
            assert_eq!(req.body.as_deref(), Some(&br#"{"data":"hello"}"#[..]));
        }
    }

    #[test]
    fn client_is_shared_across_threads() {
        let c = std::sync::Arc::new(client(Scripted::always(status(200)), true));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let c = std::sync::Arc::clone(&c);
                std::thread::spawn(move || c.execute(&template(), 2).retries)
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 0);
        }
        assert_eq!(c.transport().sent().len(), 4);
    }
}
