//! Request templates: everything needed to rebuild an equivalent request on
//! every attempt, plus JSON and form body builders.

mod body;

pub use body::{form_post, json_post, RequestError, JSON_CONTENT_TYPE};

use crate::transport::{Method, Request, TransportError};
use std::fmt;
use std::sync::Arc;

/// Caller hook applied to each freshly built request (extra headers, cookies).
pub type RequestHook = Arc<dyn Fn(&mut Request) + Send + Sync>;

/// Recipe for an outbound request. `build()` returns a new `Request` each call,
/// so a body is never shared between attempts.
#[derive(Clone)]
pub struct RequestTemplate {
    method: Method,
    url: String,
    body: Option<Arc<[u8]>>,
    hook: Option<RequestHook>,
}

impl fmt::Debug for RequestTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestTemplate")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("body_len", &self.body.as_ref().map(|b| b.len()))
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl RequestTemplate {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            hook: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Attach body bytes. An empty body is treated as no body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        self.body = if body.is_empty() {
            None
        } else {
            Some(Arc::from(body))
        };
        self
    }

    /// Set the hook run on every materialized request. Replaces any previous hook.
    pub fn with_hook(mut self, hook: RequestHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Run `hook` after the existing hook (if any).
    pub fn then_hook(self, hook: RequestHook) -> Self {
        let combined: RequestHook = match self.hook.clone() {
            Some(first) => Arc::new(move |req: &mut Request| {
                first(req);
                hook(req);
            }),
            None => hook,
        };
        self.with_hook(combined)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Materialize a fresh request. Fails if the URL does not parse.
    pub fn build(&self) -> Result<Request, TransportError> {
        url::Url::parse(&self.url)
            .map_err(|e| TransportError::InvalidRequest(format!("{}: {}", self.url, e)))?;
        let mut req = Request::new(self.method, self.url.clone());
        req.body = self.body.as_ref().map(|b| b.to_vec());
        if let Some(hook) = &self.hook {
            hook(&mut req);
        }
        Ok(req)
    }
}

impl From<Request> for RequestTemplate {
    /// Template that rebuilds `req` as-is; its headers are replayed through a hook.
    fn from(req: Request) -> Self {
        let mut template = Self::new(req.method, req.url);
        if let Some(body) = req.body {
            template = template.with_body(body);
        }
        if !req.headers.is_empty() {
            template = template.with_hook(header_hook(req.headers));
        }
        template
    }
}

/// Hook that adds a fixed set of headers.
pub fn header_hook(headers: Vec<(String, String)>) -> RequestHook {
    Arc::new(move |req: &mut Request| {
        for (k, v) in &headers {
            req.add_header(k.clone(), v.clone());
        }
    })
}
