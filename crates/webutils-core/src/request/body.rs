//! JSON and form body builders.

use super::{RequestHook, RequestTemplate};
use crate::transport::{Method, Request};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Failure to turn a payload into a request body.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("encoding JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// POST template with a JSON body and `Content-Type: application/json; charset=utf-8`.
///
/// The caller's hook runs first; the content type is appended after it.
pub fn json_post<T: Serialize + ?Sized>(
    url: &str,
    value: &T,
    hook: Option<RequestHook>,
) -> Result<RequestTemplate, RequestError> {
    let data = serde_json::to_vec(value)?;
    let content_type: RequestHook = Arc::new(|req: &mut Request| {
        req.add_header("Content-Type", JSON_CONTENT_TYPE);
    });
    let template = RequestTemplate::new(Method::Post, url).with_body(data);
    let template = match hook {
        Some(h) => template.with_hook(h).then_hook(content_type),
        None => template.with_hook(content_type),
    };
    Ok(template)
}

/// POST template with an `application/x-www-form-urlencoded` body.
///
/// No content type header is set; add one through the hook if the server needs it.
pub fn form_post<K, V>(url: &str, pairs: &[(K, V)], hook: Option<RequestHook>) -> RequestTemplate
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
        .finish();
    let template = RequestTemplate::new(Method::Post, url).with_body(encoded.into_bytes());
    match hook {
        Some(h) => template.with_hook(h),
        None => template,
    }
}
