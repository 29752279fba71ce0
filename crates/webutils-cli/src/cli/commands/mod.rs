//! CLI command handlers. Each command is in its own file.

mod batch;
mod config;
mod request;

pub use batch::run_batch;
#[cfg(test)]
pub(crate) use batch::parse_url_list;
pub use config::run_config;
pub use request::{run_get, run_post_form, run_post_json};

use anyhow::Result;
use webutils_core::transport::CurlTransport;
use webutils_core::RetryClient;

use super::Invocation;

pub(crate) fn build_client(inv: &Invocation) -> Result<RetryClient<CurlTransport>> {
    Ok(RetryClient::from_config(&inv.cfg)?)
}
