//! `webutils get|post-json|post-form` – one request through the retry client.

use anyhow::{Context, Result};
use webutils_core::request::{form_post, json_post};
use webutils_core::{RequestTemplate, RetryOutcome};

use super::build_client;
use crate::cli::Invocation;

pub async fn run_get(inv: &Invocation, url: String) -> Result<()> {
    let mut template = RequestTemplate::get(url);
    if let Some(hook) = inv.hook.clone() {
        template = template.with_hook(hook);
    }
    send(inv, template).await
}

pub async fn run_post_json(inv: &Invocation, url: String, json: &str) -> Result<()> {
    let value: serde_json::Value = serde_json::from_str(json).context("invalid JSON argument")?;
    let template = json_post(&url, &value, inv.hook.clone())?;
    send(inv, template).await
}

pub async fn run_post_form(
    inv: &Invocation,
    url: String,
    pairs: Vec<(String, String)>,
) -> Result<()> {
    let template = form_post(&url, &pairs, inv.hook.clone());
    send(inv, template).await
}

async fn send(inv: &Invocation, template: RequestTemplate) -> Result<()> {
    let client = build_client(inv)?;
    let tries = inv.tries;
    let outcome = tokio::task::spawn_blocking(move || client.execute(&template, tries))
        .await
        .context("request task join")?;
    print_outcome(&outcome)
}

fn print_outcome(outcome: &RetryOutcome) -> Result<()> {
    match &outcome.result {
        Ok(resp) => {
            eprintln!("HTTP {} (retries: {})", resp.status, outcome.retries);
            println!("{}", resp.text());
            if !resp.is_success() {
                tracing::info!("final status {} after {} retries", resp.status, outcome.retries);
            }
            Ok(())
        }
        Err(e) => anyhow::bail!("request failed after {} retries: {}", outcome.retries, e),
    }
}
