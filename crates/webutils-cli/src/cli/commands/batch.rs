//! `webutils batch <file>` – fetch many URLs with at most N in flight.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use webutils_core::{Cancellation, RequestTemplate, RetryOutcome, Semaphore};

use super::build_client;
use crate::cli::Invocation;

/// URLs from a list file: one per line, blank lines and `#` comments skipped.
pub(crate) fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Runs `work` for each item on the blocking pool, at most `sema.capacity()` at once.
///
/// Blocks the calling thread: a slot is obtained before each task is spawned,
/// so neither running nor parked blocking threads exceed the capacity. Stops
/// dispatching if the semaphore is closed.
pub(crate) fn fan_out<T, R, F>(
    rt: &Handle,
    sema: &Arc<Semaphore>,
    items: Vec<T>,
    work: F,
) -> Vec<JoinHandle<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    let work = Arc::new(work);
    let mut handles = Vec::with_capacity(items.len());
    for item in items {
        let Some(slot) = sema.obtain_owned(&Cancellation::never()) else {
            tracing::warn!("semaphore closed, {} task(s) dispatched", handles.len());
            break;
        };
        let work = Arc::clone(&work);
        handles.push(rt.spawn_blocking(move || {
            let _slot = slot;
            work(item)
        }));
    }
    handles
}

pub async fn run_batch(inv: &Invocation, path: &Path, jobs: usize) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading URL list {}", path.display()))?;
    let urls = parse_url_list(&text);
    if urls.is_empty() {
        println!("No URLs in {}.", path.display());
        return Ok(());
    }
    let total = urls.len();

    let client = Arc::new(build_client(inv)?);
    let sema = Arc::new(Semaphore::new(jobs));
    tracing::info!("batch of {} URL(s), {} in flight", total, sema.capacity());

    let hook = inv.hook.clone();
    let tries = inv.tries;
    let fetch = move |url: String| -> (String, RetryOutcome) {
        let mut template = RequestTemplate::get(url.clone());
        if let Some(hook) = hook.clone() {
            template = template.with_hook(hook);
        }
        let outcome = client.execute(&template, tries);
        (url, outcome)
    };

    let rt = Handle::current();
    let dispatch_sema = Arc::clone(&sema);
    let handles = tokio::task::spawn_blocking(move || fan_out(&rt, &dispatch_sema, urls, fetch))
        .await
        .map_err(|e| anyhow::anyhow!("batch dispatch join: {}", e))?;

    let (mut ok, mut failed) = (0usize, 0usize);
    for handle in handles {
        let (url, outcome) = handle
            .await
            .map_err(|e| anyhow::anyhow!("batch task join: {}", e))?;
        match &outcome.result {
            Ok(resp) => {
                if resp.is_success() {
                    ok += 1;
                } else {
                    failed += 1;
                }
                println!("{}\t{}\t{}", resp.status, outcome.retries, url);
            }
            Err(e) => {
                failed += 1;
                println!("error\t{}\t{}\t{}", outcome.retries, url, e);
            }
        }
    }
    let skipped = total - ok - failed;

    sema.close();
    tracing::info!("batch done: {} ok, {} failed, {} skipped", ok, failed, skipped);
    println!("{} ok, {} failed", ok, failed);
    Ok(())
}
