//! CLI for the webutils retrying HTTP client.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use webutils_core::config::{self, ClientConfig};
use webutils_core::request::{header_hook, RequestHook};

use commands::{run_batch, run_config, run_get, run_post_form, run_post_json};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "webutils")]
#[command(about = "HTTP requests with retries, backoff and bounded concurrency", long_about = None)]
pub struct Cli {
    /// Extra request header, e.g. -H 'Authorization: Bearer x'. Repeatable.
    #[arg(short = 'H', long = "header", global = true, value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Attempts per request including the first (default from config).
    #[arg(long, global = true, value_name = "N")]
    pub tries: Option<u32>,

    /// Use this config file instead of the XDG default.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// GET a URL and print the final status and body.
    Get {
        url: String,
    },

    /// POST a JSON document.
    PostJson {
        url: String,
        /// JSON text to send.
        json: String,
    },

    /// POST form fields (key=value).
    PostForm {
        url: String,
        /// Fields as key=value.
        fields: Vec<String>,
    },

    /// GET every URL listed in a file (one per line) with bounded concurrency.
    Batch {
        /// File with one URL per line; blank lines and '#' comments are skipped.
        path: PathBuf,
        /// Maximum requests in flight (default from config max_in_flight).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
    },

    /// Show the config path and effective settings.
    Config,
}

/// Settings shared by every command.
pub struct Invocation {
    pub cfg: ClientConfig,
    pub tries: u32,
    pub hook: Option<RequestHook>,
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        Cli::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let cfg = match &self.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        let headers = self
            .headers
            .iter()
            .map(|h| parse_header(h))
            .collect::<Result<Vec<_>>>()?;
        let hook = (!headers.is_empty()).then(|| header_hook(headers));
        let tries = self.tries.unwrap_or(cfg.max_tries);
        let inv = Invocation { cfg, tries, hook };

        match self.command {
            CliCommand::Get { url } => run_get(&inv, url).await?,
            CliCommand::PostJson { url, json } => run_post_json(&inv, url, &json).await?,
            CliCommand::PostForm { url, fields } => {
                let pairs = fields
                    .iter()
                    .map(|f| parse_field(f))
                    .collect::<Result<Vec<_>>>()?;
                run_post_form(&inv, url, pairs).await?;
            }
            CliCommand::Batch { path, jobs } => {
                let jobs = jobs.unwrap_or(inv.cfg.max_in_flight);
                run_batch(&inv, &path, jobs).await?;
            }
            CliCommand::Config => run_config(&inv.cfg, self.config.as_deref())?,
        }
        Ok(())
    }
}

/// Parse "Name: value".
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .with_context(|| format!("header {:?} is not 'Name: value'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("header {:?} has an empty name", raw);
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Parse "key=value" (value may be empty).
pub fn parse_field(raw: &str) -> Result<(String, String)> {
    let (k, v) = raw
        .split_once('=')
        .with_context(|| format!("form field {:?} is not key=value", raw))?;
    Ok((k.to_string(), v.to_string()))
}

#[cfg(test)]
mod tests;
