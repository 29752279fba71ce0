//! `webutils config` – show where the config lives and what is in effect.

use anyhow::Result;
use std::path::Path;
use webutils_core::config::{self, ClientConfig};

pub fn run_config(cfg: &ClientConfig, explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    println!("# {}", path.display());
    print!("{}", config::to_toml(cfg)?);
    let backoff = cfg.backoff()?;
    println!(
        "# effective backoff: {:?} .. {:?}",
        backoff.base(),
        backoff.max()
    );
    Ok(())
}
