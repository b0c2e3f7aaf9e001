// Copyright (c) 2026 rezky_nightky

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

pub const ENV_VAR: &str = "ASCIIANT_LOG";

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env(ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default))
}

/// Installs the global subscriber.
///
/// While the alternate screen is up nothing may reach stderr, so interactive
/// runs stay silent unless a log file is given.
pub fn init(log_file: Option<&Path>, interactive: bool) -> Result<()> {
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter("info"))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_thread_names(true)
                .try_init();
        }
        None if interactive => {}
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter("warn"))
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false)
                .try_init();
        }
    }
    Ok(())
}
