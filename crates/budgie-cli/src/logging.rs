// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "BUDGIE_LOG";

/// Installs the global subscriber. The terminal belongs to the UI, so every
/// event goes to `path` instead of stderr.
pub fn init(level: &str, path: &Path) -> Result<()> {
    let filter = build_filter(level, env::var(LOG_ENV).ok())?;
    let file = open_log_file(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|error| anyhow!("install log subscriber: {error}"))
}

fn build_filter(configured: &str, env_override: Option<String>) -> Result<EnvFilter> {
    let directive = env_override
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| configured.to_owned());
    EnvFilter::try_new(&directive).with_context(|| {
        format!("invalid log level {directive:?}; use error, warn, info, debug, or trace")
    })
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::{build_filter, open_log_file};
    use anyhow::Result;

    #[test]
    fn env_override_wins_over_configured_level() -> Result<()> {
        let filter = build_filter("info", Some("debug".to_owned()))?;
        assert_eq!(filter.to_string(), "debug");
        Ok(())
    }

    #[test]
    fn blank_override_falls_back_to_configured_level() -> Result<()> {
        let filter = build_filter("warn", Some("  ".to_owned()))?;
        assert_eq!(filter.to_string(), "warn");
        Ok(())
    }

    #[test]
    fn invalid_level_is_rejected() {
        let error = build_filter("budgie=loudest", None).expect_err("bad directive should fail");
        assert!(error.to_string().contains("invalid log level"));
    }

    #[test]
    fn log_file_parent_is_created() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("budgie.log");
        open_log_file(&path)?;
        assert!(path.exists());
        Ok(())
    }
}
