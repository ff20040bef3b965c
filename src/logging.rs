//! Log sink for a single run
//!
//! Events go to an append-only text file. The subscriber is installed as the
//! default for the current thread only and is removed when the session ends.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use tracing::dispatcher::DefaultGuard;
use tracing::{Level as TraceLevel, debug, info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::constants::config::ENV_LOG_LEVEL;

/// Installed log subscriber; events stop being recorded once finished
pub struct LogSession {
    _guard: DefaultGuard,
}

impl LogSession {
    /// Start logging to `path`, or to stderr if the file cannot be opened
    pub fn start(path: &Path) -> Self {
        let level = level_from_env();
        match open_append(path) {
            Ok(file) => {
                let subscriber = FmtSubscriber::builder()
                    .with_max_level(level)
                    .with_ansi(false)
                    .with_writer(Arc::new(file))
                    .finish();
                let guard = tracing::subscriber::set_default(subscriber);
                debug!(path = %path.display(), "Log session started");
                Self { _guard: guard }
            }
            Err(e) => {
                let subscriber = FmtSubscriber::builder()
                    .with_max_level(level)
                    .with_writer(std::io::stderr)
                    .finish();
                let guard = tracing::subscriber::set_default(subscriber);
                warn!(path = %path.display(), error = ?e, "Failed to open log file, logging to stderr");
                Self { _guard: guard }
            }
        }
    }

    /// Record the end of the run and uninstall the subscriber
    pub fn finish(self, success: bool) {
        info!(success, "Run finished");
    }
}

fn level_from_env() -> TraceLevel {
    match std::env::var(ENV_LOG_LEVEL)
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .context(format!("Failed to create log directory: {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context(format!("Failed to open log file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::error;

    #[test]
    fn test_session_appends_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("xrandrctl.log");

        let session = LogSession::start(&path);
        error!("first run failed");
        session.finish(false);

        let session = LogSession::start(&path);
        warn!(output = "HDMI-1", "second run");
        session.finish(true);

        // Not recorded: no session installed
        error!("after shutdown");

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("first run failed"));
        assert!(contents.contains("second run"));
        assert!(contents.contains("HDMI-1"));
        assert!(!contents.contains("after shutdown"));
        assert!(contents.find("first run failed") < contents.find("second run"));
    }
}
