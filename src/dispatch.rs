//! xrandr invocation
//!
//! Every known output is re-sent on each run, so outputs that were not adjusted
//! are reasserted at their last recorded values.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::constants::xrandr::{BRIGHTNESS_ARG, GAMMA_ARG, OUTPUT_ARG};
use crate::state::StateDocument;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to start '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'{program}' failed to complete after {timeout:?}{}", describe_stderr(.stderr))]
    Timeout {
        program: String,
        timeout: Duration,
        stderr: String,
    },

    #[error("failed while waiting for '{program}'")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

fn describe_stderr(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(". There were the following errors: {stderr}")
    }
}

/// What the finished process reported
#[derive(Debug)]
pub struct DispatchReport {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// `--output <name> --gamma <R:G:B> --brightness <value>` for every output
pub fn build_args(document: &StateDocument) -> Vec<String> {
    document
        .output_values()
        .into_iter()
        .flat_map(|values| {
            [
                OUTPUT_ARG.to_string(),
                values.output.to_string(),
                GAMMA_ARG.to_string(),
                values.levels.gamma.to_string(),
                BRIGHTNESS_ARG.to_string(),
                values.levels.brightness.to_string(),
            ]
        })
        .collect()
}

/// Runs the display tool once per invocation, bounded by a timeout
#[derive(Debug, Clone)]
pub struct Dispatcher {
    program: String,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Run the program with `args`, killing it if it outlives the timeout
    ///
    /// A non-zero exit is reported as a warning, not an error: the caller still
    /// persists the values in that case.
    pub async fn dispatch(&self, args: &[String]) -> Result<DispatchReport, DispatchError> {
        debug!(program = %self.program, ?args, "Attempting to begin a process");
        let start = Instant::now();

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DispatchError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let finished = tokio::time::timeout(self.timeout, async {
            let read_stdout = async {
                match stdout_pipe.as_mut() {
                    Some(pipe) => pipe.read_to_end(&mut stdout).await.map(|_| ()),
                    None => Ok(()),
                }
            };
            let read_stderr = async {
                match stderr_pipe.as_mut() {
                    Some(pipe) => pipe.read_to_end(&mut stderr).await.map(|_| ()),
                    None => Ok(()),
                }
            };
            let (status, _, _) = tokio::try_join!(child.wait(), read_stdout, read_stderr)?;
            Ok::<_, io::Error>(status)
        })
        .await;

        let status = match finished {
            Ok(Ok(status)) => status,
            Ok(Err(source)) => {
                return Err(DispatchError::Wait {
                    program: self.program.clone(),
                    source,
                });
            }
            Err(_elapsed) => {
                if let Err(e) = child.kill().await {
                    warn!(program = %self.program, error = %e, "Failed to kill timed out process");
                }
                return Err(DispatchError::Timeout {
                    program: self.program.clone(),
                    timeout: self.timeout,
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                });
            }
        };

        let report = DispatchReport {
            status,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            elapsed: start.elapsed(),
        };

        let elapsed_secs = report.elapsed.as_secs_f64();
        if report.status.success() {
            if report.stdout.trim().is_empty() {
                info!(program = %self.program, "Process completed in {elapsed_secs:.2} seconds");
            } else {
                info!(
                    program = %self.program,
                    stdout = %report.stdout.trim(),
                    "Process completed in {elapsed_secs:.2} seconds with output"
                );
            }
        } else {
            warn!(
                program = %self.program,
                status = ?report.status.code(),
                stdout = %report.stdout.trim(),
                stderr = %report.stderr.trim(),
                "Process exited unsuccessfully after {elapsed_secs:.2} seconds"
            );
        }

        Ok(report)
    }
}
