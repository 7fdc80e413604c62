//! # invoke: runs the external redaction program
//!
//! [`ExternalRedactor`] is the production [`Redactor`]. It launches the configured
//! program inside the run directory as
//!
//! ```text
//! <program> [<script>] --input <spreadsheet> [--verbose] [<extra_args>...]
//! ```
//!
//! and waits for it. The program's own exit status never fails the pipeline: it is
//! reported through [`RedactionOutcome`] and ends up in the bundle's README.
//!
//! # Exit codes reported when the program did not exit normally
//! - [`SIGNAL_EXIT_CODE`]: terminated by a signal
//! - [`LAUNCH_FAILURE_EXIT_CODE`]: could not be started at all
//! - [`TIMEOUT_EXIT_CODE`]: killed after `timeout_secs`

use crate::config::InvokerConfig;
use crate::contract::{InvokeError, RedactionOutcome, Redactor, StagedRun};
use async_trait::async_trait;
use std::ffi::OsString;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

pub const SIGNAL_EXIT_CODE: i32 = 1;
pub const TIMEOUT_EXIT_CODE: i32 = 124;
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = 127;

pub struct ExternalRedactor {
    config: InvokerConfig,
}

impl ExternalRedactor {
    pub fn new(config: InvokerConfig) -> Self {
        Self { config }
    }

    /// Arguments passed after the program name for `run`.
    pub fn command_args(&self, run: &StagedRun) -> Vec<OsString> {
        let mut args = Vec::with_capacity(4 + self.config.extra_args.len());
        if let Some(script) = &self.config.script {
            args.push(script.clone().into_os_string());
        }
        args.push("--input".into());
        args.push(run.spreadsheet_name.clone().into());
        if self.config.verbose {
            args.push("--verbose".into());
        }
        args.extend(self.config.extra_args.iter().map(OsString::from));
        args
    }
}

#[async_trait]
impl Redactor for ExternalRedactor {
    async fn redact(&self, run: &StagedRun) -> Result<RedactionOutcome, InvokeError> {
        let args = self.command_args(run);
        info!(
            run_id = %run.run_id,
            program = %self.config.program.display(),
            ?args,
            cwd = %run.work_dir.display(),
            "[INVOKE] Launching redaction program"
        );

        let mut command = Command::new(&self.config.program);
        command
            .args(&args)
            .current_dir(&run.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!(
                    run_id = %run.run_id,
                    error = ?e,
                    program = %self.config.program.display(),
                    "[INVOKE] Failed to launch redaction program"
                );
                return Ok(RedactionOutcome::exited(LAUNCH_FAILURE_EXIT_CODE));
            }
        };

        // Detached: a grandchild holding the pipes open must not block the response.
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, run.run_id.clone(), "stdout"));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, run.run_id.clone(), "stderr"));
        }

        let status = match self.config.timeout_secs {
            Some(secs) => {
                let waited = tokio::time::timeout(Duration::from_secs(secs), child.wait()).await;
                match waited {
                    Ok(status) => status?,
                    Err(_) => {
                        warn!(
                            run_id = %run.run_id,
                            timeout_secs = secs,
                            "[INVOKE] Redaction program timed out, killing it"
                        );
                        if let Err(e) = child.kill().await {
                            error!(run_id = %run.run_id, error = ?e, "[INVOKE] Failed to kill timed out program");
                        }
                        return Ok(RedactionOutcome {
                            exit_code: TIMEOUT_EXIT_CODE,
                            timed_out: true,
                        });
                    }
                }
            }
            None => child.wait().await?,
        };

        let exit_code = status.code().unwrap_or(SIGNAL_EXIT_CODE);
        if status.success() {
            info!(run_id = %run.run_id, exit_code, "[INVOKE] Redaction program finished");
        } else {
            warn!(run_id = %run.run_id, exit_code, status = %status, "[INVOKE] Redaction program exited with failure");
        }
        Ok(RedactionOutcome::exited(exit_code))
    }
}

/// Logs the program's output line by line. Lines need not be UTF-8. The pipe is
/// drained to EOF even after a read error, so the program never sees a closed pipe.
async fn forward_lines<R>(reader: R, run_id: String, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
                info!(run_id = %run_id, stream, "{line}");
            }
            Err(e) => {
                debug!(run_id = %run_id, stream, error = ?e, "[INVOKE] Output unreadable, discarding the rest");
                if let Err(e) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
                    debug!(run_id = %run_id, stream, error = ?e, "[INVOKE] Stopped draining program output");
                }
                break;
            }
        }
    }
}
