//! High-level pipeline: validate → stage → redact → collect → archive.
//!
//! [`process_request`] turns one [`RedactionRequest`] into a ZIP on disk and a
//! [`RedactionReport`] describing it. It is shared by the HTTP handler and the
//! offline `run` command.
//!
//! # Error Handling
//! - Validation failures come back as [`PipelineError::Validation`]; nothing is
//!   written to disk in that case.
//! - The external program's exit status is data, not an error: collection and
//!   archiving always run once the program returns.
//! - Local I/O failures stop the pipeline at the failing step.
//!
//! Run directories are left in place after the response so they can be inspected.

use crate::archive::{self, ArchiveError};
use crate::collect::{self, BundledFile, CollectError};
use crate::config::PipelineConfig;
use crate::contract::{InvokeError, RedactionRequest, Redactor};
use crate::stage::{self, StageError};
use crate::validate::{self, ValidationError};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("staging failed: {0}")]
    Stage(#[from] StageError),
    #[error("redaction program could not be run: {0}")]
    Invoke(InvokeError),
    #[error("collecting outputs failed: {0}")]
    Collect(#[from] CollectError),
    #[error("archiving failed: {0}")]
    Archive(#[from] ArchiveError),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl PipelineError {
    /// True when the request itself was at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RedactionReport {
    pub run_id: String,
    pub work_dir: PathBuf,
    pub archive_path: PathBuf,
    pub download_name: String,
    pub exit_code: i32,
    pub timed_out: bool,
    pub files: Vec<BundledFile>,
}

pub async fn process_request<R>(
    config: &PipelineConfig,
    redactor: &R,
    request: RedactionRequest,
) -> Result<RedactionReport, PipelineError>
where
    R: Redactor + ?Sized,
{
    info!("[REDACT] Starting redaction request");

    // --- Step 1: Validate ---
    let validated = validate::validate(request)?;

    // --- Step 2: Stage ---
    let runs_dir = config.runs_dir.clone();
    let run = tokio::task::spawn_blocking(move || stage::stage(&runs_dir, validated)).await??;
    info!(run_id = %run.run_id, "[REDACT] Staged run");

    // --- Step 3: Redact ---
    let outcome = match redactor.redact(&run).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(run_id = %run.run_id, error = ?e, "[REDACT][ERROR] Redaction step failed");
            return Err(PipelineError::Invoke(e));
        }
    };
    info!(
        run_id = %run.run_id,
        exit_code = outcome.exit_code,
        timed_out = outcome.timed_out,
        "[REDACT] Redaction step returned"
    );

    // --- Step 4-5: Collect and archive ---
    let (run, bundle, archive_path) = tokio::task::spawn_blocking(move || {
        let bundle = collect::collect(&run, &outcome)?;
        let archive_path = archive::archive(&run, &bundle)?;
        Ok::<_, PipelineError>((run, bundle, archive_path))
    })
    .await??;

    let report = RedactionReport {
        download_name: archive::download_name(&run.run_id),
        run_id: run.run_id,
        work_dir: run.work_dir,
        archive_path,
        exit_code: outcome.exit_code,
        timed_out: outcome.timed_out,
        files: bundle.files,
    };
    info!(
        run_id = %report.run_id,
        archive = %report.archive_path.display(),
        files = report.files.len(),
        "[REDACT] Request complete"
    );
    Ok(report)
}
