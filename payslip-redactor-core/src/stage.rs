//! Per-run staging: allocate a run id and write the validated uploads side by side.

use crate::contract::{StagedRun, ValidatedRequest};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Length of a run id in hex characters.
pub const RUN_ID_LEN: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("failed to create run directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// First [`RUN_ID_LEN`] hex characters of a random v4 UUID.
pub fn new_run_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(RUN_ID_LEN);
    id
}

/// Creates `<runs_dir>/<run_id>/` and writes the spreadsheet and every PDF into it.
///
/// Files keep their base names so paths referenced from inside the spreadsheet
/// resolve relative to the run directory. A later file with the same name replaces
/// an earlier one.
pub fn stage(runs_dir: &Path, request: ValidatedRequest) -> Result<StagedRun, StageError> {
    let run_id = new_run_id();
    let work_dir = runs_dir.join(&run_id);

    fs::create_dir_all(&work_dir).map_err(|source| {
        error!(error = ?source, path = %work_dir.display(), "[STAGE] Failed to create run directory");
        StageError::CreateDir {
            path: work_dir.clone(),
            source,
        }
    })?;
    debug!(run_id = %run_id, path = %work_dir.display(), "[STAGE] Created run directory");

    write_file(&work_dir, &request.spreadsheet.name, &request.spreadsheet.content)?;

    let mut pdf_names = Vec::with_capacity(request.pdfs.len());
    for pdf in &request.pdfs {
        write_file(&work_dir, &pdf.name, &pdf.content)?;
        pdf_names.push(pdf.name.clone());
    }

    info!(
        run_id = %run_id,
        spreadsheet = %request.spreadsheet.name,
        pdfs = pdf_names.len(),
        "[STAGE] Uploads staged"
    );
    Ok(StagedRun {
        run_id,
        work_dir,
        spreadsheet_name: request.spreadsheet.name,
        pdf_names,
    })
}

fn write_file(work_dir: &Path, name: &str, content: &[u8]) -> Result<(), StageError> {
    let path = work_dir.join(name);
    fs::write(&path, content).map_err(|source| {
        error!(error = ?source, path = %path.display(), "[STAGE] Failed to write upload");
        StageError::Write {
            path: path.clone(),
            source,
        }
    })?;
    debug!(path = %path.display(), size = content.len(), "[STAGE] Wrote upload");
    Ok(())
}
