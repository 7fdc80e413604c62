//! Output collection: copy recognised files into `_bundle/` and write the README note.

use crate::contract::{RedactionOutcome, StagedRun};
use crate::validate::extension_of;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Name of the staging subfolder inside a run directory.
pub const BUNDLE_DIR: &str = "_bundle";

/// Manifest note written into every bundle.
pub const README_NAME: &str = "README.txt";

/// Extensions copied into the bundle, lowercase.
pub const COLLECTED_EXTENSIONS: &[&str] = &["pdf", "xlsx", "xls", "csv"];

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("failed to create bundle directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to list run directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to copy {path} into bundle: {source}")]
    Copy {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    WriteReadme {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundledFile {
    pub name: String,
    pub size: u64,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct CollectedBundle {
    pub dir: PathBuf,
    /// Copied outputs sorted by name; the README is not listed.
    pub files: Vec<BundledFile>,
}

/// True for a top-level run directory entry that belongs in the bundle.
pub fn is_collectable(name: &str) -> bool {
    !name.starts_with(BUNDLE_DIR)
        && extension_of(name).is_some_and(|ext| COLLECTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Copies every collectable regular file from the run directory into `_bundle/`
/// and writes `README.txt` carrying the program's exit code.
pub fn collect(run: &StagedRun, outcome: &RedactionOutcome) -> Result<CollectedBundle, CollectError> {
    let bundle_dir = run.work_dir.join(BUNDLE_DIR);
    fs::create_dir_all(&bundle_dir).map_err(|source| {
        error!(error = ?source, path = %bundle_dir.display(), "[COLLECT] Failed to create bundle directory");
        CollectError::CreateDir {
            path: bundle_dir.clone(),
            source,
        }
    })?;

    let read_dir_err = |source: std::io::Error| {
        error!(error = ?source, path = %run.work_dir.display(), "[COLLECT] Failed to list run directory");
        CollectError::ReadDir {
            path: run.work_dir.clone(),
            source,
        }
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(&run.work_dir).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_collectable(&name) {
            continue;
        }
        if !path.is_file() {
            debug!(path = %path.display(), "[COLLECT] Skipping non-file entry");
            continue;
        }
        files.push(copy_into_bundle(&path, &bundle_dir.join(&name), name)?);
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));

    let readme_path = bundle_dir.join(README_NAME);
    fs::write(&readme_path, readme_text(outcome, &files)).map_err(|source| {
        error!(error = ?source, path = %readme_path.display(), "[COLLECT] Failed to write README");
        CollectError::WriteReadme {
            path: readme_path.clone(),
            source,
        }
    })?;

    info!(
        run_id = %run.run_id,
        files = files.len(),
        exit_code = outcome.exit_code,
        "[COLLECT] Bundle ready"
    );
    Ok(CollectedBundle {
        dir: bundle_dir,
        files,
    })
}

fn copy_into_bundle(from: &Path, to: &Path, name: String) -> Result<BundledFile, CollectError> {
    let copy_err = |source: std::io::Error| {
        error!(error = ?source, path = %from.display(), "[COLLECT] Failed to copy output");
        CollectError::Copy {
            path: from.to_path_buf(),
            source,
        }
    };
    let content = fs::read(from).map_err(copy_err)?;
    fs::write(to, &content).map_err(copy_err)?;
    debug!(name = %name, size = content.len(), "[COLLECT] Copied output");
    Ok(BundledFile {
        size: content.len() as u64,
        sha256: format!("{:x}", Sha256::digest(&content)),
        name,
    })
}

/// Contents of `README.txt`.
pub fn readme_text(outcome: &RedactionOutcome, files: &[BundledFile]) -> String {
    let mut text = String::from(
        "ZIP includes redacted PDFs (*_redacted.pdf) and Payslips_redacted.xlsx.\n",
    );
    let _ = writeln!(text, "Exit code: {}", outcome.exit_code);
    if outcome.timed_out {
        text.push_str("Timed out: the redaction program was stopped before it finished.\n");
    }
    if !files.is_empty() {
        text.push_str("\nFiles:\n");
        for file in files {
            let _ = writeln!(text, "  {}  {} bytes  sha256:{}", file.name, file.size, file.sha256);
        }
    }
    text
}
