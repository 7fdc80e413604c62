//! Archiving: compress a bundle directory into `<runs_dir>/<run_id>.zip`.

use crate::collect::CollectedBundle;
use crate::contract::StagedRun;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("run directory {0} has no parent to hold the archive")]
    NoParent(PathBuf),
    #[error("I/O error while archiving {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("zip error while archiving {path}: {source}")]
    Zip {
        path: PathBuf,
        source: zip::result::ZipError,
    },
}

/// File name offered to the client for a run's archive.
pub fn download_name(run_id: &str) -> String {
    format!("redaction_results_{run_id}.zip")
}

/// Path of the archive for `run`: a sibling of its run directory.
pub fn archive_path(run: &StagedRun) -> Result<PathBuf, ArchiveError> {
    let parent = run
        .work_dir
        .parent()
        .ok_or_else(|| ArchiveError::NoParent(run.work_dir.clone()))?;
    Ok(parent.join(format!("{}.zip", run.run_id)))
}

/// Writes every file under the bundle directory, recursively, into a deflated ZIP.
/// Entry names are relative to the bundle and `/`-separated.
pub fn archive(run: &StagedRun, bundle: &CollectedBundle) -> Result<PathBuf, ArchiveError> {
    let zip_path = archive_path(run)?;
    let file = File::create(&zip_path).map_err(|source| {
        error!(error = ?source, path = %zip_path.display(), "[ARCHIVE] Failed to create archive");
        ArchiveError::Io {
            path: zip_path.clone(),
            source,
        }
    })?;

    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = Vec::new();
    walk_files(&bundle.dir, &mut entries)?;
    entries.sort();

    for path in &entries {
        let entry_name = entry_name(&bundle.dir, path);
        let zip_err = |source| ArchiveError::Zip {
            path: path.clone(),
            source,
        };
        zip.start_file(entry_name.as_str(), options).map_err(zip_err)?;
        let mut source = File::open(path).map_err(|source| ArchiveError::Io {
            path: path.clone(),
            source,
        })?;
        io::copy(&mut source, &mut zip).map_err(|source| ArchiveError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(entry = %entry_name, "[ARCHIVE] Added entry");
    }

    zip.finish().map_err(|source| {
        error!(error = ?source, path = %zip_path.display(), "[ARCHIVE] Failed to finish archive");
        ArchiveError::Zip {
            path: zip_path.clone(),
            source,
        }
    })?;

    info!(
        run_id = %run.run_id,
        entries = entries.len(),
        path = %zip_path.display(),
        "[ARCHIVE] Archive written"
    );
    Ok(zip_path)
}

fn walk_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), ArchiveError> {
    let io_err = |source| ArchiveError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_dir() {
            walk_files(&path, out)?;
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

fn entry_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
