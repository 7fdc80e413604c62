//! # contract: data types and the redaction seam
//!
//! Plain data passed between pipeline steps, plus the [`Redactor`] trait that stands
//! in front of the external redaction program.
//!
//! ## Mocking & Testing
//! - [`Redactor`] is annotated for `mockall`; `MockRedactor` is exported behind the
//!   default `test-export-mocks` feature so the binary crate's tests can use it too.

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;
use std::path::PathBuf;

/// One uploaded file exactly as the client sent it.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name. May contain directory parts or be empty.
    pub filename: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// An unvalidated request: one spreadsheet (possibly absent) and any number of PDFs.
#[derive(Debug, Clone, Default)]
pub struct RedactionRequest {
    pub spreadsheet: Option<UploadedFile>,
    pub pdfs: Vec<UploadedFile>,
}

/// A file that passed validation, renamed to its safe base name.
#[derive(Debug, Clone)]
pub struct AcceptedFile {
    pub name: String,
    pub content: Vec<u8>,
}

/// Request after validation. Only constructed by [`crate::validate::validate`].
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub spreadsheet: AcceptedFile,
    pub pdfs: Vec<AcceptedFile>,
}

/// A run whose inputs are on disk and ready for the external program.
#[derive(Debug, Clone)]
pub struct StagedRun {
    pub run_id: String,
    /// `<runs_dir>/<run_id>`; the external program runs with this as its cwd.
    pub work_dir: PathBuf,
    /// Base name of the spreadsheet inside `work_dir`.
    pub spreadsheet_name: String,
    pub pdf_names: Vec<String>,
}

/// What the external program reported back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RedactionOutcome {
    pub exit_code: i32,
    pub timed_out: bool,
}

impl RedactionOutcome {
    pub fn exited(exit_code: i32) -> Self {
        Self {
            exit_code,
            timed_out: false,
        }
    }
}

/// Error type for the [`Redactor`] seam.
pub type InvokeError = Box<dyn std::error::Error + Send + Sync>;

/// Runs redaction over a staged run directory.
///
/// Implementations report the program's exit status through [`RedactionOutcome`];
/// a non-zero exit is not an error. `Err` is reserved for failures that leave the
/// run directory in an unknown state.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Redactor: Send + Sync {
    async fn redact(&self, run: &StagedRun) -> Result<RedactionOutcome, InvokeError>;
}
