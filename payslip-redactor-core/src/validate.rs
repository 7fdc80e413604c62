//! Upload validation: file name reduction and extension checks.
//!
//! Nothing here touches the filesystem. A request either comes out as a
//! [`ValidatedRequest`] with safe base names, or as a [`ValidationError`] whose
//! `Display` text is shown to the user verbatim.

use crate::contract::{AcceptedFile, RedactionRequest, UploadedFile, ValidatedRequest};
use std::path::Path;
use tracing::{debug, warn};

/// Extensions accepted for the spreadsheet, lowercase, without the dot.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "csv"];

/// Extensions accepted for the payslip documents.
pub const PDF_EXTENSIONS: &[&str] = &["pdf"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing Excel/CSV file.")]
    MissingSpreadsheet,
    #[error("Unsupported Excel/CSV type. Use .xlsx, .xls, or .csv.")]
    UnsupportedSpreadsheet,
    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),
}

/// Reduces a client-supplied file name to its last path component.
///
/// Both `/` and `\` count as separators and trailing separators are ignored, so
/// `dir/a.csv/` gives `a.csv`. Returns `None` for names that reduce to nothing
/// usable (`""`, `.`, `..`).
pub fn safe_file_name(raw: &str) -> Option<String> {
    let is_separator = |c: char| c == '/' || c == '\\';
    let base = raw
        .trim_end_matches(is_separator)
        .rsplit(is_separator)
        .next()
        .unwrap_or("");
    match base {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

/// Lowercased extension of `name`, if any. Dotfiles such as `.pdf` have none.
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

fn has_extension(name: &str, allowed: &[&str]) -> bool {
    extension_of(name).is_some_and(|ext| allowed.contains(&ext.as_str()))
}

/// Checks the spreadsheet first, then each PDF in order.
pub fn validate(request: RedactionRequest) -> Result<ValidatedRequest, ValidationError> {
    let RedactionRequest { spreadsheet, pdfs } = request;

    let Some(UploadedFile { filename, content }) = spreadsheet else {
        warn!("[VALIDATE] No spreadsheet in request");
        return Err(ValidationError::MissingSpreadsheet);
    };
    if filename.is_empty() {
        warn!("[VALIDATE] Spreadsheet part has no file name");
        return Err(ValidationError::MissingSpreadsheet);
    }
    // A name without a usable base (`dir/`, `..`) has no extension either.
    let Some(spreadsheet_name) = safe_file_name(&filename)
        .filter(|name| has_extension(name, SPREADSHEET_EXTENSIONS))
    else {
        warn!(filename = %filename, "[VALIDATE] Unsupported spreadsheet type");
        return Err(ValidationError::UnsupportedSpreadsheet);
    };

    let mut accepted = Vec::with_capacity(pdfs.len());
    for pdf in pdfs {
        if pdf.filename.is_empty() {
            debug!("[VALIDATE] Skipping PDF part without a file name");
            continue;
        }
        let name = safe_file_name(&pdf.filename)
            .filter(|name| has_extension(name, PDF_EXTENSIONS))
            .ok_or_else(|| {
                warn!(filename = %pdf.filename, "[VALIDATE] Unsupported PDF upload");
                ValidationError::UnsupportedFile(pdf.filename.clone())
            })?;
        accepted.push(AcceptedFile {
            name,
            content: pdf.content,
        });
    }

    debug!(
        spreadsheet = %spreadsheet_name,
        pdfs = accepted.len(),
        "[VALIDATE] Request accepted"
    );
    Ok(ValidatedRequest {
        spreadsheet: AcceptedFile {
            name: spreadsheet_name,
            content,
        },
        pdfs: accepted,
    })
}
