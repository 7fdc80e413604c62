use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Where runs are staged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub runs_dir: PathBuf,
}

impl PipelineConfig {
    pub fn trace_loaded(&self) {
        info!(runs_dir = %self.runs_dir.display(), "Loaded PipelineConfig");
    }
}

/// How the external redaction program is launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InvokerConfig {
    /// Interpreter or executable. A bare name is looked up on `PATH`; a path must be
    /// absolute by the time it reaches the invoker, like `script`.
    pub program: PathBuf,
    /// Script handed to `program` as its first argument. Must be absolute by the
    /// time it reaches the invoker, since the program runs inside the run directory.
    pub script: Option<PathBuf>,
    /// Pass `--verbose` to the program.
    pub verbose: bool,
    /// Kill the program after this many seconds.
    pub timeout_secs: Option<u64>,
    /// Appended after the standard arguments.
    pub extra_args: Vec<String>,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("python3"),
            script: Some(PathBuf::from("payslip_universal_redactor.py")),
            verbose: true,
            timeout_secs: None,
            extra_args: Vec::new(),
        }
    }
}

impl InvokerConfig {
    pub fn trace_loaded(&self) {
        info!(
            program = %self.program.display(),
            script = ?self.script,
            verbose = self.verbose,
            timeout_secs = ?self.timeout_secs,
            "Loaded InvokerConfig"
        );
        debug!(?self, "InvokerConfig loaded (full debug)");
    }
}
