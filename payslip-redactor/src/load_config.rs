/// `load_config` module: loads the YAML service config and applies environment overrides.
///
/// # Responsibilities
/// - Parse the optional YAML file into [`AppConfig`]; every key has a default, so a
///   missing file, an empty file or a partial file are all valid
/// - Apply `PORT` from the environment over `server.port`
/// - Make a relative redactor `script`, and a `program` given as a relative path
///   such as `./redact.sh`, absolute, because the program is started inside each
///   run directory
///
/// # Errors
/// All errors use `anyhow::Error` and surface at the CLI boundary.
///
/// Accepted schema:
///
/// ```yaml
/// runs_dir: ./runs
/// server:
///   host: 0.0.0.0
///   port: 8000
///   max_upload_bytes: 1073741824
/// redactor:
///   program: python3
///   script: ./payslip_universal_redactor.py
///   verbose: true
///   timeout_secs: ~
///   extra_args: []
/// ```
use anyhow::{Context, Result};
use payslip_redactor_core::config::{InvokerConfig, PipelineConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// 1 GiB, the largest request body accepted by default.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

pub const PORT_ENV: &str = "PORT";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub runs_dir: PathBuf,
    pub server: ServerSection,
    pub redactor: InvokerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            runs_dir: PathBuf::from("runs"),
            server: ServerSection::default(),
            redactor: InvokerConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            runs_dir: self.runs_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Loads a YAML config file, then applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config: AppConfig = if config_content.trim().is_empty() {
        AppConfig::default()
    } else {
        match serde_yaml::from_str(&config_content) {
            Ok(conf) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                conf
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    let base = match path_ref.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    finish(config, &base)
}

/// Loads `path` when given, otherwise starts from defaults. Environment overrides
/// apply either way.
pub fn load_config_or_default(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => load_config(path),
        None => {
            info!("No config file given, using defaults");
            finish(AppConfig::default(), Path::new("."))
        }
    }
}

fn finish(mut config: AppConfig, base: &Path) -> Result<AppConfig> {
    apply_env_overrides(&mut config)?;
    resolve_paths(&mut config, base)?;

    config.pipeline().trace_loaded();
    config.redactor.trace_loaded();
    info!(
        host = %config.server.host,
        port = config.server.port,
        max_upload_bytes = config.server.max_upload_bytes,
        "Config loaded successfully"
    );
    Ok(config)
}

fn apply_env_overrides(config: &mut AppConfig) -> Result<()> {
    if let Ok(raw) = std::env::var(PORT_ENV) {
        let port = raw.trim().parse::<u16>().map_err(|e| {
            error!(error = ?e, raw = %raw, "PORT must be a valid port number");
            anyhow::anyhow!("PORT must be a valid port number: {e}")
        })?;
        info!(port, "Using port from environment");
        config.server.port = port;
    }
    Ok(())
}

fn resolve_paths(config: &mut AppConfig, base: &Path) -> Result<()> {
    // Bare names like `python3` stay as they are for the PATH lookup.
    let program = &config.redactor.program;
    if program.is_relative() && program.components().count() > 1 {
        let absolute = std::path::absolute(base.join(program))
            .with_context(|| format!("Failed to resolve redactor program {:?}", program))?;
        config.redactor.program = absolute;
    }
    if let Some(script) = &config.redactor.script {
        if script.is_relative() {
            let absolute = std::path::absolute(base.join(script))
                .with_context(|| format!("Failed to resolve redactor script {:?}", script))?;
            config.redactor.script = Some(absolute);
        }
    }
    if config.runs_dir.is_relative() {
        config.runs_dir = base.join(&config.runs_dir);
    }
    Ok(())
}
