/// # payslip-redactor CLI
///
/// Command parsing and the async [`run`] entrypoint shared by `main` and the
/// integration tests. All pipeline logic lives in `payslip-redactor-core`; this
/// module only loads config and picks between serving and a one-shot run.
///
/// - `serve`: start the upload form and `/process` endpoint
/// - `run`: push one spreadsheet and its PDFs through the same pipeline offline
///   and print the JSON report
use crate::load_config::load_config_or_default;
use crate::server;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use payslip_redactor_core::contract::{RedactionRequest, UploadedFile};
use payslip_redactor_core::invoke::ExternalRedactor;
use payslip_redactor_core::pipeline::process_request;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[clap(
    name = "payslip-redactor",
    version,
    about = "Upload a payslip spreadsheet and PDFs, run the redactor, download a ZIP of the results"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the upload form and the /process endpoint
    Serve {
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Redact one spreadsheet and its PDFs without starting the server
    Run {
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Spreadsheet (.xlsx, .xls or .csv)
        #[clap(long)]
        excel: PathBuf,
        /// Payslip PDF, repeatable
        #[clap(long = "pdf")]
        pdfs: Vec<PathBuf>,
    },
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Serve { config } => {
            let config = load_config_or_default(config.as_deref())?;
            tracing::info!(command = "serve", "Starting server");
            server::serve(config).await
        }
        Commands::Run {
            config,
            excel,
            pdfs,
        } => {
            let config = load_config_or_default(config.as_deref())?;
            tracing::info!(command = "run", excel = %excel.display(), pdfs = pdfs.len(), "Starting one-shot redaction");

            let request = RedactionRequest {
                spreadsheet: Some(read_upload(&excel)?),
                pdfs: pdfs
                    .iter()
                    .map(|path| read_upload(path))
                    .collect::<Result<Vec<_>>>()?,
            };
            let redactor = ExternalRedactor::new(config.redactor.clone());
            let report = process_request(&config.pipeline(), &redactor, request)
                .await
                .map_err(|e| {
                    tracing::error!(command = "run", error = %e, "Redaction failed");
                    anyhow::Error::from(e)
                })?;

            tracing::info!(command = "run", run_id = %report.run_id, "Redaction complete");
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

fn read_upload(path: &Path) -> Result<UploadedFile> {
    let content =
        std::fs::read(path).with_context(|| format!("Failed to read input file {:?}", path))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(UploadedFile::new(filename, content))
}
