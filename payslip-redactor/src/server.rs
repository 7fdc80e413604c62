//! HTTP surface: the upload form and the `/process` endpoint.
//!
//! - `GET /` returns the static form from [`crate::page`].
//! - `POST /process` reads multipart fields `excel` (first one wins) and `pdfs`
//!   (any number), runs the pipeline and streams the resulting ZIP back as an
//!   attachment. Validation failures are `400 text/plain`.

use crate::error::ApiError;
use crate::load_config::AppConfig;
use crate::page::INDEX_HTML;
use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use payslip_redactor_core::config::PipelineConfig;
use payslip_redactor_core::contract::{RedactionRequest, Redactor, UploadedFile};
use payslip_redactor_core::invoke::ExternalRedactor;
use payslip_redactor_core::pipeline::process_request;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

pub const SPREADSHEET_FIELD: &str = "excel";
pub const PDFS_FIELD: &str = "pdfs";

pub struct AppState {
    pub pipeline: PipelineConfig,
    pub redactor: Arc<dyn Redactor>,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            pipeline: config.pipeline(),
            redactor: Arc::new(ExternalRedactor::new(config.redactor.clone())),
        }
    }
}

pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/process", post(process_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn process_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let request = read_request(&mut multipart).await?;
    let report = process_request(&state.pipeline, state.redactor.as_ref(), request).await?;

    let file = tokio::fs::File::open(&report.archive_path).await?;
    let length = file.metadata().await?.len();
    info!(
        run_id = %report.run_id,
        bytes = length,
        download = %report.download_name,
        "Sending archive"
    );

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", report.download_name),
        ),
        (header::CONTENT_LENGTH, length.to_string()),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

/// Pulls the `excel` and `pdfs` file fields out of the multipart body.
async fn read_request(multipart: &mut Multipart) -> Result<RedactionRequest, ApiError> {
    let mut request = RedactionRequest::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().unwrap_or_default().to_string();
        match name.as_str() {
            SPREADSHEET_FIELD => {
                let content = field.bytes().await?;
                if request.spreadsheet.is_none() {
                    request.spreadsheet = Some(UploadedFile::new(filename, content.to_vec()));
                } else {
                    debug!(filename = %filename, "Ignoring extra spreadsheet field");
                }
            }
            PDFS_FIELD => {
                let content = field.bytes().await?;
                request.pdfs.push(UploadedFile::new(filename, content.to_vec()));
            }
            other => debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }
    Ok(request)
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve_on<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!(%addr, "Payslip redactor listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(config: AppConfig) -> Result<()> {
    tokio::fs::create_dir_all(&config.runs_dir)
        .await
        .with_context(|| format!("Failed to create runs directory {:?}", config.runs_dir))?;

    let state = Arc::new(AppState::from_config(&config));
    let app = router(state, config.server.max_upload_bytes);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    serve_on(listener, app, shutdown_signal()).await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = ?e, "Failed to listen for shutdown signal"),
    }
}
