use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use labeldate_core::DateRoles;
use labeldate_ocr::PipelineError;
use serde_json::{json, Value};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::backend::DynPipeline;
use crate::config::ServerConfig;

const UPLOAD_FIELD: &str = "file";

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DynPipeline>,
    pub upload_dir: PathBuf,
    pub timeout: Duration,
}

impl AppState {
    pub fn new(pipeline: DynPipeline, config: &ServerConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            upload_dir: config.upload_dir.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/process-image", post(process_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Pipeline(#[from] PipelineError),
    #[error("Failed to store upload: {0}")]
    Upload(#[from] std::io::Error),
    #[error("Processing timed out after {0:?}")]
    Timeout(Duration),
    #[error("Processing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "rejected request");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}

/// Accept one image in the `file` multipart field and return its dates.
///
/// The upload lives in a temp file for the duration of processing. The file
/// guard moves into the blocking task, so it is removed whether the pipeline
/// succeeds, fails, panics, or outlives a timed-out request.
async fn process_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let (file_name, data) = read_upload(&mut multipart).await?;

    let temp = tempfile::Builder::new()
        .prefix("upload_")
        .suffix(&upload_suffix(file_name.as_deref()))
        .tempfile_in(&state.upload_dir)?;
    tokio::fs::write(temp.path(), &data).await?;
    tracing::info!(
        file = file_name.as_deref().unwrap_or("<unnamed>"),
        bytes = data.len(),
        "processing upload"
    );

    let pipeline = Arc::clone(&state.pipeline);
    let job = tokio::task::spawn_blocking(move || {
        let scan = pipeline.process_path(temp.path());
        drop(temp);
        scan
    });

    let scan = tokio::time::timeout(state.timeout, job)
        .await
        .map_err(|_| ApiError::Timeout(state.timeout))???;

    Ok(roles_response(scan.roles))
}

async fn read_upload(multipart: &mut Multipart) -> Result<(Option<String>, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        if data.is_empty() {
            return Err(ApiError::BadRequest("Uploaded file is empty".into()));
        }
        return Ok((file_name, data.to_vec()));
    }
    Err(ApiError::BadRequest(format!("Missing multipart field '{UPLOAD_FIELD}'")))
}

/// Keep a short alphanumeric extension from the client's file name so the
/// temp file is recognizable; anything else is dropped.
fn upload_suffix(file_name: Option<&str>) -> String {
    file_name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

fn roles_response(roles: DateRoles) -> Response {
    match roles {
        DateRoles::NoValidDates => Json(json!({
            "message": "No valid dates found",
            "all_detected_dates": [],
        }))
        .into_response(),
        found => Json(found).into_response(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
