//! API route handlers.

use std::path::{Path as FsPath, PathBuf};

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::AppState;
use crate::error::Error;
use crate::pipeline::IngestFile;
use crate::store::models::DocumentRecord;

/// Upload size cap for PDF files.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Build all API routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/documents",
            get(list_documents)
                .post(upload_document)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/documents/:id", delete(delete_document))
        .route("/api/ask", post(ask_question))
        .route("/api/health", get(health))
}

// ── Error mapping ────────────────────────────────────────────────────

/// An error ready to leave the HTTP boundary.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Config(_) => StatusCode::BAD_REQUEST,
            Error::Load { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Provider(_) => StatusCode::BAD_GATEWAY,
            Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Run a blocking closure off the async workers.
///
/// The pipelines and the store are synchronous by design; handlers must not
/// run them on a runtime thread.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal(format!("worker task failed: {e}")))?
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /api/documents - upload a PDF and ingest it immediately.
async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentRecord>), ApiError> {
    let mut title: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "title" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("invalid title field: {e}")))?;
                title = Some(value);
            }
            "file" => {
                let name = field.file_name().unwrap_or("upload.pdf").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("invalid file field: {e}")))?;
                file = Some((name, data.to_vec()));
            }
            _ => {}
        }
    }

    let title = title.filter(|t| !t.trim().is_empty());
    let (Some(title), Some((filename, data))) = (title, file) else {
        return Err(ApiError::bad_request("title and file are required"));
    };

    let dest = unique_path(FsPath::new(&state.config.upload_dir), &filename);
    tokio::fs::write(&dest, &data)
        .await
        .map_err(|e| ApiError::internal(format!("failed to store upload: {e}")))?;

    let ingest = state.ingest.clone();
    let store = state.store.clone();
    let dest_for_cleanup = dest.clone();

    let result = run_blocking(move || {
        let ids = ingest.ingest(&[IngestFile {
            title,
            path: dest.clone(),
        }])?;

        let record = store
            .lock()
            .map_err(|_| ApiError::internal("vector store lock poisoned"))?
            .get_document(ids[0])
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::internal("ingested document not found"))?;

        Ok(record)
    })
    .await;

    match result {
        Ok(record) => Ok((StatusCode::CREATED, Json(record))),
        Err(e) => {
            // Do not keep files the index knows nothing about
            if let Err(remove_err) = tokio::fs::remove_file(&dest_for_cleanup).await {
                warn!(
                    "Failed to remove {} after ingest error: {remove_err}",
                    dest_for_cleanup.display()
                );
            }
            Err(e)
        }
    }
}

/// GET /api/documents - list uploads, newest first.
async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<Vec<DocumentRecord>>, ApiError> {
    let store = state.store.clone();
    let docs = run_blocking(move || {
        store
            .lock()
            .map_err(|_| ApiError::internal("vector store lock poisoned"))?
            .list_documents()
            .map_err(ApiError::from)
    })
    .await?;
    Ok(Json(docs))
}

/// DELETE /api/documents/:id - remove the file, the record, and its vectors.
async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let store = state.store.clone();
    let record = run_blocking(move || {
        let mut store = store
            .lock()
            .map_err(|_| ApiError::internal("vector store lock poisoned"))?;

        let Some(record) = store.get_document(id).map_err(ApiError::from)? else {
            return Err(ApiError::not_found(format!("no document with id {id}")));
        };
        store.delete_document(id).map_err(ApiError::from)?;
        Ok(record)
    })
    .await?;

    let path = FsPath::new(&state.config.upload_dir).join(&record.filename);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!("Failed to delete {}: {e}", path.display());
    }

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

/// POST /api/ask - answer a question from the indexed documents.
async fn ask_question(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let question = request.question.trim().to_string();
    if question.is_empty() {
        return Err(ApiError::bad_request("question is required"));
    }

    let query = state.query.clone();
    let answer = run_blocking(move || query.answer(&question).map_err(ApiError::from)).await?;

    Ok(Json(json!({ "answer": answer })))
}

// ── Helpers ──────────────────────────────────────────────────────────

/// Place an upload under `dir` without clobbering an existing file.
fn unique_path(dir: &FsPath, filename: &str) -> PathBuf {
    // Strip any client-supplied directory components
    let name = FsPath::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.pdf");

    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = FsPath::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("upload");
    let ext = FsPath::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    let mut n = 1;
    loop {
        let candidate = dir.join(format!("{stem}_{n}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
