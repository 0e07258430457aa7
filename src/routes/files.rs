use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use crate::ingest::UploadedFile;
use crate::middleware::rate_limiter_middleware;
use crate::models::{AppState, FileListResponse, FileRecord, FileSummary, SetActiveRequest};
use crate::types::{AppError, AppResult};

pub fn router(state: AppState) -> Router {
    let upload = post(upload_file).layer(middleware::from_fn_with_state(
        state.clone(),
        rate_limiter_middleware,
    ));

    Router::new()
        .route("/api/files", get(list_files).merge(upload))
        .route("/api/files/active", get(get_active).put(set_active))
        .route("/api/files/{id}", get(get_file))
        .with_state(state)
}

/// POST /api/files - multipart upload with a `file` field
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<FileRecord>)> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let declared_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidRequest(format!("Failed to read upload: {}", e)))?;
        upload = Some(UploadedFile::new(name, declared_type, data));
        break;
    }

    let upload = upload.ok_or_else(|| {
        AppError::InvalidRequest("multipart body has no `file` field".to_string())
    })?;
    info!(file = %upload.name, size = upload.data.len(), "File upload request received");

    let record = state.pipeline.process(upload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn list_files(State(state): State<AppState>) -> Json<FileListResponse> {
    let files = state.store.all().await.iter().map(FileSummary::from).collect();
    Json(FileListResponse {
        files,
        active_id: state.store.active_id().await,
    })
}

async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<FileRecord>> {
    state
        .store
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("file {}", id)))
}

async fn get_active(State(state): State<AppState>) -> AppResult<Json<FileRecord>> {
    state
        .store
        .get_active()
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("no active file".to_string()))
}

async fn set_active(
    State(state): State<AppState>,
    Json(request): Json<SetActiveRequest>,
) -> AppResult<Json<FileRecord>> {
    state.store.set_active(&request.id).await?;
    info!(id = %request.id, "Active file changed");
    get_active(State(state)).await
}
