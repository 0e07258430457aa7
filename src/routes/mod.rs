//! API Routes
//!
//! - `/api/files` - upload a document (POST) and list the session's files (GET)
//! - `/api/files/active` - read or change the active file
//! - `/api/files/{id}` - one stored file with its agenda
//! - `/api/chat` - follow-up questions about the active agenda
//! - `/api/health` - liveness plus the processing indicator

pub mod chat;
pub mod files;
pub mod health;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::cors_layer;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let body_limit = state.config.server.max_upload_bytes;
    let cors = cors_layer(&state.config.server);

    Router::new()
        .merge(files::router(state.clone()))
        .merge(chat::router(state.clone()))
        .merge(health::router(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
