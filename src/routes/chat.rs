use axum::{extract::State, middleware, routing::post, Json, Router};
use tracing::info;

use crate::middleware::rate_limiter_middleware;
use crate::models::{AppState, ChatRequest, ChatResponse};
use crate::types::AppResult;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(post_chat))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limiter_middleware))
        .with_state(state)
}

/// POST /api/chat - answer a question about the active agenda
async fn post_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let active = state.store.get_active().await;
    info!(
        history = request.history.len(),
        active_file = ?active.as_ref().map(|f| f.id.as_str()),
        "Received chat request"
    );

    let message = state
        .chat
        .reply(
            active.as_ref().and_then(|f| f.agenda.as_ref()),
            &request.history,
            &request.message,
        )
        .await?;

    Ok(Json(ChatResponse {
        message,
        active_file_id: active.map(|f| f.id),
    }))
}
