//! Chat handler.

use axum::extract::State;
use axum::{Extension, Json};
use companion_core::chat;
use tracing::debug;

use crate::AppState;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{ChatRequest, ChatResponse};

/// `POST /chat` — forward one message through the caller's conversation.
///
/// Always `200`: upstream failures come back as the fallback reply.
pub async fn chat_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let outcome = chat::respond(state.sessions.as_ref(), &user.token, &body.message).await;

    debug!(
        username = %user.username,
        fallback = outcome.is_fallback(),
        sessions = state.sessions.len(),
        "chat turn complete"
    );

    Json(ChatResponse {
        reply: outcome.into_reply(),
    })
}
