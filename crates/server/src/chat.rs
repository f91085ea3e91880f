//! Chat routes.
//!
//! - `GET    /`                          - embedded chat page
//! - `POST   /api/chat`                  - answer a question, with SQL provenance
//! - `GET    /api/sessions/{session_id}` - turn history for a session
//! - `DELETE /api/sessions/{session_id}` - forget a session

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use invchat_agent::ChatRuntime;
use invchat_core::{ChatRequest, ChatResponse, Session, SessionId};
use serde::Serialize;
use tracing::warn;

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct ChatState {
    runtime: Arc<ChatRuntime>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ClearSessionResponse {
    pub session_id: String,
    pub cleared: bool,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub fn router(runtime: Arc<ChatRuntime>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/chat", post(chat))
        .route("/api/sessions/{session_id}", get(get_session).delete(clear_session))
        .with_state(ChatState { runtime })
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn chat(
    State(state): State<ChatState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatResponse> {
    let Json(request) =
        payload.map_err(|rejection| api_error(rejection.status(), &rejection.body_text()))?;
    if request.session_id.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "session_id must not be empty"));
    }

    Ok(Json(state.runtime.process_message(request).await))
}

pub async fn get_session(
    Path(session_id): Path<String>,
    State(state): State<ChatState>,
) -> ApiResult<Session> {
    let id = SessionId(session_id);
    match state.runtime.session(&id).await {
        Ok(Some(session)) => Ok(Json(session)),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, &format!("session `{id}` not found"))),
        Err(error) => {
            warn!(event_name = "chat.session.lookup_failed", session_id = %id, error = %error);
            Err(api_error(StatusCode::SERVICE_UNAVAILABLE, error.user_message()))
        }
    }
}

pub async fn clear_session(
    Path(session_id): Path<String>,
    State(state): State<ChatState>,
) -> ApiResult<ClearSessionResponse> {
    let id = SessionId(session_id);
    match state.runtime.clear_session(&id).await {
        Ok(cleared) => Ok(Json(ClearSessionResponse { session_id: id.0, cleared })),
        Err(error) => {
            warn!(event_name = "chat.session.clear_failed", session_id = %id, error = %error);
            Err(api_error(StatusCode::SERVICE_UNAVAILABLE, error.user_message()))
        }
    }
}

fn api_error(status: StatusCode, message: &str) -> (StatusCode, Json<ApiError>) {
    (status, Json(ApiError { error: message.to_string() }))
}
