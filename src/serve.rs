//! HTTP front-end for a single chat session.
//!
//! `GET /health`, `GET /messages`, `POST /chat` and `POST /clear`. The whole
//! process shares one transcript, and turns are handled one at a time.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use eyre::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::cli::chat::conversation_state::{ConversationState, Message};
use crate::cli::chat::prompt_chain::{build_prompt_chain, strip_thinking};
use crate::config::ChatConfig;
use crate::ollama_client::{ChatBackend, ClientError};

pub struct AppState {
    config: ChatConfig,
    conversation: Mutex<ConversationState>,
    backend: Arc<dyn ChatBackend>,
}

impl AppState {
    pub fn new(config: ChatConfig, backend: Arc<dyn ChatBackend>) -> Self {
        let conversation = Mutex::new(ConversationState::new(config.persona.greeting()));
        Self {
            config,
            conversation,
            backend,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub reply: String,
}

pub enum ApiError {
    EmptyMessage,
    Backend(ClientError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::EmptyMessage => (
                StatusCode::BAD_REQUEST,
                "message cannot be empty".to_string(),
            ),
            ApiError::Backend(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/messages", get(messages))
        .route("/chat", post(chat))
        .route("/clear", post(clear))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn messages(State(state): State<Arc<AppState>>) -> Json<Vec<Message>> {
    let conversation = state.conversation.lock().await;
    Json(conversation.get_messages().to_vec())
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let text = request.message.trim();
    if text.is_empty() {
        return Err(ApiError::EmptyMessage);
    }

    // Held across the model call so turns never interleave.
    let mut conversation = state.conversation.lock().await;
    conversation.add_user_message(text);

    let chain = build_prompt_chain(state.config.persona.system_prompt(), &conversation);
    let reply = state
        .backend
        .chat(&state.config.model, state.config.temperature, &chain)
        .await
        .map_err(|e| {
            if e.is_unreachable() {
                warn!("Model server unreachable: {}", e);
            } else {
                error!("Chat request failed: {}", e);
            }
            ApiError::Backend(e)
        })?;

    let reply = if state.config.hide_thinking {
        strip_thinking(&reply)
    } else {
        reply
    };
    conversation.add_assistant_message(&reply);

    Ok(Json(ChatReply { reply }))
}

async fn clear(State(state): State<Arc<AppState>>) -> Json<Vec<Message>> {
    let mut conversation = state.conversation.lock().await;
    conversation.clear();
    info!("Conversation cleared");
    Json(conversation.get_messages().to_vec())
}

pub async fn serve(config: ChatConfig, backend: Arc<dyn ChatBackend>, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(
        "{} listening on http://{} (model {} at {})",
        config.persona.title(),
        listener.local_addr()?,
        config.model,
        config.host
    );

    let app = router(Arc::new(AppState::new(config, backend)));
    axum::serve(listener, app).await?;
    Ok(())
}
