//! Route table and request handlers.

use super::error::ApiError;
use super::state::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use relay_application::{ChatOutcome, ChatRequest, StreamEmitter};
use relay_domain::{
    AgentId, Conversation, ConversationId, HistoryEntry, Message, SpanNode, TenantId, TraceId,
    TraceStats,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::trace::TraceLayer;
use tracing::debug;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/chat", post(chat))
        .route("/v1/traces/:trace_id", get(trace))
        .route("/v1/stats", get(stats))
        .route("/v1/conversations/:conversation_id", get(conversation))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The token of an `Authorization: Bearer <token>` header, if any.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|t| !t.is_empty())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatBody {
    agent_id: AgentId,
    #[serde(alias = "tenantId")]
    store_id: TenantId,
    message: String,
    #[serde(default)]
    conversation_history: Vec<HistoryEntry>,
    #[serde(default)]
    conversation_id: Option<ConversationId>,
    #[serde(default)]
    source: Option<String>,
}

impl From<ChatBody> for ChatRequest {
    fn from(body: ChatBody) -> Self {
        let mut request = ChatRequest::new(body.agent_id, body.store_id, body.message)
            .with_history(body.conversation_history);
        request.conversation_id = body.conversation_id;
        request.source = body.source;
        request
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsQuery {
    store_id: TenantId,
    #[serde(default)]
    window_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TenantQuery {
    store_id: TenantId,
}

#[derive(Debug, Serialize)]
struct ConversationView {
    conversation: Conversation,
    messages: Vec<Message>,
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Rejections are plain JSON responses; once the stream opens, every
/// outcome (including model failures) arrives as an SSE event.
async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let prepared = state
        .chat
        .prepare(bearer_token(&headers), body.into())
        .await?;

    let (emitter, receiver) = StreamEmitter::channel(state.chat.params().event_buffer);
    let cancel = state.shutdown.child_token();
    let chat = state.chat.clone();
    tokio::spawn(async move {
        match chat.run(prepared, emitter, cancel).await {
            ChatOutcome::Completed(summary) => debug!(
                trace_id = %summary.trace_id,
                turns = summary.turns,
                "Chat stream completed"
            ),
            ChatOutcome::Failed { trace_id, message } => {
                debug!(%trace_id, error = %message, "Chat stream ended with error")
            }
            ChatOutcome::Aborted { trace_id } => debug!(%trace_id, "Chat stream aborted"),
        }
    });

    let events = ReceiverStream::new(receiver)
        .map(|event| Event::default().event(event.event_name()).json_data(&event));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

async fn trace(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(trace_id): Path<TraceId>,
) -> Result<Json<Vec<SpanNode>>, ApiError> {
    let principal = state.chat.authenticate(bearer_token(&headers)).await?;
    let nodes: Vec<SpanNode> = state
        .recorder
        .reconstruct(&trace_id)
        .await?
        .into_iter()
        .filter(|node| principal.can_access(&node.span.tenant_id))
        .collect();

    if nodes.is_empty() {
        return Err(ApiError::NotFound(format!("Trace not found: {}", trace_id)));
    }
    Ok(Json(nodes))
}

async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Json<TraceStats>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    state
        .chat
        .authorize(bearer_token(&headers), &query.store_id)
        .await?;

    let window = match query.window_secs {
        Some(0) => {
            return Err(ApiError::BadRequest(
                "windowSecs must be greater than 0".to_string(),
            ));
        }
        Some(secs) => Duration::from_secs(secs),
        None => state.chat.params().default_stats_window,
    };
    Ok(Json(state.recorder.stats(&query.store_id, window).await?))
}

async fn conversation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(conversation_id): Path<ConversationId>,
    query: Result<Query<TenantQuery>, QueryRejection>,
) -> Result<Json<ConversationView>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    state
        .chat
        .authorize(bearer_token(&headers), &query.store_id)
        .await?;

    let conversation = state
        .conversations
        .get(&conversation_id)
        .await?
        .filter(|c| c.tenant_id == query.store_id)
        .ok_or_else(|| {
            ApiError::NotFound(format!("Conversation not found: {}", conversation_id))
        })?;
    let messages = state.conversations.messages(&conversation_id).await?;

    Ok(Json(ConversationView {
        conversation,
        messages,
    }))
}
