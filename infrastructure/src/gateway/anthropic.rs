//! Anthropic Messages API gateway (streaming).
//!
//! One `POST /v1/messages` with `stream: true` per model call. The response
//! body is decoded on a spawned task and forwarded as provider-neutral
//! [`StreamEvent`]s over the [`StreamHandle`] channel.

use super::sse::{SseDecoder, SseFrame};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use relay_application::ports::llm_gateway::{GatewayError, LlmGateway, ModelRequest, StreamHandle};
use relay_domain::{ContentBlock, ModelMessage, StopReason, StreamEvent, TokenUsage};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Capacity of the per-call event channel
const EVENT_BUFFER: usize = 128;

#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub base_url: String,
    pub api_version: String,
    /// Default key; agents may override it per request
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.anthropic.com".to_string(),
            api_version: "2023-06-01".to_string(),
            api_key: None,
            timeout: Duration::from_secs(120),
        }
    }
}

pub struct AnthropicGateway {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicGateway {
    pub fn new(config: AnthropicConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let version = HeaderValue::from_str(&config.api_version)
            .map_err(|e| GatewayError::RequestFailed(format!("Invalid API version: {}", e)))?;
        headers.insert("anthropic-version", version);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::ConnectionError(e.to_string()))?;

        info!(base_url = %config.base_url, "AnthropicGateway initialized");
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LlmGateway for AnthropicGateway {
    async fn stream(&self, request: ModelRequest) -> Result<StreamHandle, GatewayError> {
        let api_key = request
            .api_key
            .clone()
            .or_else(|| self.config.api_key.clone())
            .ok_or_else(|| GatewayError::MissingApiKey(request.model.clone()))?;
        let body = request_body(&request);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending streaming model request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = error_message(&text);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    GatewayError::AuthenticationFailed(message)
                }
                _ => GatewayError::HttpStatus {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(pump(response.bytes_stream(), tx));

        Ok(StreamHandle::new(rx))
    }
}

/// Decode a response body into events until a terminal event, the end of
/// the body, or the consumer going away. Returning drops `body`, which
/// closes the model connection.
async fn pump<S, B>(body: S, tx: mpsc::Sender<StreamEvent>)
where
    S: Stream<Item = Result<B, reqwest::Error>>,
    B: AsRef<[u8]>,
{
    let mut body = std::pin::pin!(body);
    let mut decoder = SseDecoder::new();
    let mut state = StreamState::default();

    loop {
        let chunk = tokio::select! {
            biased;
            _ = tx.closed() => {
                debug!("Stream consumer went away; closing model connection");
                return;
            }
            chunk = body.next() => chunk,
        };
        let chunk = match chunk {
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => {
                let _ = tx
                    .send(StreamEvent::Error(map_reqwest_error(e).to_string()))
                    .await;
                return;
            }
            None => break,
        };
        for frame in decoder.push(chunk.as_ref()) {
            if !forward(&mut state, &frame, &tx).await {
                return;
            }
        }
    }
    if let Some(frame) = decoder.finish() {
        forward(&mut state, &frame, &tx).await;
    }
}

/// Translate one frame and send the results. Returns `false` once nothing
/// more should be sent.
async fn forward(
    state: &mut StreamState,
    frame: &SseFrame,
    tx: &mpsc::Sender<StreamEvent>,
) -> bool {
    let events = match serde_json::from_str::<WireEvent>(&frame.data) {
        Ok(event) => state.apply(event),
        Err(e) => {
            warn!(event = ?frame.event, error = %e, "Undecodable stream event");
            let error = GatewayError::MalformedStream(format!(
                "undecodable {} event: {}",
                frame.event.as_deref().unwrap_or("message"),
                e
            ));
            let _ = tx.send(StreamEvent::Error(error.to_string())).await;
            return false;
        }
    };
    for event in events {
        let terminal = event.is_terminal();
        if tx.send(event).await.is_err() {
            debug!("Stream consumer went away");
            return false;
        }
        if terminal {
            return false;
        }
    }
    true
}

fn map_reqwest_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::ConnectionError(e.to_string())
    } else {
        GatewayError::RequestFailed(e.to_string())
    }
}

/// Extract `error.message` from an API error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

// ==================== Request encoding ====================

fn request_body(request: &ModelRequest) -> Value {
    let mut body = json!({
        "model": request.model,
        "max_tokens": request.max_tokens,
        "stream": true,
        "messages": request.messages.iter().map(wire_message).collect::<Vec<_>>(),
    });
    if !request.system_prompt.is_empty() {
        body["system"] = json!(request.system_prompt);
    }
    if !request.tools.is_empty() {
        body["tools"] = request
            .tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "input_schema": t.input_schema,
                })
            })
            .collect();
    }
    if let Some(temperature) = request.temperature {
        body["temperature"] = json!(temperature);
    }
    body
}

fn wire_message(message: &ModelMessage) -> Value {
    json!({
        "role": message.role.as_str(),
        "content": message.content.iter().map(wire_block).collect::<Vec<_>>(),
    })
}

fn wire_block(block: &ContentBlock) -> Value {
    match block {
        ContentBlock::Text { text } => json!({ "type": "text", "text": text }),
        ContentBlock::ToolUse { id, name, input } => {
            json!({ "type": "tool_use", "id": id, "name": name, "input": input })
        }
        // the API accepts tool_result content only as a string or blocks
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => {
            let content = match content {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            json!({
                "type": "tool_result",
                "tool_use_id": tool_use_id,
                "content": content,
                "is_error": is_error,
            })
        }
    }
}

// ==================== Stream decoding ====================

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    MessageStart {
        message: WireMessage,
    },
    ContentBlockStart {
        index: usize,
        content_block: WireBlock,
    },
    ContentBlockDelta {
        index: usize,
        delta: WireDelta,
    },
    ContentBlockStop {
        index: usize,
    },
    MessageDelta {
        #[serde(default)]
        delta: WireMessageDelta,
        #[serde(default)]
        usage: Option<WireUsage>,
    },
    MessageStop,
    Ping,
    Error {
        error: WireError,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct WireMessageDelta {
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireUsage {
    #[serde(default)]
    input_tokens: Option<u32>,
    #[serde(default)]
    output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(rename = "type", default)]
    kind: String,
    message: String,
}

/// Per-call decoding state. Usage arrives split across `message_start` and
/// `message_delta`; it is reported once, right before completion.
#[derive(Debug, Default)]
struct StreamState {
    usage: TokenUsage,
    stop_reason: Option<StopReason>,
}

impl StreamState {
    fn apply(&mut self, event: WireEvent) -> Vec<StreamEvent> {
        match event {
            WireEvent::MessageStart { message } => {
                if let Some(usage) = message.usage {
                    self.merge_usage(usage);
                }
                Vec::new()
            }
            WireEvent::ContentBlockStart {
                index,
                content_block,
            } => match content_block {
                WireBlock::Text { text } if !text.is_empty() => vec![StreamEvent::TextDelta(text)],
                WireBlock::ToolUse { id, name } => {
                    vec![StreamEvent::ToolUseStart { index, id, name }]
                }
                _ => Vec::new(),
            },
            WireEvent::ContentBlockDelta { index, delta } => match delta {
                WireDelta::TextDelta { text } => vec![StreamEvent::TextDelta(text)],
                WireDelta::InputJsonDelta { partial_json } => {
                    vec![StreamEvent::ToolInputDelta {
                        index,
                        partial_json,
                    }]
                }
                WireDelta::Other => Vec::new(),
            },
            WireEvent::ContentBlockStop { index } => vec![StreamEvent::BlockStop { index }],
            WireEvent::MessageDelta { delta, usage } => {
                if let Some(usage) = usage {
                    self.merge_usage(usage);
                }
                if let Some(reason) = delta.stop_reason {
                    self.stop_reason = Some(StopReason::parse(&reason));
                }
                Vec::new()
            }
            WireEvent::MessageStop => vec![
                StreamEvent::Usage(self.usage),
                StreamEvent::Completed {
                    stop_reason: self.stop_reason.take(),
                },
            ],
            WireEvent::Error { error } => {
                let message = if error.kind.is_empty() {
                    error.message
                } else {
                    format!("{}: {}", error.kind, error.message)
                };
                vec![StreamEvent::Error(message)]
            }
            WireEvent::Ping | WireEvent::Unknown => Vec::new(),
        }
    }

    fn merge_usage(&mut self, usage: WireUsage) {
        if let Some(input) = usage.input_tokens {
            self.usage.input_tokens = input;
        }
        if let Some(output) = usage.output_tokens {
            self.usage.output_tokens = output;
        }
    }
}
