//! Folding a streamed model response into one turn's outcome.
//!
//! Text is passed through as it arrives. Tool-use arguments are buffered per
//! content-block index and parsed exactly once, when the block closes. A
//! payload that is not a JSON object yields a [`ToolCallParseError`] instead
//! of a call; the block is then treated as if no tool had been requested.

use super::response::{ContentBlock, StopReason, TokenUsage};
use super::stream::StreamEvent;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A tool-use block whose arguments parsed cleanly.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledToolCall {
    pub id: String,
    pub name: String,
    pub input: Map<String, Value>,
}

/// A tool-use block whose arguments could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallParseError {
    pub tool_use_id: String,
    pub name: String,
    pub error: String,
}

/// What closing a tool-use block produced.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockOutcome {
    Call(AssembledToolCall),
    ParseError(ToolCallParseError),
}

#[derive(Debug)]
struct PendingToolUse {
    id: String,
    name: String,
    json: String,
}

/// Everything one model call produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOutput {
    pub text: String,
    pub tool_calls: Vec<AssembledToolCall>,
    pub parse_errors: Vec<ToolCallParseError>,
    pub usage: TokenUsage,
    pub stop_reason: Option<StopReason>,
}

impl TurnOutput {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Assistant content to append to the model history: the turn's text
    /// followed by its tool-use blocks.
    pub fn assistant_content(&self) -> Vec<ContentBlock> {
        let mut content = Vec::with_capacity(self.tool_calls.len() + 1);
        if !self.text.is_empty() {
            content.push(ContentBlock::text(self.text.clone()));
        }
        content.extend(self.tool_calls.iter().map(|call| ContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.name.clone(),
            input: call.input.clone(),
        }));
        content
    }
}

/// Accumulates one streamed model response.
#[derive(Debug, Default)]
pub struct TurnAccumulator {
    output: TurnOutput,
    pending: BTreeMap<usize, PendingToolUse>,
}

impl TurnAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event in.
    ///
    /// Returns the outcome when the event closed a tool-use block, so the
    /// caller can surface parse errors as they happen.
    pub fn apply(&mut self, event: &StreamEvent) -> Option<BlockOutcome> {
        match event {
            StreamEvent::TextDelta(text) => {
                self.output.text.push_str(text);
                None
            }
            StreamEvent::ToolUseStart { index, id, name } => {
                self.pending.insert(
                    *index,
                    PendingToolUse {
                        id: id.clone(),
                        name: name.clone(),
                        json: String::new(),
                    },
                );
                None
            }
            StreamEvent::ToolInputDelta {
                index,
                partial_json,
            } => {
                if let Some(pending) = self.pending.get_mut(index) {
                    pending.json.push_str(partial_json);
                }
                None
            }
            StreamEvent::BlockStop { index } => {
                let pending = self.pending.remove(index)?;
                Some(self.close(pending))
            }
            StreamEvent::Usage(usage) => {
                self.output.usage = *usage;
                None
            }
            StreamEvent::Completed { stop_reason } => {
                self.output.stop_reason = stop_reason.clone();
                None
            }
            StreamEvent::Error(_) => None,
        }
    }

    /// Finish the turn. Tool blocks that never closed count as parse errors.
    pub fn finish(mut self) -> (TurnOutput, Vec<ToolCallParseError>) {
        let unclosed: Vec<ToolCallParseError> = std::mem::take(&mut self.pending)
            .into_values()
            .map(|pending| ToolCallParseError {
                tool_use_id: pending.id,
                name: pending.name,
                error: "tool input block was never closed".to_string(),
            })
            .collect();
        self.output.parse_errors.extend(unclosed.iter().cloned());
        (self.output, unclosed)
    }

    fn close(&mut self, pending: PendingToolUse) -> BlockOutcome {
        match parse_arguments(&pending.json) {
            Ok(input) => {
                let call = AssembledToolCall {
                    id: pending.id,
                    name: pending.name,
                    input,
                };
                self.output.tool_calls.push(call.clone());
                BlockOutcome::Call(call)
            }
            Err(error) => {
                let err = ToolCallParseError {
                    tool_use_id: pending.id,
                    name: pending.name,
                    error,
                };
                self.output.parse_errors.push(err.clone());
                BlockOutcome::ParseError(err)
            }
        }
    }
}

/// Parse a complete tool-argument payload. An empty payload means no
/// arguments.
pub fn parse_arguments(json: &str) -> Result<Map<String, Value>, String> {
    if json.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!(
            "tool input must be a JSON object, got {}",
            json_kind(&other)
        )),
        Err(e) => Err(format!("invalid tool input JSON: {}", e)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn start(index: usize, id: &str, name: &str) -> StreamEvent {
        StreamEvent::ToolUseStart {
            index,
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn delta(index: usize, fragment: &str) -> StreamEvent {
        StreamEvent::ToolInputDelta {
            index,
            partial_json: fragment.to_string(),
        }
    }

    #[test]
    fn test_text_and_fragmented_tool_call() {
        let mut acc = TurnAccumulator::new();
        assert!(acc.apply(&StreamEvent::TextDelta("Let me ".to_string())).is_none());
        acc.apply(&StreamEvent::TextDelta("check.".to_string()));
        acc.apply(&start(1, "toolu_1", "inventory"));
        acc.apply(&delta(1, "{\"act"));
        acc.apply(&delta(1, "ion\": \"summ"));
        acc.apply(&delta(1, "ary\"}"));
        let outcome = acc.apply(&StreamEvent::BlockStop { index: 1 });
        match outcome {
            Some(BlockOutcome::Call(call)) => {
                assert_eq!(call.name, "inventory");
                assert_eq!(call.input["action"], json!("summary"));
            }
            other => panic!("expected call, got {:?}", other),
        }
        acc.apply(&StreamEvent::Usage(TokenUsage::new(12, 8)));
        acc.apply(&StreamEvent::Completed {
            stop_reason: Some(StopReason::ToolUse),
        });

        let (output, unclosed) = acc.finish();
        assert!(unclosed.is_empty());
        assert_eq!(output.text, "Let me check.");
        assert_eq!(output.tool_calls.len(), 1);
        assert_eq!(output.usage, TokenUsage::new(12, 8));
        assert_eq!(output.stop_reason, Some(StopReason::ToolUse));

        let content = output.assistant_content();
        assert_eq!(content.len(), 2);
        assert_eq!(content[0].as_text(), Some("Let me check."));
        assert_eq!(content[1].tool_name(), Some("inventory"));
    }

    #[test]
    fn test_interleaved_blocks_keep_their_own_buffers() {
        let mut acc = TurnAccumulator::new();
        acc.apply(&start(0, "a", "orders"));
        acc.apply(&start(1, "b", "customers"));
        acc.apply(&delta(1, "{\"query\":"));
        acc.apply(&delta(0, "{\"id\": 7}"));
        acc.apply(&delta(1, "\"Jane\"}"));
        acc.apply(&StreamEvent::BlockStop { index: 0 });
        acc.apply(&StreamEvent::BlockStop { index: 1 });

        let (output, _) = acc.finish();
        assert_eq!(output.tool_calls[0].input["id"], json!(7));
        assert_eq!(output.tool_calls[1].input["query"], json!("Jane"));
    }

    #[test]
    fn test_malformed_arguments_become_parse_error() {
        let mut acc = TurnAccumulator::new();
        acc.apply(&start(0, "toolu_bad", "orders"));
        acc.apply(&delta(0, "{\"id\": "));
        let outcome = acc.apply(&StreamEvent::BlockStop { index: 0 });
        assert!(matches!(
            outcome,
            Some(BlockOutcome::ParseError(ref e)) if e.tool_use_id == "toolu_bad"
        ));

        let (output, _) = acc.finish();
        assert!(!output.has_tool_calls());
        assert_eq!(output.parse_errors.len(), 1);
    }

    #[test]
    fn test_empty_arguments_are_empty_object() {
        let mut acc = TurnAccumulator::new();
        acc.apply(&start(0, "t", "ping"));
        acc.apply(&StreamEvent::BlockStop { index: 0 });
        let (output, _) = acc.finish();
        assert!(output.tool_calls[0].input.is_empty());
    }

    #[test]
    fn test_text_block_stop_is_ignored() {
        let mut acc = TurnAccumulator::new();
        acc.apply(&StreamEvent::TextDelta("hi".to_string()));
        assert!(acc.apply(&StreamEvent::BlockStop { index: 0 }).is_none());
    }

    #[test]
    fn test_unclosed_block_reported_on_finish() {
        let mut acc = TurnAccumulator::new();
        acc.apply(&start(3, "t", "orders"));
        acc.apply(&delta(3, "{}"));
        let (output, unclosed) = acc.finish();
        assert_eq!(unclosed.len(), 1);
        assert!(output.tool_calls.is_empty());
        assert_eq!(output.parse_errors, unclosed);
    }

    #[test]
    fn test_parse_arguments_rejects_non_objects() {
        assert!(parse_arguments("[1,2]").unwrap_err().contains("array"));
        assert!(parse_arguments("\"x\"").is_err());
        assert!(parse_arguments("not json").unwrap_err().starts_with("invalid"));
    }
}
