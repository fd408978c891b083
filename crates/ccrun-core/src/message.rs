//! Messages streamed back by the delegate
//!
//! The delegate emits one JSON object per message. Only the fields ccrun
//! displays are typed; everything else is carried as raw JSON so that newer
//! message shapes still render instead of failing the run.

use serde::Deserialize;
use serde_json::Value;

use crate::types::ResultMessage;

/// One content block of an assistant or user message
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(String),
    ToolUse { name: String, input: Value },
    ToolResult { content: Value },
    Other(Value),
}

/// A streamed delegate message
#[derive(Debug, Clone, PartialEq)]
pub enum SdkMessage {
    /// Session bootstrap (`type: "system"`)
    System {
        subtype: Option<String>,
        session_id: Option<String>,
        tools: Vec<String>,
    },
    Assistant { content: Vec<ContentBlock> },
    User { content: Vec<ContentBlock> },
    /// Terminal message carrying final statistics
    Result(ResultMessage),
    /// Anything ccrun does not recognize
    Other(Value),
}

#[derive(Deserialize)]
struct SystemFields {
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    tools: Vec<String>,
}

impl SdkMessage {
    /// Classify a raw JSON message; malformed known types degrade to `Other`
    pub fn from_value(value: Value) -> Self {
        let kind = value.get("type").and_then(Value::as_str).unwrap_or("");
        match kind {
            "system" => match SystemFields::deserialize(&value) {
                Ok(fields) => SdkMessage::System {
                    subtype: fields.subtype,
                    session_id: fields.session_id,
                    tools: fields.tools,
                },
                Err(_) => SdkMessage::Other(value),
            },
            "assistant" => SdkMessage::Assistant {
                content: parse_content(&value),
            },
            "user" => SdkMessage::User {
                content: parse_content(&value),
            },
            "result" => match ResultMessage::deserialize(&value) {
                Ok(result) => SdkMessage::Result(result),
                Err(e) => {
                    tracing::warn!("unrecognized result message: {}", e);
                    SdkMessage::Other(value)
                }
            },
            _ => SdkMessage::Other(value),
        }
    }

    /// Parse one line of newline-delimited JSON; `None` for non-JSON lines
    pub fn from_line(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => Some(SdkMessage::from_value(value)),
            Err(e) => {
                tracing::debug!("skipping non-JSON delegate output ({}): {}", e, trimmed);
                None
            }
        }
    }

    /// The wire `type` tag
    pub fn message_type(&self) -> &str {
        match self {
            SdkMessage::System { .. } => "system",
            SdkMessage::Assistant { .. } => "assistant",
            SdkMessage::User { .. } => "user",
            SdkMessage::Result(_) => "result",
            SdkMessage::Other(value) => value.get("type").and_then(Value::as_str).unwrap_or("message"),
        }
    }

    /// Names of tools invoked in this message, in order
    pub fn tool_names(&self) -> Vec<&str> {
        match self {
            SdkMessage::Assistant { content } => content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolUse { name, .. } => Some(name.as_str()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn parse_content(value: &Value) -> Vec<ContentBlock> {
    match value.get("message").and_then(|m| m.get("content")) {
        Some(Value::String(text)) => vec![ContentBlock::Text(text.clone())],
        Some(Value::Array(blocks)) => blocks.iter().map(parse_block).collect(),
        _ => Vec::new(),
    }
}

fn parse_block(block: &Value) -> ContentBlock {
    let kind = block.get("type").and_then(Value::as_str).unwrap_or("");
    match kind {
        "text" => match block.get("text").and_then(Value::as_str) {
            Some(text) => ContentBlock::Text(text.to_string()),
            None => ContentBlock::Other(block.clone()),
        },
        "tool_use" => match block.get("name").and_then(Value::as_str) {
            Some(name) => ContentBlock::ToolUse {
                name: name.to_string(),
                input: block.get("input").cloned().unwrap_or(Value::Null),
            },
            None => ContentBlock::Other(block.clone()),
        },
        "tool_result" => ContentBlock::ToolResult {
            content: block.get("content").cloned().unwrap_or(Value::Null),
        },
        _ => ContentBlock::Other(block.clone()),
    }
}
