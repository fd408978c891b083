//! Rendering of streamed delegate messages
//!
//! Everything here returns plain strings; the caller decides where they go
//! and how they are colored.

use serde_json::Value;

use ccrun_core::message::{ContentBlock, SdkMessage};
use ccrun_core::types::{ResultMessage, ResultSubtype, Usage};

/// Tool input longer than this (pretty JSON) is not shown
pub const MAX_TOOL_INPUT_CHARS: usize = 200;
/// Tool result text is cut after this many characters
pub const MAX_TOOL_RESULT_CHARS: usize = 500;
/// System prompt preview length in the startup summary
pub const SYSTEM_PROMPT_PREVIEW_CHARS: usize = 50;

/// Environment variable enabling error cause chains
pub const DEBUG_ENV: &str = "CCRUN_DEBUG";

pub fn format_message(message: &SdkMessage) -> String {
    match message {
        SdkMessage::System {
            session_id, tools, ..
        } => format_system_message(session_id.as_deref(), tools),
        SdkMessage::Assistant { content } => format_chat_message("🤖", "ASSISTANT", content),
        SdkMessage::User { content } => format_chat_message("👤", "USER", content),
        SdkMessage::Result(result) => format_result_message(result),
        SdkMessage::Other(value) => format_generic_message(message.message_type(), value),
    }
}

fn format_system_message(session_id: Option<&str>, tools: &[String]) -> String {
    let mut lines = vec!["\n🔧 SYSTEM".to_string()];
    if let Some(id) = session_id {
        lines.push(format!("Session ID: {}", id));
    }
    if !tools.is_empty() {
        lines.push(format!("Available tools: {}", tools.join(", ")));
    }
    lines.push(String::new());
    lines.join("\n")
}

fn format_chat_message(icon: &str, label: &str, content: &[ContentBlock]) -> String {
    let mut lines = vec![format!("\n{} {}", icon, label)];
    for block in content {
        match block {
            ContentBlock::Text(text) => lines.push(text.clone()),
            ContentBlock::ToolUse { name, input } => lines.push(format_tool_use(name, input)),
            ContentBlock::ToolResult { content } => lines.push(format_tool_result(content)),
            // thinking blocks and future block types
            ContentBlock::Other(_) => {}
        }
    }
    lines.push(String::new());
    lines.join("\n")
}

fn format_result_message(result: &ResultMessage) -> String {
    let mut lines = vec!["\n📊 RESULT".to_string()];
    match result.subtype {
        ResultSubtype::Success => lines.push("✅ Task completed successfully".to_string()),
        ResultSubtype::ErrorMaxTurns => lines.push("⚠️  Maximum turns reached".to_string()),
        ResultSubtype::ErrorDuringExecution => {
            lines.push("❌ Error during execution".to_string())
        }
        ResultSubtype::Unknown => {}
    }
    if let Some(text) = result.result.as_deref().filter(|t| !t.is_empty()) {
        lines.push(format!("Result: {}", text));
    }
    let usage = format_usage(&result.usage, Some(result.total_cost_usd));
    if !usage.trim().is_empty() {
        lines.push(usage.trim_end().to_string());
    }
    lines.push(String::new());
    lines.join("\n")
}

fn format_generic_message(kind: &str, value: &Value) -> String {
    let body = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    format!("\n📝 {}\n{}\n", kind.to_uppercase(), body)
}

pub fn format_tool_use(name: &str, input: &Value) -> String {
    let mut lines = vec![format!("🔧 Tool: {}", name)];
    if !input.is_object() {
        return lines.join("\n");
    }

    match input.get("todos").and_then(Value::as_array) {
        Some(todos) if name == "TodoWrite" => {
            lines.push("Todo items:".to_string());
            for todo in todos {
                let content = todo.get("content").and_then(Value::as_str).unwrap_or("");
                let status = todo.get("status").and_then(Value::as_str).unwrap_or("pending");
                lines.push(format!("  • {} ({})", content, status));
            }
        }
        _ => {
            let rendered = serde_json::to_string_pretty(input).unwrap_or_default();
            if rendered.chars().count() > MAX_TOOL_INPUT_CHARS {
                lines.push("Input: [Large object, truncated]".to_string());
            } else {
                lines.push(format!("Input: {}", rendered));
            }
        }
    }
    lines.join("\n")
}

/// Text of a tool result, when it is a string or a list of text blocks
fn tool_result_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(blocks) => blocks
            .iter()
            .map(|b| b.get("text").and_then(Value::as_str))
            .collect::<Option<Vec<_>>>()
            .map(|texts| texts.join("\n")),
        _ => None,
    }
}

pub fn format_tool_result(content: &Value) -> String {
    let body = match tool_result_text(content) {
        Some(text) if text.chars().count() > MAX_TOOL_RESULT_CHARS => {
            let head: String = text.chars().take(MAX_TOOL_RESULT_CHARS).collect();
            format!("{}...\n[Content truncated]", head)
        }
        Some(text) => text,
        None => serde_json::to_string_pretty(content).unwrap_or_default(),
    };
    format!("🔧 Tool Result:\n{}", body)
}

/// Group digits in threes: `1234567` -> `1,234,567`
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Token and cost summary; zero counters are omitted
pub fn format_usage(usage: &Usage, cost_usd: Option<f64>) -> String {
    let mut lines = vec!["📊 Usage Summary:".to_string()];
    if usage.input_tokens > 0 {
        lines.push(format!("   Input tokens: {}", group_thousands(usage.input_tokens)));
    }
    if usage.output_tokens > 0 {
        lines.push(format!("   Output tokens: {}", group_thousands(usage.output_tokens)));
    }
    if let Some(total) = usage.total_tokens.filter(|t| *t > 0) {
        lines.push(format!("   Total tokens: {}", group_thousands(total)));
    }
    if let Some(cost) = cost_usd.filter(|c| *c > 0.0) {
        lines.push(format!("   Estimated cost: ${:.4}", cost));
    }
    if lines.len() == 1 {
        return String::new();
    }
    lines.push(String::new());
    lines.join("\n")
}

pub fn format_session_info(session_id: &str) -> String {
    format!(
        "🔗 Session ID: {id}\n💡 Continue with claude code: claude --continue or claude --resume {id}\n",
        id = session_id
    )
}

/// Error block; the `source()` chain is appended when `debug` is set
pub fn format_error(error: &dyn std::error::Error, debug: bool) -> String {
    let mut lines = vec!["❌ Error occurred:".to_string(), format!("   {}", error)];
    if debug {
        let mut source = error.source();
        if source.is_some() {
            lines.push("Caused by:".to_string());
        }
        while let Some(cause) = source {
            lines.push(format!("   {}", cause));
            source = cause.source();
        }
    }
    lines.push(String::new());
    lines.join("\n")
}

pub fn debug_enabled() -> bool {
    std::env::var_os(DEBUG_ENV).is_some_and(|v| !v.is_empty())
}

/// Quoted preview of a system prompt for the startup summary
pub fn format_system_prompt_preview(prompt: &str) -> String {
    if prompt.chars().count() > SYSTEM_PROMPT_PREVIEW_CHARS {
        let head: String = prompt.chars().take(SYSTEM_PROMPT_PREVIEW_CHARS).collect();
        format!("customSystemPrompt: \"{}...\"", head)
    } else {
        format!("customSystemPrompt: \"{}\"", prompt)
    }
}
