//! Validation predicates for user-supplied values

use crate::types::PermissionMode;

/// Tools the delegate ships with
pub const KNOWN_TOOLS: &[&str] = &[
    "Read",
    "Write",
    "Edit",
    "MultiEdit",
    "Bash",
    "Glob",
    "Grep",
    "LS",
    "WebFetch",
    "WebSearch",
    "TodoRead",
    "TodoWrite",
    "Task",
];

/// Prefix of tools exposed by MCP servers (`mcp__server__tool`)
const MCP_TOOL_PREFIX: &str = "mcp__";

pub const MIN_MAX_TURNS: i64 = 1;
pub const MAX_MAX_TURNS: i64 = 100;

const MAX_SESSION_ID_LEN: usize = 100;

/// Regex patterns for validation (compiled once)
mod patterns {
    use std::sync::LazyLock;

    /// Tool name with an optional rule specifier, e.g. `Bash(git log:*)`
    pub static TOOL: LazyLock<regex::Regex> =
        LazyLock::new(|| regex::Regex::new(r"^(?P<name>[A-Za-z]+)(\(.*\))?$").unwrap());

    pub static SESSION_ID: LazyLock<regex::Regex> =
        LazyLock::new(|| regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());
}

/// Check a single tool entry against the known tool names
pub fn validate_tool_name(tool: &str) -> bool {
    let trimmed = tool.trim();
    if trimmed.is_empty() {
        return false;
    }
    if let Some(rest) = trimmed.strip_prefix(MCP_TOOL_PREFIX) {
        return !rest.is_empty();
    }
    match patterns::TOOL.captures(trimmed) {
        Some(caps) => KNOWN_TOOLS.contains(&&caps["name"]),
        None => false,
    }
}

/// Every entry must be a known tool; an empty list is valid
pub fn validate_tool_list(tools: &[String]) -> bool {
    tools.iter().all(|tool| validate_tool_name(tool))
}

pub fn validate_max_turns(max_turns: i64) -> bool {
    (MIN_MAX_TURNS..=MAX_MAX_TURNS).contains(&max_turns)
}

/// Session ids are word characters and dashes, at most 100 long
pub fn validate_session_id(session_id: &str) -> bool {
    let trimmed = session_id.trim();
    !trimmed.is_empty()
        && trimmed.len() <= MAX_SESSION_ID_LEN
        && patterns::SESSION_ID.is_match(trimmed)
}

pub fn validate_permission_mode(mode: &str) -> bool {
    mode.parse::<PermissionMode>().is_ok()
}

/// Present values must contain something other than whitespace
pub fn is_blank(value: Option<&str>) -> bool {
    matches!(value, Some(v) if v.trim().is_empty())
}
