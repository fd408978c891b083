//! Core data types for ccrun

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Permission tier forwarded to the delegate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    /// Ask before anything risky
    Default,
    /// File edits are accepted without prompting
    AcceptEdits,
    /// Every permission check is skipped
    BypassPermissions,
    /// Read-only planning
    Plan,
}

impl PermissionMode {
    /// All modes, in the order they are listed in help output
    pub const ALL: [PermissionMode; 4] = [
        PermissionMode::Default,
        PermissionMode::AcceptEdits,
        PermissionMode::BypassPermissions,
        PermissionMode::Plan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
            PermissionMode::AcceptEdits => "acceptEdits",
            PermissionMode::BypassPermissions => "bypassPermissions",
            PermissionMode::Plan => "plan",
        }
    }
}

impl fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PermissionMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s.trim())
            .ok_or_else(|| format!("unknown permission mode: {}", s))
    }
}

/// Format of the persisted result file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "text",
        }
    }

    /// File extension (without the dot) enforced for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "text" => Ok(OutputFormat::Text),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

/// Options parsed from the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArguments {
    /// Inline prompt (`-i` or the first free-standing token)
    pub prompt: Option<String>,
    /// File whose content is sent as input
    pub input_file: Option<String>,
    pub max_turns: Option<i64>,
    /// Session to resume (`--resume`)
    pub session_id: Option<String>,
    pub allowed_tools: Option<Vec<String>>,
    pub disallowed_tools: Option<Vec<String>>,
    /// Continue the most recent session (`-c`)
    pub continue_session: bool,
    pub help: bool,
    pub permission_mode: Option<PermissionMode>,
    pub settings_file: Option<String>,
    pub output_file: Option<String>,
    pub output_dir: Option<String>,
    pub output_format: Option<OutputFormat>,
    /// Output requested without naming a file (`-o`, `--output-enabled`)
    pub output_enabled: bool,
    pub custom_system_prompt: Option<String>,
    pub system_prompt_file: Option<String>,
}

/// Merged allow/deny tool lists; `None` means "no restriction"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolPermissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tools: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disallowed_tools: Option<Vec<String>>,
}

/// Configuration handed to the delegate for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_file: Option<String>,
    pub max_turns: i64,
    #[serde(rename = "continue", default)]
    pub continue_session: bool,
    /// Session id to resume
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_mode: Option<PermissionMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_system_prompt: Option<String>,
    #[serde(flatten)]
    pub permissions: ToolPermissions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,
    #[serde(default)]
    pub output_enabled: bool,
}

/// Where the result file goes once output is enabled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Explicit file path from the CLI or settings
    Path(String),
    /// Timestamp-based name computed at write time
    AutoGenerate,
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputTarget::Path(path) => f.write_str(path),
            OutputTarget::AutoGenerate => f.write_str("auto-generate"),
        }
    }
}

/// Resolved output decision for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    /// `None` when output is disabled
    pub output_file: Option<OutputTarget>,
    pub output_format: OutputFormat,
}

/// Outcome classification of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSubtype {
    Success,
    ErrorMaxTurns,
    ErrorDuringExecution,
    /// Subtypes added by newer delegate releases
    #[serde(other)]
    Unknown,
}

impl ResultSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultSubtype::Success => "success",
            ResultSubtype::ErrorMaxTurns => "error_max_turns",
            ResultSubtype::ErrorDuringExecution => "error_during_execution",
            ResultSubtype::Unknown => "unknown",
        }
    }
}

/// Token counters reported with the final result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    /// Cache counters and anything else the delegate reports
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Usage {
    /// Reported total, or input + output when the delegate omits it
    pub fn total(&self) -> u64 {
        self.total_tokens
            .unwrap_or(self.input_tokens.saturating_add(self.output_tokens))
    }
}

fn result_type() -> String {
    "result".to_string()
}

/// Terminal `result` message of the delegate stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMessage {
    #[serde(rename = "type", default = "result_type")]
    pub message_type: String,
    pub subtype: ResultSubtype,
    #[serde(default)]
    pub duration_ms: f64,
    #[serde(default)]
    pub duration_api_ms: f64,
    #[serde(default)]
    pub is_error: bool,
    #[serde(default)]
    pub num_turns: u64,
    /// Final answer text (success only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub total_cost_usd: f64,
    #[serde(default)]
    pub usage: Usage,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
