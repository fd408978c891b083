//! ccrun-core: Core library for argument parsing, settings and result output
//!
//! This crate holds everything ccrun does that does not touch a terminal or
//! spawn a process.

/// Core error types for ccrun operations
pub mod error;

/// Core data types (RunConfig, ResultMessage, etc.)
pub mod types;

/// Delegate stream messages
pub mod message;

/// Validation predicates
pub mod validation;

/// Input file access
pub mod file;

/// Settings loading and configuration merging
pub mod config;

/// Result file persistence
pub mod file_output;

/// Command-line argument parsing
pub mod args;

/// Final prompt assembly
pub mod prompt;

// Re-exports for convenience
pub use args::{parse_args, validation_error};
pub use config::{
    create_config, load_settings, merge_output_settings, merge_tool_permissions,
    validate_config, LoadedSettings, Settings,
};
pub use error::CcrunError;
pub use file_output::{resolve_output_path, resolve_target, write_result};
pub use message::{ContentBlock, SdkMessage};
pub use prompt::resolve_prompt;
pub use types::{
    OutputFormat, OutputSettings, OutputTarget, ParsedArguments, PermissionMode, ResultMessage,
    ResultSubtype, RunConfig, ToolPermissions, Usage,
};
pub use validation::KNOWN_TOOLS;
