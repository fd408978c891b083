//! Error types for ccrun operations

use thiserror::Error;

/// Core error type for ccrun operations
#[derive(Error, Debug)]
pub enum CcrunError {
    // === Argument errors ===
    /// A value-consuming option was last, or followed by another flag
    #[error("Option {option} requires a value")]
    MissingValue { option: String },

    /// Semantic validation of parsed arguments failed
    #[error("{0}")]
    Validation(String),

    /// Merged run configuration is not usable
    #[error("Invalid configuration provided: {0}")]
    InvalidConfig(String),

    // === Settings errors ===
    /// Settings file named on the command line does not exist
    #[error("Specified settings file not found: {path}")]
    SettingsNotFound { path: String },

    /// Settings file exists but could not be read or parsed
    #[error("{path} failed to load or parse: {reason}")]
    SettingsParse { path: String, reason: String },

    // === Input file errors ===
    /// Input or system prompt file could not be read
    #[error("Failed to read file {path}: {reason}")]
    FileRead { path: String, reason: String },

    /// Input file does not exist or is not a regular file
    #[error("Invalid or non-existent file: {path}")]
    InvalidInputFile { path: String },

    // === Output errors ===
    /// Parent directory of the output file could not be created
    #[error("Failed to create directory {dir}: {reason}")]
    OutputDirectory { dir: String, reason: String },

    /// Output file could not be serialized or written
    #[error("Failed to write output file {path}: {reason}")]
    OutputWrite { path: String, reason: String },

    // === Delegate errors ===
    /// Claude CLI not installed
    #[error("Claude CLI not installed. Install Claude Code from https://claude.ai/download")]
    ClaudeCliNotInstalled,

    /// Delegate invocation failed
    #[error("Agent invocation failed: {reason}")]
    AgentInvocationFailed { reason: String },

    /// Run interrupted by SIGINT/SIGTERM
    #[error("Interrupted by user")]
    Interrupted,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CcrunError {
    /// Get the process exit code for this error type
    pub fn exit_code(&self) -> u8 {
        match self {
            CcrunError::Interrupted => 0, // interruption is a clean shutdown
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_value_display() {
        let err = CcrunError::MissingValue {
            option: "-i/--input".to_string(),
        };
        assert_eq!(err.to_string(), "Option -i/--input requires a value");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_settings_errors_name_the_file() {
        let err = CcrunError::SettingsNotFound {
            path: "custom.json".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Specified settings file not found: custom.json"
        );

        let err = CcrunError::SettingsParse {
            path: ".ccrun/settings.json".to_string(),
            reason: "expected value at line 1 column 1".to_string(),
        };
        assert!(err.to_string().starts_with(".ccrun/settings.json failed to load or parse"));
    }

    #[test]
    fn test_output_errors_name_the_target() {
        let err = CcrunError::OutputDirectory {
            dir: "/readonly/out".to_string(),
            reason: "Permission denied".to_string(),
        };
        assert!(err.to_string().contains("/readonly/out"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_interrupted_exits_cleanly() {
        assert_eq!(CcrunError::Interrupted.exit_code(), 0);
    }
}
