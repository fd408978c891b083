//! Settings loading and configuration merging
//!
//! A settings document is optional JSON found at an explicit path or at the
//! first existing default location. CLI values always win over settings; tool
//! lists are the union of both sources.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CcrunError;
use crate::types::{
    OutputFormat, OutputSettings, OutputTarget, ParsedArguments, RunConfig, ToolPermissions,
};
use crate::validation::{validate_max_turns, validate_session_id, validate_tool_list};

/// Default settings locations, relative to the working directory, in priority order
pub const SETTINGS_PATHS: &[&str] = &[".ccrun/settings.local.json", ".ccrun/settings.json"];

/// Turn limit used when neither CLI nor settings give one
pub const DEFAULT_MAX_TURNS: i64 = 50;

/// Deserialize a field, treating a value of the wrong JSON type as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Settings document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, deserialize_with = "lenient")]
    pub permissions: Option<PermissionsSection>,
    #[serde(default, deserialize_with = "lenient")]
    pub max_turns: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub output_file: Option<String>,
    /// Raw value; unknown formats are ignored by [`Settings::output_format`]
    #[serde(default, deserialize_with = "lenient")]
    pub output_format: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub output: Option<OutputSection>,
    /// Deprecated spelling of `systemPrompt`
    #[serde(default, deserialize_with = "lenient")]
    pub custom_system_prompt: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub system_prompt: Option<String>,
    /// Keys ccrun does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `permissions` block; a malformed list is dropped on its own
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionsSection {
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub allow: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub deny: Option<Vec<String>>,
}

/// `output` block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    #[serde(default, deserialize_with = "lenient")]
    pub enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub directory: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub filename: Option<FilenameSection>,
}

/// `output.filename` block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilenameSection {
    #[serde(default, deserialize_with = "lenient")]
    pub prefix: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub suffix: Option<String>,
}

impl Settings {
    pub fn allowed_tools(&self) -> &[String] {
        self.permissions
            .as_ref()
            .and_then(|p| p.allow.as_deref())
            .unwrap_or_default()
    }

    pub fn denied_tools(&self) -> &[String] {
        self.permissions
            .as_ref()
            .and_then(|p| p.deny.as_deref())
            .unwrap_or_default()
    }

    /// Root-level `outputFormat`, if it names a known format
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.output_format.as_deref().and_then(|f| f.parse().ok())
    }

    pub fn output_enabled(&self) -> bool {
        self.output.as_ref().and_then(|o| o.enabled).unwrap_or(false)
    }

    pub fn output_directory(&self) -> Option<&str> {
        self.output.as_ref().and_then(|o| o.directory.as_deref())
    }

    pub fn filename_prefix(&self) -> &str {
        self.filename().and_then(|f| f.prefix.as_deref()).unwrap_or("")
    }

    pub fn filename_suffix(&self) -> &str {
        self.filename().and_then(|f| f.suffix.as_deref()).unwrap_or("")
    }

    fn filename(&self) -> Option<&FilenameSection> {
        self.output.as_ref().and_then(|o| o.filename.as_ref())
    }

    /// `systemPrompt`, falling back to the deprecated `customSystemPrompt`
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt
            .as_deref()
            .or(self.custom_system_prompt.as_deref())
    }
}

/// A settings document together with the path it came from
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSettings {
    /// Path as given (relative to the working directory)
    pub source: String,
    pub settings: Settings,
}

/// Load the settings document.
///
/// An explicit `custom_path` wins and must exist and parse. Otherwise the
/// first existing entry of [`SETTINGS_PATHS`] is used; a broken default file
/// is still an error. Returns `Ok(None)` when no file is found.
pub fn load_settings(
    custom_path: Option<&str>,
    base_dir: &Path,
) -> Result<Option<LoadedSettings>, CcrunError> {
    if let Some(custom) = custom_path {
        let path = base_dir.join(custom);
        if !path.exists() {
            return Err(CcrunError::SettingsNotFound {
                path: custom.to_string(),
            });
        }
        return read_settings(custom, &path).map(Some);
    }

    for rel_path in SETTINGS_PATHS {
        let path = base_dir.join(rel_path);
        if path.exists() {
            return read_settings(rel_path, &path).map(Some);
        }
    }

    tracing::debug!("no settings file found under {}", base_dir.display());
    Ok(None)
}

fn read_settings(source: &str, path: &Path) -> Result<LoadedSettings, CcrunError> {
    let parse_error = |reason: String| CcrunError::SettingsParse {
        path: source.to_string(),
        reason,
    };
    let content = fs::read_to_string(path).map_err(|e| parse_error(e.to_string()))?;
    let settings: Settings =
        serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?;
    tracing::debug!("loaded settings from {}", path.display());
    Ok(LoadedSettings {
        source: source.to_string(),
        settings,
    })
}

/// Order-preserving union without duplicates; `None` when the union is empty
fn union(first: &[String], second: &[String]) -> Option<Vec<String>> {
    let mut seen = HashSet::new();
    let merged: Vec<String> = first
        .iter()
        .chain(second)
        .filter(|tool| seen.insert(tool.as_str()))
        .cloned()
        .collect();
    if merged.is_empty() { None } else { Some(merged) }
}

/// Union CLI and settings tool lists.
///
/// Empty results are omitted: an absent list means "no restriction", which
/// the delegate treats differently from an empty one.
pub fn merge_tool_permissions(
    cli_allowed: &[String],
    cli_denied: &[String],
    settings: Option<&Settings>,
) -> ToolPermissions {
    let (settings_allowed, settings_denied) = match settings {
        Some(s) => (s.allowed_tools(), s.denied_tools()),
        None => (&[][..], &[][..]),
    };
    ToolPermissions {
        allowed_tools: union(cli_allowed, settings_allowed),
        disallowed_tools: union(cli_denied, settings_denied),
    }
}

/// Decide whether a result file is written, where, and in which format.
///
/// Output is off unless the CLI names a file, the CLI enables output, or the
/// settings enable output or name a file.
pub fn merge_output_settings(
    cli_output_file: Option<&str>,
    cli_output_format: Option<OutputFormat>,
    cli_output_enabled: bool,
    settings: Option<&Settings>,
) -> OutputSettings {
    let output_format = cli_output_format
        .or_else(|| settings.and_then(Settings::output_format))
        .unwrap_or_default();

    let cli_file = cli_output_file.filter(|f| !f.is_empty());
    let settings_file = settings
        .and_then(|s| s.output_file.as_deref())
        .filter(|f| !f.is_empty());
    let enabled = cli_file.is_some()
        || cli_output_enabled
        || settings.is_some_and(Settings::output_enabled)
        || settings_file.is_some();

    let output_file = if !enabled {
        None
    } else if let Some(file) = cli_file.or(settings_file) {
        Some(OutputTarget::Path(file.to_string()))
    } else {
        Some(OutputTarget::AutoGenerate)
    };

    OutputSettings {
        output_file,
        output_format,
    }
}

/// Build the run configuration from parsed arguments and settings.
///
/// `file_system_prompt` is the content of `--system-prompt-file`, if read.
pub fn create_config(
    args: &ParsedArguments,
    settings: Option<&Settings>,
    permissions: ToolPermissions,
    file_system_prompt: Option<String>,
) -> RunConfig {
    let max_turns = args
        .max_turns
        .or_else(|| settings.and_then(|s| s.max_turns))
        .unwrap_or(DEFAULT_MAX_TURNS);

    let custom_system_prompt = args
        .custom_system_prompt
        .clone()
        .or(file_system_prompt)
        .or_else(|| settings.and_then(Settings::system_prompt).map(str::to_string));

    RunConfig {
        prompt: args.prompt.clone(),
        input_file: args.input_file.clone(),
        max_turns,
        continue_session: args.continue_session,
        resume: args.session_id.clone(),
        permission_mode: args.permission_mode,
        custom_system_prompt,
        permissions,
        settings_file: args.settings_file.clone(),
        output_file: args.output_file.clone(),
        output_dir: args.output_dir.clone(),
        output_format: args.output_format,
        output_enabled: args.output_enabled,
    }
}

/// Reject configurations the delegate cannot run
pub fn validate_config(config: &RunConfig) -> Result<(), CcrunError> {
    if config.prompt.is_none() && config.input_file.is_none() {
        return Err(CcrunError::InvalidConfig(
            "no prompt or input file".to_string(),
        ));
    }
    if !validate_max_turns(config.max_turns) {
        return Err(CcrunError::InvalidConfig(format!(
            "max turns {} is out of range",
            config.max_turns
        )));
    }
    if let Some(session) = &config.resume {
        if !validate_session_id(session) {
            return Err(CcrunError::InvalidConfig(format!(
                "malformed session id: {}",
                session
            )));
        }
    }
    for (label, tools) in [
        ("allowed", &config.permissions.allowed_tools),
        ("disallowed", &config.permissions.disallowed_tools),
    ] {
        if let Some(tools) = tools {
            if !validate_tool_list(tools) {
                return Err(CcrunError::InvalidConfig(format!(
                    "unknown tool in {} tools: {}",
                    label,
                    tools.join(", ")
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn settings_from(json: &str) -> Settings {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_merge_tool_permissions_union() {
        let settings = settings_from(r#"{"permissions":{"allow":["Write"]}}"#);
        let merged = merge_tool_permissions(&strings(&["Read"]), &[], Some(&settings));
        assert_eq!(merged.allowed_tools, Some(strings(&["Read", "Write"])));
        assert_eq!(merged.disallowed_tools, None);
    }

    #[test]
    fn test_merge_tool_permissions_dedups() {
        let settings =
            settings_from(r#"{"permissions":{"allow":["Read","Edit"],"deny":["Bash","Bash"]}}"#);
        let merged = merge_tool_permissions(
            &strings(&["Read", "Write"]),
            &strings(&["Bash"]),
            Some(&settings),
        );
        assert_eq!(merged.allowed_tools, Some(strings(&["Read", "Write", "Edit"])));
        assert_eq!(merged.disallowed_tools, Some(strings(&["Bash"])));
    }

    #[test]
    fn test_malformed_allow_keeps_deny() {
        let settings = settings_from(r#"{"permissions":{"allow":"Read","deny":["Bash"]}}"#);
        assert!(settings.allowed_tools().is_empty());
        assert_eq!(settings.denied_tools(), strings(&["Bash"]).as_slice());

        let merged = merge_tool_permissions(&[], &strings(&["WebFetch"]), Some(&settings));
        assert_eq!(merged.allowed_tools, None);
        assert_eq!(merged.disallowed_tools, Some(strings(&["WebFetch", "Bash"])));

        let settings = settings_from(r#"{"permissions":{"allow":["Read"],"deny":{"Bash":true}}}"#);
        let merged = merge_tool_permissions(&[], &[], Some(&settings));
        assert_eq!(merged.allowed_tools, Some(strings(&["Read"])));
        assert_eq!(merged.disallowed_tools, None);
    }

    #[test]
    fn test_merge_tool_permissions_empty_is_absent() {
        let merged = merge_tool_permissions(&[], &[], None);
        assert_eq!(merged, ToolPermissions::default());
        let json = serde_json::to_value(&merged).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn test_output_disabled_by_default() {
        let out = merge_output_settings(None, None, false, None);
        assert_eq!(out.output_file, None);
        assert_eq!(out.output_format, OutputFormat::Json);

        let settings = settings_from(r#"{"output":{"directory":"./results"}}"#);
        let out = merge_output_settings(None, None, false, Some(&settings));
        assert_eq!(out.output_file, None);
    }

    #[test]
    fn test_output_enablement_sources() {
        let out = merge_output_settings(Some("out.json"), None, false, None);
        assert_eq!(out.output_file, Some(OutputTarget::Path("out.json".to_string())));

        let out = merge_output_settings(None, None, true, None);
        assert_eq!(out.output_file, Some(OutputTarget::AutoGenerate));

        let settings = settings_from(r#"{"output":{"enabled":true}}"#);
        let out = merge_output_settings(None, None, false, Some(&settings));
        assert_eq!(out.output_file, Some(OutputTarget::AutoGenerate));

        let settings = settings_from(r#"{"outputFile":"settings.json"}"#);
        let out = merge_output_settings(None, None, false, Some(&settings));
        assert_eq!(
            out.output_file,
            Some(OutputTarget::Path("settings.json".to_string()))
        );
    }

    #[test]
    fn test_cli_output_file_beats_settings() {
        let settings = settings_from(r#"{"outputFile":"settings.json","outputFormat":"text"}"#);
        let out = merge_output_settings(Some("cli.json"), None, false, Some(&settings));
        assert_eq!(out.output_file, Some(OutputTarget::Path("cli.json".to_string())));
        assert_eq!(out.output_format, OutputFormat::Text);

        let out = merge_output_settings(
            Some("cli.json"),
            Some(OutputFormat::Json),
            false,
            Some(&settings),
        );
        assert_eq!(out.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_invalid_settings_values_are_ignored() {
        let settings = settings_from(
            r#"{"outputFormat":"xml","maxTurns":"ten","output":{"directory":123,"enabled":"yes"},"theme":"dark"}"#,
        );
        assert_eq!(settings.output_format(), None);
        assert_eq!(settings.max_turns, None);
        assert_eq!(settings.output_directory(), None);
        assert!(!settings.output_enabled());
        assert_eq!(settings.extra["theme"], "dark");
    }

    #[test]
    fn test_create_config_precedence() {
        let settings = settings_from(
            r#"{"maxTurns":20,"customSystemPrompt":"old","systemPrompt":"new"}"#,
        );
        let args = ParsedArguments {
            prompt: Some("hello".to_string()),
            session_id: Some("sess-1".to_string()),
            ..Default::default()
        };
        let config = create_config(&args, Some(&settings), ToolPermissions::default(), None);
        assert_eq!(config.max_turns, 20);
        assert_eq!(config.resume.as_deref(), Some("sess-1"));
        assert_eq!(config.custom_system_prompt.as_deref(), Some("new"));

        let args = ParsedArguments {
            max_turns: Some(7),
            custom_system_prompt: Some("inline".to_string()),
            ..args
        };
        let config = create_config(
            &args,
            Some(&settings),
            ToolPermissions::default(),
            Some("from file".to_string()),
        );
        assert_eq!(config.max_turns, 7);
        assert_eq!(config.custom_system_prompt.as_deref(), Some("inline"));
    }

    #[test]
    fn test_create_config_defaults() {
        let args = ParsedArguments {
            prompt: Some("hello".to_string()),
            ..Default::default()
        };
        let config = create_config(
            &args,
            None,
            ToolPermissions::default(),
            Some("from file".to_string()),
        );
        assert_eq!(config.max_turns, DEFAULT_MAX_TURNS);
        assert_eq!(config.custom_system_prompt.as_deref(), Some("from file"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_config_rejects() {
        let base = RunConfig {
            prompt: Some("x".to_string()),
            max_turns: 10,
            ..Default::default()
        };
        assert!(validate_config(&RunConfig { prompt: None, ..base.clone() }).is_err());
        assert!(validate_config(&RunConfig { max_turns: 0, ..base.clone() }).is_err());
        assert!(validate_config(&RunConfig {
            resume: Some("bad id!".to_string()),
            ..base.clone()
        })
        .is_err());

        let err = validate_config(&RunConfig {
            permissions: ToolPermissions {
                allowed_tools: Some(strings(&["Read", "Teleport"])),
                disallowed_tools: None,
            },
            ..base
        })
        .unwrap_err();
        assert!(err.to_string().contains("Teleport"));
    }

    #[test]
    fn test_load_settings_explicit_path() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(
            temp.path().join("custom.json"),
            r#"{"permissions":{"allow":["Read"]}}"#,
        )
        .unwrap();

        let loaded = load_settings(Some("custom.json"), temp.path())
            .unwrap()
            .unwrap();
        assert_eq!(loaded.source, "custom.json");
        assert_eq!(loaded.settings.allowed_tools(), strings(&["Read"]).as_slice());
    }

    #[test]
    fn test_load_settings_explicit_missing_is_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = load_settings(Some("nope.json"), temp.path()).unwrap_err();
        assert!(matches!(err, CcrunError::SettingsNotFound { .. }));
        assert_eq!(err.to_string(), "Specified settings file not found: nope.json");
    }

    #[test]
    fn test_load_settings_invalid_json_is_error() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("broken.json"), "{not json").unwrap();
        let err = load_settings(Some("broken.json"), temp.path()).unwrap_err();
        assert!(matches!(err, CcrunError::SettingsParse { .. }));
    }

    #[test]
    fn test_load_settings_default_order() {
        let temp = tempfile::tempdir().unwrap();
        assert_eq!(load_settings(None, temp.path()).unwrap(), None);

        let dir = temp.path().join(".ccrun");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("settings.json"), r#"{"maxTurns":5}"#).unwrap();
        let loaded = load_settings(None, temp.path()).unwrap().unwrap();
        assert_eq!(loaded.source, ".ccrun/settings.json");
        assert_eq!(loaded.settings.max_turns, Some(5));

        fs::write(dir.join("settings.local.json"), r#"{"maxTurns":9}"#).unwrap();
        let loaded = load_settings(None, temp.path()).unwrap().unwrap();
        assert_eq!(loaded.source, ".ccrun/settings.local.json");
        assert_eq!(loaded.settings.max_turns, Some(9));
    }

    #[test]
    fn test_explicit_path_skips_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join(".ccrun");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("settings.json"), r#"{"maxTurns":5}"#).unwrap();
        fs::write(temp.path().join("other.json"), r#"{}"#).unwrap();

        let loaded = load_settings(Some("other.json"), temp.path())
            .unwrap()
            .unwrap();
        assert_eq!(loaded.settings.max_turns, None);
    }
}
