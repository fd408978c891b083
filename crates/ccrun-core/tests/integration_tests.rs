//! Integration tests for ccrun-core
//!
//! These tests drive the full preparation pipeline: argv, settings discovery,
//! merging, prompt assembly and result persistence.

use std::fs;
use std::path::Path;

use ccrun_core::{
    create_config, load_settings, merge_output_settings, merge_tool_permissions, parse_args,
    resolve_prompt, resolve_target, validate_config, validation_error, write_result,
    OutputFormat, OutputTarget, PermissionMode, ResultMessage, ResultSubtype,
};

fn write_settings(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create settings directory");
    }
    fs::write(path, content).expect("Failed to write settings");
}

fn success_result() -> ResultMessage {
    serde_json::from_value(serde_json::json!({
        "type": "result",
        "subtype": "success",
        "duration_ms": 2500,
        "duration_api_ms": 2000,
        "is_error": false,
        "num_turns": 4,
        "result": "Refactoring complete",
        "session_id": "abc-123",
        "total_cost_usd": 0.0421,
        "usage": {"input_tokens": 1200, "output_tokens": 300}
    }))
    .expect("Failed to build result message")
}

#[test]
fn test_pipeline_with_default_settings() {
    let temp = tempfile::tempdir().expect("Failed to create temp dir");
    write_settings(
        temp.path(),
        ".ccrun/settings.json",
        r#"{
            "permissions": {"allow": ["Read", "Grep"], "deny": ["Bash"]},
            "maxTurns": 12,
            "systemPrompt": "You are a careful reviewer",
            "output": {"enabled": true, "directory": "reports", "filename": {"prefix": "review-"}},
            "outputFormat": "text"
        }"#,
    );
    fs::write(temp.path().join("task.md"), "Review src/lib.rs").expect("Failed to write task");

    let argv = [
        "-f",
        "task.md",
        "--allowedTools",
        "Read, Edit",
        "--permission-mode",
        "acceptEdits",
        "Focus on error handling",
    ];
    let args = parse_args(&argv).expect("argv should parse");
    assert_eq!(validation_error(&args), None);
    // -f was given, so the stray token is not adopted as the prompt
    assert_eq!(args.prompt, None);

    let loaded = load_settings(args.settings_file.as_deref(), temp.path())
        .expect("settings should load")
        .expect("default settings should be found");
    assert_eq!(loaded.source, ".ccrun/settings.json");
    let settings = Some(&loaded.settings);

    let permissions = merge_tool_permissions(
        args.allowed_tools.as_deref().unwrap_or_default(),
        args.disallowed_tools.as_deref().unwrap_or_default(),
        settings,
    );
    assert_eq!(
        permissions.allowed_tools,
        Some(vec!["Read".to_string(), "Edit".to_string(), "Grep".to_string()])
    );
    assert_eq!(permissions.disallowed_tools, Some(vec!["Bash".to_string()]));

    let config = create_config(&args, settings, permissions, None);
    assert_eq!(config.max_turns, 12);
    assert_eq!(config.permission_mode, Some(PermissionMode::AcceptEdits));
    assert_eq!(
        config.custom_system_prompt.as_deref(),
        Some("You are a careful reviewer")
    );
    validate_config(&config).expect("config should be valid");

    let prompt = resolve_prompt(&config, temp.path()).expect("prompt should resolve");
    assert_eq!(prompt, "\n\n# Input File\nReview src/lib.rs\n\n");

    let output = merge_output_settings(
        args.output_file.as_deref(),
        args.output_format,
        args.output_enabled,
        settings,
    );
    assert_eq!(output.output_file, Some(OutputTarget::AutoGenerate));
    assert_eq!(output.output_format, OutputFormat::Text);

    let path = resolve_target(&output, args.output_dir.as_deref(), settings, temp.path())
        .expect("output should be enabled");
    assert!(path.starts_with(temp.path().join("reports")));

    let written = write_result(&path, &success_result(), output.output_format, Some(&config))
        .expect("result should be written");
    assert_eq!(written.extension().and_then(|e| e.to_str()), Some("txt"));
    let name = written.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("review-"), "unexpected name {}", name);

    let text = fs::read_to_string(&written).expect("Failed to read report");
    assert!(text.contains("Session ID: abc-123"));
    assert!(text.contains("Refactoring complete"));
    assert!(text.contains("  Total Tokens: 1500"));
}

#[test]
fn test_pipeline_with_explicit_settings_and_json_output() {
    let temp = tempfile::tempdir().expect("Failed to create temp dir");
    write_settings(temp.path(), ".ccrun/settings.json", r#"{"maxTurns": 99}"#);
    write_settings(temp.path(), "custom.json", r#"{"outputFile": "ignored.json"}"#);

    let args = parse_args(&[
        "Explain the parser",
        "-s",
        "custom.json",
        "--output-file",
        "result.txt",
        "--output-dir",
        "out",
        "--max-turns",
        "3",
    ])
    .expect("argv should parse");
    assert_eq!(args.prompt.as_deref(), Some("Explain the parser"));

    let loaded = load_settings(args.settings_file.as_deref(), temp.path())
        .expect("settings should load")
        .expect("explicit settings exist");
    assert_eq!(loaded.source, "custom.json");
    let settings = Some(&loaded.settings);

    let config = create_config(
        &args,
        settings,
        merge_tool_permissions(&[], &[], settings),
        None,
    );
    assert_eq!(config.max_turns, 3);
    assert_eq!(config.permissions.allowed_tools, None);

    let output = merge_output_settings(
        args.output_file.as_deref(),
        args.output_format,
        args.output_enabled,
        settings,
    );
    assert_eq!(
        output.output_file,
        Some(OutputTarget::Path("result.txt".to_string()))
    );

    let path = resolve_target(&output, args.output_dir.as_deref(), settings, temp.path())
        .expect("output should be enabled");
    let written = write_result(&path, &success_result(), output.output_format, Some(&config))
        .expect("result should be written");
    assert_eq!(written, temp.path().join("out/result.json"));

    let envelope: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&written).expect("Failed to read output"))
            .expect("output should be JSON");
    assert_eq!(envelope["result"]["subtype"], "success");
    assert_eq!(envelope["metadata"]["config"]["prompt"], "Explain the parser");
    assert_eq!(envelope["metadata"]["config"]["maxTurns"], 3);
    assert_eq!(envelope["metadata"]["config"]["continue"], false);

    let round_trip: ResultMessage =
        serde_json::from_value(envelope["result"].clone()).expect("result should round-trip");
    assert_eq!(round_trip.subtype, ResultSubtype::Success);
    assert_eq!(round_trip, success_result());
}

#[test]
fn test_broken_default_settings_is_an_error() {
    let temp = tempfile::tempdir().expect("Failed to create temp dir");
    write_settings(temp.path(), ".ccrun/settings.local.json", "{ nope");

    let err = load_settings(None, temp.path()).expect_err("broken settings should fail");
    assert!(err
        .to_string()
        .starts_with(".ccrun/settings.local.json failed to load or parse"));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_invalid_tool_is_rejected_after_merge() {
    let temp = tempfile::tempdir().expect("Failed to create temp dir");
    write_settings(
        temp.path(),
        ".ccrun/settings.json",
        r#"{"permissions": {"allow": ["Teleport"]}}"#,
    );

    let args = parse_args(&["-i", "hello"]).expect("argv should parse");
    let loaded = load_settings(None, temp.path())
        .expect("settings should load")
        .expect("settings exist");
    let settings = Some(&loaded.settings);
    let config = create_config(
        &args,
        settings,
        merge_tool_permissions(&[], &[], settings),
        None,
    );

    let err = validate_config(&config).expect_err("unknown tool should be rejected");
    assert!(err.to_string().starts_with("Invalid configuration provided"));
}
