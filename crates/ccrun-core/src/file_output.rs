//! Result file persistence
//!
//! Decides where the final result goes and writes it either as a pretty JSON
//! envelope or as a plain-text report.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::config::Settings;
use crate::error::CcrunError;
use crate::types::{OutputFormat, OutputSettings, OutputTarget, ResultMessage, ResultSubtype, RunConfig};

/// Directory used when neither CLI nor settings name one, relative to the base directory
pub const DEFAULT_OUTPUT_DIR: &[&str] = &["tmp", "ccrun", "results"];

const BANNER: &str = "==========================================";

/// Filename timestamp, UTC, no separators
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Directory precedence: CLI > settings `output.directory` > fallback
fn output_directory(
    output_dir: Option<&str>,
    settings: Option<&Settings>,
    fallback: PathBuf,
    base_dir: &Path,
) -> PathBuf {
    let chosen = output_dir
        .filter(|d| !d.is_empty())
        .or_else(|| settings.and_then(Settings::output_directory).filter(|d| !d.is_empty()));
    match chosen {
        Some(dir) => base_dir.join(dir),
        None => fallback,
    }
}

fn join_output_file(
    output_file: &str,
    output_dir: Option<&str>,
    settings: Option<&Settings>,
    base_dir: &Path,
) -> PathBuf {
    let file = Path::new(output_file);
    if file.is_absolute() {
        return file.to_path_buf();
    }
    output_directory(output_dir, settings, base_dir.to_path_buf(), base_dir).join(file)
}

/// Timestamp-named path: `<dir>/<prefix><YYYYMMDDHHMMSS><suffix>.<ext>`
pub fn generate_default_output_path(
    output_dir: Option<&str>,
    settings: Option<&Settings>,
    base_dir: &Path,
) -> PathBuf {
    let default_dir = DEFAULT_OUTPUT_DIR
        .iter()
        .fold(base_dir.to_path_buf(), |path, part| path.join(part));
    let dir = output_directory(output_dir, settings, default_dir, base_dir);

    let format = settings
        .and_then(Settings::output_format)
        .unwrap_or_default();
    let (prefix, suffix) = match settings {
        Some(s) => (s.filename_prefix(), s.filename_suffix()),
        None => ("", ""),
    };
    let timestamp = Utc::now().format(TIMESTAMP_FORMAT);

    dir.join(format!(
        "{}{}{}.{}",
        prefix,
        timestamp,
        suffix,
        format.extension()
    ))
}

/// Compute the output path from raw CLI values; `None` when output is disabled.
///
/// Output is enabled by an explicit file, the enabled flag, or settings
/// `output.enabled`. Absolute files are used verbatim; relative ones are
/// joined to the output directory.
pub fn resolve_output_path(
    output_file: Option<&str>,
    output_dir: Option<&str>,
    output_enabled: bool,
    settings: Option<&Settings>,
    base_dir: &Path,
) -> Option<PathBuf> {
    let output_file = output_file.filter(|f| !f.is_empty());
    let enabled =
        output_file.is_some() || output_enabled || settings.is_some_and(Settings::output_enabled);
    if !enabled {
        return None;
    }

    Some(match output_file {
        Some(file) => join_output_file(file, output_dir, settings, base_dir),
        None => generate_default_output_path(output_dir, settings, base_dir),
    })
}

/// Map merged output settings onto a concrete path
pub fn resolve_target(
    output: &OutputSettings,
    output_dir: Option<&str>,
    settings: Option<&Settings>,
    base_dir: &Path,
) -> Option<PathBuf> {
    match output.output_file.as_ref()? {
        OutputTarget::Path(file) => Some(join_output_file(file, output_dir, settings, base_dir)),
        OutputTarget::AutoGenerate => {
            Some(generate_default_output_path(output_dir, settings, base_dir))
        }
    }
}

#[derive(Serialize)]
struct OutputEnvelope<'a> {
    result: &'a ResultMessage,
    metadata: OutputMetadata<'a>,
}

#[derive(Serialize)]
struct OutputMetadata<'a> {
    timestamp: String,
    #[serde(serialize_with = "config_or_empty")]
    config: Option<&'a RunConfig>,
}

fn config_or_empty<S: Serializer>(
    config: &Option<&RunConfig>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match config {
        Some(config) => config.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

/// Write `result` to `path` in `format`, returning the path actually written.
///
/// Parent directories are created. The extension is rewritten to match the
/// format, so `report.json` written as text lands in `report.txt`.
pub fn write_result(
    path: &Path,
    result: &ResultMessage,
    format: OutputFormat,
    config: Option<&RunConfig>,
) -> Result<PathBuf, CcrunError> {
    ensure_parent_dir(path)?;

    let target = if path.extension().and_then(|e| e.to_str()) == Some(format.extension()) {
        path.to_path_buf()
    } else {
        path.with_extension(format.extension())
    };
    let write_error = |reason: String| CcrunError::OutputWrite {
        path: target.display().to_string(),
        reason,
    };

    let content = match format {
        OutputFormat::Json => {
            let envelope = OutputEnvelope {
                result,
                metadata: OutputMetadata {
                    timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                    config,
                },
            };
            serde_json::to_string_pretty(&envelope).map_err(|e| write_error(e.to_string()))?
        }
        OutputFormat::Text => format_result_as_text(result),
    };

    fs::write(&target, content).map_err(|e| write_error(e.to_string()))?;
    tracing::info!("wrote {} result to {}", format, target.display());
    Ok(target)
}

fn ensure_parent_dir(path: &Path) -> Result<(), CcrunError> {
    let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(());
    };
    fs::create_dir_all(dir).map_err(|e| CcrunError::OutputDirectory {
        dir: dir.display().to_string(),
        reason: e.to_string(),
    })
}

/// Render the plain-text execution report
pub fn format_result_as_text(result: &ResultMessage) -> String {
    let executed_at = Local::now().format("%Y-%m-%d %H:%M:%S");
    let status = if result.is_error { "Error" } else { "Success" };
    let subtype = match result.subtype {
        ResultSubtype::Success => "success",
        ResultSubtype::ErrorMaxTurns => "error_max_turns",
        ResultSubtype::ErrorDuringExecution | ResultSubtype::Unknown => "error_during_execution",
    };
    let content = match result.subtype {
        ResultSubtype::Success => result.result.as_deref().unwrap_or(""),
        ResultSubtype::ErrorMaxTurns => "Maximum number of turns exceeded",
        _ => "Error occurred during execution",
    };

    let lines = [
        BANNER.to_string(),
        "CCRun Execution Report".to_string(),
        BANNER.to_string(),
        String::new(),
        format!("Executed at: {}", executed_at),
        format!("Session ID: {}", result.session_id),
        format!("Status: {} ({})", status, subtype),
        String::new(),
        "Performance:".to_string(),
        format!("  Duration: {}ms", result.duration_ms),
        format!("  API Duration: {}ms", result.duration_api_ms),
        format!("  Turns: {}", result.num_turns),
        format!("  Estimated Cost: ${:.4}", result.total_cost_usd),
        String::new(),
        "Token Usage:".to_string(),
        format!("  Input Tokens: {}", result.usage.input_tokens),
        format!("  Output Tokens: {}", result.usage.output_tokens),
        format!("  Total Tokens: {}", result.usage.total()),
        String::new(),
        "Result:".to_string(),
        content.to_string(),
        String::new(),
        BANNER.to_string(),
    ];
    lines.join("\n")
}
