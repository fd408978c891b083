//! Top-level run flow
//!
//! parse → help → validate → settings → merge → confirm → query → display
//! → persist → summary. Library errors bubble up here and become exit codes.

use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;

use owo_colors::OwoColorize;

use ccrun_core::config::{
    create_config, load_settings, merge_output_settings, merge_tool_permissions, validate_config,
};
use ccrun_core::file::read_file;
use ccrun_core::file_output::{resolve_target, write_result};
use ccrun_core::message::SdkMessage;
use ccrun_core::types::{PermissionMode, ResultMessage};
use ccrun_core::{parse_args, resolve_prompt, validation_error, CcrunError};

use crate::agent::Delegate;
use crate::colors::COLORS;
use crate::display;
use crate::help::generate_help;
use crate::interrupt::{StreamingGuard, INTERRUPTED_NOTICE};

/// Asks the user to confirm `bypassPermissions`; `false` cancels the run
pub type ConfirmFn = Box<dyn FnMut() -> bool>;

const CONFIRM_PROMPT: &str = "Are you sure you want to continue?";

/// Ask on the terminal, or read one line when stdin is piped.
///
/// Anything but an explicit yes declines.
pub fn confirm_bypass_interactively() -> bool {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return dialoguer::Confirm::new()
            .with_prompt(CONFIRM_PROMPT)
            .default(false)
            .interact()
            .unwrap_or(false);
    }

    print!("{} (y/N): ", CONFIRM_PROMPT);
    let _ = std::io::stdout().flush();
    let mut answer = String::new();
    match stdin.lock().read_line(&mut answer) {
        Ok(_) => is_yes(&answer),
        Err(e) => {
            tracing::warn!("could not read confirmation: {}", e);
            false
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Runs one ccrun invocation against a delegate
pub struct CliManager<D: Delegate> {
    delegate: D,
    /// Directory relative paths and settings are resolved against
    base_dir: PathBuf,
    confirm_bypass: ConfirmFn,
}

/// What the message loop collected
#[derive(Default)]
struct RunSummary {
    session_id: Option<String>,
    used_tools: Vec<String>,
    result: Option<ResultMessage>,
}

impl RunSummary {
    fn record(&mut self, message: &SdkMessage) {
        match message {
            SdkMessage::System {
                session_id: Some(id),
                ..
            } => self.session_id = Some(id.clone()),
            SdkMessage::Result(result) => {
                if self.session_id.is_none() && !result.session_id.is_empty() {
                    self.session_id = Some(result.session_id.clone());
                }
                self.result = Some(result.clone());
            }
            _ => {}
        }
        for tool in message.tool_names() {
            if !self.used_tools.iter().any(|t| t == tool) {
                self.used_tools.push(tool.to_string());
            }
        }
    }
}

impl<D: Delegate> CliManager<D> {
    pub fn new(delegate: D, base_dir: PathBuf) -> Self {
        Self {
            delegate,
            base_dir,
            confirm_bypass: Box::new(confirm_bypass_interactively),
        }
    }

    #[cfg(test)]
    pub fn with_confirm(mut self, confirm: ConfirmFn) -> Self {
        self.confirm_bypass = confirm;
        self
    }

    /// Run with `argv` (program name excluded) and return the exit code
    pub fn run(&mut self, argv: &[String]) -> u8 {
        match self.execute(argv) {
            Ok(code) => code,
            Err(CcrunError::Interrupted) => {
                println!("{}", INTERRUPTED_NOTICE);
                self.delegate.cleanup();
                0
            }
            Err(e) => {
                let message = display::format_error(&e, display::debug_enabled());
                eprintln!("{}", message.style(COLORS.fail));
                e.exit_code()
            }
        }
    }

    fn execute(&mut self, argv: &[String]) -> Result<u8, CcrunError> {
        let args = parse_args(argv)?;

        if args.help {
            println!("{}", generate_help());
            return Ok(0);
        }

        if let Some(message) = validation_error(&args) {
            let error = CcrunError::Validation(message);
            eprintln!("{}", display::format_error(&error, false).style(COLORS.fail));
            println!("\nUse --help for usage information");
            return Ok(1);
        }

        println!("{}\n", "🚀 CCRun starting...".style(COLORS.active));

        let loaded = load_settings(args.settings_file.as_deref(), &self.base_dir)?;
        if let Some(loaded) = &loaded {
            println!("{}", format!("{} was loaded", loaded.source).style(COLORS.dim));
        }
        let settings = loaded.as_ref().map(|l| &l.settings);

        let permissions = merge_tool_permissions(
            args.allowed_tools.as_deref().unwrap_or_default(),
            args.disallowed_tools.as_deref().unwrap_or_default(),
            settings,
        );
        tracing::debug!("merged tool permissions: {:?}", permissions);

        let mode = args.permission_mode.unwrap_or(PermissionMode::Default);
        println!("permissionMode: {}\n", mode);
        println!("allowedTools: {}", tool_summary(&permissions.allowed_tools));
        println!("disallowedTools: {}", tool_summary(&permissions.disallowed_tools));

        let file_system_prompt = match args.system_prompt_file.as_deref() {
            Some(path) => {
                if args.custom_system_prompt.is_some() {
                    tracing::warn!("both a system prompt and a system prompt file were given; using the inline prompt");
                }
                Some(read_file(path, &self.base_dir)?)
            }
            None => None,
        };

        let config = create_config(&args, settings, permissions, file_system_prompt);
        if let Some(system_prompt) = &config.custom_system_prompt {
            println!("{}", display::format_system_prompt_preview(system_prompt));
        }
        validate_config(&config)?;

        if config.permission_mode == Some(PermissionMode::BypassPermissions) {
            println!(
                "{}",
                "⚠️  WARNING: You are about to use bypassPermissions mode.".style(COLORS.warning)
            );
            println!(
                "This mode will bypass all permission checks and may perform actions without confirmation."
            );
            if !(self.confirm_bypass)() {
                println!("Operation cancelled by user.");
                return Ok(0);
            }
        }

        let output = merge_output_settings(
            args.output_file.as_deref(),
            args.output_format,
            args.output_enabled,
            settings,
        );
        let output_path = resolve_target(&output, args.output_dir.as_deref(), settings, &self.base_dir);
        if let Some(path) = &output_path {
            tracing::debug!("result will be written to {}", path.display());
        }

        let prompt = resolve_prompt(&config, &self.base_dir)?;

        let mut summary = RunSummary::default();
        {
            let _streaming = StreamingGuard::new();
            let stream = self.delegate.query(&prompt, &config)?;
            for item in stream {
                let message = item?;
                let formatted = display::format_message(&message);
                if !formatted.trim().is_empty() {
                    println!("{}", formatted);
                }
                summary.record(&message);
                if summary.result.is_some() {
                    break;
                }
            }
        }

        match (&output_path, &summary.result) {
            (Some(path), Some(result)) => {
                match write_result(path, result, output.output_format, Some(&config)) {
                    Ok(written) => println!(
                        "{} {}\n",
                        "📁 Results saved to:".style(COLORS.success),
                        written.display()
                    ),
                    Err(e) => {
                        tracing::warn!("failed to save results: {}", e);
                        eprintln!("{}", format!("⚠️  {}", e).style(COLORS.warning));
                    }
                }
            }
            (Some(_), None) => {
                tracing::warn!("delegate finished without a result message; nothing saved");
            }
            _ => {}
        }

        if let Some(session_id) = &summary.session_id {
            println!("{}", display::format_session_info(session_id));
        }
        if !summary.used_tools.is_empty() {
            println!("🔧 Tools used: {}", summary.used_tools.join(", "));
        }

        self.delegate.cleanup();
        Ok(0)
    }
}

fn tool_summary(tools: &Option<Vec<String>>) -> String {
    match tools {
        Some(tools) if !tools.is_empty() => tools.join(", "),
        _ => "(none specified)".to_string(),
    }
}
