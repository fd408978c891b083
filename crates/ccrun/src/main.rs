//! ccrun CLI - run Claude Code prompts non-interactively and save the results

mod agent;
mod cli;
mod colors;
mod display;
mod help;
mod interrupt;

use std::process::ExitCode;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use ccrun_core::CcrunError;

use agent::ClaudeCli;
use cli::CliManager;

/// Environment variable holding the log filter (e.g. `CCRUN_LOG=debug`)
const LOG_ENV: &str = "CCRUN_LOG";

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    interrupt::install_handler();

    let base_dir = match std::env::current_dir().map_err(CcrunError::from) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("{}", display::format_error(&e, display::debug_enabled()));
            return ExitCode::from(e.exit_code());
        }
    };

    let argv: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let mut manager = CliManager::new(ClaudeCli::new(base_dir.clone()), base_dir);
    ExitCode::from(manager.run(&argv))
}
