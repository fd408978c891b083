//! Delegate invocation via the Claude CLI
//!
//! The delegate runs as `claude --print --verbose --output-format stream-json`
//! and emits one JSON message per stdout line. A reader thread parses lines
//! and forwards them over a channel; the consuming side polls the channel so
//! it can observe cancellation between messages.

use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ccrun_core::message::SdkMessage;
use ccrun_core::types::RunConfig;
use ccrun_core::CcrunError;

/// Environment variable overriding the delegate binary
pub const CLAUDE_PATH_ENV: &str = "CCRUN_CLAUDE_PATH";

/// How often the stream re-checks the cancellation flag
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Messages yielded by a running query
pub type MessageStream = Box<dyn Iterator<Item = Result<SdkMessage, CcrunError>>>;

/// The external agent ccrun forwards prompts to
pub trait Delegate {
    /// Start a query; messages arrive in delegate order, ending after `result`
    fn query(&mut self, prompt: &str, config: &RunConfig) -> Result<MessageStream, CcrunError>;

    /// Release anything still held after a run or an interruption
    fn cleanup(&mut self) {}
}

/// Delegate backed by the `claude` executable
pub struct ClaudeCli {
    /// Path to the claude CLI binary (default: "claude")
    claude_path: PathBuf,
    /// Directory the delegate runs in
    working_dir: PathBuf,
    is_cancelled: fn() -> bool,
}

impl ClaudeCli {
    /// Create a delegate running in `working_dir`, honoring `CCRUN_CLAUDE_PATH`
    pub fn new(working_dir: PathBuf) -> Self {
        let claude_path = std::env::var_os(CLAUDE_PATH_ENV)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("claude"));
        Self {
            claude_path,
            working_dir,
            is_cancelled: crate::interrupt::is_cancelled,
        }
    }

    /// Set a custom path to the claude CLI
    #[cfg(test)]
    fn with_claude_path(mut self, path: PathBuf) -> Self {
        self.claude_path = path;
        self
    }

    #[cfg(test)]
    fn with_cancellation(mut self, is_cancelled: fn() -> bool) -> Self {
        self.is_cancelled = is_cancelled;
        self
    }

    /// Check if the claude CLI is installed and accessible
    pub fn check_claude_cli(&self) -> Result<(), CcrunError> {
        // First try `which claude` to find it on PATH
        let which_result = Command::new("which")
            .arg(self.claude_path.as_os_str())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match which_result {
            Ok(status) if status.success() => Ok(()),
            _ => {
                // Try running claude --version directly as fallback
                let version_result = Command::new(&self.claude_path)
                    .arg("--version")
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status();

                match version_result {
                    Ok(status) if status.success() => Ok(()),
                    _ => Err(CcrunError::ClaudeCliNotInstalled),
                }
            }
        }
    }

    /// Map the run configuration onto claude CLI flags; the prompt goes last
    pub fn build_command(&self, prompt: &str, config: &RunConfig) -> Command {
        let mut cmd = Command::new(&self.claude_path);
        cmd.args(["--print", "--verbose", "--output-format", "stream-json"]);
        cmd.arg("--max-turns").arg(config.max_turns.to_string());

        if let Some(tools) = config.permissions.allowed_tools.as_ref().filter(|t| !t.is_empty()) {
            cmd.arg("--allowed-tools").arg(tools.join(","));
        }
        if let Some(tools) = config
            .permissions
            .disallowed_tools
            .as_ref()
            .filter(|t| !t.is_empty())
        {
            cmd.arg("--disallowed-tools").arg(tools.join(","));
        }
        if config.continue_session {
            cmd.arg("--continue");
        }
        if let Some(session) = &config.resume {
            cmd.arg("--resume").arg(session);
        }
        if let Some(mode) = config.permission_mode {
            cmd.arg("--permission-mode").arg(mode.as_str());
        }
        if let Some(system_prompt) = &config.custom_system_prompt {
            cmd.arg("--system-prompt").arg(system_prompt);
        }

        cmd.arg(prompt);
        cmd.current_dir(&self.working_dir);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }
}

impl Delegate for ClaudeCli {
    fn query(&mut self, prompt: &str, config: &RunConfig) -> Result<MessageStream, CcrunError> {
        self.check_claude_cli()?;

        let mut cmd = self.build_command(prompt, config);
        tracing::debug!(
            "spawning {} (max turns {}, {} prompt bytes)",
            self.claude_path.display(),
            config.max_turns,
            prompt.len()
        );

        let mut child = cmd.spawn().map_err(|e| CcrunError::AgentInvocationFailed {
            reason: format!("Failed to spawn claude process: {}", e),
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CcrunError::AgentInvocationFailed {
                reason: "Failed to capture stdout".to_string(),
            })?;

        // Drain stderr concurrently so a chatty delegate cannot block on a full pipe
        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut content = String::new();
                let _ = pipe.read_to_string(&mut content);
                content
            })
        });

        let (tx, rx) = mpsc::channel::<Result<SdkMessage, String>>();
        thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line_result in reader.lines() {
                match line_result {
                    Ok(line) => {
                        if let Some(message) = SdkMessage::from_line(&line) {
                            if tx.send(Ok(message)).is_err() {
                                break; // Receiver dropped, stop reading
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e.to_string()));
                        break;
                    }
                }
            }
        });

        Ok(Box::new(ClaudeStream {
            child,
            rx,
            stderr,
            is_cancelled: self.is_cancelled,
            saw_result: false,
            finished: false,
        }))
    }

    fn cleanup(&mut self) {
        tracing::debug!("delegate cleanup complete");
    }
}

/// Live message stream of one claude process
struct ClaudeStream {
    child: Child,
    rx: Receiver<Result<SdkMessage, String>>,
    stderr: Option<JoinHandle<String>>,
    is_cancelled: fn() -> bool,
    saw_result: bool,
    finished: bool,
}

impl ClaudeStream {
    fn stop(&mut self) {
        self.finished = true;
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }

    fn take_stderr(&mut self) -> String {
        self.stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
    }

    /// Called once stdout closed; reports a failed exit that produced no result
    fn finish(&mut self) -> Option<Result<SdkMessage, CcrunError>> {
        self.finished = true;
        let status = match self.child.wait() {
            Ok(status) => status,
            Err(e) => {
                return Some(Err(CcrunError::AgentInvocationFailed {
                    reason: format!("Failed to wait for claude: {}", e),
                }));
            }
        };
        let stderr = self.take_stderr();

        if status.success() || self.saw_result {
            if !stderr.trim().is_empty() {
                tracing::debug!("claude stderr: {}", stderr.trim());
            }
            return None;
        }

        let exit_code = status.code().unwrap_or(-1);
        let detail = if stderr.trim().is_empty() {
            String::new()
        } else {
            format!(": {}", stderr.trim())
        };
        Some(Err(CcrunError::AgentInvocationFailed {
            reason: format!("claude exited with code {}{}", exit_code, detail),
        }))
    }
}

impl Iterator for ClaudeStream {
    type Item = Result<SdkMessage, CcrunError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            if (self.is_cancelled)() {
                self.stop();
                return Some(Err(CcrunError::Interrupted));
            }

            match self.rx.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(message)) => {
                    if matches!(message, SdkMessage::Result(_)) {
                        self.saw_result = true;
                    }
                    return Some(Ok(message));
                }
                Ok(Err(e)) => {
                    self.stop();
                    return Some(Err(CcrunError::AgentInvocationFailed {
                        reason: format!("Failed to read agent output: {}", e),
                    }));
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return self.finish(),
            }
        }
    }
}

impl Drop for ClaudeStream {
    fn drop(&mut self) {
        if !self.finished {
            self.stop();
        }
    }
}
