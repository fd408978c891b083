//! Semantic color theme for terminal output
//!
//! - `active` => blue - message headers, startup banner
//! - `success` => green - completed runs, saved files
//! - `warning` => yellow - max-turns results, the bypass warning
//! - `fail` => red - errors
//!
//! Styles are empty when stdout is not a terminal or `NO_COLOR` is set, so
//! piped output stays free of escape codes.

use std::io::IsTerminal;
use std::sync::LazyLock;

use owo_colors::Style;

/// Semantic color definitions for terminal output
pub struct SemanticColors {
    pub active: Style,
    pub success: Style,
    pub warning: Style,
    pub fail: Style,
    /// Secondary details such as truncated tool input
    pub dim: Style,
}

impl SemanticColors {
    /// Styles that render text unchanged
    pub fn plain() -> Self {
        Self {
            active: Style::new(),
            success: Style::new(),
            warning: Style::new(),
            fail: Style::new(),
            dim: Style::new(),
        }
    }

    fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        if no_color || !std::io::stdout().is_terminal() {
            Self::plain()
        } else {
            Self::default()
        }
    }
}

impl Default for SemanticColors {
    fn default() -> Self {
        Self {
            active: Style::new().blue().bold(),
            success: Style::new().green(),
            warning: Style::new().yellow(),
            fail: Style::new().red(),
            dim: Style::new().dimmed(),
        }
    }
}

/// Global theme, resolved once per process
pub static COLORS: LazyLock<SemanticColors> = LazyLock::new(SemanticColors::detect);

#[cfg(test)]
mod tests {
    use super::*;
    use owo_colors::OwoColorize;

    #[test]
    fn test_plain_styles_leave_text_unchanged() {
        let colors = SemanticColors::plain();
        assert_eq!("ok".style(colors.success).to_string(), "ok");
        assert_eq!("bad".style(colors.fail).to_string(), "bad");
    }

    #[test]
    fn test_default_styles_add_escape_codes() {
        let colors = SemanticColors::default();
        let styled = "warn".style(colors.warning).to_string();
        assert!(styled.contains("warn"));
        assert!(styled.starts_with('\u{1b}'));
    }
}
