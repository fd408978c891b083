//! Command-line argument parsing
//!
//! The grammar is a fixed table of flags consumed by one loop. Every flag has
//! one or more spellings (kebab-case, camelCase, short forms) and either takes
//! the next token as its value or acts as a switch.
//!
//! Parsing is deliberately permissive: unknown tokens are skipped, and values
//! that fail a flag's validator are dropped instead of reported. The first
//! token no flag consumed becomes the prompt when neither `-i` nor `-f` is
//! given, even if it starts with `-`. Flag values, by contrast, may never
//! start with `-`; such a token is treated as a missing value.

use crate::error::CcrunError;
use crate::types::{OutputFormat, ParsedArguments, PermissionMode};
use crate::validation::{is_blank, validate_max_turns, validate_permission_mode};

/// What a flag does with its token(s)
pub enum FlagAction {
    /// Takes no value
    Switch(fn(&mut ParsedArguments)),
    /// Consumes the next token
    Value {
        /// Values failing this check are ignored
        validator: Option<fn(&str) -> bool>,
        apply: fn(&mut ParsedArguments, &str),
    },
}

/// One recognized flag
pub struct FlagSpec {
    /// Spellings in canonical order; the first is the primary name
    pub aliases: &'static [&'static str],
    pub action: FlagAction,
}

impl FlagSpec {
    pub fn takes_value(&self) -> bool {
        matches!(self.action, FlagAction::Value { .. })
    }

    /// All spellings joined with `/`, as used in error messages
    pub fn display_name(&self) -> String {
        self.aliases.join("/")
    }
}

/// Leading integer of `value`: optional sign then digits, trailing text ignored.
///
/// `"5.5"` reads as 5 and `"10abc"` as 10; no leading digits is `None`.
/// Out-of-range magnitudes saturate and are rejected later by validation.
fn parse_max_turns(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let magnitude = rest[..digits_len].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

fn is_integer(value: &str) -> bool {
    parse_max_turns(value).is_some()
}

fn is_output_format(value: &str) -> bool {
    value.parse::<OutputFormat>().is_ok()
}

/// Strip all whitespace, split on commas, drop empty entries
pub fn parse_tool_list(value: &str) -> Vec<String> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .split(',')
        .filter(|tool| !tool.is_empty())
        .map(str::to_string)
        .collect()
}

/// The flag table
pub static FLAGS: &[FlagSpec] = &[
    FlagSpec {
        aliases: &["-i", "--input"],
        action: FlagAction::Value {
            validator: None,
            apply: |args, v| args.prompt = Some(v.to_string()),
        },
    },
    FlagSpec {
        aliases: &["-f", "--file"],
        action: FlagAction::Value {
            validator: None,
            apply: |args, v| args.input_file = Some(v.to_string()),
        },
    },
    FlagSpec {
        aliases: &["--max-turns", "--maxTurns"],
        action: FlagAction::Value {
            validator: Some(is_integer),
            apply: |args, v| args.max_turns = parse_max_turns(v),
        },
    },
    FlagSpec {
        aliases: &["-c", "--continue"],
        action: FlagAction::Switch(|args| args.continue_session = true),
    },
    FlagSpec {
        aliases: &["--resume"],
        action: FlagAction::Value {
            validator: None,
            apply: |args, v| args.session_id = Some(v.to_string()),
        },
    },
    FlagSpec {
        aliases: &["--allowedTools", "--allowed-tools"],
        action: FlagAction::Value {
            validator: None,
            apply: |args, v| args.allowed_tools = Some(parse_tool_list(v)),
        },
    },
    FlagSpec {
        aliases: &["--disallowedTools", "--disallowed-tools"],
        action: FlagAction::Value {
            validator: None,
            apply: |args, v| args.disallowed_tools = Some(parse_tool_list(v)),
        },
    },
    FlagSpec {
        aliases: &["--permission-mode", "--permissionMode"],
        action: FlagAction::Value {
            validator: Some(validate_permission_mode),
            apply: |args, v| args.permission_mode = v.parse::<PermissionMode>().ok(),
        },
    },
    FlagSpec {
        aliases: &["--settingsFile", "--settings-file", "-s"],
        action: FlagAction::Value {
            validator: None,
            apply: |args, v| args.settings_file = Some(v.to_string()),
        },
    },
    FlagSpec {
        aliases: &["-o", "--output"],
        action: FlagAction::Switch(|args| args.output_enabled = true),
    },
    FlagSpec {
        aliases: &["--output-enabled", "--outputEnabled"],
        action: FlagAction::Switch(|args| args.output_enabled = true),
    },
    FlagSpec {
        aliases: &["--output-file", "--outputFile"],
        action: FlagAction::Value {
            validator: None,
            apply: |args, v| args.output_file = Some(v.to_string()),
        },
    },
    FlagSpec {
        aliases: &["--output-dir", "--outputDir"],
        action: FlagAction::Value {
            validator: None,
            apply: |args, v| args.output_dir = Some(v.to_string()),
        },
    },
    FlagSpec {
        aliases: &["--output-format", "--outputFormat"],
        action: FlagAction::Value {
            validator: Some(is_output_format),
            apply: |args, v| args.output_format = v.parse::<OutputFormat>().ok(),
        },
    },
    // deprecated spelling, kept for existing scripts
    FlagSpec {
        aliases: &["--custom-system-prompt", "--customSystemPrompt", "-csp"],
        action: FlagAction::Value {
            validator: None,
            apply: |args, v| args.custom_system_prompt = Some(v.to_string()),
        },
    },
    FlagSpec {
        aliases: &["--system-prompt", "--systemPrompt", "-sp"],
        action: FlagAction::Value {
            validator: None,
            apply: |args, v| args.custom_system_prompt = Some(v.to_string()),
        },
    },
    FlagSpec {
        aliases: &["--system-prompt-file", "--systemPromptFile", "-sp-f"],
        action: FlagAction::Value {
            validator: None,
            apply: |args, v| args.system_prompt_file = Some(v.to_string()),
        },
    },
    FlagSpec {
        aliases: &["-h", "--help"],
        action: FlagAction::Switch(|args| args.help = true),
    },
];

/// Look up a flag by any of its spellings
pub fn find_flag(token: &str) -> Option<&'static FlagSpec> {
    FLAGS.iter().find(|flag| flag.aliases.contains(&token))
}

fn is_unset(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

/// Parse `argv` (program name excluded)
pub fn parse_args<S: AsRef<str>>(argv: &[S]) -> Result<ParsedArguments, CcrunError> {
    let mut args = ParsedArguments::default();
    let mut consumed = vec![false; argv.len()];

    let mut i = 0;
    while i < argv.len() {
        let token = argv[i].as_ref();
        let Some(flag) = find_flag(token) else {
            i += 1;
            continue;
        };
        consumed[i] = true;

        match &flag.action {
            FlagAction::Switch(apply) => apply(&mut args),
            FlagAction::Value { validator, apply } => {
                let value = match argv.get(i + 1).map(|v| v.as_ref()) {
                    Some(v) if !v.starts_with('-') => v,
                    _ => {
                        return Err(CcrunError::MissingValue {
                            option: flag.display_name(),
                        });
                    }
                };
                i += 1;
                consumed[i] = true;

                match validator {
                    Some(check) if !check(value) => {
                        tracing::warn!("ignoring invalid value for {}: {}", flag.aliases[0], value);
                    }
                    _ => apply(&mut args, value),
                }
            }
        }
        i += 1;
    }

    if is_unset(args.prompt.as_deref()) && is_unset(args.input_file.as_deref()) && !args.help {
        if let Some(pos) = consumed.iter().position(|used| !used) {
            args.prompt = Some(argv[pos].as_ref().to_string());
        }
    }

    Ok(args)
}

/// First violated rule, or `None` when the arguments are usable
pub fn validation_error(args: &ParsedArguments) -> Option<String> {
    if args.help {
        return None;
    }

    let rule = if is_unset(args.prompt.as_deref()) && is_unset(args.input_file.as_deref()) {
        "Please provide either -i <prompt> or -f <file>"
    } else if args.max_turns.is_some_and(|n| !validate_max_turns(n)) {
        "Max turns must be between 1 and 100"
    } else if is_blank(args.session_id.as_deref()) {
        "Session ID must be a non-empty string"
    } else if is_blank(args.settings_file.as_deref()) {
        "Settings file path must be a non-empty string"
    } else if is_blank(args.output_file.as_deref()) {
        "Output file path must be a non-empty string"
    } else if is_blank(args.output_dir.as_deref()) {
        "Output directory path must be a non-empty string"
    } else if is_blank(args.custom_system_prompt.as_deref()) {
        "Custom system prompt must be a non-empty string"
    } else if is_blank(args.system_prompt_file.as_deref()) {
        "System prompt file path must be a non-empty string"
    } else if args.continue_session && args.session_id.is_some() {
        "Cannot use both --continue and --resume options"
    } else {
        return None;
    };
    Some(rule.to_string())
}
