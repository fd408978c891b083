//! Usage text

use ccrun_core::args::FLAGS;
use ccrun_core::types::PermissionMode;
use ccrun_core::validation::KNOWN_TOOLS;

/// Tools per line in the "Available Tools" block
const TOOLS_PER_LINE: usize = 9;

pub fn generate_help() -> String {
    [
        generate_usage(),
        generate_description(),
        generate_options_help(),
        generate_examples(),
    ]
    .join("\n\n")
}

pub fn generate_usage() -> String {
    "Usage: ccrun [options]
       ccrun -i <prompt>
       ccrun -f <file>
       ccrun --continue -i <prompt>
       ccrun --resume <session-id> -i <prompt>"
        .to_string()
}

pub fn generate_description() -> String {
    "CCRun is a command-line wrapper around Claude Code.
It supports direct prompts, file input, session continuation, tool filtering
and saving the final result as JSON or text."
        .to_string()
}

pub fn generate_options_help() -> String {
    let modes: Vec<&str> = PermissionMode::ALL.iter().map(|m| m.as_str()).collect();
    let tools: Vec<String> = KNOWN_TOOLS
        .chunks(TOOLS_PER_LINE)
        .map(|chunk| format!("  {}", chunk.join(", ")))
        .collect();

    format!(
        "Options:
  -i, --input <prompt>          Prompt text to send to Claude
  -f, --file <file>             File whose content is sent as input
  --max-turns <number>          Maximum number of conversation turns (1-100)
  -c, --continue                Continue the most recent session
  --resume <session-id>         Resume a specific session by ID
  --allowed-tools <tools>       Comma-separated list of allowed tools
  --disallowed-tools <tools>    Comma-separated list of disallowed tools
  --permission-mode <mode>      Permission mode ({modes})
  -s, --settings-file <file>    Custom settings file path
  --system-prompt, -sp <text>   System prompt for Claude
  --system-prompt-file, -sp-f <file>
                                Load the system prompt from a file
  --custom-system-prompt, -csp <text>
                                Same as --system-prompt (deprecated)
  -o, --output, --output-enabled
                                Save the result with an auto-generated filename
  --output-file <file>          Save the result to this file
  --output-dir <directory>      Directory for result files (default: ./tmp/ccrun/results)
  --output-format <format>      Result file format: json or text (default: json)
  -h, --help                    Show this help message

  camelCase spellings are accepted too:
{aliases}

Available Tools:
{tools}",
        modes = modes.join("|"),
        aliases = camel_case_aliases(),
        tools = tools.join(",\n"),
    )
}

/// `--maxTurns`-style spellings from the flag table, wrapped four per line
fn camel_case_aliases() -> String {
    let aliases: Vec<&str> = FLAGS
        .iter()
        .flat_map(|flag| flag.aliases.iter().copied())
        .filter(|alias| alias.chars().any(|c| c.is_ascii_uppercase()))
        .collect();
    aliases
        .chunks(4)
        .map(|chunk| format!("    {}", chunk.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn generate_examples() -> String {
    r#"Examples:
  # Direct prompt
  ccrun -i "Explain how the borrow checker works"
  ccrun "Explain how the borrow checker works"

  # File input
  ccrun -f prompt.txt

  # Continue or resume a session
  ccrun --continue -i "Can you elaborate on that?"
  ccrun --resume session-abc123 -i "What did we decide?"

  # Limit turns and filter tools
  ccrun -i "Help me debug this code" --max-turns 5
  ccrun -i "Analyze this codebase" --allowed-tools "Read,Grep,LS"
  ccrun -i "Write documentation" --disallowed-tools "Bash,WebFetch"

  # Permission mode
  ccrun -i "Plan out the implementation" --permission-mode plan

  # Save results (disabled by default)
  ccrun -i "Analyze the code" --output-file analysis.json
  ccrun -i "Debug this issue" -o --output-dir ./results --output-format text

  # Settings and system prompts
  ccrun -i "Write tests" -s ../shared-settings.json
  ccrun -i "Review this code" --system-prompt "You are a security expert"
  ccrun -i "Refactor code" -sp-f ./prompts/refactor.txt"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_sections_in_order() {
        let help = generate_help();
        let usage = help.find("Usage: ccrun").unwrap();
        let options = help.find("Options:").unwrap();
        let tools = help.find("Available Tools:").unwrap();
        let examples = help.find("Examples:").unwrap();
        assert!(usage < options && options < tools && tools < examples);
    }

    #[test]
    fn test_help_lists_every_known_tool() {
        let options = generate_options_help();
        for tool in KNOWN_TOOLS {
            assert!(options.contains(tool), "missing tool {}", tool);
        }
        assert!(options.contains("default|acceptEdits|bypassPermissions|plan"));
    }

    #[test]
    fn test_help_lists_every_accepted_spelling() {
        let help = generate_help();
        for flag in FLAGS {
            for alias in flag.aliases {
                assert!(help.contains(alias), "missing {}", alias);
            }
        }
    }

    #[test]
    fn test_help_mentions_every_flag_family() {
        let help = generate_help();
        for flag in [
            "--input",
            "--file",
            "--max-turns",
            "--continue",
            "--resume",
            "--allowed-tools",
            "--disallowed-tools",
            "--permission-mode",
            "--settings-file",
            "--system-prompt",
            "--system-prompt-file",
            "--custom-system-prompt",
            "--output",
            "--output-enabled",
            "--output-file",
            "--output-dir",
            "--output-format",
            "--help",
        ] {
            assert!(help.contains(flag), "missing {}", flag);
        }
    }
}
