//! Final prompt assembly

use std::path::Path;

use crate::error::CcrunError;
use crate::file::{read_file, validate_path};
use crate::types::RunConfig;

/// Build the prompt sent to the delegate.
///
/// Input file content comes first under `# Input File`, followed by the inline
/// prompt under `# Prompt`. Each block is wrapped in blank lines so the
/// result never starts with a flag-like token.
pub fn resolve_prompt(config: &RunConfig, base_dir: &Path) -> Result<String, CcrunError> {
    let input_file = config.input_file.as_deref().filter(|f| !f.is_empty());
    let inline = config.prompt.as_deref().filter(|p| !p.is_empty());
    if input_file.is_none() && inline.is_none() {
        return Err(CcrunError::InvalidConfig(
            "no prompt or input file provided".to_string(),
        ));
    }

    let mut prompt = String::new();

    if let Some(path) = input_file {
        if !validate_path(path, base_dir) {
            return Err(CcrunError::InvalidInputFile {
                path: path.to_string(),
            });
        }
        let content = read_file(path, base_dir)?;
        prompt.push_str(&format!("\n\n# Input File\n{}\n\n", content));
    }

    if let Some(text) = inline {
        prompt.push_str(&format!("\n\n# Prompt\n{}\n\n", text));
    }

    Ok(prompt)
}
