//! Reading user-supplied input files

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CcrunError;

/// Resolve `path` against `base_dir` unless it is already absolute
pub fn resolve_input_path(path: &str, base_dir: &Path) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base_dir.join(candidate)
    }
}

/// True when `path` names an existing regular file
pub fn validate_path(path: &str, base_dir: &Path) -> bool {
    if path.is_empty() {
        return false;
    }
    resolve_input_path(path, base_dir).is_file()
}

/// Read a UTF-8 text file
pub fn read_file(path: &str, base_dir: &Path) -> Result<String, CcrunError> {
    let resolved = resolve_input_path(path, base_dir);
    fs::read_to_string(&resolved).map_err(|e| CcrunError::FileRead {
        path: path.to_string(),
        reason: e.to_string(),
    })
}
