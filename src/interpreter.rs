use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::error::{BindError, Result};

/// Resolved interpreter filenames look like `python3.11`.
static PYTHON_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^python([0-9])\.([0-9]+)$").unwrap());

/// `{major}.{minor}` of the interpreter bundled with an installation.
///
/// Components are the digits captured from the filename, kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterpreterVersion {
    pub major: String,
    pub minor: String,
}

impl fmt::Display for InterpreterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Location of the interpreter entry point inside an installation.
pub fn python_bin_path<P: AsRef<Path>>(hfs_path: P) -> PathBuf {
    hfs_path.as_ref().join("python").join("bin").join("python")
}

/// Determines the bundled Python `{major}.{minor}` from `$HFS/python/bin/python`.
///
/// The entry point is normally a bare `python` symlink, so every link is
/// followed first and the version is read from the final target's filename.
///
/// # Errors
///
/// Returns [`BindError::InterpreterNotFound`] when the entry point is missing
/// or the resolved name does not look like `python{digit}.{digits}`. The error
/// carries the resolved path when resolution succeeded, else the attempted one.
pub fn resolve_python_version<P: AsRef<Path>>(hfs_path: P) -> Result<InterpreterVersion> {
    let python_bin = python_bin_path(hfs_path);
    let resolved = match std::fs::canonicalize(&python_bin) {
        Ok(resolved) => resolved,
        Err(e) => {
            debug!(path = %python_bin.display(), error = %e, "interpreter entry point did not resolve");
            return Err(BindError::InterpreterNotFound { path: python_bin });
        }
    };

    parse_python_file_name(&resolved).ok_or(BindError::InterpreterNotFound { path: resolved })
}

/// Reads the interpreter version out of a resolved filename, if it has one.
fn parse_python_file_name(path: &Path) -> Option<InterpreterVersion> {
    let file_name = path.file_name()?.to_str()?;
    let captures = PYTHON_NAME.captures(file_name)?;
    Some(InterpreterVersion {
        major: captures[1].to_string(),
        minor: captures[2].to_string(),
    })
}
