use std::ops::Deref;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;
use crate::error::{BindError, Result};

/// Marker for internal helper binaries that should not be exposed as tools.
pub const HELPER_MARKER: &str = "-bin";

/// Sorted names of the user-facing executables an installation provides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolSet(Vec<String>);

impl ToolSet {
    /// Builds a tool set, sorting the names lexicographically.
    pub fn new(mut names: Vec<String>) -> Self {
        names.sort();
        ToolSet(names)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Deref for ToolSet {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for &'a ToolSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The directories scanned for tools: `$HB` and `$HSB`.
pub fn tool_dirs<P: AsRef<Path>>(hfs_path: P) -> [PathBuf; 2] {
    let root = hfs_path.as_ref();
    [root.join("bin"), root.join("houdini").join("sbin")]
}

/// Builds the list of tools an installation provides.
///
/// Only direct children of `bin/` and `houdini/sbin/` are considered. A child
/// becomes a tool when it is a regular file, not a symlink, executable for the
/// current process, and its name does not contain `-bin`. Names from both
/// directories are merged and sorted; a name present in both is listed twice.
///
/// # Errors
///
/// Returns [`BindError::DirectoryNotFound`] if either directory is missing.
pub fn discover_tools<P: AsRef<Path>>(hfs_path: P) -> Result<ToolSet> {
    let mut found_tools = Vec::new();

    for bin_path in tool_dirs(hfs_path) {
        if !bin_path.is_dir() {
            return Err(BindError::DirectoryNotFound { path: bin_path });
        }
        let before = found_tools.len();

        let entries = WalkDir::new(&bin_path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false);
        for entry in entries {
            let entry = entry?;
            if !entry.file_type().is_file() || entry.path_is_symlink() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.contains(HELPER_MARKER) {
                continue;
            }
            if !is_executable(entry.path()) {
                continue;
            }
            found_tools.push(name);
        }
        debug!(
            dir = %bin_path.display(),
            tools = found_tools.len() - before,
            "scanned tool directory"
        );
    }

    Ok(ToolSet::new(found_tools))
}

/// Checks execute permission for the current process.
#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use nix::unistd::{access, AccessFlags};
    access(path, AccessFlags::X_OK).is_ok()
}

/// Checks if a given path has a Windows executable extension (.exe, .bat, .cmd).
#[cfg(windows)]
fn is_executable(path: &Path) -> bool {
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        let ext = ext.to_ascii_lowercase();
        matches!(ext.as_str(), "exe" | "bat" | "cmd")
    } else {
        false
    }
}
