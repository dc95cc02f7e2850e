use std::fmt;
use std::path::Path;
use serde::{Deserialize, Serialize};

/// Length of the product prefix on installation directory names (`hfs19.5.493`).
pub const PREFIX_LEN: usize = 3;

/// A dotted version string taken from an installation directory name.
///
/// Components are kept verbatim: nothing checks that they are numeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct HoudiniVersion {
    components: Vec<String>,
}

impl HoudiniVersion {
    /// All components in order.
    pub fn components(&self) -> &[String] {
        &self.components
    }
    pub fn major(&self) -> Option<&str> {
        self.components.first().map(String::as_str)
    }
    pub fn minor(&self) -> Option<&str> {
        self.components.get(1).map(String::as_str)
    }
    pub fn patch(&self) -> Option<&str> {
        self.components.get(2).map(String::as_str)
    }
    /// Returns a copy holding at most the first two components.
    pub fn major_minor(&self) -> HoudiniVersion {
        HoudiniVersion {
            components: self.components.iter().take(2).cloned().collect(),
        }
    }
}

impl From<String> for HoudiniVersion {
    fn from(value: String) -> Self {
        HoudiniVersion::from(value.as_str())
    }
}

impl From<&str> for HoudiniVersion {
    fn from(value: &str) -> Self {
        HoudiniVersion {
            components: value.split('.').map(str::to_string).collect(),
        }
    }
}

impl From<HoudiniVersion> for String {
    fn from(value: HoudiniVersion) -> Self {
        value.to_string()
    }
}

impl fmt::Display for HoudiniVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.components.join("."))
    }
}

/// Derives the package version from the installation directory name.
///
/// Everything after the first [`PREFIX_LEN`] characters of the final path
/// segment is the version payload. With `major_minor_only` set, payloads with
/// more than two components are cut down to `{major}.{minor}`.
///
/// This never fails. A path without a usable final segment produces an empty
/// version, and non-numeric payloads are passed through unchanged.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use hbind::resolve_version;
///
/// let path = Path::new("/opt/hfs19.5.493");
/// assert_eq!(resolve_version(path, false).to_string(), "19.5.493");
/// assert_eq!(resolve_version(path, true).to_string(), "19.5");
/// ```
pub fn resolve_version<P: AsRef<Path>>(hfs_path: P, major_minor_only: bool) -> HoudiniVersion {
    let folder_name = hfs_path
        .as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let payload: String = folder_name.chars().skip(PREFIX_LEN).collect();
    let version = HoudiniVersion::from(payload.as_str());

    if major_minor_only && version.components.len() > 2 {
        version.major_minor()
    } else {
        version
    }
}
