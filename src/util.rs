use std::path::PathBuf;
use semver::Version;

/// Returns the platform name used in variant selectors (`linux`, `osx`, `windows`).
pub fn current_platform() -> String {
    match std::env::consts::OS {
        "macos" => "osx".to_string(),
        os => os.to_string(),
    }
}

/// Returns the architecture name used in variant selectors (e.g. `x86_64`).
pub fn current_arch() -> String {
    match std::env::consts::ARCH {
        "x86" => "i686".to_string(),
        arch => arch.to_string(),
    }
}

/// The variant a bind produces on this machine, e.g. `["platform-linux", "arch-x86_64"]`.
pub fn system_variant() -> Vec<String> {
    vec![
        format!("platform-{}", current_platform()),
        format!("arch-{}", current_arch()),
    ]
}

/// Directory of a variant below its version directory.
pub fn variant_subpath(variant: &[String]) -> PathBuf {
    variant.iter().collect()
}

/// Parses loose versions (`19.5`, `20.0.547`) by padding to three components.
fn parse_loose_semver(version: &str) -> Option<Version> {
    let mut parts: Vec<&str> = version.split('.').collect();
    if parts.len() > 3 {
        return None;
    }
    while parts.len() < 3 {
        parts.push("0");
    }
    Version::parse(&parts.join(".")).ok()
}

/// Sorts version strings ascending.
///
/// Numeric ordering is used when every version parses; otherwise the list is
/// ordered lexicographically so arbitrary directory names still sort stably.
pub fn sort_versions(mut versions: Vec<String>) -> Vec<String> {
    let parsed: Option<Vec<Version>> = versions.iter().map(|v| parse_loose_semver(v)).collect();
    match parsed {
        Some(parsed) => {
            let mut pairs: Vec<(Version, String)> = parsed.into_iter().zip(versions).collect();
            pairs.sort();
            pairs.into_iter().map(|(_, version)| version).collect()
        }
        None => {
            versions.sort();
            versions
        }
    }
}
