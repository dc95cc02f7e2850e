//! Environment setup for a bound installation.
//!
//! The three phases mirror the usual `houdini_setup` script: `pre_commands`
//! exports the `HFS` family of variables, `commands` puts `$HB` and `$HSB` on
//! `PATH`, and `post_commands` repairs search paths that other packages may
//! have set without Houdini's `&` default marker.
//!
//! Hooks are plain data. [`render_posix`] turns them into a sourceable script.

use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::package::Requirements;
use crate::version::HoudiniVersion;

/// Placeholder replaced with the variant root when hooks are rendered.
pub const ROOT_PLACEHOLDER: &str = "{root}";

/// Search path variables that must keep Houdini's default `&` entry.
pub const SPECIAL_PATHS: [&str; 5] = [
    "HOUDINI_PATH",
    "HOUDINI_DSO_PATH",
    "HOUDINI_OTLSCAN_PATH",
    "HOUDINI_SCRIPT_PATH",
    "HOUDINI_TOOLBAR_PATH",
];

/// A single environment operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EnvOp {
    Set { name: String, value: String },
    Prepend { name: String, value: String },
    Append { name: String, value: String },
    /// Appends `value` to `name` only if `name` is defined and lacks `value`.
    AppendIfDefined { name: String, value: String },
}

impl EnvOp {
    fn set(name: &str, value: impl Into<String>) -> Self {
        EnvOp::Set { name: name.to_string(), value: value.into() }
    }
    fn prepend(name: &str, value: impl Into<String>) -> Self {
        EnvOp::Prepend { name: name.to_string(), value: value.into() }
    }
    fn append(name: &str, value: impl Into<String>) -> Self {
        EnvOp::Append { name: name.to_string(), value: value.into() }
    }

    pub fn name(&self) -> &str {
        match self {
            EnvOp::Set { name, .. }
            | EnvOp::Prepend { name, .. }
            | EnvOp::Append { name, .. }
            | EnvOp::AppendIfDefined { name, .. } => name,
        }
    }
}

/// The environment phases attached to a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentHooks {
    pub pre_commands: Vec<EnvOp>,
    pub commands: Vec<EnvOp>,
    pub post_commands: Vec<EnvOp>,
}

impl EnvironmentHooks {
    /// Builds all three phases for a package.
    ///
    /// # Errors
    ///
    /// Fails when `requires` has no entry for `python_package`.
    pub fn for_package(
        package_name: &str,
        requires: &Requirements,
        python_package: &str,
    ) -> Result<Self> {
        Ok(EnvironmentHooks {
            pre_commands: pre_commands(package_name, requires, python_package)?,
            commands: commands(),
            post_commands: post_commands(),
        })
    }
}

/// Turns a package name into the stem used by `REZ_<NAME>_*` variables.
pub fn rez_var_stem(package_name: &str) -> String {
    package_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

/// Variables set before the package's main commands.
pub fn pre_commands(
    package_name: &str,
    requires: &Requirements,
    python_package: &str,
) -> Result<Vec<EnvOp>> {
    let python = requires.require(python_package, package_name)?;
    let stem = rez_var_stem(package_name);

    Ok(vec![
        EnvOp::set("HOUDINI_PYTHON_VERSION", python.version()),
        EnvOp::set("HOUDINI_MAJOR_RELEASE", format!("${{REZ_{stem}_MAJOR_VERSION}}")),
        EnvOp::set("HOUDINI_MINOR_RELEASE", format!("${{REZ_{stem}_MINOR_VERSION}}")),
        EnvOp::set("HOUDINI_BUILD_VERSION", format!("${{REZ_{stem}_PATCH_VERSION}}")),
        EnvOp::set(
            "HOUDINI_VERSION",
            "${HOUDINI_MAJOR_RELEASE}.${HOUDINI_MINOR_RELEASE}.${HOUDINI_BUILD_VERSION}",
        ),
        EnvOp::set("HFS", format!("{ROOT_PLACEHOLDER}/ext")),
        EnvOp::set("H", "${HFS}"),
        EnvOp::set("HB", "${H}/bin"),
        EnvOp::set("HDSO", "${H}/dsolib"),
        EnvOp::set("HH", "${H}/houdini"),
        EnvOp::set("HHC", "${HH}/config"),
        EnvOp::set("HHP", "${HH}/python${HOUDINI_PYTHON_VERSION}libs"),
        EnvOp::set("HT", "${H}/toolkit"),
        EnvOp::set("HSB", "${HH}/sbin"),
        EnvOp::set("TEMP", "/tmp"),
        EnvOp::prepend("LD_LIBRARY_PATH", "$HDSO"),
        EnvOp::set("HIH", "${HOME}/houdini${HOUDINI_MAJOR_RELEASE}.${HOUDINI_MINOR_RELEASE}"),
        EnvOp::set("HIS", "${HH}"),
        EnvOp::append("CMAKE_PREFIX_PATH", "${HT}/cmake"),
    ])
}

/// Main commands: the Houdini bin directories go to the front of `PATH`.
pub fn commands() -> Vec<EnvOp> {
    vec![
        EnvOp::prepend("PATH", "$HSB"),
        EnvOp::prepend("PATH", "$HB"),
    ]
}

/// Ensures any Houdini search path set by another package keeps `&`.
pub fn post_commands() -> Vec<EnvOp> {
    SPECIAL_PATHS
        .iter()
        .map(|name| EnvOp::AppendIfDefined {
            name: name.to_string(),
            value: "&".to_string(),
        })
        .collect()
}

/// Renders hooks as a POSIX `sh` script to be sourced.
///
/// `REZ_<NAME>_VERSION` and its component variables are exported first so
/// the templated values resolve without the package manager's help.
pub fn render_posix(
    hooks: &EnvironmentHooks,
    package_name: &str,
    version: &HoudiniVersion,
    root: &str,
) -> String {
    let stem = rez_var_stem(package_name);
    let root = escape_double_quoted(root);
    let mut script = String::from("#!/bin/sh\n");
    script.push_str(&format!("# environment for {package_name}-{version}\n"));

    let components = [
        ("VERSION", Some(version.to_string())),
        ("MAJOR_VERSION", version.major().map(str::to_string)),
        ("MINOR_VERSION", version.minor().map(str::to_string)),
        ("PATCH_VERSION", version.patch().map(str::to_string)),
    ];
    for (suffix, value) in components {
        let value = value.unwrap_or_default();
        script.push_str(&format!("export REZ_{stem}_{suffix}=\"{}\"\n", escape_double_quoted(&value)));
    }
    script.push_str(&format!("export REZ_{stem}_ROOT=\"{root}\"\n"));

    for phase in [&hooks.pre_commands, &hooks.commands, &hooks.post_commands] {
        script.push('\n');
        for op in phase {
            script.push_str(&render_op(op, &root));
        }
    }
    script
}

fn render_op(op: &EnvOp, root: &str) -> String {
    match op {
        EnvOp::Set { name, value } => {
            format!("export {name}=\"{}\"\n", value.replace(ROOT_PLACEHOLDER, root))
        }
        EnvOp::Prepend { name, value } => {
            let value = value.replace(ROOT_PLACEHOLDER, root);
            format!("export {name}=\"{value}${{{name}:+:${name}}}\"\n")
        }
        EnvOp::Append { name, value } => {
            let value = value.replace(ROOT_PLACEHOLDER, root);
            format!("export {name}=\"${{{name}:+${name}:}}{value}\"\n")
        }
        EnvOp::AppendIfDefined { name, value } => {
            let value = value.replace(ROOT_PLACEHOLDER, root);
            format!(
                "if [ -n \"${{{name}+x}}\" ]; then\n    case \"${name}\" in\n        *\"{value}\"*) ;;\n        *) export {name}=\"${{{name}:+${name}:}}{value}\" ;;\n    esac\nfi\n"
            )
        }
    }
}

fn escape_double_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
