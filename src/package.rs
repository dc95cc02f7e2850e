use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Serialize};
use crate::environment::EnvironmentHooks;
use crate::error::{BindError, Result};
use crate::tools::ToolSet;
use crate::version::HoudiniVersion;

/// A version constraint on another package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRange {
    /// Any version sharing these leading components (`~python-3.9` accepts `3.9.18`).
    Weak(String),
    /// Exactly this version.
    Exact(String),
}

impl VersionRange {
    /// The version the range is anchored on.
    pub fn version(&self) -> &str {
        match self {
            VersionRange::Weak(version) | VersionRange::Exact(version) => version,
        }
    }

    /// Checks whether a concrete version satisfies the range.
    pub fn allows(&self, candidate: &str) -> bool {
        match self {
            VersionRange::Weak(version) => {
                candidate == version
                    || candidate
                        .strip_prefix(version.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            }
            VersionRange::Exact(version) => candidate == version,
        }
    }

    fn format_requirement(&self, name: &str) -> String {
        match self {
            VersionRange::Weak(version) => format!("~{name}-{version}"),
            VersionRange::Exact(version) => format!("{name}=={version}"),
        }
    }
}

/// Requirements on other packages, keyed by package name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<String>", try_from = "Vec<String>")]
pub struct Requirements(BTreeMap<String, VersionRange>);

impl Requirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the requirement on `name`.
    pub fn insert(&mut self, name: &str, range: VersionRange) {
        self.0.insert(name.to_string(), range);
    }

    pub fn get(&self, name: &str) -> Option<&VersionRange> {
        self.0.get(name)
    }

    /// Returns the requirement on `dependency`, failing if `package` never declared one.
    pub fn require(&self, dependency: &str, package: &str) -> Result<&VersionRange> {
        self.0
            .get(dependency)
            .ok_or_else(|| BindError::MissingDependencyDeclaration {
                package: package.to_string(),
                dependency: dependency.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Requirements in their textual form, ordered by package name.
    pub fn to_strings(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|(name, range)| range.format_requirement(name))
            .collect()
    }
}

impl From<Requirements> for Vec<String> {
    fn from(value: Requirements) -> Self {
        value.to_strings()
    }
}

impl TryFrom<Vec<String>> for Requirements {
    type Error = String;

    fn try_from(value: Vec<String>) -> std::result::Result<Self, Self::Error> {
        let mut requires = Requirements::new();
        for requirement in value {
            let (name, range) = parse_requirement(&requirement)
                .ok_or_else(|| format!("invalid requirement: {requirement}"))?;
            requires.insert(name, range);
        }
        Ok(requires)
    }
}

fn parse_requirement(requirement: &str) -> Option<(&str, VersionRange)> {
    if let Some(weak) = requirement.strip_prefix('~') {
        let (name, version) = weak.split_once('-')?;
        return (!name.is_empty() && !version.is_empty())
            .then(|| (name, VersionRange::Weak(version.to_string())));
    }
    let (name, version) = requirement.split_once("==")?;
    (!name.is_empty() && !version.is_empty())
        .then(|| (name, VersionRange::Exact(version.to_string())))
}

impl fmt::Display for Requirements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_strings().join(", "))
    }
}

/// Everything the registry needs to know about a bound installation.
///
/// Built once through [`PackageDescriptorBuilder`] and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    name: String,
    version: HoudiniVersion,
    description: String,
    has_plugins: bool,
    tools: ToolSet,
    requires: Requirements,
    variants: Vec<Vec<String>>,
    hooks: EnvironmentHooks,
}

impl PackageDescriptor {
    pub fn builder(name: &str, version: HoudiniVersion) -> PackageDescriptorBuilder {
        PackageDescriptorBuilder::new(name, version)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn version(&self) -> &HoudiniVersion {
        &self.version
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn has_plugins(&self) -> bool {
        self.has_plugins
    }
    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }
    pub fn requires(&self) -> &Requirements {
        &self.requires
    }
    /// Variant selectors, e.g. `[["platform-linux", "arch-x86_64"]]`.
    pub fn variants(&self) -> &[Vec<String>] {
        &self.variants
    }
    pub fn hooks(&self) -> &EnvironmentHooks {
        &self.hooks
    }

    /// Renders the descriptor as a `package.toml` document.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Collects descriptor fields and checks them in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct PackageDescriptorBuilder {
    name: String,
    version: HoudiniVersion,
    description: String,
    has_plugins: bool,
    tools: ToolSet,
    requires: Requirements,
    variants: Vec<Vec<String>>,
    hooks: EnvironmentHooks,
    required_dependency: Option<String>,
}

impl PackageDescriptorBuilder {
    pub fn new(name: &str, version: HoudiniVersion) -> Self {
        PackageDescriptorBuilder {
            name: name.to_string(),
            version,
            description: String::new(),
            has_plugins: false,
            tools: ToolSet::default(),
            requires: Requirements::new(),
            variants: Vec::new(),
            hooks: EnvironmentHooks::default(),
            required_dependency: None,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn has_plugins(mut self, has_plugins: bool) -> Self {
        self.has_plugins = has_plugins;
        self
    }

    pub fn tools(mut self, tools: ToolSet) -> Self {
        self.tools = tools;
        self
    }

    pub fn requires(mut self, requires: Requirements) -> Self {
        self.requires = requires;
        self
    }

    pub fn variant(mut self, variant: Vec<String>) -> Self {
        self.variants.push(variant);
        self
    }

    pub fn hooks(mut self, hooks: EnvironmentHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Makes [`build`](Self::build) fail unless `requires` names this package.
    pub fn require_dependency(mut self, dependency: &str) -> Self {
        self.required_dependency = Some(dependency.to_string());
        self
    }

    pub fn build(self) -> Result<PackageDescriptor> {
        if let Some(dependency) = &self.required_dependency {
            self.requires.require(dependency, &self.name)?;
        }
        Ok(PackageDescriptor {
            name: self.name,
            version: self.version,
            description: self.description,
            has_plugins: self.has_plugins,
            tools: self.tools,
            requires: self.requires,
            variants: self.variants,
            hooks: self.hooks,
        })
    }
}
