use std::path::{Path, PathBuf};
use tracing::{debug, info};
use crate::environment::EnvironmentHooks;
use crate::error::{BindError, Result};
use crate::interpreter::resolve_python_version;
use crate::link::link_installation;
use crate::package::{PackageDescriptor, Requirements, VersionRange};
use crate::registry::{InstalledVariant, PackageRegistry};
use crate::tools::discover_tools;
use crate::util::system_variant;
use crate::version::resolve_version;

pub const DEFAULT_PACKAGE_NAME: &str = "houdini";
pub const DEFAULT_PYTHON_PACKAGE: &str = "python";
pub const DEFAULT_DESCRIPTION: &str = "Base Houdini package";

/// Settings for a single bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindOptions {
    /// Name the package is registered under.
    pub package_name: String,
    /// Register `{major}.{minor}` instead of the full build version.
    pub major_minor_only: bool,
    /// Name of the interpreter package the descriptor depends on.
    pub python_package: String,
    pub description: String,
}

impl Default for BindOptions {
    fn default() -> Self {
        BindOptions {
            package_name: DEFAULT_PACKAGE_NAME.to_string(),
            major_minor_only: false,
            python_package: DEFAULT_PYTHON_PACKAGE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
        }
    }
}

/// The result of a successful bind.
#[derive(Debug, Clone)]
pub struct BindOutcome {
    pub descriptor: PackageDescriptor,
    pub installed: Vec<InstalledVariant>,
}

/// Inspects an installation and builds its package descriptor.
///
/// The steps run cheapest first: version from the directory name, then the
/// interpreter version, then the tool directory scan. Any failure is returned
/// as is. Relative paths are made absolute first, so `.` names the current
/// directory's version.
pub fn describe(hfs_path: &Path, options: &BindOptions) -> Result<PackageDescriptor> {
    let hfs_path = &absolute_installation_path(hfs_path)?;
    let version = resolve_version(hfs_path, options.major_minor_only);
    debug!(%version, "resolved package version");

    let python_version = resolve_python_version(hfs_path)?;
    debug!(%python_version, "resolved python version");

    let tools = discover_tools(hfs_path)?;
    debug!(count = tools.len(), "discovered tools");

    let mut requires = Requirements::new();
    requires.insert(
        &options.python_package,
        VersionRange::Weak(python_version.to_string()),
    );
    let hooks = EnvironmentHooks::for_package(&options.package_name, &requires, &options.python_package)?;

    PackageDescriptor::builder(&options.package_name, version)
        .description(&options.description)
        .has_plugins(true)
        .tools(tools)
        .requires(requires)
        .variant(system_variant())
        .hooks(hooks)
        .require_dependency(&options.python_package)
        .build()
}

/// Binds the installation at `hfs_path` into `registry`.
///
/// Every variant root gets an `ext` symlink to the installation, so the
/// package references the installed files instead of copying them. Nothing is
/// registered if any step fails.
pub fn bind<R: PackageRegistry + ?Sized>(
    hfs_path: &Path,
    options: &BindOptions,
    registry: &R,
) -> Result<BindOutcome> {
    let hfs_path = absolute_installation_path(hfs_path)?;
    let descriptor = describe(&hfs_path, options)?;

    let make_root = |variant_root: &Path| -> Result<()> {
        link_installation(&hfs_path, variant_root)?;
        Ok(())
    };
    let installed = registry.install(&descriptor, &make_root)?;
    info!(
        package = descriptor.name(),
        version = %descriptor.version(),
        hfs = %hfs_path.display(),
        "bound installation"
    );

    Ok(BindOutcome { descriptor, installed })
}

/// Makes the path absolute so the `ext` link stays valid from any directory.
fn absolute_installation_path(hfs_path: &Path) -> Result<PathBuf> {
    std::path::absolute(hfs_path).map_err(|e| BindError::io(hfs_path, e))
}
