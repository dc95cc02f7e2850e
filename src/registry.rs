use std::fs;
use std::path::{Path, PathBuf};
use serde::Serialize;
use tracing::{debug, info, warn};
use crate::environment::render_posix;
use crate::error::{BindError, Result};
use crate::package::PackageDescriptor;
use crate::util::{sort_versions, variant_subpath};
use crate::version::HoudiniVersion;

/// File holding the package definition inside a version directory.
pub const PACKAGE_FILE: &str = "package.toml";

/// Environment script written into every variant root.
pub const ACTIVATE_FILE: &str = "activate";

/// One installed variant of a registered package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledVariant {
    /// Name of the package.
    pub name: String,
    /// The registered version.
    pub version: HoudiniVersion,
    /// Position of the variant in the descriptor's variant list.
    pub index: usize,
    /// Directory the variant's `{root}` expands to.
    pub root: PathBuf,
}

/// Callback that fills a freshly created variant root.
pub type MakeRoot<'a> = dyn Fn(&Path) -> Result<()> + 'a;

/// A place packages can be registered in.
pub trait PackageRegistry {
    /// Registers `descriptor`, calling `make_root` once per variant root.
    ///
    /// Either every variant is installed or none is.
    fn install(
        &self,
        descriptor: &PackageDescriptor,
        make_root: &MakeRoot<'_>,
    ) -> Result<Vec<InstalledVariant>>;
}

/// A package repository on the local filesystem.
///
/// Packages live in `<root>/<name>/<version>/`, with the definition in
/// `package.toml` and one sub-directory per variant.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
    force: bool,
}

impl LocalRepository {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        LocalRepository {
            root: root.into(),
            force: false,
        }
    }

    /// Allows replacing a version that is already registered.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a given package version.
    pub fn version_dir(&self, name: &str, version: &HoudiniVersion) -> PathBuf {
        self.root.join(name).join(version.to_string())
    }

    /// Lists the registered versions of `name`, oldest first.
    pub fn list(&self, name: &str) -> Result<Vec<String>> {
        let package_dir = self.root.join(name);
        if !package_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut versions = Vec::new();
        let entries = fs::read_dir(&package_dir).map_err(|e| BindError::io(&package_dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| BindError::io(&package_dir, e))?;
            let version = entry.file_name().to_string_lossy().to_string();
            if !version.starts_with('.') && entry.path().join(PACKAGE_FILE).is_file() {
                versions.push(version);
            }
        }
        Ok(sort_versions(versions))
    }

    /// Names of all packages with at least one registered version.
    pub fn packages(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        let entries = fs::read_dir(&self.root).map_err(|e| BindError::io(&self.root, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| BindError::io(&self.root, e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if !self.list(&name)?.is_empty() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Reads back a registered package definition.
    pub fn load(&self, name: &str, version: &HoudiniVersion) -> Result<PackageDescriptor> {
        let path = self.version_dir(name, version).join(PACKAGE_FILE);
        let content = fs::read_to_string(&path).map_err(|e| BindError::io(&path, e))?;
        toml::from_str(&content).map_err(|source| BindError::TomlDeserialize { path, source })
    }

    /// Writes a complete version into `build_dir`.
    ///
    /// Variant roots are populated inside `build_dir`, but scripts and the
    /// returned roots refer to `version_dir`, where the build is moved later.
    fn write_version(
        &self,
        descriptor: &PackageDescriptor,
        build_dir: &Path,
        version_dir: &Path,
        make_root: &MakeRoot<'_>,
    ) -> Result<Vec<InstalledVariant>> {
        // A package without variants is installed straight into its version directory.
        let no_variant: [Vec<String>; 1] = [Vec::new()];
        let variants = if descriptor.variants().is_empty() {
            &no_variant[..]
        } else {
            descriptor.variants()
        };

        let mut installed = Vec::with_capacity(variants.len());
        for (index, variant) in variants.iter().enumerate() {
            let subpath = variant_subpath(variant);
            let build_root = build_dir.join(&subpath);
            let variant_root = version_dir.join(&subpath);
            fs::create_dir_all(&build_root).map_err(|e| BindError::io(&build_root, e))?;
            make_root(&build_root)?;

            let script = render_posix(
                descriptor.hooks(),
                descriptor.name(),
                descriptor.version(),
                &variant_root.to_string_lossy(),
            );
            let activate = build_root.join(ACTIVATE_FILE);
            fs::write(&activate, script).map_err(|e| BindError::io(&activate, e))?;
            debug!(root = %variant_root.display(), "variant root populated");

            installed.push(InstalledVariant {
                name: descriptor.name().to_string(),
                version: descriptor.version().clone(),
                index,
                root: variant_root,
            });
        }

        let definition = build_dir.join(PACKAGE_FILE);
        fs::write(&definition, descriptor.to_toml()?).map_err(|e| BindError::io(&definition, e))?;
        Ok(installed)
    }

    /// Moves a finished build to `version_dir`, replacing what was there.
    ///
    /// The previous version is kept aside until the new one is in place and
    /// put back if the move fails.
    fn swap_into_place(&self, build_dir: &Path, version_dir: &Path, backup_dir: &Path) -> Result<()> {
        if !version_dir.exists() {
            return fs::rename(build_dir, version_dir).map_err(|e| BindError::io(version_dir, e));
        }

        info!(path = %version_dir.display(), "replacing registered package");
        if backup_dir.exists() {
            fs::remove_dir_all(backup_dir).map_err(|e| BindError::io(backup_dir, e))?;
        }
        fs::rename(version_dir, backup_dir).map_err(|e| BindError::io(version_dir, e))?;

        if let Err(e) = fs::rename(build_dir, version_dir) {
            if let Err(restore) = fs::rename(backup_dir, version_dir) {
                warn!(path = %backup_dir.display(), error = %restore, "could not restore previous package");
            }
            return Err(BindError::io(version_dir, e));
        }
        if let Err(e) = fs::remove_dir_all(backup_dir) {
            warn!(path = %backup_dir.display(), error = %e, "could not remove previous package");
        }
        Ok(())
    }
}

/// Rejects names and versions that would not map to their own directory.
fn check_path_segments(name: &str, version: &str) -> Result<()> {
    for (what, value) in [("name", name), ("version", version)] {
        let reason = if value.is_empty() {
            "is empty"
        } else if value.starts_with('.') {
            "starts with a dot"
        } else if value.contains(['/', '\\']) {
            "contains a path separator"
        } else {
            continue;
        };
        return Err(BindError::InvalidPackagePath {
            name: name.to_string(),
            version: version.to_string(),
            reason: format!("{what} {reason}"),
        });
    }
    Ok(())
}

impl PackageRegistry for LocalRepository {
    fn install(
        &self,
        descriptor: &PackageDescriptor,
        make_root: &MakeRoot<'_>,
    ) -> Result<Vec<InstalledVariant>> {
        let version = descriptor.version().to_string();
        check_path_segments(descriptor.name(), &version)?;

        let package_dir = self.root.join(descriptor.name());
        let version_dir = package_dir.join(&version);
        if version_dir.exists() && !self.force {
            return Err(BindError::PackageExists {
                name: descriptor.name().to_string(),
                version,
                path: version_dir,
            });
        }

        let build_dir = package_dir.join(format!(".{version}.tmp"));
        let backup_dir = package_dir.join(format!(".{version}.old"));
        if build_dir.exists() {
            fs::remove_dir_all(&build_dir).map_err(|e| BindError::io(&build_dir, e))?;
        }
        fs::create_dir_all(&build_dir).map_err(|e| BindError::io(&build_dir, e))?;

        let result = self
            .write_version(descriptor, &build_dir, &version_dir, make_root)
            .and_then(|installed| {
                self.swap_into_place(&build_dir, &version_dir, &backup_dir)?;
                Ok(installed)
            });
        match result {
            Ok(installed) => {
                info!(
                    package = descriptor.name(),
                    version = %descriptor.version(),
                    variants = installed.len(),
                    "package registered"
                );
                Ok(installed)
            }
            Err(e) => {
                if build_dir.exists() {
                    if let Err(cleanup) = fs::remove_dir_all(&build_dir) {
                        warn!(path = %build_dir.display(), error = %cleanup, "could not remove partial package");
                    }
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{Requirements, VersionRange};
    use crate::environment::EnvironmentHooks;
    use crate::tools::ToolSet;
    use tempfile::tempdir;

    fn descriptor(version: &str, variants: Vec<Vec<String>>) -> PackageDescriptor {
        let mut requires = Requirements::new();
        requires.insert("python", VersionRange::Weak("3.9".to_string()));
        let hooks = EnvironmentHooks::for_package("houdini", &requires, "python").unwrap();
        let mut builder = PackageDescriptor::builder("houdini", HoudiniVersion::from(version))
            .tools(ToolSet::new(vec!["hython".to_string()]))
            .requires(requires)
            .hooks(hooks);
        for variant in variants {
            builder = builder.variant(variant);
        }
        builder.build().unwrap()
    }

    fn linux() -> Vec<String> {
        vec!["platform-linux".to_string(), "arch-x86_64".to_string()]
    }

    fn noop(_: &Path) -> Result<()> {
        Ok(())
    }

    #[test]
    fn test_install_writes_definition_and_variant() {
        let dir = tempdir().unwrap();
        let repo = LocalRepository::new(dir.path());
        let installed = repo.install(&descriptor("19.5.493", vec![linux()]), &noop).unwrap();

        assert_eq!(installed.len(), 1);
        let root = dir.path().join("houdini/19.5.493/platform-linux/arch-x86_64");
        assert_eq!(installed[0].root, root);
        assert!(root.join(ACTIVATE_FILE).is_file());
        assert!(dir.path().join("houdini/19.5.493").join(PACKAGE_FILE).is_file());

        let loaded = repo.load("houdini", &HoudiniVersion::from("19.5.493")).unwrap();
        assert_eq!(loaded.tools().to_vec(), vec!["hython"]);
    }

    #[test]
    fn test_install_without_variants_uses_version_dir() {
        let dir = tempdir().unwrap();
        let repo = LocalRepository::new(dir.path());
        let installed = repo.install(&descriptor("19.5", vec![]), &noop).unwrap();
        assert_eq!(installed[0].root, dir.path().join("houdini").join("19.5"));
    }

    #[test]
    fn test_make_root_receives_each_variant_root() {
        let dir = tempdir().unwrap();
        let repo = LocalRepository::new(dir.path());
        let seen = std::cell::RefCell::new(Vec::new());
        let record = |root: &Path| -> Result<()> {
            seen.borrow_mut().push(root.to_path_buf());
            Ok(())
        };
        let installed = repo.install(&descriptor("19.5", vec![linux()]), &record).unwrap();

        let seen = seen.into_inner();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].ends_with(Path::new("platform-linux").join("arch-x86_64")));
        assert!(installed[0].root.is_dir());
    }

    #[test]
    fn test_existing_version_is_refused() {
        let dir = tempdir().unwrap();
        let repo = LocalRepository::new(dir.path());
        repo.install(&descriptor("19.5", vec![linux()]), &noop).unwrap();

        let err = repo.install(&descriptor("19.5", vec![linux()]), &noop).unwrap_err();
        assert!(matches!(err, BindError::PackageExists { .. }));

        let forced = repo.clone().force(true);
        assert!(forced.install(&descriptor("19.5", vec![linux()]), &noop).is_ok());
    }

    #[test]
    fn test_failed_root_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let repo = LocalRepository::new(dir.path());
        let failing = |root: &Path| -> Result<()> {
            Err(BindError::Registry(format!("cannot populate {}", root.display())))
        };

        assert!(repo.install(&descriptor("19.5", vec![linux()]), &failing).is_err());
        assert!(!dir.path().join("houdini").join("19.5").exists());
        assert!(repo.list("houdini").unwrap().is_empty());
    }

    #[test]
    fn test_forced_failure_keeps_previous_version() {
        let dir = tempdir().unwrap();
        let repo = LocalRepository::new(dir.path());
        let installed = repo.install(&descriptor("19.5.493", vec![linux()]), &noop).unwrap();
        let failing = |_: &Path| -> Result<()> { Err(BindError::Registry("boom".to_string())) };

        let forced = repo.clone().force(true);
        assert!(forced.install(&descriptor("19.5.493", vec![linux()]), &failing).is_err());

        assert_eq!(repo.list("houdini").unwrap(), vec!["19.5.493"]);
        assert!(installed[0].root.join(ACTIVATE_FILE).is_file());
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("houdini"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec!["19.5.493"]);
    }

    #[test]
    fn test_forced_install_replaces_version() {
        let dir = tempdir().unwrap();
        let repo = LocalRepository::new(dir.path()).force(true);
        repo.install(&descriptor("19.5", vec![linux()]), &noop).unwrap();
        let marker = |root: &Path| -> Result<()> {
            std::fs::write(root.join("marker"), "").map_err(|e| BindError::io(root, e))
        };

        let installed = repo.install(&descriptor("19.5", vec![linux()]), &marker).unwrap();
        assert!(installed[0].root.join("marker").is_file());
        let script = std::fs::read_to_string(installed[0].root.join(ACTIVATE_FILE)).unwrap();
        assert!(!script.contains(".19.5.tmp"));
        assert_eq!(repo.list("houdini").unwrap(), vec!["19.5"]);
    }

    #[test]
    fn test_unusable_versions_are_rejected_before_writing() {
        let dir = tempdir().unwrap();
        let repo = LocalRepository::new(dir.path()).force(true);
        repo.install(&descriptor("19.5.493", vec![linux()]), &noop).unwrap();

        for version in ["", ".", "..", "19/5", "19\\5", ".hidden"] {
            let err = repo.install(&descriptor(version, vec![linux()]), &noop).unwrap_err();
            assert!(
                matches!(err, BindError::InvalidPackagePath { .. }),
                "version {version:?} gave {err:?}"
            );
        }

        assert_eq!(repo.list("houdini").unwrap(), vec!["19.5.493"]);
        assert!(!dir.path().join("houdini").join(PACKAGE_FILE).exists());
        assert_eq!(repo.packages().unwrap(), vec!["houdini"]);
    }

    #[test]
    fn test_list_and_packages() {
        let dir = tempdir().unwrap();
        let repo = LocalRepository::new(dir.path());
        for version in ["20.0.547", "19.5.493", "19.5"] {
            repo.install(&descriptor(version, vec![linux()]), &noop).unwrap();
        }
        std::fs::create_dir_all(dir.path().join("houdini").join("scratch")).unwrap();

        assert_eq!(repo.list("houdini").unwrap(), vec!["19.5", "19.5.493", "20.0.547"]);
        assert_eq!(repo.packages().unwrap(), vec!["houdini"]);
        assert!(repo.list("nuke").unwrap().is_empty());
    }
}
