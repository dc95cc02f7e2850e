#![cfg(unix)]

use std::fs;
use std::os::unix::fs::{symlink, PermissionsExt};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_executable(path: &Path) {
    fs::write(path, "#!/bin/sh\n").unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Lays out a minimal `$HFS` tree: `hython` and `mantra` in `bin/`, plus helpers
/// that must never be listed as tools.
fn setup_hfs(dir_name: &str, python: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let hfs = temp_dir.path().join(dir_name);
    let hb = hfs.join("bin");
    let hsb = hfs.join("houdini").join("sbin");
    let py = hfs.join("python").join("bin");
    for dir in [&hb, &hsb, &py] {
        fs::create_dir_all(dir).unwrap();
    }
    write_executable(&hb.join("hython"));
    write_executable(&hb.join("mantra"));
    write_executable(&hb.join("hython-bin"));
    symlink(hb.join("hython"), hb.join("hython3.9")).unwrap();
    fs::write(hb.join("houdini_setup.txt"), "").unwrap();
    fs::write(py.join(python), "").unwrap();
    if python != "python" {
        symlink(python, py.join("python")).unwrap();
    }
    (temp_dir, hfs)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use hbind::*;
    use crate::setup_hfs;

    #[test]
    fn test_describe_end_to_end() {
        let (_dir, hfs) = setup_hfs("hfs19.5.493", "python3.9");
        let descriptor = describe(&hfs, &BindOptions::default()).unwrap();

        assert_eq!(descriptor.version().to_string(), "19.5.493");
        assert_eq!(descriptor.tools().to_vec(), vec!["hython", "mantra"]);
        let python = descriptor.requires().get("python").unwrap();
        assert_eq!(python, &VersionRange::Weak("3.9".to_string()));
        assert!(python.allows("3.9.18"));
        assert!(!python.allows("3.10.0"));
    }

    #[test]
    fn test_describe_truncated() {
        let (_dir, hfs) = setup_hfs("hfs19.5.493", "python3.9");
        let options = BindOptions { major_minor_only: true, ..BindOptions::default() };
        let descriptor = describe(&hfs, &options).unwrap();
        assert_eq!(descriptor.version().to_string(), "19.5");
    }

    #[test]
    fn test_bind_into_local_repository() {
        let (dir, hfs) = setup_hfs("hfs20.0.547", "python3.10");
        let repo = LocalRepository::new(dir.path().join("packages"));
        let outcome = bind(&hfs, &BindOptions::default(), &repo).unwrap();

        let variant = &outcome.installed[0];
        assert_eq!(variant.name, "houdini");
        assert_eq!(variant.version.to_string(), "20.0.547");
        assert!(variant.root.join("ext").join("bin").join("hython").is_file());

        let activate = fs::read_to_string(variant.root.join(ACTIVATE_FILE)).unwrap();
        assert!(activate.contains("export HOUDINI_PYTHON_VERSION=\"3.10\""));
        assert!(activate.contains(&format!("export HFS=\"{}/ext\"", variant.root.display())));

        let loaded = repo.load("houdini", descriptor_version(&outcome)).unwrap();
        assert_eq!(loaded, outcome.descriptor);
    }

    fn descriptor_version(outcome: &BindOutcome) -> &HoudiniVersion {
        outcome.descriptor.version()
    }

    #[test]
    fn test_bind_twice_needs_force() {
        let (dir, hfs) = setup_hfs("hfs19.5.493", "python3.9");
        let repo = LocalRepository::new(dir.path().join("packages"));
        bind(&hfs, &BindOptions::default(), &repo).unwrap();

        let err = bind(&hfs, &BindOptions::default(), &repo).unwrap_err();
        assert!(matches!(err, BindError::PackageExists { .. }));
        assert!(bind(&hfs, &BindOptions::default(), &repo.clone().force(true)).is_ok());
    }

    #[test]
    fn test_versionless_directory_keeps_registered_versions() {
        let (dir, hfs) = setup_hfs("hfs19.5.493", "python3.9");
        let (_other, bare_hfs) = setup_hfs("hfs", "python3.9");
        let repo = LocalRepository::new(dir.path().join("packages"));
        bind(&hfs, &BindOptions::default(), &repo).unwrap();

        for repo in [repo.clone(), repo.clone().force(true)] {
            let err = bind(&bare_hfs, &BindOptions::default(), &repo).unwrap_err();
            assert!(matches!(err, BindError::InvalidPackagePath { .. }));
        }

        assert_eq!(repo.list("houdini").unwrap(), vec!["19.5.493"]);
        assert!(!dir.path().join("packages").join("houdini").join(PACKAGE_FILE).exists());
    }

    #[test]
    fn test_unversioned_python_aborts_bind() {
        let (dir, hfs) = setup_hfs("hfs19.5.493", "python");
        let repo = LocalRepository::new(dir.path().join("packages"));

        let err = bind(&hfs, &BindOptions::default(), &repo).unwrap_err();
        assert!(matches!(err, BindError::InterpreterNotFound { .. }));
        assert!(repo.packages().unwrap().is_empty());
    }
}
