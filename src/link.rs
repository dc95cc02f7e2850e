use std::path::{Path, PathBuf};
use crate::error::{BindError, Result};

/// Name of the link inside a variant root that points at the installation.
pub const EXT_DIR: &str = "ext";

/// Links `<variant_root>/ext` to the installation directory.
///
/// The package never holds a copy of the installation; `$HFS` resolves
/// through this link. On Unix this is a symlink; on Windows a directory
/// symlink.
///
/// # Errors
///
/// Returns an error if the link cannot be created, e.g. because `ext` already
/// exists.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use hbind::link_installation;
///
/// let link = link_installation(Path::new("/opt/hfs19.5.493"), Path::new("/tmp/pkg")).unwrap();
/// assert!(link.ends_with("ext"));
/// ```
pub fn link_installation(hfs_path: &Path, variant_root: &Path) -> Result<PathBuf> {
    let link_path = variant_root.join(EXT_DIR);
    #[cfg(unix)]
    {
        use std::os::unix::fs::symlink;
        symlink(hfs_path, &link_path).map_err(|e| BindError::io(&link_path, e))?;
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::symlink_dir;
        symlink_dir(hfs_path, &link_path).map_err(|e| BindError::io(&link_path, e))?;
    }
    Ok(link_path)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_link_points_at_installation() {
        let dir = tempdir().unwrap();
        let hfs = dir.path().join("hfs19.5.493");
        let root = dir.path().join("variant");
        fs::create_dir_all(hfs.join("bin")).unwrap();
        fs::create_dir_all(&root).unwrap();

        let link = link_installation(&hfs, &root).unwrap();
        assert_eq!(link, root.join("ext"));
        assert_eq!(fs::read_link(&link).unwrap(), hfs);
        assert!(link.join("bin").is_dir());
    }

    #[test]
    fn test_existing_link_is_an_error() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("variant");
        fs::create_dir_all(root.join(EXT_DIR)).unwrap();

        let err = link_installation(dir.path(), &root).unwrap_err();
        assert!(matches!(err, BindError::Io { .. }));
    }
}
