//! Directory-tree helpers for relocating repositories.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Recursively copy the directory `src` to `dst`, creating `dst`.
///
/// Symlinks are not followed; the tree is expected to hold only
/// directories and regular files.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(io::Error::from)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn copies_nested_files() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("objects")).unwrap();
        fs::write(src.join("key"), b"/a.txt").unwrap();
        fs::write(src.join("objects").join("ab"), b"blob").unwrap();

        let dst = tmp.path().join("x").join("dst");
        copy_tree(&src, &dst).unwrap();
        assert_eq!(fs::read(dst.join("key")).unwrap(), b"/a.txt");
        assert_eq!(fs::read(dst.join("objects").join("ab")).unwrap(), b"blob");
        // Source untouched.
        assert!(src.join("key").exists());
    }

    #[test]
    fn missing_source_is_an_error() {
        let tmp = tempdir().unwrap();
        assert!(copy_tree(&tmp.path().join("nope"), &tmp.path().join("dst")).is_err());
    }
}
