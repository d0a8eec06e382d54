//! Filesystem helpers for crash-safe writes.

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Write `data` to `path` atomically using temp-file-then-rename.
///
/// The temp file is created in the destination directory so the final
/// `rename` never crosses filesystems. With `sync` set, the data is fsynced
/// before the rename.
pub fn atomic_write(path: &Path, data: &[u8], sync: bool) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    if sync {
        tmp.as_file().sync_all()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
