use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use maroon_types::ContentHash;
use tracing::{debug, warn};

use crate::codec;
use crate::error::{StoreError, StoreResult};
use crate::fsutil::atomic_write;
use crate::traits::ObjectStore;

/// Filesystem object store: one zlib-compressed file per object.
///
/// Layout is flat, `<root>/<40-hex-hash>`. The root directory is created
/// by the repository lifecycle, not by the store.
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
    level: u32,
    sync: bool,
}

impl FsObjectStore {
    /// Open a store rooted at an `objects/` directory with default settings.
    pub fn new(objects_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: objects_dir.into(),
            level: codec::DEFAULT_LEVEL,
            sync: false,
        }
    }

    /// Set the zlib level used for new objects.
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Fsync each object before it is renamed into place.
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// The directory holding the objects.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for an object hash.
    pub fn object_path(&self, hash: &ContentHash) -> PathBuf {
        self.root.join(hash.to_hex())
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, content: &[u8]) -> StoreResult<ContentHash> {
        let hash = maroon_crypto::hash(content);
        let path = self.object_path(&hash);
        if path.try_exists()? {
            debug!(object = %hash.short_hex(), "object already stored");
            return Ok(hash);
        }

        let compressed = codec::compress(content, self.level)?;
        atomic_write(&path, &compressed, self.sync)?;
        debug!(
            object = %hash.short_hex(),
            raw = content.len(),
            stored = compressed.len(),
            "wrote object"
        );
        Ok(hash)
    }

    fn get(&self, hash: &ContentHash) -> StoreResult<Vec<u8>> {
        let compressed = match fs::read(self.object_path(hash)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(*hash));
            }
            Err(e) => return Err(e.into()),
        };

        let content = codec::decompress(&compressed).map_err(|e| StoreError::CorruptObject {
            hash: *hash,
            reason: e.to_string(),
        })?;

        let computed = maroon_crypto::hash(&content);
        if computed != *hash {
            warn!(object = %hash.short_hex(), computed = %computed.short_hex(), "object hash mismatch");
            return Err(StoreError::HashMismatch {
                hash: *hash,
                computed,
            });
        }
        Ok(content)
    }

    fn exists(&self, hash: &ContentHash) -> StoreResult<bool> {
        Ok(self.object_path(hash).try_exists()?)
    }

    fn list(&self) -> StoreResult<Vec<ContentHash>> {
        let mut hashes = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            // Leftover temp files and anything else non-hash are skipped.
            if let Some(hash) = name.to_str().and_then(|n| n.parse().ok()) {
                hashes.push(hash);
            }
        }
        hashes.sort();
        Ok(hashes)
    }
}
