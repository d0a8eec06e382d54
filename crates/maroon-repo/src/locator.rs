//! Where a tracked file's repository lives on disk.
//!
//! The directory is derived from the SHA-1 of the file's identity string
//! (its absolute path), sharded as `<root>/<hash[0:2]>/<hash[2:]>/`. The
//! same identity always maps to the same directory, so a repository can be
//! found again after restart without any lookup table.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use maroon_dag::Index;
use maroon_store::{atomic_write, codec, FsObjectStore};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::RepoConfig;
use crate::error::{RepoError, RepoResult};

const KEY: &str = "key";
const INDEX: &str = "index";
const OBJECTS: &str = "objects";

/// Maps identities to repository directories under one root.
#[derive(Clone, Debug)]
pub struct Locator {
    root: PathBuf,
}

impl Locator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Repository directory for an identity. Pure; touches no files.
    pub fn path(&self, identity: &str) -> RepoDir {
        let (prefix, rest) = maroon_crypto::hash_str(identity).shard();
        RepoDir::new(self.root.join(prefix).join(rest))
    }

    /// Whether a repository directory exists for an identity.
    pub fn exists(&self, identity: &str) -> bool {
        self.path(identity).exists()
    }

    /// Every repository under the root, as `(identity, dir)` pairs sorted by
    /// identity. Directories whose key record is unreadable are skipped.
    pub fn list(&self) -> RepoResult<Vec<(String, RepoDir)>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut repos = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(2).max_depth(2) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let dir = RepoDir::new(entry.path());
            match dir.read_key() {
                Ok(identity) => repos.push((identity, dir)),
                Err(e) => warn!(dir = %entry.path().display(), error = %e, "skipping repository without key"),
            }
        }
        repos.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(repos)
    }
}

/// One repository directory: `key`, `index` and `objects/`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoDir {
    path: PathBuf,
}

impl RepoDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn key_path(&self) -> PathBuf {
        self.path.join(KEY)
    }

    pub fn index_path(&self) -> PathBuf {
        self.path.join(INDEX)
    }

    pub fn objects_path(&self) -> PathBuf {
        self.path.join(OBJECTS)
    }

    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Object store over this repository's `objects/` directory.
    pub fn store(&self, config: &RepoConfig) -> FsObjectStore {
        FsObjectStore::new(self.objects_path())
            .with_level(config.compression_level)
            .with_sync(config.sync_writes)
    }

    /// The identity this repository was recorded for.
    pub fn read_key(&self) -> RepoResult<String> {
        Ok(fs::read_to_string(self.key_path())?)
    }

    pub fn write_key(&self, identity: &str, config: &RepoConfig) -> RepoResult<()> {
        atomic_write(&self.key_path(), identity.as_bytes(), config.sync_writes)?;
        Ok(())
    }

    /// Read, inflate and decode the index.
    pub fn read_index(&self) -> RepoResult<Index> {
        let path = self.index_path();
        let corrupt = |reason: String| RepoError::IndexCorrupt {
            path: path.clone(),
            reason,
        };

        let compressed = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(corrupt("index file is missing".into()));
            }
            Err(e) => return Err(e.into()),
        };
        let json = codec::decompress(&compressed).map_err(|e| corrupt(e.to_string()))?;
        Index::from_bytes(&json).map_err(|e| corrupt(e.to_string()))
    }

    /// Encode, compress and atomically replace the index.
    pub fn write_index(&self, index: &Index, config: &RepoConfig) -> RepoResult<()> {
        let json = index.to_bytes()?;
        let compressed = codec::compress(&json, config.compression_level)?;
        atomic_write(&self.index_path(), &compressed, config.sync_writes)?;
        debug!(
            repo = %self.path.display(),
            head = %index.head().short_hex(),
            versions = index.version_count(),
            "wrote index"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn path_is_sharded_by_identity_hash() {
        let locator = Locator::new("/repos");
        let hash = maroon_crypto::hash_str("/f.txt").to_hex();
        let dir = locator.path("/f.txt");
        assert_eq!(
            dir.path(),
            Path::new("/repos").join(&hash[..2]).join(&hash[2..])
        );
        assert_eq!(dir.key_path(), dir.path().join("key"));
        assert_eq!(dir.index_path(), dir.path().join("index"));
        assert_eq!(dir.objects_path(), dir.path().join("objects"));
    }

    #[test]
    fn mapping_is_stable_and_disjoint() {
        let locator = Locator::new("repos");
        assert_eq!(locator.path("/a.txt"), locator.path("/a.txt"));
        assert_ne!(locator.path("/a.txt"), locator.path("/b.txt"));
    }

    #[test]
    fn exists_tracks_directory() {
        let root = tempdir().unwrap();
        let locator = Locator::new(root.path());
        assert!(!locator.exists("/a.txt"));
        fs::create_dir_all(locator.path("/a.txt").path()).unwrap();
        assert!(locator.exists("/a.txt"));
    }

    #[test]
    fn index_roundtrip_through_disk() {
        let root = tempdir().unwrap();
        let dir = RepoDir::new(root.path());
        let config = RepoConfig::default();
        let mut index = Index::build(b"hello");
        index
            .append(maroon_crypto::hash_str("hello"), maroon_crypto::hash_str("world"), false)
            .unwrap();
        dir.write_index(&index, &config).unwrap();
        assert_eq!(dir.read_index().unwrap(), index);
    }

    #[test]
    fn index_on_disk_is_zlib_json() {
        let root = tempdir().unwrap();
        let dir = RepoDir::new(root.path());
        dir.write_index(&Index::build(b"hello"), &RepoConfig::default())
            .unwrap();
        let json = codec::decompress(&fs::read(dir.index_path()).unwrap()).unwrap();
        let text = String::from_utf8(json).unwrap();
        assert!(text.contains("\"root\""));
        assert!(text.contains("\"adopts\":[]"));
    }

    #[test]
    fn missing_or_garbled_index_is_corrupt() {
        let root = tempdir().unwrap();
        let dir = RepoDir::new(root.path());
        assert!(matches!(dir.read_index(), Err(RepoError::IndexCorrupt { .. })));

        fs::write(dir.index_path(), b"not zlib").unwrap();
        assert!(matches!(dir.read_index(), Err(RepoError::IndexCorrupt { .. })));

        let not_an_index = codec::compress(b"{\"root\": 1}", 6).unwrap();
        fs::write(dir.index_path(), not_an_index).unwrap();
        assert!(matches!(dir.read_index(), Err(RepoError::IndexCorrupt { .. })));
    }

    #[test]
    fn list_reads_keys() {
        let root = tempdir().unwrap();
        let locator = Locator::new(root.path());
        let config = RepoConfig::default();
        for identity in ["/b.txt", "/a.txt"] {
            let dir = locator.path(identity);
            fs::create_dir_all(dir.path()).unwrap();
            dir.write_key(identity, &config).unwrap();
        }
        // A shard directory without a key is ignored.
        fs::create_dir_all(root.path().join("zz").join("orphan")).unwrap();

        let identities: Vec<String> = locator.list().unwrap().into_iter().map(|(id, _)| id).collect();
        assert_eq!(identities, vec!["/a.txt", "/b.txt"]);
    }

    #[test]
    fn list_of_missing_root_is_empty() {
        let locator = Locator::new("/definitely/not/here");
        assert!(locator.list().unwrap().is_empty());
    }
}
