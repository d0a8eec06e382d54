use std::collections::BTreeSet;

use maroon_store::{ObjectStore, StoreError};
use maroon_types::ContentHash;
use tracing::warn;

use crate::config::RepoConfig;
use crate::error::{RepoError, RepoResult};
use crate::locator::RepoDir;

/// Result of checking one repository's on-disk state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub identity: String,
    /// The key record names this identity.
    pub key_matches: bool,
    /// Why the index could not be loaded, if it could not.
    pub index_error: Option<String>,
    pub versions: usize,
    /// Versions in the index with no object.
    pub missing_objects: Vec<ContentHash>,
    /// Objects that fail to inflate or whose content hashes differently.
    pub corrupt_objects: Vec<ContentHash>,
    /// Objects the index does not reference. Harmless, reported for cleanup.
    pub orphan_objects: Vec<ContentHash>,
}

impl VerifyReport {
    /// Whether the repository is fully usable. Orphans do not count.
    pub fn is_ok(&self) -> bool {
        self.key_matches
            && self.index_error.is_none()
            && self.missing_objects.is_empty()
            && self.corrupt_objects.is_empty()
    }
}

pub(crate) fn verify_dir(
    identity: &str,
    dir: &RepoDir,
    config: &RepoConfig,
) -> RepoResult<VerifyReport> {
    let mut report = VerifyReport {
        identity: identity.to_string(),
        key_matches: matches!(dir.read_key(), Ok(key) if key == identity),
        ..VerifyReport::default()
    };

    let index = match dir.read_index() {
        Ok(index) => index,
        Err(RepoError::IndexCorrupt { reason, .. }) => {
            warn!(identity, %reason, "index failed verification");
            report.index_error = Some(reason);
            return Ok(report);
        }
        Err(e) => return Err(e),
    };
    report.versions = index.version_count();

    let store = dir.store(config);
    let referenced: BTreeSet<ContentHash> = index.nodes().copied().collect();
    for hash in &referenced {
        match store.get(hash) {
            Ok(_) => {}
            Err(StoreError::NotFound(_)) => report.missing_objects.push(*hash),
            Err(StoreError::HashMismatch { .. } | StoreError::CorruptObject { .. }) => {
                report.corrupt_objects.push(*hash)
            }
            Err(e) => return Err(e.into()),
        }
    }

    if dir.objects_path().is_dir() {
        report.orphan_objects = store
            .list()?
            .into_iter()
            .filter(|hash| !referenced.contains(hash))
            .collect();
    }

    if !report.is_ok() {
        warn!(
            identity,
            missing = report.missing_objects.len(),
            corrupt = report.corrupt_objects.len(),
            key_matches = report.key_matches,
            "repository failed verification"
        );
    }
    Ok(report)
}
