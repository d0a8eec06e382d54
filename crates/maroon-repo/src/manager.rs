//! Repository lifecycle: create, open, copy, move, remove and rebuild.

use std::fs;
use std::io;
use std::path::Path;

use maroon_dag::Index;
use maroon_store::ObjectStore;
use tracing::{debug, info, warn};

use crate::config::RepoConfig;
use crate::error::{RepoError, RepoResult};
use crate::events::{EventBus, EventStream, TimelineEvent};
use crate::fsutil::copy_tree;
use crate::locator::{Locator, RepoDir};
use crate::reconcile::Reconciliation;
use crate::repository::Repository;
use crate::verify::{verify_dir, VerifyReport};

/// Entry point for everything that touches repositories on disk.
///
/// Identities are the tracked files' absolute path strings, used verbatim:
/// two spellings of the same file are two repositories.
#[derive(Clone, Debug)]
pub struct RepoManager {
    config: RepoConfig,
    locator: Locator,
    events: EventBus,
}

impl RepoManager {
    pub fn new(config: RepoConfig) -> Self {
        let locator = Locator::new(&config.repos_root);
        Self {
            config,
            locator,
            events: EventBus::default(),
        }
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Receive a [`TimelineEvent`] for every persisted index change.
    pub fn subscribe(&self) -> EventStream {
        self.events.subscribe()
    }

    pub fn exists(&self, identity: &str) -> bool {
        self.locator.exists(identity)
    }

    /// Start tracking `identity` with `content` as its first version.
    pub fn init(&self, identity: &str, content: &[u8]) -> RepoResult<Repository> {
        if identity.is_empty() || !Path::new(identity).exists() {
            return Err(RepoError::InvalidPath(identity.to_string()));
        }
        let dir = self.locator.path(identity);
        if dir.exists() {
            return Err(RepoError::RepoAlreadyExists(identity.to_string()));
        }

        fs::create_dir_all(dir.objects_path())?;
        dir.store(&self.config).put(content)?;
        let index = Index::build(content);
        dir.write_index(&index, &self.config)?;
        dir.write_key(identity, &self.config)?;
        info!(identity, root = %index.root().short_hex(), "initialized repository");

        self.events.publish(TimelineEvent::IndexChanged {
            identity: identity.to_string(),
            index: index.clone(),
        });
        self.events.publish(TimelineEvent::HeadChanged {
            identity: identity.to_string(),
            head: index.head(),
        });
        Ok(Repository::new(
            identity.to_string(),
            dir,
            index,
            self.config.clone(),
            self.events.clone(),
        ))
    }

    /// Open an existing repository.
    pub fn open(&self, identity: &str) -> RepoResult<Repository> {
        Repository::load(
            identity,
            self.locator.path(identity),
            self.config.clone(),
            self.events.clone(),
        )
    }

    /// The editor's open flow: create the repository on first sight,
    /// otherwise reconcile the live content with the recorded head.
    pub fn open_or_init(
        &self,
        identity: &str,
        content: &[u8],
    ) -> RepoResult<(Repository, Reconciliation)> {
        if !self.exists(identity) {
            let repo = self.init(identity, content)?;
            let head = repo.head();
            return Ok((repo, Reconciliation::Clean(head)));
        }
        let mut repo = self.open(identity)?;
        let outcome = repo.reconcile(content)?;
        Ok((repo, outcome))
    }

    /// Duplicate the repository of `old` as the repository of `new`.
    ///
    /// Any repository already at `new` is replaced. The copied head is left
    /// as it was; reconciling it against the file at `new` is up to the
    /// caller.
    pub fn copy(&self, old: &str, new: &str) -> RepoResult<()> {
        if old.is_empty() || new.is_empty() {
            return Err(RepoError::InvalidPath(format!("{old:?} -> {new:?}")));
        }
        if old == new {
            return Ok(());
        }
        let src = self.locator.path(old);
        if !src.exists() {
            return Err(RepoError::RepoNotFound(old.to_string()));
        }

        let dst = self.locator.path(new);
        if dst.exists() {
            warn!(identity = new, "replacing existing repository");
            fs::remove_dir_all(dst.path())?;
        }
        copy_tree(src.path(), dst.path())?;
        dst.write_key(new, &self.config)?;
        info!(from = old, to = new, "copied repository");
        Ok(())
    }

    /// Move the repository of `old` to `new`: copy, then remove the source.
    ///
    /// The two steps are not atomic; a crash in between leaves both copies.
    pub fn relocate(&self, old: &str, new: &str) -> RepoResult<()> {
        if old == new {
            return Ok(());
        }
        self.copy(old, new)?;
        self.remove(old)?;
        info!(from = old, to = new, "moved repository");
        Ok(())
    }

    /// Rename the tracked file on disk and move its repository with it.
    ///
    /// Whatever history `new` had belonged to the file that was overwritten,
    /// so it is discarded even when `old` was never tracked.
    pub fn rename(&self, old: &str, new: &str) -> RepoResult<()> {
        let (old_path, new_path) = (Path::new(old), Path::new(new));
        if old.is_empty() || !old_path.is_file() {
            return Err(RepoError::InvalidPath(old.to_string()));
        }
        if old != new {
            move_file(old_path, new_path)?;
        }
        if self.exists(old) {
            self.relocate(old, new)?;
        } else if old != new {
            self.remove(new)?;
        }
        Ok(())
    }

    /// Delete the repository of `identity`. Absent repositories are fine.
    pub fn remove(&self, identity: &str) -> RepoResult<()> {
        let dir = self.locator.path(identity);
        if !dir.exists() {
            debug!(identity, "nothing to remove");
            return Ok(());
        }
        fs::remove_dir_all(dir.path())?;
        info!(identity, "removed repository");
        self.events.publish(TimelineEvent::Removed {
            identity: identity.to_string(),
        });
        Ok(())
    }

    /// Discard all history of `identity` and start again from `content`.
    pub fn rebuild(&self, identity: &str, content: &[u8]) -> RepoResult<Repository> {
        self.remove(identity)?;
        self.init(identity, content)
    }

    pub fn load_index(&self, identity: &str) -> RepoResult<Index> {
        let dir = self.existing(identity)?;
        dir.read_index()
    }

    /// Persist an index for `identity`, replacing what is on disk.
    pub fn save_index(&self, identity: &str, index: &Index) -> RepoResult<()> {
        let dir = self.existing(identity)?;
        dir.write_index(index, &self.config)?;
        self.events.publish(TimelineEvent::IndexChanged {
            identity: identity.to_string(),
            index: index.clone(),
        });
        Ok(())
    }

    /// The identity recorded inside the repository of `identity`.
    pub fn key(&self, identity: &str) -> RepoResult<String> {
        self.existing(identity)?.read_key()
    }

    /// All repositories under the configured root, by identity.
    pub fn list(&self) -> RepoResult<Vec<String>> {
        Ok(self
            .locator
            .list()?
            .into_iter()
            .map(|(identity, _)| identity)
            .collect())
    }

    pub fn verify(&self, identity: &str) -> RepoResult<VerifyReport> {
        let dir = self.existing(identity)?;
        verify_dir(identity, &dir, &self.config)
    }

    fn existing(&self, identity: &str) -> RepoResult<RepoDir> {
        let dir = self.locator.path(identity);
        if !dir.exists() {
            return Err(RepoError::RepoNotFound(identity.to_string()));
        }
        Ok(dir)
    }
}

/// `rename`, falling back to copy-and-delete across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(error = %e, "rename failed, copying instead");
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}
