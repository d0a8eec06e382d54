use maroon_dag::{DagError, Index};
use maroon_store::{FsObjectStore, ObjectStore};
use maroon_types::ContentHash;
use tracing::{debug, info};

use crate::config::RepoConfig;
use crate::error::{RepoError, RepoResult};
use crate::events::{EventBus, TimelineEvent};
use crate::locator::RepoDir;
use crate::reconcile::{self, Reconciliation};

/// What a save did to the timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Saved content is already the head.
    Unchanged(ContentHash),
    /// Saved content matches an earlier version; head moved to it.
    Revisited { from: ContentHash, to: ContentHash },
    /// New content recorded under the previous head.
    Appended {
        parent: ContentHash,
        child: ContentHash,
    },
}

impl SaveOutcome {
    pub fn head(&self) -> ContentHash {
        match *self {
            Self::Unchanged(head) => head,
            Self::Revisited { to, .. } => to,
            Self::Appended { child, .. } => child,
        }
    }
}

/// An open per-file repository.
///
/// Holds the loaded index in memory. Every mutation is applied to a copy,
/// persisted, and only then swapped in, so a failed write leaves both the
/// disk and the handle on the previous state. Each persisted change is
/// published on the manager's event bus.
pub struct Repository {
    identity: String,
    dir: RepoDir,
    store: FsObjectStore,
    index: Index,
    config: RepoConfig,
    events: EventBus,
}

impl Repository {
    pub(crate) fn new(
        identity: String,
        dir: RepoDir,
        index: Index,
        config: RepoConfig,
        events: EventBus,
    ) -> Self {
        let store = dir.store(&config);
        Self {
            identity,
            dir,
            store,
            index,
            config,
            events,
        }
    }

    /// Load the repository stored in `dir`.
    pub(crate) fn load(
        identity: &str,
        dir: RepoDir,
        config: RepoConfig,
        events: EventBus,
    ) -> RepoResult<Self> {
        if !dir.exists() {
            return Err(RepoError::RepoNotFound(identity.to_string()));
        }
        let index = dir.read_index()?;
        Ok(Self::new(identity.to_string(), dir, index, config, events))
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn dir(&self) -> &RepoDir {
        &self.dir
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn store(&self) -> &FsObjectStore {
        &self.store
    }

    pub fn head(&self) -> ContentHash {
        self.index.head()
    }

    /// Bytes of a stored version.
    pub fn content(&self, hash: &ContentHash) -> RepoResult<Vec<u8>> {
        Ok(self.store.get(hash)?)
    }

    pub fn head_content(&self) -> RepoResult<Vec<u8>> {
        self.content(&self.index.head())
    }

    /// Re-read the index from disk, discarding the in-memory copy.
    pub fn reload(&mut self) -> RepoResult<()> {
        self.index = self.dir.read_index()?;
        Ok(())
    }

    /// Resolve a full hash or a unique hex prefix to a recorded version.
    pub fn resolve(&self, prefix: &str) -> RepoResult<ContentHash> {
        let prefix = prefix.trim().to_ascii_lowercase();
        if prefix.is_empty() {
            return Err(RepoError::UnknownVersion(prefix));
        }
        let mut matches = self
            .index
            .nodes()
            .filter(|hash| hash.to_hex().starts_with(&prefix));
        match (matches.next(), matches.next()) {
            (Some(hash), None) => Ok(*hash),
            (Some(_), Some(_)) => Err(RepoError::UnknownVersion(format!("{prefix} is ambiguous"))),
            (None, _) => Err(RepoError::UnknownVersion(prefix)),
        }
    }

    /// Record the editor saving `content`.
    ///
    /// Unchanged content does nothing. Content matching an earlier version
    /// moves the head there. Anything else becomes an organic child of the
    /// current head.
    pub fn record_save(&mut self, content: &[u8]) -> RepoResult<SaveOutcome> {
        let hash = maroon_crypto::hash(content);
        let head = self.index.head();
        if hash == head {
            debug!(identity = %self.identity, head = %head.short_hex(), "save without changes");
            return Ok(SaveOutcome::Unchanged(head));
        }

        let mut next = self.index.clone();
        let outcome = if next.contains(&hash) {
            if !self.store.exists(&hash)? {
                self.store.put(content)?;
            }
            next.set_head(hash)?;
            SaveOutcome::Revisited { from: head, to: hash }
        } else {
            self.store.put(content)?;
            next.append(head, hash, false)?;
            SaveOutcome::Appended {
                parent: head,
                child: hash,
            }
        };
        self.commit(next)?;
        info!(identity = %self.identity, head = %hash.short_hex(), "recorded save");
        Ok(outcome)
    }

    /// Record `content` as a child of `parent`, flagged as adopted if asked.
    pub fn append(
        &mut self,
        parent: ContentHash,
        content: &[u8],
        adopted: bool,
    ) -> RepoResult<ContentHash> {
        let mut next = self.index.clone();
        let child = maroon_crypto::hash(content);
        // Validate before writing the object.
        next.append(parent, child, adopted)?;
        self.store.put(content)?;
        self.commit(next)?;
        Ok(child)
    }

    /// Point the head at an existing version.
    pub fn set_head(&mut self, hash: ContentHash) -> RepoResult<()> {
        let mut next = self.index.clone();
        next.set_head(hash)?;
        self.commit(next)
    }

    /// Navigate to a recorded version and return its content.
    ///
    /// The content is read before the head moves, so a missing object
    /// leaves the timeline untouched.
    pub fn checkout(&mut self, hash: ContentHash) -> RepoResult<Vec<u8>> {
        if !self.index.contains(&hash) {
            return Err(DagError::UnknownNode(hash).into());
        }
        let content = self.content(&hash)?;
        if hash != self.index.head() {
            self.set_head(hash)?;
            info!(identity = %self.identity, head = %hash.short_hex(), "checked out version");
        }
        Ok(content)
    }

    /// Reconcile the file's live content with the recorded head.
    pub fn reconcile(&mut self, live: &[u8]) -> RepoResult<Reconciliation> {
        let mut next = self.index.clone();
        let outcome = reconcile::reconcile(live, &mut next, &self.store)?;
        if outcome.changed() {
            self.commit(next)?;
        }
        Ok(outcome)
    }

    fn commit(&mut self, next: Index) -> RepoResult<()> {
        self.dir.write_index(&next, &self.config)?;
        let previous_head = self.index.head();
        self.index = next;

        self.events.publish(TimelineEvent::IndexChanged {
            identity: self.identity.clone(),
            index: self.index.clone(),
        });
        if self.index.head() != previous_head {
            self.events.publish(TimelineEvent::HeadChanged {
                identity: self.identity.clone(),
                head: self.index.head(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("identity", &self.identity)
            .field("dir", &self.dir.path())
            .field("head", &self.index.head())
            .field("versions", &self.index.version_count())
            .finish()
    }
}
