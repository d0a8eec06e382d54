//! Reconciling a file's live content with its recorded history.
//!
//! When a tracked file is opened, its current bytes are compared to the
//! index head. Three outcomes are possible:
//!
//! | live hash                    | outcome      | effect                          |
//! |------------------------------|--------------|---------------------------------|
//! | equals `head`                | `Clean`      | none                            |
//! | some other recorded version  | `Rewound`    | `set_head`                      |
//! | never recorded               | `Diverged`   | adopted edge under the old head |
//!
//! "Recorded" means a node of the index. An object that sits in the store
//! without a node (left by an interrupted save) is adopted, since the head
//! must always be a node.
//!
//! The decision depends only on the live hash and the index, so running it
//! twice without an intervening save always ends in `Clean`.

use maroon_dag::Index;
use maroon_store::ObjectStore;
use maroon_types::ContentHash;
use tracing::{debug, info};

use crate::error::RepoResult;

/// Outcome of reconciling live content against an index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reconciliation {
    /// Live content already is the head.
    Clean(ContentHash),
    /// Live content is an earlier recorded version; head moved back to it.
    Rewound { from: ContentHash, to: ContentHash },
    /// Live content was never recorded; it was adopted under the old head.
    Diverged {
        parent: ContentHash,
        adopted: ContentHash,
    },
}

impl Reconciliation {
    /// Decide what reconciling `live` against `index` would do.
    pub fn plan(live: ContentHash, index: &Index) -> Self {
        let head = index.head();
        if live == head {
            Self::Clean(head)
        } else if index.contains(&live) {
            Self::Rewound {
                from: head,
                to: live,
            }
        } else {
            Self::Diverged {
                parent: head,
                adopted: live,
            }
        }
    }

    /// The head after reconciliation.
    pub fn head(&self) -> ContentHash {
        match *self {
            Self::Clean(head) => head,
            Self::Rewound { to, .. } => to,
            Self::Diverged { adopted, .. } => adopted,
        }
    }

    /// Whether the index was modified.
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Clean(_))
    }
}

/// Reconcile `live` content against `index`, writing to `store` as needed.
///
/// The object is stored before the index is touched, so a failed write
/// leaves the index as it was. Persisting the index is the caller's job.
pub fn reconcile<S: ObjectStore + ?Sized>(
    live: &[u8],
    index: &mut Index,
    store: &S,
) -> RepoResult<Reconciliation> {
    let live_hash = maroon_crypto::hash(live);
    let plan = Reconciliation::plan(live_hash, index);
    match plan {
        Reconciliation::Clean(_) => {
            debug!(head = %live_hash.short_hex(), "live content matches head");
        }
        Reconciliation::Rewound { from, to } => {
            if !store.exists(&to)? {
                store.put(live)?;
            }
            index.set_head(to)?;
            info!(from = %from.short_hex(), to = %to.short_hex(), "head rewound to recorded version");
        }
        Reconciliation::Diverged { parent, adopted } => {
            store.put(live)?;
            index.append(parent, adopted, true)?;
            info!(parent = %parent.short_hex(), adopted = %adopted.short_hex(), "adopted foreign content");
        }
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use maroon_crypto::hash;
    use maroon_store::InMemoryObjectStore;
    use proptest::prelude::*;

    fn history(store: &InMemoryObjectStore) -> Index {
        let mut index = Index::build(b"hello");
        store.put(b"hello").unwrap();
        store.put(b"world").unwrap();
        index.append(hash(b"hello"), hash(b"world"), false).unwrap();
        index
    }

    #[test]
    fn clean_when_live_is_head() {
        let store = InMemoryObjectStore::new();
        let mut index = history(&store);
        let before = index.clone();
        let r = reconcile(b"world", &mut index, &store).unwrap();
        assert_eq!(r, Reconciliation::Clean(hash(b"world")));
        assert!(!r.changed());
        assert_eq!(index, before);
    }

    #[test]
    fn rewound_when_live_is_older_version() {
        let store = InMemoryObjectStore::new();
        let mut index = history(&store);
        let r = reconcile(b"hello", &mut index, &store).unwrap();
        assert_eq!(
            r,
            Reconciliation::Rewound {
                from: hash(b"world"),
                to: hash(b"hello")
            }
        );
        assert_eq!(index.head(), hash(b"hello"));
        assert_eq!(index.version_count(), 2);
        assert!(index.adopts().is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn rewind_restores_missing_object() {
        let store = InMemoryObjectStore::new();
        let mut index = Index::build(b"hello");
        index.append(hash(b"hello"), hash(b"world"), false).unwrap();
        store.put(b"world").unwrap();
        reconcile(b"hello", &mut index, &store).unwrap();
        assert_eq!(store.get(&hash(b"hello")).unwrap(), b"hello");
    }

    #[test]
    fn diverged_adopts_under_old_head() {
        let store = InMemoryObjectStore::new();
        let mut index = history(&store);
        let r = reconcile(b"xyz", &mut index, &store).unwrap();
        assert_eq!(
            r,
            Reconciliation::Diverged {
                parent: hash(b"world"),
                adopted: hash(b"xyz")
            }
        );
        assert_eq!(r.head(), hash(b"xyz"));
        assert_eq!(index.head(), hash(b"xyz"));
        assert_eq!(index.children_of(&hash(b"world")).unwrap(), &[hash(b"xyz")]);
        assert_eq!(index.adopts(), &[(hash(b"world"), hash(b"xyz"))]);
        assert_eq!(store.get(&hash(b"xyz")).unwrap(), b"xyz");
    }

    #[test]
    fn stored_but_unrecorded_content_is_adopted() {
        let store = InMemoryObjectStore::new();
        let mut index = history(&store);
        // Object written but never reached the index.
        store.put(b"orphan").unwrap();

        let r = reconcile(b"orphan", &mut index, &store).unwrap();
        assert_eq!(
            r,
            Reconciliation::Diverged {
                parent: hash(b"world"),
                adopted: hash(b"orphan")
            }
        );
        assert_eq!(index.head(), hash(b"orphan"));
        assert!(index.is_adopted(&hash(b"world"), &hash(b"orphan")));
        assert!(index.validate().is_ok());
    }

    #[test]
    fn plan_is_pure() {
        let store = InMemoryObjectStore::new();
        let index = history(&store);
        let before = index.clone();
        let _ = Reconciliation::plan(hash(b"new"), &index);
        assert_eq!(index, before);
        assert_eq!(store.len(), 2);
    }

    proptest! {
        #[test]
        fn reconcile_is_idempotent(
            saves in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..16), 1..6),
            live in proptest::collection::vec(any::<u8>(), 0..16),
        ) {
            let store = InMemoryObjectStore::new();
            let mut index = Index::build(&saves[0]);
            store.put(&saves[0]).unwrap();
            for content in &saves[1..] {
                let h = hash(content);
                if !index.contains(&h) {
                    store.put(content).unwrap();
                    index.append(index.head(), h, false).unwrap();
                }
            }

            reconcile(&live, &mut index, &store).unwrap();
            let once = index.clone();
            let objects = store.len();
            let second = reconcile(&live, &mut index, &store).unwrap();
            prop_assert_eq!(second, Reconciliation::Clean(hash(&live)));
            prop_assert_eq!(&index, &once);
            prop_assert_eq!(store.len(), objects);
            prop_assert!(index.validate().is_ok());
        }

        #[test]
        fn unseen_content_adds_one_adopted_edge(
            base in proptest::collection::vec(any::<u8>(), 0..16),
            live in proptest::collection::vec(any::<u8>(), 0..16),
        ) {
            prop_assume!(base != live);
            let store = InMemoryObjectStore::new();
            let mut index = Index::build(&base);
            let old_head = index.head();
            let edges_before = index.edges().len();

            reconcile(&live, &mut index, &store).unwrap();

            prop_assert_eq!(index.edges().len(), edges_before + 1);
            prop_assert_eq!(index.adopts(), &[(old_head, hash(&live))][..]);
            prop_assert!(index.is_adopted(&old_head, &hash(&live)));
        }
    }
}
