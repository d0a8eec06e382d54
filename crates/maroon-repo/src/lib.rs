//! Per-file repositories for maroon.
//!
//! Every tracked file gets its own repository, found by hashing the file's
//! absolute path:
//!
//! ```text
//! <repos_root>/<hh>/<rest>/key              identity, plaintext
//! <repos_root>/<hh>/<rest>/index            zlib(JSON index)
//! <repos_root>/<hh>/<rest>/objects/<hash>   zlib(version content)
//! ```
//!
//! [`RepoManager`] owns the lifecycle (init, copy, move, remove, rebuild)
//! and hands out [`Repository`] handles for saving, navigating and
//! reconciling. Persisted changes are broadcast as [`TimelineEvent`]s.
//!
//! All operations are synchronous and assume a single writer per
//! repository. Individual files are replaced atomically, but multi-step
//! operations such as a move are not rolled back on failure.

pub mod config;
pub mod error;
pub mod events;
pub mod fsutil;
pub mod locator;
pub mod manager;
pub mod reconcile;
pub mod repository;
pub mod verify;

pub use config::{RepoConfig, REPOS_ENV};
pub use error::{RepoError, RepoResult};
pub use events::{EventBus, EventStream, TimelineEvent};
pub use locator::{Locator, RepoDir};
pub use manager::RepoManager;
pub use reconcile::{reconcile, Reconciliation};
pub use repository::{Repository, SaveOutcome};
pub use verify::VerifyReport;
