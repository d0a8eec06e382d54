//! Content-addressed object storage for maroon.
//!
//! Every saved version of a tracked file is stored as an immutable object
//! named by the SHA-1 of its bytes, analogous to git's loose objects but
//! flat: one file per version under `objects/<hash>`, zlib-compressed.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`FsObjectStore`] -- one compressed file per object, atomic writes
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Writes go to a temp file in the target directory and are renamed into
//!    place, so a reader never sees a partial object.
//! 3. Reads verify the content hash; corruption is reported, never masked.
//! 4. The store never interprets object contents.
//! 5. Objects are only removed in bulk, together with their repository.

pub mod codec;
pub mod error;
pub mod fs;
pub mod fsutil;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use fsutil::atomic_write;
pub use memory::InMemoryObjectStore;
pub use traits::ObjectStore;
